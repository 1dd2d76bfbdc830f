#[cfg(test)]
use axum_test::TestServer;

#[cfg(test)]
use crate::core::config::{AppConfig, Config, StorageDefaults};

#[cfg(test)]
use crate::shared::constants::{DEFAULT_EXPIRY_SECS, DEFAULT_HOMEPAGE_URL};

#[cfg(test)]
pub const TEST_ACCESS_KEY_ID: &str = "AKIDEXAMPLE";

#[cfg(test)]
pub const TEST_SECRET_ACCESS_KEY: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

#[cfg(test)]
pub fn test_config() -> Config {
    Config {
        app: AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_request_body_size: 64 * 1024,
            homepage_url: DEFAULT_HOMEPAGE_URL.to_string(),
        },
        storage: StorageDefaults {
            access_key_id: Some(TEST_ACCESS_KEY_ID.to_string()),
            secret_access_key: Some(TEST_SECRET_ACCESS_KEY.to_string()),
            expires_in_secs: DEFAULT_EXPIRY_SECS,
            signature_expiry_secs: DEFAULT_EXPIRY_SECS,
        },
    }
}

/// Full application router, middleware included, behind an in-memory server
#[cfg(test)]
pub fn test_server() -> TestServer {
    TestServer::new(crate::build_router(&test_config())).unwrap()
}
