use std::env;
use std::fmt;

use crate::shared::constants::{DEFAULT_EXPIRY_SECS, DEFAULT_HOMEPAGE_URL, MAX_EXPIRY_SECS};

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub storage: StorageDefaults,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub max_request_body_size: usize,
    /// Target of the `GET /` redirect
    pub homepage_url: String,
}

/// Process-wide storage settings that seed every per-request storage configuration.
///
/// Credentials are optional here: a request may carry its own through path
/// configuration segments, and signing fails only when neither source has them.
#[derive(Clone)]
pub struct StorageDefaults {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Advisory `expires_in` returned to clients
    pub expires_in_secs: u32,
    /// `X-Amz-Expires` window baked into every signature
    pub signature_expiry_secs: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            storage: StorageDefaults::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8787".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        let homepage_url = env::var("HOMEPAGE_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_HOMEPAGE_URL.to_string());

        Ok(Self {
            host,
            port,
            max_request_body_size,
            homepage_url,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl StorageDefaults {
    pub fn from_env() -> Result<Self, String> {
        // Empty values count as unset so a blank secret never signs anything
        let access_key_id = env::var("ACCESS_KEY_ID").ok().filter(|s| !s.is_empty());
        let secret_access_key = env::var("SECRET_ACCESS_KEY")
            .ok()
            .filter(|s| !s.is_empty());

        let expires_in_secs = expiry_from_env("EXPIRY")?;
        let signature_expiry_secs = expiry_from_env("SIGNATURE_EXPIRY")?;

        Ok(Self {
            access_key_id,
            secret_access_key,
            expires_in_secs,
            signature_expiry_secs,
        })
    }
}

impl fmt::Debug for StorageDefaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageDefaults")
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "***"),
            )
            .field("expires_in_secs", &self.expires_in_secs)
            .field("signature_expiry_secs", &self.signature_expiry_secs)
            .finish()
    }
}

fn expiry_from_env(name: &str) -> Result<u32, String> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => parse_expiry(raw.trim())
            .ok_or_else(|| format!("{} must be between 1 and {} seconds", name, MAX_EXPIRY_SECS)),
        _ => Ok(DEFAULT_EXPIRY_SECS),
    }
}

/// Parse an expiry in seconds, accepting only the window SigV4 allows
pub fn parse_expiry(raw: &str) -> Option<u32> {
    raw.parse::<u32>()
        .ok()
        .filter(|secs| (1..=MAX_EXPIRY_SECS).contains(secs))
}
