//! Per-request storage configuration
//!
//! Built fresh for every batch request: seeded from the process-wide defaults,
//! then overridden by `key=value` segments at the front of the request path.

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::core::config::{parse_expiry, StorageDefaults};
use crate::core::error::{AppError, Result};
use crate::shared::constants::MAX_EXPIRY_SECS;

/// Keys accepted in path configuration segments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    AccessKeyId,
    SecretAccessKey,
    SessionToken,
    Region,
    Service,
    Expiry,
}

impl FromStr for ConfigKey {
    type Err = ();

    fn from_str(key: &str) -> std::result::Result<Self, Self::Err> {
        match key {
            "accessKeyId" => Ok(ConfigKey::AccessKeyId),
            "secretAccessKey" => Ok(ConfigKey::SecretAccessKey),
            "sessionToken" => Ok(ConfigKey::SessionToken),
            "region" => Ok(ConfigKey::Region),
            "service" => Ok(ConfigKey::Service),
            "expiry" => Ok(ConfigKey::Expiry),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct StorageConfig {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    /// Overrides the region guessed from the bucket host
    pub region: Option<String>,
    /// Overrides the service guessed from the bucket host
    pub service: Option<String>,
    /// Per-request `expires_in` override, in seconds
    pub expiry: Option<u32>,
}

impl StorageConfig {
    pub fn from_defaults(defaults: &StorageDefaults) -> Self {
        Self {
            access_key_id: defaults.access_key_id.clone(),
            secret_access_key: defaults.secret_access_key.clone(),
            ..Self::default()
        }
    }

    /// Apply one decoded `key=value` pair. Later calls win.
    ///
    /// Unrecognised keys are ignored; only the key name is logged.
    pub fn set(&mut self, key: &str, value: String) -> Result<()> {
        let Ok(parsed) = key.parse::<ConfigKey>() else {
            warn!(key = %key, "Ignoring unrecognised configuration key");
            return Ok(());
        };

        match parsed {
            ConfigKey::AccessKeyId => self.access_key_id = Some(value),
            ConfigKey::SecretAccessKey => self.secret_access_key = Some(value),
            ConfigKey::SessionToken => self.session_token = Some(value),
            ConfigKey::Region => self.region = Some(value),
            ConfigKey::Service => self.service = Some(value),
            ConfigKey::Expiry => {
                let secs = parse_expiry(&value).ok_or_else(|| {
                    AppError::BadRequest(format!(
                        "expiry must be between 1 and {} seconds",
                        MAX_EXPIRY_SECS
                    ))
                })?;
                self.expiry = Some(secs);
            }
        }

        Ok(())
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "***"),
            )
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .field("region", &self.region)
            .field("service", &self.service)
            .field("expiry", &self.expiry)
            .finish()
    }
}
