//! Storage configuration smuggled through the request path
//!
//! `/k1=v1/k2=v2/host/prefix/objects/batch` yields `{k1: v1, k2: v2}` applied
//! over the defaults and the bucket `host/prefix`. Configuration segments must
//! come first: the first segment without `=` starts the bucket, and everything
//! after it belongs to the bucket even if it contains `=`.

use std::borrow::Cow;

use crate::core::config::StorageDefaults;
use crate::core::error::{AppError, Result};
use crate::modules::storage::StorageConfig;

/// Split a batch path into its storage configuration and bucket path.
///
/// `path` must already be known to end in `/objects/batch`.
pub fn extract(path: &str, defaults: &StorageDefaults) -> Result<(StorageConfig, String)> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() < 3 {
        return Err(AppError::BadRequest(
            "Path is not a batch endpoint".to_string(),
        ));
    }
    let inner = &segments[1..segments.len() - 2];

    let config_len = inner.iter().take_while(|s| s.contains('=')).count();
    let mut config = StorageConfig::from_defaults(defaults);

    for (index, segment) in inner[..config_len].iter().enumerate() {
        let Some((raw_key, raw_value)) = segment.split_once('=') else {
            continue;
        };
        let key = decode_component(raw_key, index)?;
        let value = decode_component(raw_value, index)?;
        config.set(&key, value.into_owned())?;
    }

    let bucket = inner[config_len..].join("/");
    if bucket.is_empty() {
        return Err(AppError::BadRequest(
            "Bucket missing from request path".to_string(),
        ));
    }

    Ok((config, bucket))
}

/// Strict percent-decoding: every `%` must start a two-digit hex escape and
/// the result must be UTF-8. `+` stays a literal plus.
fn decode_component(raw: &str, index: usize) -> Result<Cow<'_, str>> {
    let malformed = || {
        AppError::BadRequest(format!(
            "Configuration segment {} is not valid percent-encoding",
            index + 1
        ))
    };

    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3).ok_or_else(malformed)?;
            if !escape.iter().all(u8::is_ascii_hexdigit) {
                return Err(malformed());
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    urlencoding::decode(raw).map_err(|_| malformed())
}

/// Path with configuration values masked, safe to log.
///
/// Keys are kept so operators can see which overrides a request carried.
pub fn redact_path(path: &str) -> String {
    let mut in_config = true;
    path.split('/')
        .enumerate()
        .map(|(index, segment)| {
            if index == 0 || !in_config {
                return segment.to_string();
            }
            match segment.split_once('=') {
                Some((key, _)) => format!("{}=***", key),
                None => {
                    in_config = false;
                    segment.to_string()
                }
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
