//! AWS Signature v4 query-string presigning
//!
//! Produces time-limited URLs for S3-compatible stores without any network
//! call. The bucket path is `host[/prefix...]`: the first component is the
//! virtual host, the rest is prepended to every object key.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::core::error::{AppError, Result};
use crate::modules::storage::StorageConfig;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";
const DEFAULT_SERVICE: &str = "s3";
const DEFAULT_REGION: &str = "us-east-1";

lazy_static! {
    static ref AMAZONAWS_HOST: Regex =
        Regex::new(r"([^.]{1,63})\.(?:([^.]{0,63})\.)?amazonaws\.com(?:\.cn)?$").unwrap();
    static ref BACKBLAZE_HOST: Regex =
        Regex::new(r"^(?:[^.]{1,63}\.)?s3\.([^.]{1,63})\.backblazeb2\.com$").unwrap();
}

/// HTTP methods a presigned URL can authorize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedMethod {
    Get,
    Put,
}

impl SignedMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            SignedMethod::Get => "GET",
            SignedMethod::Put => "PUT",
        }
    }
}

/// Turns an object id into a URL authorizing `method` against it
pub trait UrlSigner: Send + Sync {
    fn sign(&self, object_id: &str, method: SignedMethod) -> Result<String>;
}

/// SigV4 presigner scoped to one bucket and one instant.
///
/// All URLs from one instance share the timestamp and derived signing key.
pub struct Presigner {
    access_key_id: String,
    session_token: Option<String>,
    host: String,
    prefix: Vec<String>,
    credential_scope: String,
    amz_date: String,
    expires_secs: u32,
    signing_key: Vec<u8>,
}

impl Presigner {
    pub fn new(
        config: &StorageConfig,
        bucket: &str,
        expires_secs: u32,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let access_key_id = config
            .access_key_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Signing("No access key id configured".to_string()))?;
        let secret_access_key = config
            .secret_access_key
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Signing("No secret access key configured".to_string()))?;

        let mut components = bucket.split('/');
        let host = components
            .next()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| AppError::BadRequest("Bucket host is empty".to_string()))?
            .to_ascii_lowercase();
        let prefix = components
            .filter(|c| !c.is_empty())
            .map(|c| {
                urlencoding::decode(c)
                    .map(|d| d.into_owned())
                    .map_err(|_| AppError::BadRequest("Bucket path is not valid UTF-8".to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let (guessed_service, guessed_region) = guess_service_region(&host);
        let service = config.service.clone().unwrap_or(guessed_service);
        let region = config.region.clone().unwrap_or(guessed_region);

        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let credential_scope = format!("{}/{}/{}/aws4_request", date_stamp, region, service);
        let signing_key = signing_key(secret_access_key, &date_stamp, &region, &service)?;

        Ok(Self {
            access_key_id: access_key_id.to_string(),
            session_token: config.session_token.clone(),
            host,
            prefix,
            credential_scope,
            amz_date,
            expires_secs,
            signing_key,
        })
    }

    /// Canonical URI for an object: prefix plus key, each segment RFC 3986 encoded
    fn canonical_uri(&self, object_id: &str) -> String {
        let segments = self
            .prefix
            .iter()
            .map(String::as_str)
            .chain(object_id.split('/'))
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>();
        format!("/{}", segments.join("/"))
    }

    /// Sorted, encoded query without the signature itself
    fn canonical_query(&self) -> String {
        let mut params: Vec<(&str, String)> = vec![
            ("X-Amz-Algorithm", ALGORITHM.to_string()),
            (
                "X-Amz-Credential",
                format!("{}/{}", self.access_key_id, self.credential_scope),
            ),
            ("X-Amz-Date", self.amz_date.clone()),
            ("X-Amz-Expires", self.expires_secs.to_string()),
            ("X-Amz-SignedHeaders", "host".to_string()),
        ];
        if let Some(token) = &self.session_token {
            params.push(("X-Amz-Security-Token", token.clone()));
        }
        params.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.cmp(&b.1)));

        params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn presign(&self, object_id: &str, method: SignedMethod) -> Result<String> {
        let canonical_uri = self.canonical_uri(object_id);
        let canonical_query = self.canonical_query();

        let canonical_request = format!(
            "{}\n{}\n{}\nhost:{}\n\nhost\n{}",
            method.as_str(),
            canonical_uri,
            canonical_query,
            self.host,
            UNSIGNED_PAYLOAD
        );

        let canonical_request_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM, self.amz_date, self.credential_scope, canonical_request_hash
        );
        let signature = hex::encode(hmac_sha256(&self.signing_key, string_to_sign.as_bytes())?);

        Ok(format!(
            "https://{}{}?{}&X-Amz-Signature={}",
            self.host, canonical_uri, canonical_query, signature
        ))
    }
}

impl UrlSigner for Presigner {
    fn sign(&self, object_id: &str, method: SignedMethod) -> Result<String> {
        self.presign(object_id, method)
    }
}

/// Derive the SigV4 signing key for one day, region and service
fn signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Result<Vec<u8>> {
    let k_date = hmac_sha256(
        format!("AWS4{}", secret_key).as_bytes(),
        date_stamp.as_bytes(),
    )?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

/// HMAC-SHA256 helper
fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Signing(format!("HMAC key error: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Guess `(service, region)` from a storage host name.
///
/// Unknown hosts are treated as S3 in `us-east-1`.
pub fn guess_service_region(host: &str) -> (String, String) {
    let hostname = host.split(':').next().unwrap_or(host);

    if hostname.ends_with(".r2.cloudflarestorage.com") {
        return ("s3".to_string(), "auto".to_string());
    }

    if hostname.ends_with(".backblazeb2.com") {
        let region = BACKBLAZE_HOST
            .captures(hostname)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        return ("s3".to_string(), or_default(region, DEFAULT_REGION));
    }

    let hostname = hostname.replace("dualstack.", "");
    let Some(captures) = AMAZONAWS_HOST.captures(&hostname) else {
        return (DEFAULT_SERVICE.to_string(), DEFAULT_REGION.to_string());
    };

    let mut service = captures
        .get(1)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    let mut region = captures
        .get(2)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    if region == "us-gov" {
        region = "us-gov-west-1".to_string();
    } else if region == "s3" || region == "s3-accelerate" {
        region = DEFAULT_REGION.to_string();
        service = "s3".to_string();
    } else if let Some(legacy_region) = service.strip_prefix("s3-") {
        // s3-us-west-2.amazonaws.com style
        region = match legacy_region {
            "external-1" => DEFAULT_REGION.to_string(),
            other => other.to_string(),
        };
        service = "s3".to_string();
    } else if let Some(base) = service.strip_suffix("-fips") {
        service = base.to_string();
    }

    (
        or_default(service, DEFAULT_SERVICE),
        or_default(region, DEFAULT_REGION),
    )
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}
