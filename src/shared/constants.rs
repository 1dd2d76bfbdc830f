/// Media type of Git LFS batch requests and responses
pub const LFS_MIME: &str = "application/vnd.git-lfs+json";

/// Where `GET /` redirects unless `HOMEPAGE_URL` says otherwise
pub const DEFAULT_HOMEPAGE_URL: &str = "https://github.com/milkey-mouse/git-lfs-s3-proxy";

/// Default lifetime of signed URLs, in seconds
pub const DEFAULT_EXPIRY_SECS: u32 = 3600;

/// Longest `X-Amz-Expires` accepted by SigV4 (7 days)
pub const MAX_EXPIRY_SECS: u32 = 604_800;

/// The only transfer adapter this proxy speaks
pub const TRANSFER_BASIC: &str = "basic";

/// Trailing path segments of the batch endpoint
pub const BATCH_PATH_SUFFIX: &str = "/objects/batch";
