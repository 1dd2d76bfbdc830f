//! Storage module for S3-compatible object stores
//!
//! Provides the per-request storage configuration and SigV4 presigned URL
//! generation. Nothing here talks to the network.

mod presigner;
mod storage_config;

pub use presigner::{Presigner, SignedMethod, UrlSigner};
pub use storage_config::StorageConfig;
