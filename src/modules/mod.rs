//! Modules layer - Infrastructure components for external integrations
//!
//! Contains adapters for external services like object storage.

pub mod storage;
