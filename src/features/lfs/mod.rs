//! Git LFS batch API backed by presigned S3 URLs.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/` | Redirect to the project homepage |
//! | POST | `/{key=value/...}{bucket-path}/objects/batch` | Presign transfer actions |

pub mod dtos;
pub mod handlers;
pub mod path_config;
pub mod routes;
pub mod services;

pub use routes::{routes, LfsState};
pub use services::BatchService;
