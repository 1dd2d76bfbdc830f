use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Terminal outcome of a failed request.
///
/// Responses carry only a status code (and `Allow` for 405). Messages go to the
/// log, so they must never include credential values.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed (allowed: {allow})")]
    MethodNotAllowed { allow: &'static str },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Signing error: {0}")]
    Signing(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            AppError::BadRequest(_)
            | AppError::Validation(_)
            | AppError::UnsupportedOperation(_) => StatusCode::BAD_REQUEST,
            AppError::Signing(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            AppError::NotFound(_) | AppError::MethodNotAllowed { .. } => {
                tracing::debug!("{}", self);
            }
            AppError::BadRequest(_)
            | AppError::Validation(_)
            | AppError::UnsupportedOperation(_) => {
                tracing::warn!("{}", self);
            }
            AppError::Signing(ref msg) => {
                tracing::error!("Signing error: {}", msg);
            }
        }

        match self {
            AppError::MethodNotAllowed { allow } => {
                (status, [(header::ALLOW, allow)]).into_response()
            }
            _ => status.into_response(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
