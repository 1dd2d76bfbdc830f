use axum::{
    extract::{FromRequest, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::LfsJson;
use crate::features::lfs::dtos::{BatchRequestDto, Operation};
use crate::features::lfs::path_config::{self, redact_path};
use crate::features::lfs::routes::{resolve, LfsState, Route};

/// Entry point for every request.
///
/// The route is resolved from method and path alone, so unmatched requests
/// are rejected before their body is read.
pub async fn dispatch(State(state): State<LfsState>, request: Request) -> Result<Response> {
    let path = request.uri().path().to_string();

    match resolve(request.method(), &path) {
        Route::HomepageRedirect => Ok(homepage_redirect(&state.homepage_url)),
        Route::Batch => batch(&state, &path, request).await,
        Route::MethodNotAllowed(allow) => Err(AppError::MethodNotAllowed { allow }),
        Route::NotFound => Err(AppError::NotFound(redact_path(&path))),
    }
}

fn homepage_redirect(url: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, url)]).into_response()
}

/// Git LFS batch API
///
/// Storage configuration comes from the path, the object list from the body.
/// Responds with one presigned action per object, in request order.
async fn batch(state: &LfsState, path: &str, request: Request) -> Result<Response> {
    let (config, bucket) = path_config::extract(path, state.batch_service.defaults())?;

    let LfsJson(dto) = LfsJson::<BatchRequestDto>::from_request(request, state).await?;
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let operation = dto.operation.parse::<Operation>()?;

    let response = state
        .batch_service
        .sign_batch(config, &bucket, operation, dto.objects)
        .await?;

    Ok(([(header::CACHE_CONTROL, "no-store")], LfsJson(response)).into_response())
}
