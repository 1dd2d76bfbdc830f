use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Request},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::core::error::AppError;
use crate::shared::constants::LFS_MIME;

/// Git LFS JSON body, in both directions.
///
/// Extraction does not insist on a content type: any body that parses as JSON
/// is accepted. Responses are always tagged `application/vnd.git-lfs+json`.
pub struct LfsJson<T>(pub T);

impl<T, S> FromRequest<S> for LfsJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| {
                AppError::BadRequest(format!("Failed to read request body: {}", rejection))
            })?;

        serde_json::from_slice::<T>(&bytes)
            .map(Self)
            .map_err(|err| match err.classify() {
                serde_json::error::Category::Data => {
                    AppError::BadRequest(format!("Invalid JSON data: {}", err))
                }
                _ => AppError::BadRequest(format!("Invalid JSON syntax: {}", err)),
            })
    }
}

impl<T: Serialize> IntoResponse for LfsJson<T> {
    fn into_response(self) -> Response {
        let mut response = Json(self.0).into_response();
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(LFS_MIME));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Probe {
        name: String,
    }

    fn request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_extracts_json_without_content_type() {
        let LfsJson(probe) = LfsJson::<Probe>::from_request(request(r#"{"name":"a"}"#), &())
            .await
            .unwrap();
        assert_eq!(probe.name, "a");
    }

    #[tokio::test]
    async fn test_rejects_malformed_json_as_bad_request() {
        let err = LfsJson::<Probe>::from_request(request("{not json"), &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rejects_missing_fields_as_bad_request() {
        let err = LfsJson::<Probe>::from_request(request("{}"), &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_response_uses_lfs_content_type() {
        let response = LfsJson(Probe {
            name: "a".to_string(),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            LFS_MIME
        );
    }
}
