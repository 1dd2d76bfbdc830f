use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, http::Method, Router};

use crate::features::lfs::handlers;
use crate::features::lfs::services::BatchService;
use crate::shared::constants::BATCH_PATH_SUFFIX;

#[derive(Clone)]
pub struct LfsState {
    pub batch_service: Arc<BatchService>,
    pub homepage_url: Arc<str>,
}

/// Outcome of matching a request line against the two endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    HomepageRedirect,
    Batch,
    /// Carries the value of the `Allow` header
    MethodNotAllowed(&'static str),
    NotFound,
}

pub fn resolve(method: &Method, path: &str) -> Route {
    if path == "/" {
        return if *method == Method::GET {
            Route::HomepageRedirect
        } else {
            Route::MethodNotAllowed("GET")
        };
    }

    if !path.ends_with(BATCH_PATH_SUFFIX) {
        return Route::NotFound;
    }

    if *method == Method::POST {
        Route::Batch
    } else {
        Route::MethodNotAllowed("POST")
    }
}

/// Create the router for the LFS proxy.
///
/// Batch paths have an arbitrary number of leading segments, so everything
/// goes through one fallback handler that resolves the route itself.
pub fn routes(state: LfsState, max_request_body_size: usize) -> Router {
    Router::new()
        .fallback(handlers::dispatch)
        .layer(DefaultBodyLimit::max(max_request_body_size))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{header, StatusCode};
    use serde_json::{json, Value};

    use crate::shared::constants::{DEFAULT_HOMEPAGE_URL, LFS_MIME};
    use crate::shared::test_helpers::{test_server, TEST_ACCESS_KEY_ID, TEST_SECRET_ACCESS_KEY};

    fn lfs_body(value: Value) -> Bytes {
        Bytes::from(value.to_string())
    }

    #[test]
    fn test_resolve_root() {
        assert_eq!(resolve(&Method::GET, "/"), Route::HomepageRedirect);
        assert_eq!(resolve(&Method::POST, "/"), Route::MethodNotAllowed("GET"));
        assert_eq!(resolve(&Method::DELETE, "/"), Route::MethodNotAllowed("GET"));
    }

    #[test]
    fn test_resolve_batch() {
        assert_eq!(resolve(&Method::POST, "/objects/batch"), Route::Batch);
        assert_eq!(
            resolve(&Method::POST, "/region=auto/host/prefix/objects/batch"),
            Route::Batch
        );
        assert_eq!(
            resolve(&Method::GET, "/x/y/objects/batch"),
            Route::MethodNotAllowed("POST")
        );
        assert_eq!(
            resolve(&Method::PUT, "/x/objects/batch"),
            Route::MethodNotAllowed("POST")
        );
    }

    #[test]
    fn test_resolve_other_paths() {
        assert_eq!(resolve(&Method::GET, "/favicon.ico"), Route::NotFound);
        assert_eq!(resolve(&Method::POST, "/x/objects/batch/"), Route::NotFound);
        assert_eq!(resolve(&Method::POST, "/x/objects"), Route::NotFound);
    }

    #[tokio::test]
    async fn test_homepage_redirects() {
        let server = test_server();

        let response = server.get("/").await;

        assert_eq!(response.status_code(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            DEFAULT_HOMEPAGE_URL
        );
    }

    #[tokio::test]
    async fn test_post_to_root_is_method_not_allowed() {
        let server = test_server();

        let response = server.post("/").await;

        assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET");
    }

    #[tokio::test]
    async fn test_get_batch_is_method_not_allowed() {
        let server = test_server();

        let response = server.get("/x/y/objects/batch").await;

        assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "POST");
        assert!(response.text().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let server = test_server();

        let response = server.get("/some/where").await;

        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        assert!(response.text().is_empty());
    }

    #[tokio::test]
    async fn test_download_batch() {
        let server = test_server();

        let response = server
            .post("/my-bucket/objects/batch")
            .content_type(LFS_MIME)
            .bytes(lfs_body(json!({
                "operation": "download",
                "objects": [{ "oid": "abc123", "size": 10 }]
            })))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-store"
        );
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            LFS_MIME
        );

        let body: Value = response.json();
        assert_eq!(body["transfer"], "basic");
        let objects = body["objects"].as_array().unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0]["oid"], "abc123");
        assert_eq!(objects[0]["size"], 10);
        assert_eq!(objects[0]["authenticated"], true);

        let action = &objects[0]["actions"]["download"];
        assert_eq!(action["expires_in"], 3600);
        let href = action["href"].as_str().unwrap();
        assert!(href.starts_with("https://my-bucket/abc123?X-Amz-Algorithm=AWS4-HMAC-SHA256"));
        assert!(href.contains(&format!("X-Amz-Credential={}%2F", TEST_ACCESS_KEY_ID)));
        assert!(href.contains("X-Amz-Expires=3600"));
        assert!(href.contains("X-Amz-Signature="));
        assert!(objects[0]["actions"].get("upload").is_none());
    }

    #[tokio::test]
    async fn test_upload_batch_preserves_order() {
        let server = test_server();
        let oids = ["ffff", "0000", "aaaa", "5555", "cccc"];
        let requested: Vec<Value> = oids
            .iter()
            .enumerate()
            .map(|(i, oid)| json!({ "oid": oid, "size": i }))
            .collect();

        let response = server
            .post("/region=eu-west-1/host.example.com/lfs/objects/batch")
            .bytes(lfs_body(json!({ "operation": "upload", "objects": requested })))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        let objects = body["objects"].as_array().unwrap();
        assert_eq!(objects.len(), oids.len());
        for (i, (object, oid)) in objects.iter().zip(oids).enumerate() {
            assert_eq!(object["oid"], oid);
            assert_eq!(object["size"], i);
            let href = object["actions"]["upload"]["href"].as_str().unwrap();
            assert!(href.starts_with(&format!("https://host.example.com/lfs/{}?", oid)));
            assert!(href.contains("%2Feu-west-1%2Fs3%2Faws4_request"));
        }
    }

    #[tokio::test]
    async fn test_empty_object_list() {
        let server = test_server();

        let response = server
            .post("/my-bucket/objects/batch")
            .bytes(lfs_body(json!({ "operation": "upload", "objects": [] })))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body, json!({ "transfer": "basic", "objects": [] }));
    }

    #[tokio::test]
    async fn test_expiry_override_from_path() {
        let server = test_server();

        let response = server
            .post("/expiry=600/my-bucket/objects/batch")
            .bytes(lfs_body(json!({
                "operation": "download",
                "objects": [{ "oid": "abc123", "size": 10 }]
            })))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["objects"][0]["actions"]["download"]["expires_in"], 600);
    }

    #[tokio::test]
    async fn test_unsupported_operation_is_bad_request() {
        let server = test_server();

        let response = server
            .post("/my-bucket/objects/batch")
            .bytes(lfs_body(json!({
                "operation": "verify",
                "objects": [{ "oid": "abc123", "size": 10 }]
            })))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert!(response.text().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_requests_are_bad_request() {
        let server = test_server();

        let invalid_json = server
            .post("/my-bucket/objects/batch")
            .bytes(Bytes::from_static(b"{\"operation\":"))
            .await;
        assert_eq!(invalid_json.status_code(), StatusCode::BAD_REQUEST);

        let missing_objects = server
            .post("/my-bucket/objects/batch")
            .bytes(lfs_body(json!({ "operation": "download" })))
            .await;
        assert_eq!(missing_objects.status_code(), StatusCode::BAD_REQUEST);

        let bad_escape = server
            .post("/region=%zz/my-bucket/objects/batch")
            .bytes(lfs_body(json!({ "operation": "download", "objects": [] })))
            .await;
        assert_eq!(bad_escape.status_code(), StatusCode::BAD_REQUEST);

        let no_bucket = server
            .post("/objects/batch")
            .bytes(lfs_body(json!({ "operation": "download", "objects": [] })))
            .await;
        assert_eq!(no_bucket.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_credentials_is_bad_gateway() {
        let server = test_server();

        let response = server
            .post("/accessKeyId=/my-bucket/objects/batch")
            .bytes(lfs_body(json!({
                "operation": "upload",
                "objects": [{ "oid": "abc123", "size": 10 }]
            })))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
        assert!(response.text().is_empty());
    }

    #[tokio::test]
    async fn test_secret_never_echoed() {
        let server = test_server();
        let path_secret = "path-secret/with+special=chars";

        for path in [
            "/my-bucket/objects/batch".to_string(),
            format!(
                "/secretAccessKey={}/my-bucket/objects/batch",
                urlencoding::encode(path_secret)
            ),
        ] {
            let response = server
                .post(&path)
                .bytes(lfs_body(json!({
                    "operation": "upload",
                    "objects": [{ "oid": "abc123", "size": 10 }]
                })))
                .await;

            assert_eq!(response.status_code(), StatusCode::OK);
            let text = response.text();
            for secret in [TEST_SECRET_ACCESS_KEY, path_secret] {
                assert!(!text.contains(secret));
                assert!(!text.contains(&*urlencoding::encode(secret)));
                for value in response.headers().values() {
                    assert!(!value.to_str().unwrap_or_default().contains(secret));
                }
            }
        }
    }
}
