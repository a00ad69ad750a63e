use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use tracing::{info, warn};

use super::{ObjectStore, StoreError, validate_segment};

/// Remote bucket store speaking the common `object/{bucket}/{name}` REST shape
/// (Supabase Storage and compatible gateways).
///
/// Uploads go to `POST {endpoint}/object/{bucket}/{name}` with a bearer key;
/// public objects are served from `{endpoint}/object/public/{bucket}/{name}`.
pub struct HttpObjectStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpObjectStore {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

impl ObjectStore for HttpObjectStore {
    async fn store(
        &self,
        bucket: &str,
        name: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StoreError> {
        validate_segment(bucket)?;
        validate_segment(name)?;

        let size = bytes.len();
        let url = format!("{}/object/{}/{}", self.endpoint, bucket, name);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("Storage rejected {}/{}: {} {}", bucket, name, status, body);
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!("Uploaded {}/{} ({} bytes) to {}", bucket, name, size, self.endpoint);
        Ok(self.public_url(bucket, name))
    }

    fn public_url(&self, bucket: &str, name: &str) -> String {
        format!("{}/object/public/{}/{}", self.endpoint, bucket, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::extract::State;
    use axum::http::{HeaderMap, HeaderName, StatusCode, Uri, header};
    use axum::routing::post;

    #[derive(Debug, Clone)]
    struct Received {
        path: String,
        authorization: Option<String>,
        content_type: Option<String>,
        len: usize,
    }

    /// Bucket endpoint that accepts the first upload and rejects the rest.
    #[derive(Default)]
    struct Bucket {
        received: Mutex<Vec<Received>>,
        calls: AtomicUsize,
    }

    async fn accept_once(
        State(bucket): State<Arc<Bucket>>,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> (StatusCode, &'static str) {
        let header = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        bucket.received.lock().unwrap().push(Received {
            path: uri.path().to_string(),
            authorization: header(header::AUTHORIZATION),
            content_type: header(header::CONTENT_TYPE),
            len: body.len(),
        });

        if bucket.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            (StatusCode::OK, "{}")
        } else {
            (StatusCode::FORBIDDEN, "bucket is read-only")
        }
    }

    async fn spawn_bucket(bucket: Arc<Bucket>) -> String {
        let app = Router::new()
            .route("/object/{bucket}/{name}", post(accept_once))
            .with_state(bucket);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn uploads_with_bearer_key_then_reports_rejection() {
        let bucket = Arc::new(Bucket::default());
        let endpoint = spawn_bucket(bucket.clone()).await;
        let store = HttpObjectStore::new(format!("{}/", endpoint), "service-key");

        let url = store
            .store("uploads", "cover-1", Bytes::from_static(b"jpegdata"), "image/jpeg")
            .await
            .unwrap();
        assert_eq!(url, format!("{}/object/public/uploads/cover-1", endpoint));

        let err = store
            .store("uploads", "cover-2", Bytes::from_static(b"jpegdata"), "image/jpeg")
            .await
            .unwrap_err();
        match err {
            StoreError::Rejected { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "bucket is read-only");
            }
            other => panic!("expected rejection, got {other:?}"),
        }

        let received = bucket.received.lock().unwrap().clone();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].path, "/object/uploads/cover-1");
        assert_eq!(received[1].path, "/object/uploads/cover-2");
        assert_eq!(received[0].authorization.as_deref(), Some("Bearer service-key"));
        assert_eq!(received[0].content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(received[0].len, 8);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_http_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let store = HttpObjectStore::new(format!("http://{}", addr), "key");
        let err = store
            .store("uploads", "avatar-1", Bytes::from_static(b"x"), "image/jpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Http(_)));
    }

    #[test]
    fn public_url_layout() {
        let store = HttpObjectStore::new("https://example.supabase.co/storage/v1/", "key");
        assert_eq!(
            store.public_url("uploads", "avatar-1"),
            "https://example.supabase.co/storage/v1/object/public/uploads/avatar-1"
        );
    }

    #[tokio::test]
    async fn invalid_names_fail_before_any_request() {
        let store = HttpObjectStore::new("http://127.0.0.1:9", "key");
        let err = store
            .store("uploads", "a/b", Bytes::from_static(b"x"), "image/jpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidName(_)));
    }
}
