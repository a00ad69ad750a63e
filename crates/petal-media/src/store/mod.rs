//! Object storage for uploaded images.
//!
//! The pipeline needs exactly two capabilities from a store: put bytes under
//! a bucket/name, and turn a bucket/name into a public URL.

mod http;
mod local;

use std::future::Future;

use bytes::Bytes;
use thiserror::Error;

pub use http::HttpObjectStore;
pub use local::LocalObjectStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid object name: {0:?}")]
    InvalidName(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("storage rejected upload ({status}): {body}")]
    Rejected { status: u16, body: String },
}

pub trait ObjectStore: Send + Sync {
    /// Store `bytes` as `bucket/name`, returning the object's URL.
    fn store(
        &self,
        bucket: &str,
        name: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Stable, externally fetchable address of `bucket/name`.
    fn public_url(&self, bucket: &str, name: &str) -> String;
}

/// The store selected at startup.
pub enum AnyObjectStore {
    Local(LocalObjectStore),
    Http(HttpObjectStore),
}

impl ObjectStore for AnyObjectStore {
    async fn store(
        &self,
        bucket: &str,
        name: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StoreError> {
        match self {
            Self::Local(s) => s.store(bucket, name, bytes, content_type).await,
            Self::Http(s) => s.store(bucket, name, bytes, content_type).await,
        }
    }

    fn public_url(&self, bucket: &str, name: &str) -> String {
        match self {
            Self::Local(s) => s.public_url(bucket, name),
            Self::Http(s) => s.public_url(bucket, name),
        }
    }
}

/// Bucket and object names are single path segments.
pub(crate) fn validate_segment(segment: &str) -> Result<(), StoreError> {
    let ok = !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidName(segment.to_string()))
    }
}
