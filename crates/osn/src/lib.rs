//! # OSN
//!
//! Anonymous read access to S3-compatible object storage, shaped for the
//! ingestion pipeline: prefix listing with directory semantics, object
//! reads, and zip globbing. Paths are `{bucket}/{key}` strings without a
//! leading slash, the way the rest of the pipeline addresses records.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

mod client;

pub use client::OsnClient;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("storage request failed with HTTP {status} for {path}")]
    HttpStatus {
        status: reqwest::StatusCode,
        path: String,
    },

    #[error("invalid storage path `{path}`: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("invalid storage URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("malformed listing response: {0}")]
    Xml(#[from] quick_xml::DeError),
}

impl StoreError {
    pub fn http_status(status: reqwest::StatusCode, path: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            path: path.into(),
        }
    }

    pub fn invalid_path(path: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason,
        }
    }
}

/// Read-side storage operations the pipeline depends on.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List the immediate children of a prefix.
    ///
    /// Directory entries come back without a trailing slash; when the
    /// bucket carries a marker object for the prefix itself it is
    /// returned first, with its trailing slash intact.
    async fn ls(&self, path: &str) -> Result<Vec<String>, StoreError>;

    /// Read a whole object.
    async fn read(&self, path: &str) -> Result<Bytes, StoreError>;

    /// All `.zip` object paths under a prefix.
    async fn glob_zip(&self, path: &str) -> Result<Vec<String>, StoreError>;
}
