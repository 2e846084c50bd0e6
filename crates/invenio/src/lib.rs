//! # Invenio
//!
//! Bearer-token client for the research repository's write API. `write`
//! creates and publishes a record from DataCite metadata plus file links,
//! returning the new internal record id; `edit` replaces the metadata of
//! an existing record and returns the service's confirmation text.

use async_trait::async_trait;
use ingest_common::Document;
use reqwest::Client;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Production write endpoint.
pub const PRODUCTION_URL: &str = "https://data.caltech.edu";
/// Sandbox write endpoint used when production is off.
pub const TEST_URL: &str = "https://cd-sandbox.tind.io";

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("HTTP request failed: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("repository request failed with HTTP {status} during {operation}")]
    HttpStatus {
        status: reqwest::StatusCode,
        operation: &'static str,
    },

    #[error("invalid repository URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("malformed repository response: {reason}")]
    MalformedResponse { reason: String },

    #[error("confirmation text carries no record URL: {text}")]
    MissingRecordUrl { text: String },
}

impl RepoError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }
}

/// Submission options shared by write and edit calls.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub production: bool,
    pub schema: String,
    pub publish: bool,
    pub community: Option<String>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            production: false,
            schema: "43".to_string(),
            publish: true,
            community: None,
        }
    }
}

/// Repository-side operations the publisher depends on.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Create and publish a record; returns the internal record id.
    async fn write(
        &self,
        metadata: &Document,
        file_links: &[String],
        options: &WriteOptions,
    ) -> Result<String, RepoError>;

    /// Replace the metadata of an existing record; returns the service's
    /// confirmation text.
    async fn edit(
        &self,
        record_id: &str,
        metadata: &Document,
        options: &WriteOptions,
    ) -> Result<String, RepoError>;
}

/// REST client for the repository write API.
pub struct InvenioClient {
    http: Client,
    token: String,
}

impl InvenioClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            token: token.into(),
        }
    }

    fn base_url(options: &WriteOptions) -> Result<Url, RepoError> {
        let base = if options.production {
            PRODUCTION_URL
        } else {
            TEST_URL
        };
        Ok(Url::parse(base)?)
    }

    fn submission_body(
        metadata: &Document,
        file_links: &[String],
        options: &WriteOptions,
    ) -> Value {
        let mut body = json!({
            "metadata": metadata,
            "schema": options.schema,
            "publish": options.publish,
        });
        if !file_links.is_empty() {
            body["file_links"] = json!(file_links);
        }
        if let Some(community) = &options.community {
            body["community"] = json!(community);
        }
        body
    }
}

#[async_trait]
impl Repository for InvenioClient {
    async fn write(
        &self,
        metadata: &Document,
        file_links: &[String],
        options: &WriteOptions,
    ) -> Result<String, RepoError> {
        let url = Self::base_url(options)?.join("api/records")?;
        let body = Self::submission_body(metadata, file_links, options);
        debug!(%url, files = file_links.len(), "submitting record");

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RepoError::HttpStatus {
                status,
                operation: "write",
            });
        }
        let payload: Value = response.json().await?;
        let id = payload
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| RepoError::malformed("response carries no record id"))?
            .to_string();
        info!(record_id = %id, "record created");
        Ok(id)
    }

    async fn edit(
        &self,
        record_id: &str,
        metadata: &Document,
        options: &WriteOptions,
    ) -> Result<String, RepoError> {
        let url = Self::base_url(options)?.join(&format!("api/records/{record_id}"))?;
        let body = Self::submission_body(metadata, &[], options);
        debug!(%url, "editing record");

        let response = self
            .http
            .put(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RepoError::HttpStatus {
                status,
                operation: "edit",
            });
        }
        let confirmation = response.text().await?;
        info!(record_id, "record edited");
        Ok(confirmation)
    }
}

/// Pull the landing URL out of an edit/write confirmation.
///
/// The service answers with a sentence ending in the record URL and a
/// closing period, e.g. `"Successfully updated record
/// https://data.caltech.edu/records/1234."`.
pub fn parse_record_url(confirmation: &str) -> Result<String, RepoError> {
    let after = confirmation
        .split("record ")
        .nth(1)
        .ok_or_else(|| RepoError::MissingRecordUrl {
            text: confirmation.to_string(),
        })?;
    let trimmed = after.trim();
    let url = trimmed.strip_suffix('.').unwrap_or(trimmed);
    if url.is_empty() {
        return Err(RepoError::MissingRecordUrl {
            text: confirmation.to_string(),
        });
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_url_is_parsed() {
        let text = "Successfully updated record https://data.caltech.edu/records/1234.";
        assert_eq!(
            parse_record_url(text).unwrap(),
            "https://data.caltech.edu/records/1234"
        );
    }

    #[test]
    fn confirmation_without_record_is_an_error() {
        assert!(matches!(
            parse_record_url("nothing to see"),
            Err(RepoError::MissingRecordUrl { .. })
        ));
    }

    #[test]
    fn submission_body_includes_links_and_community() {
        let metadata = Document::new();
        let links = vec!["https://example.org/data.zip".to_string()];
        let options = WriteOptions {
            community: Some("d0de1569".to_string()),
            ..WriteOptions::default()
        };
        let body = InvenioClient::submission_body(&metadata, &links, &options);
        assert_eq!(body["file_links"], json!(links));
        assert_eq!(body["community"], json!("d0de1569"));
        assert_eq!(body["schema"], json!("43"));
        assert_eq!(body["publish"], json!(true));
    }

    #[test]
    fn submission_body_omits_empty_links() {
        let body = InvenioClient::submission_body(
            &Document::new(),
            &[],
            &WriteOptions::default(),
        );
        assert!(body.get("file_links").is_none());
        assert!(body.get("community").is_none());
    }
}
