//! DataCite REST registration client.
//!
//! Mints (`public_doi`) or retargets (`update_doi`) DOIs against the
//! registration service, and answers whether a DOI is currently
//! registered. The trait seam lets the engine run against an in-memory
//! registry in tests.

use async_trait::async_trait;
use ingest_common::Document;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::API_BASE;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("HTTP request failed: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("registry request failed with HTTP {status} during {operation} for {doi}")]
    HttpStatus {
        status: StatusCode,
        doi: String,
        operation: &'static str,
    },

    #[error("invalid registry URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("malformed registry response: {reason}")]
    MalformedResponse { reason: String },
}

impl RegistryError {
    pub fn http_status(status: StatusCode, doi: impl Into<String>, operation: &'static str) -> Self {
        Self::HttpStatus {
            status,
            doi: doi.into(),
            operation,
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }
}

/// Account triple for the registration service.
#[derive(Debug, Clone)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
    pub prefix: String,
}

/// Registration-side operations the publisher depends on.
#[async_trait]
pub trait DoiRegistry: Send + Sync {
    /// Whether the DOI currently resolves at the registry.
    async fn exists(&self, doi: &str) -> Result<bool, RegistryError>;

    /// Mint a findable DOI bound to the landing URL.
    async fn public_doi(
        &self,
        doi: &str,
        metadata: &Document,
        url: &str,
    ) -> Result<String, RegistryError>;

    /// Update an already registered DOI's metadata and target URL.
    async fn update_doi(
        &self,
        doi: &str,
        metadata: &Document,
        url: &str,
    ) -> Result<String, RegistryError>;
}

/// REST client for the DataCite registration API.
pub struct DataCiteClient {
    http: Client,
    api_base: Url,
    credentials: RegistryCredentials,
}

impl DataCiteClient {
    pub fn new(credentials: RegistryCredentials) -> Result<Self, RegistryError> {
        Self::with_api_base(credentials, API_BASE)
    }

    /// Point the client at a different API base, for tests and sandboxes.
    pub fn with_api_base(
        credentials: RegistryCredentials,
        api_base: &str,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            http: Client::new(),
            api_base: Url::parse(api_base)?,
            credentials,
        })
    }

    fn doi_url(&self, doi: &str) -> Result<Url, RegistryError> {
        Ok(self.api_base.join(&format!("dois/{doi}"))?)
    }

    fn registration_body(
        doi: &str,
        metadata: &Document,
        url: &str,
        event: Option<&str>,
    ) -> Value {
        let mut attributes = metadata.clone();
        attributes.insert("doi".to_string(), json!(doi));
        attributes.insert("url".to_string(), json!(url));
        if let Some(event) = event {
            attributes.insert("event".to_string(), json!(event));
        }
        json!({ "data": { "type": "dois", "attributes": attributes } })
    }

    fn registered_doi(body: &Value) -> Result<String, RegistryError> {
        body.pointer("/data/attributes/doi")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RegistryError::malformed("response carries no data.attributes.doi"))
    }
}

#[async_trait]
impl DoiRegistry for DataCiteClient {
    async fn exists(&self, doi: &str) -> Result<bool, RegistryError> {
        let url = self.doi_url(doi)?;
        debug!(%doi, "checking DOI registration");
        let response = self.http.get(url).send().await?;
        Ok(response.status() == StatusCode::OK)
    }

    async fn public_doi(
        &self,
        doi: &str,
        metadata: &Document,
        url: &str,
    ) -> Result<String, RegistryError> {
        info!(%doi, %url, "minting DOI");
        let body = Self::registration_body(doi, metadata, url, Some("publish"));
        let response = self
            .http
            .post(self.api_base.join("dois")?)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::http_status(status, doi, "public_doi"));
        }
        Self::registered_doi(&response.json::<Value>().await?)
    }

    async fn update_doi(
        &self,
        doi: &str,
        metadata: &Document,
        url: &str,
    ) -> Result<String, RegistryError> {
        info!(%doi, %url, "updating DOI target");
        let body = Self::registration_body(doi, metadata, url, None);
        let response = self
            .http
            .put(self.doi_url(doi)?)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::http_status(status, doi, "update_doi"));
        }
        Self::registered_doi(&response.json::<Value>().await?)
    }
}
