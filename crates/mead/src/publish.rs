//! Record publication: repository submission plus DOI registration.

use datacite::DoiRegistry;
use ingest_common::Document;
use invenio::{Repository, WriteOptions, parse_record_url};
use tracing::{debug, info};

use crate::{EngineError, IngestConfig};

/// Submits records to the repository and keeps the DOI registry in step.
pub struct Publisher<'a> {
    repo: &'a dyn Repository,
    registry: &'a dyn DoiRegistry,
    config: &'a IngestConfig,
}

impl<'a> Publisher<'a> {
    pub fn new(
        repo: &'a dyn Repository,
        registry: &'a dyn DoiRegistry,
        config: &'a IngestConfig,
    ) -> Self {
        Self {
            repo,
            registry,
            config,
        }
    }

    fn write_options(&self) -> WriteOptions {
        WriteOptions {
            production: self.config.production,
            schema: "43".to_string(),
            publish: true,
            community: self.config.community.clone(),
        }
    }

    /// Create a new repository record, then register its DOI against the
    /// constructed landing URL. Returns the canonical registered DOI.
    pub async fn create(
        &self,
        record_id: &str,
        metadata: &Document,
        file_links: &[String],
    ) -> Result<String, EngineError> {
        let internal_id = self
            .repo
            .write(metadata, file_links, &self.write_options())
            .await?;
        let url = format!("{}/{}", self.config.landing_base, internal_id);
        debug!(record_id, %url, "record written");
        self.register(record_id, metadata, &url).await
    }

    /// Replace an existing record's metadata, then retarget its DOI at
    /// the landing URL parsed from the confirmation.
    pub async fn update(
        &self,
        record_id: &str,
        internal_id: &str,
        metadata: &Document,
    ) -> Result<String, EngineError> {
        let confirmation = self
            .repo
            .edit(internal_id, metadata, &self.write_options())
            .await?;
        let url = parse_record_url(&confirmation)?;
        debug!(record_id, %url, "record edited");
        self.register(record_id, metadata, &url).await
    }

    async fn register(
        &self,
        record_id: &str,
        metadata: &Document,
        url: &str,
    ) -> Result<String, EngineError> {
        let doi = if self.registry.exists(record_id).await? {
            self.registry.update_doi(record_id, metadata, url).await?
        } else {
            self.registry.public_doi(record_id, metadata, url).await?
        };
        info!(%doi, url, "DOI registered");
        Ok(doi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingRepo, StubRegistry};

    fn config() -> IngestConfig {
        IngestConfig {
            landing_base: "https://data.caltech.edu/records".to_string(),
            ..IngestConfig::default()
        }
    }

    #[tokio::test]
    async fn create_mints_when_unregistered() {
        let repo = RecordingRepo::new("1234");
        let registry = StubRegistry::unregistered();
        let config = config();
        let publisher = Publisher::new(&repo, &registry, &config);

        let doi = publisher
            .create("10.25989/abc", &Document::new(), &[])
            .await
            .unwrap();
        assert_eq!(doi, "10.25989/abc");
        assert_eq!(
            registry.minted(),
            [("10.25989/abc".to_string(), "https://data.caltech.edu/records/1234".to_string())]
        );
        assert!(registry.updated().is_empty());
    }

    #[tokio::test]
    async fn create_updates_when_registered() {
        let repo = RecordingRepo::new("1234");
        let registry = StubRegistry::registered();
        let config = config();
        let publisher = Publisher::new(&repo, &registry, &config);

        publisher
            .create("10.25989/abc", &Document::new(), &[])
            .await
            .unwrap();
        assert!(registry.minted().is_empty());
        assert_eq!(registry.updated().len(), 1);
    }

    #[tokio::test]
    async fn update_parses_landing_url_from_confirmation() {
        let repo = RecordingRepo::new("5678");
        let registry = StubRegistry::registered();
        let config = config();
        let publisher = Publisher::new(&repo, &registry, &config);

        publisher
            .update("10.25989/abc", "5678", &Document::new())
            .await
            .unwrap();
        assert_eq!(
            registry.updated(),
            [("10.25989/abc".to_string(), "https://data.caltech.edu/records/5678".to_string())]
        );
    }
}
