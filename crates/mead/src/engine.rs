//! The sequential ingestion run loop.

use datacite::{DoiRegistry, NormalizeProfile, Schema43, build_pipeline, description_policy};
use ingest_common::{Document, ExclusionReason, Ledger, RecordOutcome};
use invenio::Repository;
use osn::ObjectStore;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::{EngineError, IngestConfig, Publisher, enumerate_records, filter_candidates};

/// Counts for one finished run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub excluded: usize,
}

/// Drives records through fetch, normalize, validate, publish, record.
pub struct IngestEngine<'a> {
    store: &'a dyn ObjectStore,
    repo: &'a dyn Repository,
    registry: &'a dyn DoiRegistry,
    schema: Schema43,
    profile: NormalizeProfile,
    config: IngestConfig,
}

impl<'a> IngestEngine<'a> {
    pub fn new(
        store: &'a dyn ObjectStore,
        repo: &'a dyn Repository,
        registry: &'a dyn DoiRegistry,
        config: IngestConfig,
    ) -> Result<Self, EngineError> {
        let schema = Schema43::new()?;
        let profile = NormalizeProfile::for_kind(config.profile);
        Ok(Self {
            store,
            repo,
            registry,
            schema,
            profile,
            config,
        })
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Process every remaining candidate, one record at a time.
    ///
    /// Excluded records continue the loop; any error stops the run with
    /// prior progress already persisted in the ledger.
    pub async fn run(&self, ledger: &mut Ledger) -> Result<RunSummary, EngineError> {
        let candidates = enumerate_records(self.store, &self.config).await?;
        let records = filter_candidates(candidates, ledger);
        info!(records = records.len(), "starting ingestion run");

        let mut summary = RunSummary::default();
        for record_id in &records {
            match self.process_record(record_id, ledger).await? {
                RecordOutcome::Completed { doi } => {
                    summary.completed += 1;
                    info!(%doi, "record completed");
                }
                RecordOutcome::Excluded { reason } => {
                    summary.excluded += 1;
                    warn!(record = %record_id, %reason, "record excluded");
                }
            }
        }
        Ok(summary)
    }

    /// Run one record through the whole pipeline.
    pub async fn process_record(
        &self,
        record_id: &str,
        ledger: &mut Ledger,
    ) -> Result<RecordOutcome, EngineError> {
        let base = record_id
            .split('/')
            .nth(1)
            .filter(|base| !base.is_empty())
            .ok_or_else(|| EngineError::MalformedRecordId {
                record: record_id.to_string(),
            })?;
        let record_path = format!("{}{}", self.config.bucket_path(), base);

        let files = self.store.ls(&record_path).await?;
        if files.is_empty() {
            ledger.mark_excluded(record_id)?;
            return Ok(RecordOutcome::excluded(ExclusionReason::NoFiles));
        }

        let meta_path = format!("{record_path}/{}", self.config.metadata_file);
        let raw = match self.store.read(&meta_path).await {
            Ok(raw) => raw,
            Err(source) => {
                error!(record = record_id, ?files, "metadata object unavailable");
                ledger.mark_excluded(record_id)?;
                return Err(EngineError::MissingMetadata {
                    record: record_id.to_string(),
                    source,
                });
            }
        };
        let doc = match serde_json::from_slice::<Value>(&raw) {
            Ok(Value::Object(doc)) => doc,
            Ok(_) => {
                ledger.mark_excluded(record_id)?;
                return Err(EngineError::NotAnObject {
                    record: record_id.to_string(),
                });
            }
            Err(source) => {
                ledger.mark_excluded(record_id)?;
                return Err(EngineError::UnreadableMetadata {
                    record: record_id.to_string(),
                    source,
                });
            }
        };

        let zip_keys = self.store.glob_zip(&record_path).await?;
        let file_links: Vec<String> = zip_keys
            .iter()
            .map(|key| format!("{}{}", self.config.endpoint, key))
            .collect();

        let doc = self.normalize(record_id, doc, &file_links)?;

        let publisher = Publisher::new(self.repo, self.registry, &self.config);
        let links: &[String] = if self.profile.attach_file_links {
            &file_links
        } else {
            &[]
        };
        let doi = publisher.create(record_id, &doc, links).await?;
        ledger.mark_completed(&doi)?;
        Ok(RecordOutcome::completed(doi))
    }

    /// Normalize and validate one document, then apply the profile's
    /// post-validation scrub.
    fn normalize(
        &self,
        record_id: &str,
        doc: Document,
        file_links: &[String],
    ) -> Result<Document, EngineError> {
        let policy = description_policy(
            &self.profile,
            &self.config.endpoint,
            &self.config.bucket_path(),
            file_links,
        );
        let pipeline = build_pipeline(&self.profile, record_id, policy);
        let mut doc = pipeline.run(doc)?;

        if let Err(failure) = self.schema.validate(&doc) {
            for violation in &failure.errors {
                error!(path = %violation.instance_path, "{}", violation.message);
            }
            return Err(failure.into());
        }

        // The write API rejects `language`; the schema does not. Stripped
        // only after validation so the validated shape matches the schema.
        if self.profile.drop_language {
            doc.remove("language");
        }
        Ok(doc)
    }
}
