//! Engine error taxonomy.
//!
//! Every variant here is fatal to the run: the loop stops, and progress
//! persisted for prior records stays on disk. Recoverable conditions are
//! expressed as `RecordOutcome::Excluded`, not errors.

use datacite::{RegistryError, SchemaError, ValidationFailure};
use ingest_common::{LedgerError, PipelineError};
use invenio::RepoError;
use osn::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("storage listing for `{path}` returned nothing")]
    EmptyListing { path: String },

    #[error("storage listing for `{expected}` started with `{found}` instead of the prefix itself")]
    UnexpectedListingRoot { expected: String, found: String },

    #[error("listing entry `{entry}` is not under folder `{folder}`")]
    MalformedEntry { entry: String, folder: String },

    #[error("record id `{record}` is not of the form `prefix/suffix`")]
    MalformedRecordId { record: String },

    #[error("missing metadata for {record}: {source}")]
    MissingMetadata {
        record: String,
        #[source]
        source: StoreError,
    },

    #[error("unreadable metadata for {record}: {source}")]
    UnreadableMetadata {
        record: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("metadata document for {record} is not a JSON object")]
    NotAnObject { record: String },

    #[error(transparent)]
    Normalize(#[from] PipelineError),

    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("repository error: {0}")]
    Repository(#[from] RepoError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
