//! # MEAD Engine
//!
//! The ingestion engine: enumerate candidate records from object storage,
//! filter against the progress ledger, normalize and validate each
//! record's DataCite metadata, publish to the repository, register the
//! DOI, and record completion. Processing is strictly sequential with one
//! record in flight at a time; a recoverable condition excludes the
//! record and continues, everything else halts the run.

pub mod config;
pub mod engine;
pub mod enumerate;
pub mod error;
pub mod filter;
pub mod publish;

#[cfg(test)]
pub(crate) mod testing;

pub use config::IngestConfig;
pub use engine::{IngestEngine, RunSummary};
pub use enumerate::enumerate_records;
pub use error::EngineError;
pub use filter::filter_candidates;
pub use publish::Publisher;
