//! # Ingest Common
//!
//! This crate provides common abstractions for building record ingestion
//! pipelines. It defines the generic transform traits and implementations
//! shared by the metadata shaping stages, the typed per-record outcomes,
//! and the persisted progress ledger.
//!
//! ## Features
//!
//! - Generic `Transform` trait for pure document-to-document steps
//! - `TransformPipeline` implementation for chaining named steps
//! - `RecordOutcome` typed results for the run loop
//! - `Ledger` for crash-safe completed/excluded bookkeeping

use thiserror::Error;

pub mod ledger;
pub mod outcome;
pub mod transform;

/// Re-export key traits and types
pub use ledger::{Ledger, LedgerError};
pub use outcome::{ExclusionReason, RecordOutcome};
pub use transform::{BoxError, Document, Transform, TransformPipeline};

/// Common error type for pipeline operations
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("step failed ({step}): {source}")]
    Step {
        step: &'static str,
        #[source]
        source: BoxError,
    },
}

impl PipelineError {
    /// Return the name of the failing step, if this error came out of one.
    pub fn step_name(&self) -> Option<&'static str> {
        match self {
            Self::Step { step, .. } => Some(step),
            _ => None,
        }
    }
}
