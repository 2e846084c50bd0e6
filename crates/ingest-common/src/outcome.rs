//! Typed per-record results for the ingestion run loop.
//!
//! The run loop decides whether to continue or stop based on these values
//! instead of terminating the process from inside a helper. Fatal
//! conditions travel as `Err` values; everything here is a non-fatal
//! resolution of a single record.

use std::fmt;

/// Why a record was excluded from further processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    /// The record's storage path listed no files at all.
    NoFiles,
    /// The record's metadata document was missing or unreadable.
    MissingMetadata,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFiles => write!(f, "no files available"),
            Self::MissingMetadata => write!(f, "missing metadata"),
        }
    }
}

/// Resolution of a single record within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The record was published and its DOI registered.
    Completed { doi: String },
    /// The record was skipped and added to the excluded ledger.
    Excluded { reason: ExclusionReason },
}

impl RecordOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn completed(doi: impl Into<String>) -> Self {
        Self::Completed { doi: doi.into() }
    }

    pub fn excluded(reason: ExclusionReason) -> Self {
        Self::Excluded { reason }
    }
}
