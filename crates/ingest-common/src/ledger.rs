//! Persisted progress ledger.
//!
//! Two JSON array files track which record DOIs have been completed or
//! excluded across runs. Every mutation rewrites the affected file through
//! a temp-file-then-rename so a crash mid-write never truncates the
//! ledger; at most the in-flight record's progress is lost.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed ledger file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to persist ledger {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{doi}` is already tracked as {other}")]
    CrossListed { doi: String, other: &'static str },
}

/// Completed/excluded DOI bookkeeping backed by two JSON files.
#[derive(Debug)]
pub struct Ledger {
    completed: Vec<String>,
    excluded: Vec<String>,
    completed_path: PathBuf,
    excluded_path: PathBuf,
}

impl Ledger {
    /// Load both ledger files. A missing file is an empty ledger.
    pub fn load(
        completed_path: impl Into<PathBuf>,
        excluded_path: impl Into<PathBuf>,
    ) -> Result<Self, LedgerError> {
        let completed_path = completed_path.into();
        let excluded_path = excluded_path.into();
        let completed = read_entries(&completed_path)?;
        let excluded = read_entries(&excluded_path)?;
        debug!(
            completed = completed.len(),
            excluded = excluded.len(),
            "loaded progress ledger"
        );
        Ok(Self {
            completed,
            excluded,
            completed_path,
            excluded_path,
        })
    }

    pub fn completed(&self) -> &[String] {
        &self.completed
    }

    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    pub fn is_completed(&self, doi: &str) -> bool {
        self.completed.iter().any(|d| d == doi)
    }

    pub fn is_excluded(&self, doi: &str) -> bool {
        self.excluded.iter().any(|d| d == doi)
    }

    /// Record a completed DOI and rewrite the completed file.
    ///
    /// Rejects DOIs already tracked as excluded; marking the same DOI
    /// completed twice is a no-op.
    pub fn mark_completed(&mut self, doi: &str) -> Result<(), LedgerError> {
        if self.is_excluded(doi) {
            return Err(LedgerError::CrossListed {
                doi: doi.to_string(),
                other: "excluded",
            });
        }
        if !self.is_completed(doi) {
            self.completed.push(doi.to_string());
        }
        write_entries(&self.completed_path, &self.completed)
    }

    /// Record an excluded DOI and rewrite the excluded file.
    ///
    /// Rejects DOIs already tracked as completed; marking the same DOI
    /// excluded twice is a no-op.
    pub fn mark_excluded(&mut self, doi: &str) -> Result<(), LedgerError> {
        if self.is_completed(doi) {
            return Err(LedgerError::CrossListed {
                doi: doi.to_string(),
                other: "completed",
            });
        }
        if !self.is_excluded(doi) {
            self.excluded.push(doi.to_string());
        }
        write_entries(&self.excluded_path, &self.excluded)
    }
}

fn read_entries(path: &Path) -> Result<Vec<String>, LedgerError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|source| LedgerError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

fn write_entries(path: &Path, entries: &[String]) -> Result<(), LedgerError> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))?;
    let data = serde_json::to_vec(entries).map_err(std::io::Error::other)?;
    tmp.write_all(&data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| LedgerError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}
