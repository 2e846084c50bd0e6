//! In-memory fakes for the engine's external seams.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use datacite::{DoiRegistry, RegistryError};
use ingest_common::Document;
use invenio::{RepoError, Repository, WriteOptions};
use osn::{ObjectStore, StoreError};

/// Object store backed by hash maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    listings: HashMap<String, Vec<String>>,
    objects: HashMap<String, Vec<u8>>,
    zips: HashMap<String, Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing<I, S>(mut self, path: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.listings
            .insert(path.to_string(), entries.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_object(mut self, path: &str, body: impl Into<Vec<u8>>) -> Self {
        self.objects.insert(path.to_string(), body.into());
        self
    }

    pub fn with_zips<I, S>(mut self, path: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.zips
            .insert(path.to_string(), keys.into_iter().map(Into::into).collect());
        self
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn ls(&self, path: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.listings.get(path).cloned().unwrap_or_default())
    }

    async fn read(&self, path: &str) -> Result<Bytes, StoreError> {
        self.objects
            .get(path)
            .map(|body| Bytes::from(body.clone()))
            .ok_or_else(|| StoreError::http_status(reqwest::StatusCode::NOT_FOUND, path))
    }

    async fn glob_zip(&self, path: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.zips.get(path).cloned().unwrap_or_default())
    }
}

/// Repository fake that records every write and answers a fixed id.
#[derive(Debug)]
pub struct RecordingRepo {
    next_id: String,
    pub writes: Mutex<Vec<(Document, Vec<String>, WriteOptions)>>,
    pub edits: Mutex<Vec<String>>,
}

impl RecordingRepo {
    pub fn new(next_id: &str) -> Self {
        Self {
            next_id: next_id.to_string(),
            writes: Mutex::new(Vec::new()),
            edits: Mutex::new(Vec::new()),
        }
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

#[async_trait]
impl Repository for RecordingRepo {
    async fn write(
        &self,
        metadata: &Document,
        file_links: &[String],
        options: &WriteOptions,
    ) -> Result<String, RepoError> {
        self.writes
            .lock()
            .unwrap()
            .push((metadata.clone(), file_links.to_vec(), options.clone()));
        Ok(self.next_id.clone())
    }

    async fn edit(
        &self,
        record_id: &str,
        _metadata: &Document,
        _options: &WriteOptions,
    ) -> Result<String, RepoError> {
        self.edits.lock().unwrap().push(record_id.to_string());
        Ok(format!(
            "Successfully updated record https://data.caltech.edu/records/{record_id}."
        ))
    }
}

/// Registry fake with a fixed registration answer.
#[derive(Debug)]
pub struct StubRegistry {
    registered: bool,
    minted_calls: Mutex<Vec<(String, String)>>,
    updated_calls: Mutex<Vec<(String, String)>>,
}

impl StubRegistry {
    pub fn registered() -> Self {
        Self {
            registered: true,
            minted_calls: Mutex::new(Vec::new()),
            updated_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unregistered() -> Self {
        Self {
            registered: false,
            ..Self::registered()
        }
    }

    pub fn minted(&self) -> Vec<(String, String)> {
        self.minted_calls.lock().unwrap().clone()
    }

    pub fn updated(&self) -> Vec<(String, String)> {
        self.updated_calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.minted().len() + self.updated().len()
    }
}

#[async_trait]
impl DoiRegistry for StubRegistry {
    async fn exists(&self, _doi: &str) -> Result<bool, RegistryError> {
        Ok(self.registered)
    }

    async fn public_doi(
        &self,
        doi: &str,
        _metadata: &Document,
        url: &str,
    ) -> Result<String, RegistryError> {
        self.minted_calls
            .lock()
            .unwrap()
            .push((doi.to_string(), url.to_string()));
        Ok(doi.to_string())
    }

    async fn update_doi(
        &self,
        doi: &str,
        _metadata: &Document,
        url: &str,
    ) -> Result<String, RegistryError> {
        self.updated_calls
            .lock()
            .unwrap()
            .push((doi.to_string(), url.to_string()));
        Ok(doi.to_string())
    }
}
