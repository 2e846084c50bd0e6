//! Ingestion run configuration.

use datacite::ProfileKind;

/// Default S3-compatible endpoint hosting the MEAD bucket.
pub const DEFAULT_ENDPOINT: &str = "https://renc.osn.xsede.org/";
pub const DEFAULT_BUCKET: &str = "ini210004tommorrell";
pub const DEFAULT_FOLDER: &str = "0_gregoire";
pub const DEFAULT_DOI_PREFIX: &str = "10.25989";
pub const DEFAULT_METADATA_FILE: &str = "metadata.json";
pub const DEFAULT_LANDING_BASE: &str = "https://data.caltech.edu/records";

/// Repository community the HTE records are filed under.
pub const MEAD_COMMUNITY: &str = "d0de1569-0a01-498f-b6bd-4bc75d54012f";

/// Configurable options for one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Storage endpoint, with trailing slash.
    pub endpoint: String,

    /// Bucket holding the dataset folders.
    pub bucket: String,

    /// Folder under the bucket whose children are candidate records.
    pub folder: String,

    /// DOI prefix candidate identifiers are minted under.
    pub doi_prefix: String,

    /// Per-record metadata object name.
    pub metadata_file: String,

    /// Landing page base; record ids are appended.
    pub landing_base: String,

    /// Repository community tag attached to created records.
    pub community: Option<String>,

    /// Whether to write against the production repository.
    pub production: bool,

    /// Which entry point's normalization behavior to reproduce.
    pub profile: ProfileKind,
}

impl IngestConfig {
    /// The enumerated prefix, `{bucket}/{folder}/`.
    pub fn bucket_path(&self) -> String {
        format!("{}/{}/", self.bucket, self.folder)
    }

    /// The folder component used to derive DOI suffixes, `{folder}/`.
    pub fn folder_prefix(&self) -> String {
        format!("{}/", self.folder)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            folder: DEFAULT_FOLDER.to_string(),
            doi_prefix: DEFAULT_DOI_PREFIX.to_string(),
            metadata_file: DEFAULT_METADATA_FILE.to_string(),
            landing_base: DEFAULT_LANDING_BASE.to_string(),
            community: None,
            production: false,
            profile: ProfileKind::Hte,
        }
    }
}
