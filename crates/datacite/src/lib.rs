//! # DataCite
//!
//! DataCite 4.3 support for the ingestion pipeline: metadata normalization
//! steps, in-process schema validation, the DOI registration REST client,
//! and the media API download helper.

pub mod media;
pub mod normalize;
pub mod registry;
pub mod schema43;

pub use media::{MediaError, MediaOptions, MediaOutcome, download_media};
pub use normalize::{
    DescriptionPolicy, NormalizeError, NormalizeProfile, ProfileKind, build_pipeline,
    description_policy,
};
pub use registry::{DataCiteClient, DoiRegistry, RegistryCredentials, RegistryError};
pub use schema43::{Schema43, SchemaError, ValidationFailure, ValidationMessage};

/// The DataCite kernel-4 schema URI stamped into every record.
pub const SCHEMA_VERSION: &str = "http://datacite.org/schema/kernel-4";

/// Public DataCite REST API base.
pub const API_BASE: &str = "https://api.datacite.org";
