//! In-process validation against the DataCite Metadata Schema 4.3.
//!
//! The schema's JSON representation is embedded at compile time and
//! compiled once per [`Schema43`] instance. Validation reports every
//! violation, sorted by the JSON pointer into the document at which it
//! occurs, so operators can fix source metadata in one pass.

use ingest_common::Document;
use jsonschema::JSONSchema;
use serde_json::Value;
use thiserror::Error;

static SCHEMA_JSON: &str = include_str!("../schema/datacite-v4.3.json");

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("embedded DataCite 4.3 schema is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("embedded DataCite 4.3 schema failed to compile: {reason}")]
    Compile { reason: String },
}

/// One schema violation, addressed by its location in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationMessage {
    pub instance_path: String,
    pub message: String,
}

/// All violations for one document, sorted by instance path.
#[derive(Debug, Error)]
#[error("metadata failed DataCite 4.3 validation with {} error(s)", errors.len())]
pub struct ValidationFailure {
    pub errors: Vec<ValidationMessage>,
}

/// A compiled DataCite 4.3 validator.
pub struct Schema43 {
    compiled: JSONSchema,
}

impl Schema43 {
    pub fn new() -> Result<Self, SchemaError> {
        let schema: Value = serde_json::from_str(SCHEMA_JSON)?;
        let compiled = JSONSchema::compile(&schema).map_err(|e| SchemaError::Compile {
            reason: e.to_string(),
        })?;
        Ok(Self { compiled })
    }

    /// Validate a metadata document against the 4.3 schema.
    pub fn validate(&self, doc: &Document) -> Result<(), ValidationFailure> {
        let instance = Value::Object(doc.clone());
        if self.compiled.is_valid(&instance) {
            return Ok(());
        }
        let mut errors: Vec<ValidationMessage> = match self.compiled.validate(&instance) {
            Ok(()) => Vec::new(),
            Err(violations) => violations
                .map(|error| ValidationMessage {
                    instance_path: error.instance_path.to_string(),
                    message: error.to_string(),
                })
                .collect(),
        };
        errors.sort_by(|a, b| a.instance_path.cmp(&b.instance_path));
        Err(ValidationFailure { errors })
    }
}
