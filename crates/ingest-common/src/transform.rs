//! # Generic Transform Pipeline
//!
//! This module provides a generic pipeline implementation that chains
//! together named, pure transform steps to form a complete document
//! shaping workflow.
//!
//! ## Usage
//!
//! Create a new `TransformPipeline` and add steps that implement the
//! `Transform` trait. Then run a document through the pipeline. Steps run
//! in the order they were added; a failing step aborts the run with the
//! step's name attached to the error.

use crate::PipelineError;

/// A JSON metadata document, keyed by schema field name.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Boxed error type carried out of individual steps.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A single named, pure transformation over a metadata document.
///
/// Steps consume the document and return the transformed document, so
/// each step can be unit tested in isolation.
pub trait Transform {
    /// Stable name of the step, used in error reporting.
    fn name(&self) -> &'static str;

    /// Apply the transformation.
    fn apply(&self, doc: Document) -> Result<Document, BoxError>;
}

/// A pipeline of transform steps applied in a fixed declared order.
pub struct TransformPipeline {
    steps: Vec<Box<dyn Transform>>,
}

impl TransformPipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Add a step to the end of the pipeline.
    ///
    /// Returns self for method chaining.
    pub fn add_step<S: Transform + 'static>(mut self, step: S) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Names of the steps in execution order.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run the document through every step in order.
    ///
    /// Returns the fully transformed document, or the first step failure
    /// wrapped with the failing step's name.
    pub fn run(&self, mut doc: Document) -> Result<Document, PipelineError> {
        for step in &self.steps {
            doc = step
                .apply(doc)
                .map_err(|source| PipelineError::Step {
                    step: step.name(),
                    source,
                })?;
        }
        Ok(doc)
    }
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::new()
    }
}
