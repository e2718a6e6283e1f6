//! Error types for the props pipeline.

use thiserror::Error;

use crate::props::InstanceId;

/// Error raised by a single pipeline stage.
#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct TransformError(pub String);

impl TransformError {
    /// Create a stage error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors that can occur while running a component.
#[derive(Error, Debug)]
pub enum WeftError {
    /// A transformer aborted the pipeline for this pass.
    #[error("pipeline stage {stage} failed: {message}")]
    Pipeline {
        /// Zero-based position in the transformer chain.
        stage: usize,
        /// Stage error message.
        message: String,
    },

    /// The instance is not mounted.
    #[error("unknown instance {0}")]
    UnknownInstance(InstanceId),

    /// No component registered under this tag.
    #[error("component '{0}' is not registered")]
    UnknownComponent(String),
}
