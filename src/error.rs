//! Error types for hidewatch.
//!
//! Only the tracer stage can fail a detection run. Property and pts failures
//! are logged where they happen and degrade to "flag not set".

use crate::tracer::error::ProbeError;
use thiserror::Error;

/// Main error type for detection runs.
#[derive(Debug, Error)]
pub enum DetectError {
    /// The tracer probe could not be started
    #[error("launch trace checker: {0}")]
    LaunchTracer(#[source] ProbeError),

    /// The tracer probe did not deliver a usable reply
    #[error("wait trace checker: {0}")]
    WaitTracer(#[source] ProbeError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for detection operations
pub type Result<T> = std::result::Result<T, DetectError>;
