//! Error types for the tracer probe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("failed to create probe channel: {0}")]
    Pipe(#[source] std::io::Error),

    #[error("failed to spawn probe process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("probe closed the channel without replying")]
    Closed,

    #[error("malformed probe reply: {0}")]
    Malformed(String),

    #[error("probe I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProbeError>;
