//! Error types for the property area module.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AreaError {
    #[error("Property area {} does not exist or is not a regular file.", path.display())]
    NotFound { path: PathBuf },

    #[error("Property area {} has an invalid size of {size} bytes.", path.display())]
    InvalidSize { path: PathBuf, size: u64 },

    #[error("Bad property area magic: {found:#010x}")]
    BadMagic { found: u32 },

    #[error("Bad property area version: {found:#010x}")]
    BadVersion { found: u32 },

    #[error("An underlying I/O error occurred: {0}")]
    Io(#[from] std::io::Error),
}

impl AreaError {
    /// Absence of a store is expected on many devices and is not a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AreaError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, AreaError>;
