//! Error types for the POSIX facade

use std::io;
use std::path::PathBuf;

use lowio_vfs::VfsError;
use thiserror::Error;

/// POSIX facade error types
#[derive(Debug, Error)]
pub enum PosixError {
    #[error(transparent)]
    Vfs(#[from] VfsError),

    #[error("No documents or home directory to derive a base directory from")]
    NoBaseDir,

    #[error("Failed to create base directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = core::result::Result<T, PosixError>;
