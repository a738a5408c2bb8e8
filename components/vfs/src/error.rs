//! Error types for descriptor table operations

use std::io;

use thiserror::Error;

use crate::flags::OpenFlags;

/// VFS error types
///
/// Every variant collapses to the same failure sentinel at the POSIX
/// boundary; the distinction only exists for Rust callers and logs.
#[derive(Debug, Error)]
pub enum VfsError {
    #[error("Invalid open mode: {flags:?}")]
    InvalidMode { flags: OpenFlags },

    #[error("Descriptor table full ({capacity} slots in use)")]
    TableFull { capacity: usize },

    #[error("Failed to open {name}: {source}")]
    OpenFailed {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("Handle {handle} out of range [0, {capacity})")]
    HandleOutOfRange { handle: i64, capacity: usize },

    #[error("Handle {handle} is not open")]
    HandleNotOpen { handle: usize },

    #[error("Invalid seek origin: {origin}")]
    InvalidOrigin { origin: i64 },

    #[error("Invalid byte count {count} (buffer holds {available})")]
    InvalidCount { count: i64, available: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = core::result::Result<T, VfsError>;
