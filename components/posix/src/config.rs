//! Base directory configuration
//!
//! ```toml
//! base_dir = "/srv/scripts/data"   # optional
//! create_base_dir = true           # default
//! ```
//!
//! Resolution order for the base directory: `base_dir` from the config,
//! then the `LOWIO_BASE_DIR` environment variable, then the user's
//! documents directory (or home directory) joined with `Vset2/LUA`.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{PosixError, Result};

/// Environment variable overriding the default base directory
pub const BASE_DIR_ENV: &str = "LOWIO_BASE_DIR";

/// Subpath appended to the documents directory
pub const DEFAULT_SUBDIR: [&str; 2] = ["Vset2", "LUA"];

/// I/O context configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Directory every file name is resolved against
    pub base_dir: Option<PathBuf>,

    /// Create the base directory at construction if missing
    pub create_base_dir: bool,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            create_base_dir: true,
        }
    }
}

impl IoConfig {
    /// Configuration rooted at an explicit directory
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
            ..Self::default()
        }
    }

    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| PosixError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Resolve the effective base directory
    ///
    /// # Errors
    /// Returns `PosixError::NoBaseDir` if nothing is configured and the host
    /// has neither a documents nor a home directory
    pub fn base_dir(&self) -> Result<PathBuf> {
        self.resolve_base_dir(std::env::var_os(BASE_DIR_ENV))
    }

    fn resolve_base_dir(&self, from_env: Option<OsString>) -> Result<PathBuf> {
        if let Some(dir) = &self.base_dir {
            return Ok(dir.clone());
        }
        match from_env {
            Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
            _ => default_base_dir(),
        }
    }
}

/// Documents directory (or home directory) joined with [`DEFAULT_SUBDIR`]
pub fn default_base_dir() -> Result<PathBuf> {
    let root = dirs_next::document_dir()
        .or_else(dirs_next::home_dir)
        .ok_or(PosixError::NoBaseDir)?;
    Ok(DEFAULT_SUBDIR.iter().fold(root, |dir, part| dir.join(part)))
}
