//! Byte-stream backends
//!
//! The descriptor table never touches the host filesystem directly; it asks
//! a [`FileSystem`] for a stream that honours a validated [`OpenMode`].

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};

use crate::flags::{Disposition, OpenMode};

/// File system trait
pub trait FileSystem {
    /// Stream type stored in an occupied slot
    type Stream: Read + Write + Seek;

    /// Open `name` with the given mode
    ///
    /// The returned stream is positioned at the start, except for
    /// [`Disposition::Append`] where every write lands at the end.
    fn open(&self, name: &str, mode: OpenMode) -> io::Result<Self::Stream>;
}

/// Host filesystem rooted at a base directory
#[derive(Debug, Clone)]
pub struct HostFs {
    base_dir: PathBuf,
}

impl HostFs {
    /// Root a backend at `base_dir` without touching the disk
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Root a backend at `base_dir`, creating the directory if missing
    pub fn create(base_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        log::debug!("Base directory ready: {}", base_dir.display());
        Ok(Self { base_dir })
    }

    /// Directory every name is resolved against
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve a name against the base directory
    ///
    /// Leading separators are stripped so a name can never replace the base
    /// directory with an absolute path.
    pub fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        let relative = name.trim_start_matches(['/', '\\']);
        if relative.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "empty file name",
            ));
        }
        Ok(self.base_dir.join(relative))
    }
}

impl FileSystem for HostFs {
    type Stream = File;

    fn open(&self, name: &str, mode: OpenMode) -> io::Result<File> {
        let path = self.resolve(name)?;
        let mut options = OpenOptions::new();
        options.read(mode.access.readable());

        match mode.disposition {
            Disposition::Append => {
                options.append(true).create(true);
            }
            Disposition::Truncate => {
                options.write(true).truncate(true).create(mode.create);
            }
            Disposition::OpenOrCreate if mode.access.writable() => {
                options.write(true).create(true);
            }
            Disposition::OpenOrCreate => {
                // OpenOptions refuses `create` without write access, so the
                // file is created through an appending handle first. An
                // existing file is left as it is.
                OpenOptions::new().append(true).create(true).open(&path)?;
            }
        }

        let file = options.open(&path)?;
        if file.metadata()?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is a directory", path.display()),
            ));
        }
        Ok(file)
    }
}
