//! lowio POSIX - Sentinel-returning low-level I/O facade
//!
//! # Purpose
//! Exposes `open`/`close`/`read`/`write`/`lseek` with traditional integer
//! handles, flag words and seek origins, for embedders (script runtimes,
//! FFI layers) that want a small bounded I/O surface rather than native
//! file objects.
//!
//! # Integration Points
//! - Depends on: `lowio-vfs` (descriptor table, host backend)
//! - Provides to: script bindings, the `lowio` CLI
//!
//! # Error Contract
//! Every failure returns [`FAILURE`] (`-1`); callers cannot tell causes
//! apart from the return value. The `try_*` methods return the underlying
//! [`VfsError`] for Rust callers, and the sentinel methods log the cause at
//! debug level before collapsing it.
//!
//! # Example
//! ```no_run
//! use lowio_posix::{LowLevelIo, O_CREAT, O_RDWR, SEEK_SET};
//!
//! let mut io = LowLevelIo::with_base_dir("/tmp/lowio-demo").unwrap();
//! let fd = io.open("test.csv", O_RDWR | O_CREAT, 0o644);
//! io.write(fd, b"TEST", 4);
//! io.lseek(fd, 0, SEEK_SET);
//! let (n, data) = io.read(fd, 4);
//! assert_eq!((n, data.as_slice()), (4, &b"TEST"[..]));
//! io.close(fd);
//! ```

use std::io;
use std::path::Path;

use lowio_vfs::{DescriptorTable, Fd, FileSystem, HostFs, OpenFlags, SeekOrigin, VfsError};
use static_assertions::const_assert_eq;

mod config;
mod error;

pub use config::{default_base_dir, IoConfig, BASE_DIR_ENV, DEFAULT_SUBDIR};
pub use error::{PosixError, Result};

/// Open for reading only
pub const O_RDONLY: i64 = 0x0001;
/// Open for writing only
pub const O_WRONLY: i64 = 0x0002;
/// Open for reading and writing
pub const O_RDWR: i64 = 0x0004;
/// Create the file if it does not exist
pub const O_CREAT: i64 = 0x0008;
/// Discard existing content on open
pub const O_TRUNC: i64 = 0x0010;
/// Every write lands at the end of the file
pub const O_APPEND: i64 = 0x0020;

pub const SEEK_SET: i64 = 0;
pub const SEEK_CUR: i64 = 1;
pub const SEEK_END: i64 = 2;

/// Number of handles; valid handles are `0..MAX_FILENO`
pub const MAX_FILENO: i64 = 128;

/// Failure sentinel returned by every operation
pub const FAILURE: i64 = -1;

/// Largest byte count a single `read` may request
///
/// The sentinel `read` allocates its output buffer before the handle is
/// checked, so this also bounds what a failing call can allocate.
pub const MAX_IO_COUNT: i64 = 16 * 1024 * 1024;

const_assert_eq!(MAX_FILENO as usize, lowio_vfs::DEFAULT_CAPACITY);
const_assert_eq!(O_RDONLY as u32, OpenFlags::RDONLY.bits());
const_assert_eq!(O_WRONLY as u32, OpenFlags::WRONLY.bits());
const_assert_eq!(O_RDWR as u32, OpenFlags::RDWR.bits());
const_assert_eq!(O_CREAT as u32, OpenFlags::CREAT.bits());
const_assert_eq!(O_TRUNC as u32, OpenFlags::TRUNC.bits());
const_assert_eq!(O_APPEND as u32, OpenFlags::APPEND.bits());

type VfsResult<T> = lowio_vfs::Result<T>;

/// Low-level I/O context: one descriptor table plus its backend
pub struct LowLevelIo<F: FileSystem = HostFs> {
    table: DescriptorTable<F>,
}

impl LowLevelIo<HostFs> {
    /// Context rooted at the default base directory, created if missing
    pub fn new() -> Result<Self> {
        Self::from_config(&IoConfig::default())
    }

    /// Context rooted at `base_dir`, created if missing
    pub fn with_base_dir(base_dir: impl AsRef<Path>) -> Result<Self> {
        Self::from_config(&IoConfig::with_base_dir(base_dir.as_ref()))
    }

    /// Context built from a configuration
    pub fn from_config(config: &IoConfig) -> Result<Self> {
        let base_dir = config.base_dir()?;

        let fs = if config.create_base_dir {
            HostFs::create(&base_dir).map_err(|source| PosixError::CreateDir {
                path: base_dir.clone(),
                source,
            })?
        } else {
            HostFs::new(base_dir)
        };

        log::debug!("I/O context rooted at {}", fs.base_dir().display());
        Ok(Self::with_filesystem(fs))
    }

    /// Directory file names are resolved against
    pub fn base_dir(&self) -> &Path {
        self.table.filesystem().base_dir()
    }
}

impl<F: FileSystem> LowLevelIo<F> {
    /// Context over an arbitrary backend
    pub fn with_filesystem(fs: F) -> Self {
        Self {
            table: DescriptorTable::new(fs),
        }
    }

    /// Underlying descriptor table
    pub fn table(&self) -> &DescriptorTable<F> {
        &self.table
    }

    /// Map a caller-supplied handle onto a table index
    fn handle(&self, fileno: i64) -> VfsResult<Fd> {
        let capacity = self.table.capacity();
        usize::try_from(fileno)
            .ok()
            .filter(|fd| *fd < capacity)
            .ok_or(VfsError::HandleOutOfRange {
                handle: fileno,
                capacity,
            })
    }

    /// Open `name` under `mode` flags
    ///
    /// `permission` is accepted for signature compatibility and ignored.
    pub fn try_open(&mut self, name: &str, mode: i64, permission: i64) -> VfsResult<Fd> {
        log::trace!("open({name}): permission {permission:#o} not enforced");
        self.table.open(name, OpenFlags::from_mode(mode))
    }

    /// Close a handle, releasing its slot
    pub fn try_close(&mut self, fileno: i64) -> VfsResult<()> {
        let fd = self.handle(fileno)?;
        self.table.close(fd)
    }

    /// Read up to `buf.len()` bytes from the current position
    pub fn try_read(&mut self, fileno: i64, buf: &mut [u8]) -> VfsResult<usize> {
        let fd = self.handle(fileno)?;
        self.table.read(fd, buf)
    }

    /// Write the first `count` bytes of `buf` at the current position
    pub fn try_write(&mut self, fileno: i64, buf: &[u8], count: i64) -> VfsResult<usize> {
        let fd = self.handle(fileno)?;
        if !self.table.is_open(fd) {
            return Err(VfsError::HandleNotOpen { handle: fd });
        }

        let len = usize::try_from(count)
            .ok()
            .filter(|len| *len <= buf.len())
            .ok_or(VfsError::InvalidCount {
                count,
                available: buf.len(),
            })?;

        self.table.write(fd, &buf[..len])
    }

    /// Reposition relative to `origin` (`SEEK_SET`, `SEEK_CUR`, `SEEK_END`)
    pub fn try_lseek(&mut self, fileno: i64, offset: i64, origin: i64) -> VfsResult<u64> {
        let fd = self.handle(fileno)?;
        if !self.table.is_open(fd) {
            return Err(VfsError::HandleNotOpen { handle: fd });
        }

        let pos = SeekOrigin::try_from(origin)?.with_offset(offset)?;
        self.table.seek(fd, pos)
    }

    /// Open a file, returning its handle or [`FAILURE`]
    pub fn open(&mut self, name: &str, mode: i64, permission: i64) -> i64 {
        let result = self
            .try_open(name, mode, permission)
            .and_then(to_sentinel_range);
        collapse("open", result)
    }

    /// Close a handle, returning `0` or [`FAILURE`]
    pub fn close(&mut self, fileno: i64) -> i64 {
        collapse("close", self.try_close(fileno).map(|()| 0))
    }

    /// Read up to `count` bytes
    ///
    /// The returned buffer is always `count` bytes long, zero-filled past
    /// the bytes actually read, failure included. A negative or oversized
    /// `count` fails with an empty buffer.
    pub fn read(&mut self, fileno: i64, count: i64) -> (i64, Vec<u8>) {
        let len = match usize::try_from(count) {
            Ok(len) if count <= MAX_IO_COUNT => len,
            _ => {
                let err = VfsError::InvalidCount {
                    count,
                    available: 0,
                };
                return (collapse("read", Err(err)), Vec::new());
            }
        };

        let mut buf = vec![0u8; len];
        let result = self.try_read(fileno, &mut buf).and_then(to_sentinel_range);
        (collapse("read", result), buf)
    }

    /// Write `count` bytes of `buf`, returning `count` or [`FAILURE`]
    pub fn write(&mut self, fileno: i64, buf: &[u8], count: i64) -> i64 {
        let result = self.try_write(fileno, buf, count).map(|_| count);
        collapse("write", result)
    }

    /// Seek, returning the new absolute position or [`FAILURE`]
    pub fn lseek(&mut self, fileno: i64, offset: i64, origin: i64) -> i64 {
        let result = self
            .try_lseek(fileno, offset, origin)
            .and_then(to_sentinel_range);
        collapse("lseek", result)
    }
}

/// Convert a successful result into the non-negative sentinel domain
fn to_sentinel_range<T: TryInto<i64>>(value: T) -> VfsResult<i64> {
    value.try_into().map_err(|_| {
        VfsError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            "result exceeds i64 range",
        ))
    })
}

/// Collapse a rich result into the POSIX return convention
fn collapse(op: &str, result: VfsResult<i64>) -> i64 {
    match result {
        Ok(value) => value,
        Err(e) => {
            log::debug!("{op} failed: {e}");
            FAILURE
        }
    }
}
