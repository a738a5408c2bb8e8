//! Open flags, access modes, dispositions and seek origins
//!
//! Raw POSIX-style mode words are decoded into a validated [`OpenMode`]
//! before any slot is looked at. The bit values are fixed:
//!
//! | Flag     | Bit      |
//! |----------|----------|
//! | `RDONLY` | `0x0001` |
//! | `WRONLY` | `0x0002` |
//! | `RDWR`   | `0x0004` |
//! | `CREAT`  | `0x0008` |
//! | `TRUNC`  | `0x0010` |
//! | `APPEND` | `0x0020` |

use std::io::SeekFrom;

use bitflags::bitflags;

use crate::{Result, VfsError};

bitflags! {
    /// Open flags (access mode bits plus modifiers)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u32 {
        /// Open for reading only
        const RDONLY = 0x0001;

        /// Open for writing only
        const WRONLY = 0x0002;

        /// Open for reading and writing
        const RDWR   = 0x0004;

        /// Create the file if it does not exist
        const CREAT  = 0x0008;

        /// Discard existing content, resetting the size to zero
        const TRUNC  = 0x0010;

        /// Every write lands at the end of the file
        const APPEND = 0x0020;
    }
}

impl OpenFlags {
    /// Mask of the three access mode bits
    pub const ACCESS_MASK: Self = Self::RDONLY.union(Self::WRONLY).union(Self::RDWR);

    /// Decode a raw mode word, ignoring unknown bits
    pub fn from_mode(mode: i64) -> Self {
        Self::from_bits_truncate(mode as u32)
    }

    /// Derive the access mode
    ///
    /// When several access bits are present `RDWR` wins, then `RDONLY`,
    /// then `WRONLY`.
    ///
    /// # Errors
    /// Returns `VfsError::InvalidMode` if no access bit is set
    pub fn access(self) -> Result<Access> {
        if self.contains(Self::RDWR) {
            Ok(Access::ReadWrite)
        } else if self.contains(Self::RDONLY) {
            Ok(Access::Read)
        } else if self.contains(Self::WRONLY) {
            Ok(Access::Write)
        } else {
            Err(VfsError::InvalidMode { flags: self })
        }
    }

    /// Derive the open disposition (append beats truncate)
    pub fn disposition(self) -> Disposition {
        if self.contains(Self::APPEND) {
            Disposition::Append
        } else if self.contains(Self::TRUNC) {
            Disposition::Truncate
        } else {
            Disposition::OpenOrCreate
        }
    }

    /// Validate the flags and resolve them into an [`OpenMode`]
    ///
    /// # Errors
    /// Returns `VfsError::InvalidMode` if no access bit is set, if truncate
    /// is requested on a read-only stream, or if append is combined with any
    /// readable access
    pub fn resolve(self) -> Result<OpenMode> {
        let access = self.access()?;
        let disposition = self.disposition();

        let conflict = match disposition {
            Disposition::OpenOrCreate => false,
            Disposition::Truncate => access == Access::Read,
            Disposition::Append => access != Access::Write,
        };
        if conflict {
            return Err(VfsError::InvalidMode { flags: self });
        }

        Ok(OpenMode {
            access,
            disposition,
            create: self.contains(Self::CREAT),
        })
    }
}

/// Stream access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}

impl Access {
    /// Can the stream be read from?
    pub fn readable(self) -> bool {
        matches!(self, Access::Read | Access::ReadWrite)
    }

    /// Can the stream be written to?
    pub fn writable(self) -> bool {
        matches!(self, Access::Write | Access::ReadWrite)
    }
}

/// What happens to existing content when a file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Keep content, position at start, create if missing
    OpenOrCreate,
    /// Discard content, size reset to zero
    Truncate,
    /// Keep content, every write goes to the end, create if missing
    Append,
}

/// Validated open request handed to a [`FileSystem`](crate::FileSystem)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMode {
    pub access: Access,
    pub disposition: Disposition,
    /// `CREAT` was requested; only consulted for [`Disposition::Truncate`]
    pub create: bool,
}

/// Reference point for a seek
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum SeekOrigin {
    Begin = 0,
    Current = 1,
    End = 2,
}

impl SeekOrigin {
    /// Combine the origin with an offset
    ///
    /// # Errors
    /// Returns `VfsError::Io` for a negative offset from `Begin`
    pub fn with_offset(self, offset: i64) -> Result<SeekFrom> {
        match self {
            SeekOrigin::Begin => u64::try_from(offset)
                .map(SeekFrom::Start)
                .map_err(|_| {
                    VfsError::Io(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "seek before start of stream",
                    ))
                }),
            SeekOrigin::Current => Ok(SeekFrom::Current(offset)),
            SeekOrigin::End => Ok(SeekFrom::End(offset)),
        }
    }
}

impl TryFrom<i64> for SeekOrigin {
    type Error = VfsError;

    fn try_from(origin: i64) -> Result<Self> {
        match origin {
            0 => Ok(SeekOrigin::Begin),
            1 => Ok(SeekOrigin::Current),
            2 => Ok(SeekOrigin::End),
            _ => Err(VfsError::InvalidOrigin { origin }),
        }
    }
}
