//! lowio VFS - Bounded descriptor table over pluggable byte streams
//!
//! # Purpose
//! Maps small integer handles to open byte streams inside a fixed-capacity
//! table, with POSIX-style open flags and seek origins.
//!
//! # Integration Points
//! - Depends on: host filesystem (through the `FileSystem` trait)
//! - Provides to: POSIX facade (`lowio-posix`), embedders
//!
//! # Architecture
//! - `flags`: raw mode word → validated `OpenMode` (access + disposition)
//! - `fs`: `FileSystem` backend trait and the `HostFs` implementation
//! - `table`: `DescriptorTable`, first-fit slot allocation and per-handle I/O
//!
//! Single-threaded by contract: the table is plain owned state with no
//! internal locking. Callers sharing one across threads must serialize.
//!
//! # Testing Strategy
//! - Unit tests: flag resolution, slot allocation/reuse, bad handles
//! - Integration tests: host filesystem round trips (see `lowio-posix`)
//! - Benchmarks: open/close cycle

mod error;
pub mod flags;
pub mod fs;
pub mod table;

pub use error::{Result, VfsError};
pub use flags::{Access, Disposition, OpenFlags, OpenMode, SeekOrigin};
pub use fs::{FileSystem, HostFs};
pub use table::{DescriptorTable, Fd, DEFAULT_CAPACITY};
