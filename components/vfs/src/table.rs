//! Descriptor Table
//!
//! A fixed-size array of slots mapping integer handles to open streams.
//!
//! ## Design
//!
//! - `N` slots indexed `0..N`, each either empty or owning one stream
//! - `open` claims the lowest free slot (first fit from index 0)
//! - `close` moves the stream out of its slot and releases it, making the
//!   index the next candidate for reuse
//! - A failed `open` never leaves a slot claimed
//!
//! ```text
//! Descriptor Table (N = 128)
//!   ├─[0] → File "a.txt"
//!   ├─[1] → (empty)        ← next open lands here
//!   ├─[2] → File "b.txt"
//!   └─ ...
//! ```

use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

use crate::flags::OpenFlags;
use crate::fs::FileSystem;
use crate::{Result, VfsError};

/// Default number of slots
pub const DEFAULT_CAPACITY: usize = 128;

/// Handle to an occupied slot
pub type Fd = usize;

/// Descriptor Table - owns every open stream of one I/O context
pub struct DescriptorTable<F: FileSystem, const N: usize = DEFAULT_CAPACITY> {
    /// Backend that produces streams
    fs: F,

    /// Slot array; `Some` iff the handle is open
    slots: [Option<F::Stream>; N],

    /// Number of occupied slots
    count: usize,
}

impl<F: FileSystem, const N: usize> DescriptorTable<F, N> {
    /// Create an empty table over the given backend
    pub fn new(fs: F) -> Self {
        Self {
            fs,
            slots: std::array::from_fn(|_| None),
            count: 0,
        }
    }

    /// Number of slots
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of open handles
    #[inline]
    pub fn open_count(&self) -> usize {
        self.count
    }

    /// Backend this table opens streams with
    pub fn filesystem(&self) -> &F {
        &self.fs
    }

    /// Check if a handle is in range and occupied
    pub fn is_open(&self, fd: Fd) -> bool {
        matches!(self.slots.get(fd), Some(Some(_)))
    }

    /// Lowest free slot, if any
    fn lowest_free(&self) -> Option<Fd> {
        self.slots.iter().position(Option::is_none)
    }

    /// Look up the stream behind a handle
    ///
    /// # Errors
    /// - `VfsError::HandleOutOfRange` if `fd >= N`
    /// - `VfsError::HandleNotOpen` if the slot is empty
    fn stream_mut(&mut self, fd: Fd) -> Result<&mut F::Stream> {
        self.slot_mut(fd)?
            .as_mut()
            .ok_or(VfsError::HandleNotOpen { handle: fd })
    }

    fn slot_mut(&mut self, fd: Fd) -> Result<&mut Option<F::Stream>> {
        self.slots.get_mut(fd).ok_or(VfsError::HandleOutOfRange {
            handle: i64::try_from(fd).unwrap_or(i64::MAX),
            capacity: N,
        })
    }

    /// Open a stream and bind it to the lowest free handle
    ///
    /// # Errors
    /// - `VfsError::InvalidMode` if the flags do not resolve to a valid mode
    /// - `VfsError::TableFull` if every slot is occupied (the backend is not
    ///   consulted)
    /// - `VfsError::OpenFailed` if the backend refuses; the slot stays empty
    pub fn open(&mut self, name: &str, flags: OpenFlags) -> Result<Fd> {
        let mode = flags.resolve()?;

        let fd = self
            .lowest_free()
            .ok_or(VfsError::TableFull { capacity: N })?;

        let stream = self.fs.open(name, mode).map_err(|source| {
            log::warn!("open({name}, {flags:?}) failed: {source}");
            VfsError::OpenFailed {
                name: name.to_string(),
                source,
            }
        })?;

        self.slots[fd] = Some(stream);
        self.count += 1;
        log::debug!("open({name}, {flags:?}) -> {fd}");

        Ok(fd)
    }

    /// Release the stream behind a handle
    ///
    /// The slot is emptied before the stream is flushed, so a flush failure
    /// is reported but the handle is released either way.
    ///
    /// # Errors
    /// - `VfsError::HandleOutOfRange` / `VfsError::HandleNotOpen` for a bad handle
    /// - `VfsError::Io` if the final flush fails
    pub fn close(&mut self, fd: Fd) -> Result<()> {
        let mut stream = self
            .slot_mut(fd)?
            .take()
            .ok_or(VfsError::HandleNotOpen { handle: fd })?;
        self.count -= 1;
        log::debug!("close({fd})");

        stream.flush()?;
        Ok(())
    }

    /// Read into `buf` from the current position
    ///
    /// Keeps reading until `buf` is full or the stream reaches its end, so
    /// a short count means end-of-stream.
    pub fn read(&mut self, fd: Fd, buf: &mut [u8]) -> Result<usize> {
        let stream = self.stream_mut(fd)?;

        let mut filled = 0;
        while filled < buf.len() {
            match stream.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(filled)
    }

    /// Write all of `buf` at the current position
    pub fn write(&mut self, fd: Fd, buf: &[u8]) -> Result<usize> {
        let stream = self.stream_mut(fd)?;
        stream.write_all(buf)?;
        Ok(buf.len())
    }

    /// Move the stream position, returning the new absolute position
    ///
    /// A target before the start of the stream fails and leaves the
    /// position unchanged.
    pub fn seek(&mut self, fd: Fd, pos: SeekFrom) -> Result<u64> {
        let stream = self.stream_mut(fd)?;
        Ok(stream.seek(pos)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::OpenMode;
    use crate::fs::HostFs;
    use std::io::{self, Cursor};
    use std::path::{Path, PathBuf};

    /// Backend whose opens always fail
    struct RefusingFs;

    impl FileSystem for RefusingFs {
        type Stream = Cursor<Vec<u8>>;

        fn open(&self, _name: &str, _mode: OpenMode) -> io::Result<Self::Stream> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "refused"))
        }
    }

    /// Backend handing out empty in-memory streams
    struct MemoryFs;

    impl FileSystem for MemoryFs {
        type Stream = Cursor<Vec<u8>>;

        fn open(&self, _name: &str, _mode: OpenMode) -> io::Result<Self::Stream> {
            Ok(Cursor::new(Vec::new()))
        }
    }

    /// Stream whose flush always fails
    struct BrokenFlush;

    impl Read for BrokenFlush {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Ok(0)
        }
    }

    impl Write for BrokenFlush {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk gone"))
        }
    }

    impl Seek for BrokenFlush {
        fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
            Ok(0)
        }
    }

    struct BrokenFlushFs;

    impl FileSystem for BrokenFlushFs {
        type Stream = BrokenFlush;

        fn open(&self, _name: &str, _mode: OpenMode) -> io::Result<Self::Stream> {
            Ok(BrokenFlush)
        }
    }

    /// Scratch directory removed again when dropped
    struct Scratch(PathBuf);

    impl Scratch {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!(
                "lowio-vfs-table-{}-{}",
                name,
                std::process::id()
            ));
            let _ = std::fs::remove_dir_all(&dir);
            Self(dir)
        }

        fn path(&self) -> &Path {
            &self.0
        }
    }

    impl Drop for Scratch {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn test_table_creation() {
        let table: DescriptorTable<MemoryFs> = DescriptorTable::new(MemoryFs);
        assert_eq!(table.capacity(), DEFAULT_CAPACITY);
        assert_eq!(table.open_count(), 0);
        assert!(!table.is_open(0));
        assert!(!table.is_open(DEFAULT_CAPACITY));
    }

    #[test]
    fn test_first_fit_allocation() {
        let mut table: DescriptorTable<MemoryFs, 4> = DescriptorTable::new(MemoryFs);

        assert_eq!(table.open("a", OpenFlags::RDWR).unwrap(), 0);
        assert_eq!(table.open("b", OpenFlags::RDWR).unwrap(), 1);
        assert_eq!(table.open("c", OpenFlags::RDWR).unwrap(), 2);

        table.close(1).unwrap();
        table.close(0).unwrap();

        // Lowest free index wins, not the most recently freed
        assert_eq!(table.open("d", OpenFlags::RDWR).unwrap(), 0);
        assert_eq!(table.open("e", OpenFlags::RDWR).unwrap(), 1);
        assert_eq!(table.open("f", OpenFlags::RDWR).unwrap(), 3);
        assert_eq!(table.open_count(), 4);
    }

    #[test]
    fn test_table_full() {
        let mut table: DescriptorTable<MemoryFs, 2> = DescriptorTable::new(MemoryFs);
        table.open("a", OpenFlags::RDWR).unwrap();
        table.open("b", OpenFlags::RDWR).unwrap();

        let result = table.open("c", OpenFlags::RDWR);
        assert!(matches!(result, Err(VfsError::TableFull { capacity: 2 })));
        assert!(table.is_open(0));
        assert!(table.is_open(1));
        assert_eq!(table.open_count(), 2);
    }

    #[test]
    fn test_table_full_checked_before_backend() {
        // A zero-slot table never reaches the refusing backend
        let mut table: DescriptorTable<RefusingFs, 0> = DescriptorTable::new(RefusingFs);
        let result = table.open("a", OpenFlags::RDWR);
        assert!(matches!(result, Err(VfsError::TableFull { capacity: 0 })));
    }

    #[test]
    fn test_failed_open_leaves_slot_empty() {
        let mut table: DescriptorTable<RefusingFs, 4> = DescriptorTable::new(RefusingFs);

        let result = table.open("a", OpenFlags::RDWR);
        assert!(matches!(result, Err(VfsError::OpenFailed { ref name, .. }) if name == "a"));
        assert_eq!(table.open_count(), 0);
        assert!(!table.is_open(0));
    }

    #[test]
    fn test_invalid_mode_rejected_before_allocation() {
        let mut table: DescriptorTable<MemoryFs, 4> = DescriptorTable::new(MemoryFs);

        let result = table.open("a", OpenFlags::CREAT);
        assert!(matches!(result, Err(VfsError::InvalidMode { .. })));
        let result = table.open("a", OpenFlags::RDONLY | OpenFlags::APPEND);
        assert!(matches!(result, Err(VfsError::InvalidMode { .. })));
        assert_eq!(table.open_count(), 0);
    }

    #[test]
    fn test_bad_handles() {
        let mut table: DescriptorTable<MemoryFs, 4> = DescriptorTable::new(MemoryFs);
        let mut buf = [0u8; 4];

        assert!(matches!(
            table.close(4),
            Err(VfsError::HandleOutOfRange { handle: 4, capacity: 4 })
        ));
        assert!(matches!(table.close(2), Err(VfsError::HandleNotOpen { handle: 2 })));
        assert!(matches!(table.read(2, &mut buf), Err(VfsError::HandleNotOpen { .. })));
        assert!(matches!(table.write(2, &buf), Err(VfsError::HandleNotOpen { .. })));
        assert!(matches!(
            table.seek(2, SeekFrom::Start(0)),
            Err(VfsError::HandleNotOpen { .. })
        ));
        assert!(matches!(
            table.read(usize::MAX, &mut buf),
            Err(VfsError::HandleOutOfRange { .. })
        ));
    }

    #[test]
    fn test_double_close() {
        let mut table: DescriptorTable<MemoryFs, 4> = DescriptorTable::new(MemoryFs);
        let fd = table.open("a", OpenFlags::RDWR).unwrap();

        table.close(fd).unwrap();
        assert!(matches!(table.close(fd), Err(VfsError::HandleNotOpen { .. })));
        assert_eq!(table.open_count(), 0);
    }

    #[test]
    fn test_close_releases_slot_on_flush_failure() {
        let mut table: DescriptorTable<BrokenFlushFs, 2> = DescriptorTable::new(BrokenFlushFs);
        let fd = table.open("a", OpenFlags::WRONLY).unwrap();

        assert!(matches!(table.close(fd), Err(VfsError::Io(_))));
        assert!(!table.is_open(fd));
        assert_eq!(table.open("b", OpenFlags::WRONLY).unwrap(), fd);
    }

    #[test]
    fn test_read_write_seek_in_memory() {
        let mut table: DescriptorTable<MemoryFs, 2> = DescriptorTable::new(MemoryFs);
        let fd = table.open("a", OpenFlags::RDWR).unwrap();

        assert_eq!(table.write(fd, b"ABCDEFG").unwrap(), 7);
        assert_eq!(table.seek(fd, SeekFrom::Start(1)).unwrap(), 1);
        assert_eq!(table.write(fd, b"000").unwrap(), 3);
        assert_eq!(table.seek(fd, SeekFrom::End(0)).unwrap(), 7);
        assert_eq!(table.seek(fd, SeekFrom::Current(-7)).unwrap(), 0);

        let mut buf = [0u8; 10];
        assert_eq!(table.read(fd, &mut buf).unwrap(), 7);
        assert_eq!(&buf[..7], b"A000EFG");
        assert_eq!(table.read(fd, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_seek_before_start_keeps_position() {
        let scratch = Scratch::new("seek");
        let mut table: DescriptorTable<HostFs, 2> =
            DescriptorTable::new(HostFs::create(scratch.path()).unwrap());
        let fd = table.open("a.txt", OpenFlags::RDWR).unwrap();
        table.write(fd, b"ABC").unwrap();

        assert!(table.seek(fd, SeekFrom::Current(-10)).is_err());
        assert_eq!(table.seek(fd, SeekFrom::Current(0)).unwrap(), 3);
        table.close(fd).unwrap();
    }

    #[test]
    fn test_host_round_trip() {
        let scratch = Scratch::new("round-trip");
        let mut table: DescriptorTable<HostFs> =
            DescriptorTable::new(HostFs::create(scratch.path()).unwrap());

        let fd = table.open("test.csv", OpenFlags::RDWR).unwrap();
        table.write(fd, b"TEST").unwrap();
        table.close(fd).unwrap();

        let fd = table.open("test.csv", OpenFlags::RDONLY).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(table.read(fd, &mut buf).unwrap(), 4);
        assert_eq!(&buf, b"TEST");

        // Read-only stream refuses writes
        assert!(matches!(table.write(fd, b"X"), Err(VfsError::Io(_))));
        table.close(fd).unwrap();
    }

    #[test]
    fn test_directory_open_leaves_slot_empty() {
        let scratch = Scratch::new("directory");
        let mut table: DescriptorTable<HostFs, 2> =
            DescriptorTable::new(HostFs::create(scratch.path()).unwrap());
        std::fs::create_dir(scratch.path().join("sub")).unwrap();

        let result = table.open("sub", OpenFlags::RDONLY);
        assert!(matches!(result, Err(VfsError::OpenFailed { .. })));
        assert_eq!(table.open_count(), 0);
        assert!(!table.is_open(0));
    }
}
