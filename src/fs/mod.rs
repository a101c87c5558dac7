//! Filesystem facade used by the planner.
//!
//! Partition directories hold one `<column>.d` file per column (plus a
//! `<column>.i` offset file for var-sized columns) and, once archived, a
//! `_size` marker recording the partition's row count.

use std::{
    fs::{File, OpenOptions},
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use memmap2::{Mmap, MmapOptions};

/// Name of the row-count marker stored in archived partition directories.
pub const SIZE_MARKER: &str = "_size";

/// Path of a column's fixed-side (or var-length payload) file.
pub fn data_file_path(dir: &Path, column: &str) -> PathBuf {
    dir.join(format!("{column}.d"))
}

/// Path of a var-sized column's offset file.
pub fn aux_file_path(dir: &Path, column: &str) -> PathBuf {
    dir.join(format!("{column}.i"))
}

/// The filesystem operations the planner performs, behind a seam so tests
/// and alternative stores can intercept them.
pub trait StoreFs: Send + Sync {
    /// Open an existing column file for read/write.
    fn open_rw(&self, path: &Path) -> io::Result<File>;

    /// Map the first `len` bytes of `file` read-only.
    fn mmap_ro(&self, file: &File, len: u64) -> io::Result<Mmap>;

    /// Create `path` and any missing parents with `mode` permission bits.
    fn mkdirs(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Read the row count recorded in the partition directory's size marker.
    fn read_partition_size(&self, dir: &Path) -> io::Result<i64>;

    /// Record `rows` in the partition directory's size marker.
    fn write_partition_size(&self, dir: &Path, rows: i64) -> io::Result<()>;
}

/// [`StoreFs`] over the host filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsFs;

impl StoreFs for OsFs {
    fn open_rw(&self, path: &Path) -> io::Result<File> {
        OpenOptions::new().read(true).write(true).open(path)
    }

    fn mmap_ro(&self, file: &File, len: u64) -> io::Result<Mmap> {
        unsafe { MmapOptions::new().len(len as usize).map(file) }
    }

    fn mkdirs(&self, path: &Path, mode: u32) -> io::Result<()> {
        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;
        builder.create(path)
    }

    fn read_partition_size(&self, dir: &Path) -> io::Result<i64> {
        let mut buf = [0u8; 8];
        File::open(dir.join(SIZE_MARKER))?.read_exact(&mut buf)?;
        Ok(i64::from_le_bytes(buf))
    }

    fn write_partition_size(&self, dir: &Path, rows: i64) -> io::Result<()> {
        File::create(dir.join(SIZE_MARKER))?.write_all(&rows.to_le_bytes())
    }
}
