use std::{io, path::PathBuf};

use thiserror::Error;

/// Fatal per-partition planning failures.
///
/// Any of these aborts the partition plan; released state is limited to what
/// the planner itself acquired (owned file handles, scratch buffers), and a
/// staging directory that was already created is left behind for inspection.
#[derive(Debug, Error)]
pub enum SpliceError {
    /// The existing timestamp column could not be opened.
    #[error("could not open timestamp column `{}`: {source}", .path.display())]
    Open {
        /// Offending file path.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },

    /// A partition or staging directory could not be created.
    #[error("could not create directory `{}`: {source}", .path.display())]
    Mkdir {
        /// Offending directory path.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },

    /// Mapping the timestamp column failed.
    #[error("could not map {rows} rows of timestamp column `{}`: {source}", .path.display())]
    Map {
        /// Offending file path.
        path: PathBuf,
        /// Rows the mapping was to cover.
        rows: i64,
        /// Underlying OS error.
        source: io::Error,
    },

    /// The partition size marker was missing or unreadable.
    #[error("could not read partition size marker in `{}`: {source}", .path.display())]
    SizeMarker {
        /// Partition directory path.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },

    /// Merge-index or scratch allocation failed.
    #[error("merge index allocation of {bytes} bytes failed")]
    Alloc {
        /// Requested allocation size.
        bytes: usize,
    },
}

impl SpliceError {
    /// OS errno of the underlying failure, when there is one.
    pub fn errno(&self) -> Option<i32> {
        match self {
            SpliceError::Open { source, .. }
            | SpliceError::Mkdir { source, .. }
            | SpliceError::Map { source, .. }
            | SpliceError::SizeMarker { source, .. } => source.raw_os_error(),
            SpliceError::Alloc { .. } => None,
        }
    }
}
