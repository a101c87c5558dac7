//! Target-partition resolution: directory creation, timestamp mapping and
//! open-mode selection.

use std::{fs::File, path::Path, sync::Arc};

use memmap2::Mmap;

use super::{
    classify::{BlockKind, SplicePlan},
    error::SpliceError,
    task::PartitionSpliceTask,
};
use crate::{
    config::SpliceOption,
    fs::{self, StoreFs},
};

/// How the downstream stage must open a column of the target partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenColumnMode {
    /// The partition did not exist; append the whole slice into a fresh
    /// directory.
    NewPartitionForAppend,
    /// Append to an archived partition in place.
    MidPartitionForAppend,
    /// Append to the live tail partition through the writer's open files.
    LastPartitionForAppend,
    /// Merge an archived partition into a txn-stamped staging directory.
    MidPartitionForMerge,
    /// Merge the live tail partition into a txn-stamped staging directory.
    LastPartitionForMerge,
}

/// Ownership of the timestamp file handle a plan carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FdProvenance {
    /// Opened by the planner; closed when the last holder drops it.
    Owned,
    /// Borrowed from the table writer's open files; never closed downstream.
    Reused,
}

/// Read-only mapping of a partition's timestamp column.
pub struct TimestampColumn {
    file: Arc<File>,
    map: Mmap,
    rows: i64,
}

impl TimestampColumn {
    pub(crate) fn map(
        store: &dyn StoreFs,
        file: Arc<File>,
        rows: i64,
        path: &Path,
    ) -> Result<Self, SpliceError> {
        let map = store
            .mmap_ro(&file, rows as u64 * 8)
            .map_err(|source| SpliceError::Map {
                path: path.to_path_buf(),
                rows,
                source,
            })?;
        Ok(Self { file, map, rows })
    }

    /// Mapped timestamps in row order.
    pub fn as_slice(&self) -> &[i64] {
        // the mapping starts page-aligned and spans exactly `rows` values
        unsafe { std::slice::from_raw_parts(self.map.as_ptr().cast::<i64>(), self.rows as usize) }
    }

    /// Number of mapped rows.
    pub fn rows(&self) -> i64 {
        self.rows
    }

    /// Backing file handle.
    pub fn file(&self) -> &Arc<File> {
        &self.file
    }

    fn first(&self) -> i64 {
        self.as_slice()[0]
    }

    fn last(&self) -> i64 {
        self.as_slice()[self.rows as usize - 1]
    }
}

/// Mapped timestamp column plus descriptor provenance, handed to every
/// column task of the partition.
#[derive(Clone)]
pub struct SrcTimestamp {
    /// Shared mapping of the partition's timestamps.
    pub column: Arc<TimestampColumn>,
    /// Whether the handle is planner-owned or writer-owned.
    pub provenance: FdProvenance,
}

impl SrcTimestamp {
    /// Whether the handle is borrowed from the table writer.
    pub fn is_reused(&self) -> bool {
        self.provenance == FdProvenance::Reused
    }
}

/// Existing-partition view produced ahead of overlap classification.
pub(crate) struct OpenedPartition {
    pub(crate) src_timestamp: SrcTimestamp,
    pub(crate) data_ts_lo: i64,
    pub(crate) data_ts_hi: i64,
    pub(crate) src_data_max: i64,
}

/// Resolution of the target partition directory.
pub(crate) enum PartitionTarget {
    /// Fresh directory created for a pure append.
    New,
    /// Existing partition with its timestamps mapped.
    Existing(OpenedPartition),
}

/// Decide whether the slice targets a new, tail or archived partition and
/// prepare the timestamp column accordingly.
pub(crate) fn open_target(
    store: &dyn StoreFs,
    option: &SpliceOption,
    task: &PartitionSpliceTask,
    partition_dir: &Path,
) -> Result<PartitionTarget, SpliceError> {
    if task.ooo_timestamp_hi > task.table_ceil_of_max_timestamp
        || task.ooo_timestamp_hi < task.table_floor_of_min_timestamp
    {
        // the slice falls outside every on-disk partition
        store
            .mkdirs(partition_dir, option.mkdir_mode)
            .map_err(|source| SpliceError::Mkdir {
                path: partition_dir.to_path_buf(),
                source,
            })?;
        return Ok(PartitionTarget::New);
    }

    if task.ooo_timestamp_hi == task.table_ceil_of_max_timestamp {
        // live tail: borrow the writer's open timestamp descriptor
        let ts_index = task.table.timestamp_index();
        let file = Arc::clone(&task.columns[ts_index].primary);
        let rows = task.last_partition_size;
        let column = TimestampColumn::map(store, file, rows, partition_dir)?;
        let data_ts_lo = column.first();
        Ok(PartitionTarget::Existing(OpenedPartition {
            src_timestamp: SrcTimestamp {
                column: Arc::new(column),
                provenance: FdProvenance::Reused,
            },
            data_ts_lo,
            data_ts_hi: task.table_max_timestamp,
            src_data_max: rows,
        }))
    } else {
        // archived partition: row count from the size marker, own the handle
        let rows = store
            .read_partition_size(partition_dir)
            .map_err(|source| SpliceError::SizeMarker {
                path: partition_dir.to_path_buf(),
                source,
            })?;
        let ts_name = task.table.column_name(task.table.timestamp_index());
        let path = fs::data_file_path(partition_dir, ts_name);
        let file = store.open_rw(&path).map_err(|source| SpliceError::Open {
            path: path.clone(),
            source,
        })?;
        let column = TimestampColumn::map(store, Arc::new(file), rows, &path)?;
        let data_ts_lo = column.first();
        let data_ts_hi = column.last();
        Ok(PartitionTarget::Existing(OpenedPartition {
            src_timestamp: SrcTimestamp {
                column: Arc::new(column),
                provenance: FdProvenance::Owned,
            },
            data_ts_lo,
            data_ts_hi,
            src_data_max: rows,
        }))
    }
}

/// Finalize the open mode once the block plan is known. Merge modes create
/// the txn-stamped staging directory as a side effect.
pub(crate) fn finalize_mode(
    store: &dyn StoreFs,
    option: &SpliceOption,
    task: &PartitionSpliceTask,
    plan: &SplicePlan,
    provenance: FdProvenance,
    staging_dir: &Path,
) -> Result<OpenColumnMode, SpliceError> {
    if plan.prefix_kind == BlockKind::None {
        // nothing ahead of the splice point survives as-is: plain append
        if task.ooo_timestamp_hi < task.table_floor_of_max_timestamp {
            Ok(OpenColumnMode::MidPartitionForAppend)
        } else {
            Ok(OpenColumnMode::LastPartitionForAppend)
        }
    } else {
        store
            .mkdirs(staging_dir, option.mkdir_mode)
            .map_err(|source| SpliceError::Mkdir {
                path: staging_dir.to_path_buf(),
                source,
            })?;
        match provenance {
            FdProvenance::Reused => Ok(OpenColumnMode::LastPartitionForMerge),
            FdProvenance::Owned => Ok(OpenColumnMode::MidPartitionForMerge),
        }
    }
}
