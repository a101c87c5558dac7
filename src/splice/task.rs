//! Task payloads exchanged over the splice queues.

use std::{fs::File, path::PathBuf, sync::Arc};

use bytes::Bytes;

use super::{
    classify::SplicePlan,
    merge_index::MergeIndex,
    opener::{OpenColumnMode, SrcTimestamp},
};
use crate::{
    partition::PartitionBy,
    sync::{ColumnCounter, DoneLatch},
    table::{ColumnRole, TableMeta},
};

/// One 16-byte entry of the batch-wide sorted timestamp index: the batch is
/// sorted once up front and every partition slice addresses rows through
/// these entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct TsIndexEntry {
    /// Timestamp in epoch microseconds.
    pub ts: i64,
    /// Row position within the ingest batch memory.
    pub row: u64,
}

impl TsIndexEntry {
    /// Entry directing `row` at `ts`.
    pub fn new(ts: i64, row: u64) -> Self {
        Self { ts, row }
    }
}

/// Writable tail-partition files of one column, borrowed from the table
/// writer. Handles are shared, never re-opened or closed here.
#[derive(Clone)]
pub struct ActiveColumn {
    /// Fixed-width data, or var-length payload for string/binary columns.
    pub primary: Arc<File>,
    /// Offset file backing var-sized columns.
    pub aux: Option<Arc<File>>,
}

/// Sorted in-memory slice of one ingest-batch column.
#[derive(Clone)]
pub struct OooColumn {
    /// Fixed-width values, or var-length payload for string/binary columns.
    pub primary: Bytes,
    /// Offsets for var-sized columns.
    pub aux: Option<Bytes>,
}

/// Unit of work for the partition splice planner. Published once by the
/// ingest front end, consumed once by a planner worker.
///
/// `ooo_timestamp_hi` and the `table_*` bounds are partition-aligned
/// inclusive upper/lower bounds (see [`PartitionBy::partition_hi`]); equality
/// of `ooo_timestamp_hi` with `table_ceil_of_max_timestamp` identifies the
/// live tail partition.
pub struct PartitionSpliceTask {
    /// Table root directory.
    pub path_to_table: PathBuf,
    /// Partitioning granularity of the table.
    pub partition_by: PartitionBy,
    /// Writable column files of the current tail partition, in metadata order.
    pub columns: Arc<[ActiveColumn]>,
    /// Sorted ingest-batch column slices, same arity and order as `columns`.
    pub ooo_columns: Arc<[OooColumn]>,
    /// First batch row of this partition's slice (inclusive).
    pub src_ooo_lo: i64,
    /// Last batch row of this partition's slice (inclusive).
    pub src_ooo_hi: i64,
    /// Total row count of the ingest batch.
    pub src_ooo_max: i64,
    /// Smallest timestamp of the whole batch.
    pub ooo_timestamp_min: i64,
    /// Largest timestamp of the whole batch.
    pub ooo_timestamp_max: i64,
    /// Inclusive upper bound of the slice's partition window.
    pub ooo_timestamp_hi: i64,
    /// Transaction number stamped onto staging directories.
    pub txn: u64,
    /// Batch-wide `(timestamp, row)` index, ascending by timestamp.
    pub sorted_timestamps: Arc<[TsIndexEntry]>,
    /// Row count of the table's tail partition.
    pub last_partition_size: i64,
    /// Inclusive upper bound of the tail partition's window.
    pub table_ceil_of_max_timestamp: i64,
    /// First instant of the table's oldest partition.
    pub table_floor_of_min_timestamp: i64,
    /// First instant of the tail partition.
    pub table_floor_of_max_timestamp: i64,
    /// Largest timestamp persisted in the table.
    pub table_max_timestamp: i64,
    /// Writer-side metadata.
    pub table: Arc<dyn TableMeta>,
    /// Counted once per partition when all downstream work completes.
    pub done_latch: Arc<DoneLatch>,
}

/// Column-level work emitted by the planner for the downstream open-column
/// stage. One task per column per partition; all tasks of a partition share
/// the merge index and the column counter.
pub struct OpenColumnTask {
    /// How the column file(s) must be opened.
    pub mode: OpenColumnMode,
    /// Table root directory.
    pub path_to_table: PathBuf,
    /// Partitioning granularity, for resolving partition directories.
    pub partition_by: PartitionBy,
    /// Column name.
    pub column_name: Arc<str>,
    /// Column type; the designated timestamp column travels tagged.
    pub column_role: ColumnRole,
    /// Whether the column carries a symbol index.
    pub is_indexed: bool,
    /// OOO fixed-side slice (offsets for var-sized columns).
    pub src_ooo_fix: Bytes,
    /// OOO var-side slice for string/binary columns.
    pub src_ooo_var: Option<Bytes>,
    /// First batch row of this partition's slice (inclusive).
    pub src_ooo_lo: i64,
    /// Last batch row of this partition's slice (inclusive).
    pub src_ooo_hi: i64,
    /// Total row count of the ingest batch.
    pub src_ooo_max: i64,
    /// Smallest timestamp of the whole batch.
    pub ooo_timestamp_min: i64,
    /// Largest timestamp of the whole batch.
    pub ooo_timestamp_max: i64,
    /// Partition identity timestamp (first slice value).
    pub ooo_timestamp_lo: i64,
    /// Inclusive upper bound of the slice's partition window.
    pub ooo_timestamp_hi: i64,
    /// Row count of the existing partition data.
    pub src_data_max: i64,
    /// First instant of the tail partition.
    pub table_floor_of_max_timestamp: i64,
    /// Largest existing timestamp of the target partition.
    pub data_timestamp_hi: i64,
    /// Transaction number stamped onto staging directories.
    pub txn: u64,
    /// Block decomposition of the splice.
    pub plan: SplicePlan,
    /// Interleave directions for merge blocks, shared across the partition's
    /// columns; the last holder's drop releases the buffer.
    pub merge_index: Option<Arc<MergeIndex>>,
    /// Mapped timestamp column of the existing partition, with provenance.
    pub src_timestamp: Option<SrcTimestamp>,
    /// Writer-owned fixed-side file when appending to the tail in place.
    pub active_fix: Option<Arc<File>>,
    /// Writer-owned var-side file when appending to the tail in place.
    pub active_var: Option<Arc<File>>,
    /// Rows absent at the head of the partition for this column.
    pub active_top: i64,
    /// Countdown across the partition's columns.
    pub column_counter: Arc<ColumnCounter>,
    /// Completion latch carried through from the partition task.
    pub done_latch: Arc<DoneLatch>,
}

/// Partition size bookkeeping record, produced by the downstream stage once
/// a partition's columns are fully written and reconciled by transaction
/// number at the commit stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartitionSizeUpdate {
    /// Partition identity timestamp.
    pub partition_timestamp: i64,
    /// New row count of the partition.
    pub partition_size: i64,
    /// Transaction that produced the partition.
    pub txn: u64,
}
