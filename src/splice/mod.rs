//! The per-partition splice planning pipeline.
//!
//! A splice plan decides how one sorted slice of an out-of-order ingest
//! batch folds into its target partition: which rows survive untouched,
//! which interleave, how each column file is opened, and what work the
//! downstream copy stage receives. Planning is pure bookkeeping over the
//! mapped timestamp column; no row data moves here.

/// Overlap classification into prefix/merge/suffix blocks.
mod classify;
/// Planner failure modes.
mod error;
/// Partition-task consumption and worker pool.
mod job;
/// Merge-index construction for interleaved blocks.
mod merge_index;
/// Target-partition resolution and open-mode selection.
mod opener;
/// Column task fan-out with saturation fallback.
mod publish;
/// Bisection over timestamp arrays.
mod search;
/// Task payloads exchanged over the splice queues.
mod task;

pub use classify::{classify, BlockKind, OverlapBounds, SplicePlan};
pub use error::SpliceError;
pub use job::{process_partition, PartitionSpliceJob, SpliceWorkers};
pub use merge_index::{MergeEntry, MergeIndex, MergeSource};
pub use opener::{FdProvenance, OpenColumnMode, SrcTimestamp, TimestampColumn};
pub use publish::{ColumnTaskQueue, OpenColumnSink};
pub use task::{
    ActiveColumn, OooColumn, OpenColumnTask, PartitionSizeUpdate, PartitionSpliceTask,
    TsIndexEntry,
};
