#![deny(missing_docs)]
//! Out-of-order splice planning for a timestamp-partitioned columnar store.
//!
//! Rows live in per-partition directories, one file per column, kept sorted
//! by a designated timestamp column. When an ingest batch arrives whose
//! timestamps fall behind the persisted tail, the batch is sorted once and
//! cut into per-partition slices; this crate plans how each slice folds into
//! its target partition:
//!
//! - resolve the target directory (fresh, live tail, or archived),
//! - classify the overlap into prefix/merge/suffix blocks,
//! - build the merge index that interleaves both sources in timestamp order,
//! - fan one open-column task per column out to the copy workers, degrading
//!   to inline execution when the queue saturates.
//!
//! The planner is a library component: the ingest front end publishes
//! [`splice::PartitionSpliceTask`]s onto a [`bus::SpliceBus`], a
//! [`splice::SpliceWorkers`] pool drains them, and the downstream
//! open-column stage consumes the emitted [`splice::OpenColumnTask`]s.

/// Queue wiring between the splice stages.
pub mod bus;
/// Planner operating parameters.
pub mod config;
/// Filesystem facade.
pub mod fs;
mod logging;
/// Partition granularity and directory naming.
pub mod partition;
/// The splice planning pipeline.
pub mod splice;
/// Cross-stage synchronization primitives.
pub mod sync;
/// Table metadata surface.
pub mod table;

pub use bus::SpliceBus;
pub use config::SpliceOption;
pub use splice::{
    process_partition, BlockKind, OpenColumnMode, OpenColumnSink, PartitionSpliceJob,
    PartitionSpliceTask, SpliceError, SplicePlan, SpliceWorkers,
};
