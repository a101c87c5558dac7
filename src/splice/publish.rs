//! Column task fan-out onto the open-column queue.

use std::sync::Arc;

use bytes::Bytes;

use super::{
    classify::SplicePlan,
    merge_index::MergeIndex,
    opener::{OpenColumnMode, SrcTimestamp},
    task::{OpenColumnTask, PartitionSpliceTask},
};
use crate::{logging::strata_log, sync::ColumnCounter, table::ColumnRole};

/// Downstream open-column stage entry point, used directly when the queue
/// saturates.
pub trait OpenColumnSink: Send + Sync {
    /// Execute one open-column task on the calling thread.
    fn open_column(&self, task: OpenColumnTask);
}

/// Bounded handle to the open-column queue with saturation fallback.
#[derive(Clone)]
pub struct ColumnTaskQueue {
    tx: flume::Sender<OpenColumnTask>,
}

impl ColumnTaskQueue {
    /// Wrap a sender onto the open-column queue.
    pub fn new(tx: flume::Sender<OpenColumnTask>) -> Self {
        Self { tx }
    }

    /// Publish the task, or run it inline on the calling thread when no slot
    /// frees up. The inline path is semantically identical to the queued one:
    /// the sink performs the same counter decrement and latch signalling.
    pub fn publish_or_inline(&self, task: OpenColumnTask, sink: &dyn OpenColumnSink) {
        match self.tx.try_send(task) {
            Ok(()) => {}
            Err(flume::TrySendError::Full(task)) | Err(flume::TrySendError::Disconnected(task)) => {
                strata_log!(
                    log::Level::Debug,
                    "open_column_inline",
                    "column={}",
                    task.column_name
                );
                sink.open_column(task);
            }
        }
    }
}

/// Partition-level planning output shared by every column task.
pub(crate) struct PublishContext<'a> {
    pub(crate) task: &'a PartitionSpliceTask,
    pub(crate) mode: OpenColumnMode,
    pub(crate) plan: SplicePlan,
    pub(crate) merge_index: Option<Arc<MergeIndex>>,
    pub(crate) src_timestamp: Option<SrcTimestamp>,
    pub(crate) src_data_max: i64,
    pub(crate) data_timestamp_hi: i64,
    pub(crate) ooo_timestamp_lo: i64,
}

/// Emit one open-column task per table column, timestamp column included.
pub(crate) fn publish_open_column_tasks(
    queue: &ColumnTaskQueue,
    sink: &dyn OpenColumnSink,
    ctx: PublishContext<'_>,
) {
    let task = ctx.task;
    let table = task.table.as_ref();
    let column_count = table.column_count();
    let timestamp_index = table.timestamp_index();
    let column_counter = Arc::new(ColumnCounter::new(column_count));

    for i in 0..column_count {
        let kind = table.column_kind(i);
        let active = &task.columns[i];
        let ooo = &task.ooo_columns[i];

        // var-sized columns swap slots: offsets ride the fixed side, payload
        // rides the var side
        let (active_fix, active_var) = if kind.is_var_sized() {
            (active.aux.clone(), Some(Arc::clone(&active.primary)))
        } else {
            (Some(Arc::clone(&active.primary)), None)
        };
        let (src_ooo_fix, src_ooo_var): (Bytes, Option<Bytes>) = match (&ooo.aux, kind.is_var_sized()) {
            (Some(aux), true) => (aux.clone(), Some(ooo.primary.clone())),
            _ => (ooo.primary.clone(), None),
        };

        let column_role = if i == timestamp_index {
            ColumnRole::Timestamp(kind)
        } else {
            ColumnRole::Regular(kind)
        };

        let column_task = OpenColumnTask {
            mode: ctx.mode,
            path_to_table: task.path_to_table.clone(),
            partition_by: task.partition_by,
            column_name: Arc::from(table.column_name(i)),
            column_role,
            is_indexed: table.is_column_indexed(i),
            src_ooo_fix,
            src_ooo_var,
            src_ooo_lo: task.src_ooo_lo,
            src_ooo_hi: task.src_ooo_hi,
            src_ooo_max: task.src_ooo_max,
            ooo_timestamp_min: task.ooo_timestamp_min,
            ooo_timestamp_max: task.ooo_timestamp_max,
            ooo_timestamp_lo: ctx.ooo_timestamp_lo,
            ooo_timestamp_hi: task.ooo_timestamp_hi,
            src_data_max: ctx.src_data_max,
            table_floor_of_max_timestamp: task.table_floor_of_max_timestamp,
            data_timestamp_hi: ctx.data_timestamp_hi,
            txn: task.txn,
            plan: ctx.plan,
            merge_index: ctx.merge_index.clone(),
            src_timestamp: ctx.src_timestamp.clone(),
            active_fix,
            active_var,
            active_top: table.column_top(i),
            column_counter: Arc::clone(&column_counter),
            done_latch: Arc::clone(&task.done_latch),
        };

        queue.publish_or_inline(column_task, sink);
    }
}
