//! Partition-task consumption and planning orchestration.

use std::{io, sync::Arc, thread};

use super::{
    classify::{self, BlockKind, OverlapBounds, SplicePlan},
    error::SpliceError,
    merge_index,
    opener::{self, OpenColumnMode, PartitionTarget},
    publish::{self, ColumnTaskQueue, OpenColumnSink, PublishContext},
    task::PartitionSpliceTask,
};
use crate::{
    config::SpliceOption,
    fs::StoreFs,
    logging::strata_log,
    partition::staging_dir_name,
};

/// Plan one partition splice end to end: resolve the target directory,
/// classify the overlap, build the merge index when the plan interleaves,
/// and fan the column tasks out.
pub fn process_partition(
    option: &SpliceOption,
    store: &dyn StoreFs,
    queue: &ColumnTaskQueue,
    sink: &dyn OpenColumnSink,
    task: &PartitionSpliceTask,
) -> Result<(), SpliceError> {
    let ooo_ts_lo = task.sorted_timestamps[task.src_ooo_lo as usize].ts;
    let dir_name = task.partition_by.dir_name(ooo_ts_lo);
    let partition_dir = task.path_to_table.join(&dir_name);

    match opener::open_target(store, option, task, &partition_dir)? {
        PartitionTarget::New => {
            strata_log!(
                log::Level::Debug,
                "partition_new",
                "path={}",
                partition_dir.display()
            );
            publish::publish_open_column_tasks(
                queue,
                sink,
                PublishContext {
                    task,
                    mode: OpenColumnMode::NewPartitionForAppend,
                    plan: SplicePlan::pure_ooo_append(task.src_ooo_lo, task.src_ooo_hi),
                    merge_index: None,
                    src_timestamp: None,
                    src_data_max: 0,
                    data_timestamp_hi: 0,
                    ooo_timestamp_lo: ooo_ts_lo,
                },
            );
        }
        PartitionTarget::Existing(opened) => {
            let ts_column = Arc::clone(&opened.src_timestamp.column);
            let data_ts = ts_column.as_slice();
            // classification needs the slice's own extremes; the batch-wide
            // maximum on the task may belong to a later partition
            let bounds = OverlapBounds {
                data_ts_lo: opened.data_ts_lo,
                data_ts_hi: opened.data_ts_hi,
                src_data_max: opened.src_data_max,
                ooo_ts_lo,
                ooo_ts_max: task.sorted_timestamps[task.src_ooo_hi as usize].ts,
                src_ooo_lo: task.src_ooo_lo,
                src_ooo_hi: task.src_ooo_hi,
            };
            let plan = classify::classify(data_ts, &task.sorted_timestamps, &bounds);

            let staging_dir = task.path_to_table.join(staging_dir_name(&dir_name, task.txn));
            let mode = opener::finalize_mode(
                store,
                option,
                task,
                &plan,
                opened.src_timestamp.provenance,
                &staging_dir,
            )?;

            let merge_index = if plan.merge_kind == BlockKind::Merge {
                Some(Arc::new(merge_index::build(
                    data_ts,
                    &task.sorted_timestamps,
                    plan.merge_data_lo,
                    plan.merge_data_hi,
                    plan.merge_ooo_lo,
                    plan.merge_ooo_hi,
                )?))
            } else {
                None
            };

            strata_log!(
                log::Level::Debug,
                "partition_plan",
                "path={} mode={:?} prefix={:?} merge={:?} suffix={:?}",
                partition_dir.display(),
                mode,
                plan.prefix_kind,
                plan.merge_kind,
                plan.suffix_kind,
            );
            publish::publish_open_column_tasks(
                queue,
                sink,
                PublishContext {
                    task,
                    mode,
                    plan,
                    merge_index,
                    src_timestamp: Some(opened.src_timestamp),
                    src_data_max: opened.src_data_max,
                    data_timestamp_hi: opened.data_ts_hi,
                    ooo_timestamp_lo: ooo_ts_lo,
                },
            );
        }
    }
    Ok(())
}

/// Queue-consuming planner job; one instance is shared by the worker pool.
pub struct PartitionSpliceJob {
    option: SpliceOption,
    store: Arc<dyn StoreFs>,
    partition_rx: flume::Receiver<PartitionSpliceTask>,
    queue: ColumnTaskQueue,
    sink: Arc<dyn OpenColumnSink>,
}

impl PartitionSpliceJob {
    /// Wire a job to its queues, filesystem and downstream sink.
    pub fn new(
        option: SpliceOption,
        store: Arc<dyn StoreFs>,
        partition_rx: flume::Receiver<PartitionSpliceTask>,
        queue: ColumnTaskQueue,
        sink: Arc<dyn OpenColumnSink>,
    ) -> Self {
        Self {
            option,
            store,
            partition_rx,
            queue,
            sink,
        }
    }

    /// Attempt one unit of work; returns whether a partition was processed.
    ///
    /// The dequeue releases the ring slot before any planning IO starts, so
    /// producers are never held up by a slow plan.
    pub fn run_once(&self) -> bool {
        match self.partition_rx.try_recv() {
            Ok(task) => {
                self.plan(task);
                true
            }
            Err(_) => false,
        }
    }

    /// Serve the partition queue until every sender is dropped.
    pub fn run_loop(&self) {
        while let Ok(task) = self.partition_rx.recv() {
            self.plan(task);
        }
    }

    fn plan(&self, task: PartitionSpliceTask) {
        if let Err(err) = process_partition(
            &self.option,
            self.store.as_ref(),
            &self.queue,
            self.sink.as_ref(),
            &task,
        ) {
            strata_log!(
                log::Level::Error,
                "partition_failed",
                "table={} errno={:?} err={}",
                task.path_to_table.display(),
                err.errno(),
                err,
            );
        }
    }
}

/// Fixed pool of partition planner threads.
pub struct SpliceWorkers {
    handles: Vec<thread::JoinHandle<()>>,
}

impl SpliceWorkers {
    /// Spawn `count` workers over the shared job. Workers exit once the
    /// partition queue disconnects.
    pub fn start(count: usize, job: Arc<PartitionSpliceJob>) -> io::Result<Self> {
        let handles = (0..count.max(1))
            .map(|id| {
                let job = Arc::clone(&job);
                thread::Builder::new()
                    .name(format!("strata-splice-{id}"))
                    .spawn(move || job.run_loop())
            })
            .collect::<io::Result<Vec<_>>>()?;
        Ok(Self { handles })
    }

    /// Wait for the pool to drain and exit. Every partition sender must be
    /// dropped first, or this blocks forever.
    pub fn join(self) {
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}
