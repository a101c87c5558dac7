//! Queue wiring between the ingest front end, the planner and the
//! downstream stages.

use flume::{Receiver, Sender};

use crate::{
    config::SpliceOption,
    splice::{ColumnTaskQueue, OpenColumnTask, PartitionSizeUpdate, PartitionSpliceTask},
};

/// The three bounded MPMC queues connecting the splice stages.
///
/// The ingest front end produces partition tasks; planner workers consume
/// them and produce open-column tasks; the downstream stage consumes those
/// and reports partition sizes for the commit stage. Capacities are rounded
/// up to powers of two.
pub struct SpliceBus {
    partition_tx: Sender<PartitionSpliceTask>,
    partition_rx: Receiver<PartitionSpliceTask>,
    open_column_tx: Sender<OpenColumnTask>,
    open_column_rx: Receiver<OpenColumnTask>,
    size_update_tx: Sender<PartitionSizeUpdate>,
    size_update_rx: Receiver<PartitionSizeUpdate>,
}

impl SpliceBus {
    /// Build the queues from the configured capacities.
    pub fn new(option: &SpliceOption) -> Self {
        let (partition_tx, partition_rx) =
            flume::bounded(option.partition_queue_capacity.next_power_of_two());
        let (open_column_tx, open_column_rx) =
            flume::bounded(option.open_column_queue_capacity.next_power_of_two());
        let (size_update_tx, size_update_rx) =
            flume::bounded(option.size_update_queue_capacity.next_power_of_two());
        Self {
            partition_tx,
            partition_rx,
            open_column_tx,
            open_column_rx,
            size_update_tx,
            size_update_rx,
        }
    }

    /// Producer side of the partition queue.
    pub fn partition_sender(&self) -> Sender<PartitionSpliceTask> {
        self.partition_tx.clone()
    }

    /// Consumer side of the partition queue.
    pub fn partition_receiver(&self) -> Receiver<PartitionSpliceTask> {
        self.partition_rx.clone()
    }

    /// Saturation-aware handle for publishing column tasks.
    pub fn column_task_queue(&self) -> ColumnTaskQueue {
        ColumnTaskQueue::new(self.open_column_tx.clone())
    }

    /// Consumer side of the open-column queue.
    pub fn open_column_receiver(&self) -> Receiver<OpenColumnTask> {
        self.open_column_rx.clone()
    }

    /// Producer side of the partition-size update queue.
    pub fn size_update_sender(&self) -> Sender<PartitionSizeUpdate> {
        self.size_update_tx.clone()
    }

    /// Consumer side of the partition-size update queue.
    pub fn size_update_receiver(&self) -> Receiver<PartitionSizeUpdate> {
        self.size_update_rx.clone()
    }
}
