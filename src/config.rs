//! Operating parameters of the splice planner.

const DEFAULT_MKDIR_MODE: u32 = 0o755;
const DEFAULT_PARTITION_QUEUE_CAPACITY: usize = 128;
const DEFAULT_OPEN_COLUMN_QUEUE_CAPACITY: usize = 256;
const DEFAULT_SIZE_UPDATE_QUEUE_CAPACITY: usize = 128;
const DEFAULT_WORKER_COUNT: usize = 2;

/// Configure the operating parameters of the splice planner: directory
/// permissions, queue sizing and the partition worker pool.
#[derive(Clone, Debug)]
pub struct SpliceOption {
    /// POSIX permission bits applied to new partition and staging directories.
    pub(crate) mkdir_mode: u32,

    /// Capacity of the inbound partition queue.
    pub(crate) partition_queue_capacity: usize,

    /// Capacity of the outbound open-column queue.
    pub(crate) open_column_queue_capacity: usize,

    /// Capacity of the partition-size update queue.
    pub(crate) size_update_queue_capacity: usize,

    /// Number of partition planner threads.
    pub(crate) worker_count: usize,
}

impl Default for SpliceOption {
    fn default() -> Self {
        Self {
            mkdir_mode: DEFAULT_MKDIR_MODE,
            partition_queue_capacity: DEFAULT_PARTITION_QUEUE_CAPACITY,
            open_column_queue_capacity: DEFAULT_OPEN_COLUMN_QUEUE_CAPACITY,
            size_update_queue_capacity: DEFAULT_SIZE_UPDATE_QUEUE_CAPACITY,
            worker_count: DEFAULT_WORKER_COUNT,
        }
    }
}

impl SpliceOption {
    /// Permission bits for newly created partition and staging directories.
    pub fn with_mkdir_mode(mut self, mode: u32) -> Self {
        self.mkdir_mode = mode;
        self
    }

    /// Capacity of the inbound partition queue. Rounded up to a power of two
    /// when the queues are built.
    pub fn with_partition_queue_capacity(mut self, capacity: usize) -> Self {
        self.partition_queue_capacity = capacity;
        self
    }

    /// Capacity of the outbound open-column queue. Rounded up to a power of
    /// two when the queues are built.
    pub fn with_open_column_queue_capacity(mut self, capacity: usize) -> Self {
        self.open_column_queue_capacity = capacity;
        self
    }

    /// Capacity of the partition-size update queue. Rounded up to a power of
    /// two when the queues are built.
    pub fn with_size_update_queue_capacity(mut self, capacity: usize) -> Self {
        self.size_update_queue_capacity = capacity;
        self
    }

    /// Number of partition planner threads spawned by the worker pool.
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count.max(1);
        self
    }

    /// Configured worker pool size.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}
