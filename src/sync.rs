//! Cross-stage synchronization primitives.

use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::{Condvar, Mutex};

/// Countdown over the columns of one partition.
///
/// Created by the planner with the table's column count and decremented by
/// the downstream stage as each column completes; the final decrement is the
/// signal to release per-partition shared state.
#[derive(Debug)]
pub struct ColumnCounter {
    remaining: AtomicI64,
}

impl ColumnCounter {
    /// Counter starting at the table's column count.
    pub fn new(columns: usize) -> Self {
        Self {
            remaining: AtomicI64::new(columns as i64),
        }
    }

    /// Columns still outstanding.
    pub fn remaining(&self) -> i64 {
        self.remaining.load(Ordering::Acquire)
    }

    /// Record one finished column; returns `true` for the final one.
    pub fn countdown(&self) -> bool {
        self.remaining.fetch_sub(1, Ordering::AcqRel) == 1
    }
}

/// Unbounded countdown latch.
///
/// Downstream stages count completions as they finish partitions; the ingest
/// front end blocks until the expected number has been counted. The latch
/// never saturates, so one instance serves any number of batches.
#[derive(Debug, Default)]
pub struct DoneLatch {
    counted: Mutex<u64>,
    cond: Condvar,
}

impl DoneLatch {
    /// Fresh latch with nothing counted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completion and wake any waiters.
    pub fn count_down(&self) {
        let mut counted = self.counted.lock();
        *counted += 1;
        self.cond.notify_all();
    }

    /// Completions recorded so far.
    pub fn counted(&self) -> u64 {
        *self.counted.lock()
    }

    /// Block until at least `target` completions have been recorded.
    pub fn wait_for(&self, target: u64) {
        let mut counted = self.counted.lock();
        while *counted < target {
            self.cond.wait(&mut counted);
        }
    }
}
