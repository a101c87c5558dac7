#![allow(dead_code)]

use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use bytes::Bytes;
use strata::{
    splice::{
        ActiveColumn, OooColumn, OpenColumnMode, OpenColumnSink, OpenColumnTask, SplicePlan,
        TsIndexEntry,
    },
    sync::DoneLatch,
    table::{ColumnDesc, ColumnKind, ColumnRole, TableDesc, TableMeta},
};

pub const DAY: i64 = 86_400_000_000;

/// What a test observes about one delivered open-column task.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub column_name: String,
    pub role: ColumnRole,
    pub mode: OpenColumnMode,
    pub plan: SplicePlan,
    pub reused_fd: Option<bool>,
    pub merge_len: Option<usize>,
    pub src_data_max: i64,
    pub active_top: i64,
    pub was_last: bool,
}

/// Downstream stand-in honoring the counter/latch contract: decrement the
/// column counter, count the latch down on the final column.
#[derive(Default, Debug)]
pub struct RecordingSink {
    tasks: Mutex<Vec<Summary>>,
}

impl RecordingSink {
    pub fn summaries(&self) -> Vec<Summary> {
        self.tasks.lock().unwrap().clone()
    }

    /// Summaries ordered by column name, for multiset comparison.
    pub fn sorted_summaries(&self) -> Vec<Summary> {
        let mut all = self.summaries();
        all.sort_by(|a, b| a.column_name.cmp(&b.column_name));
        all
    }

    pub fn zero_crossings(&self) -> usize {
        self.summaries().iter().filter(|s| s.was_last).count()
    }
}

impl OpenColumnSink for RecordingSink {
    fn open_column(&self, task: OpenColumnTask) {
        let was_last = task.column_counter.countdown();
        self.tasks.lock().unwrap().push(Summary {
            column_name: task.column_name.to_string(),
            role: task.column_role,
            mode: task.mode,
            plan: task.plan,
            reused_fd: task.src_timestamp.as_ref().map(|src| src.is_reused()),
            merge_len: task.merge_index.as_ref().map(|idx| idx.len()),
            src_data_max: task.src_data_max,
            active_top: task.active_top,
            was_last,
        });
        if was_last {
            task.done_latch.count_down();
        }
    }
}

pub fn write_i64_column(dir: &Path, name: &str, values: &[i64]) -> Arc<File> {
    let path = dir.join(format!("{name}.d"));
    let mut file = File::create(&path).expect("create column file");
    for value in values {
        file.write_all(&value.to_le_bytes()).expect("write column");
    }
    drop(file);
    Arc::new(
        OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .expect("reopen column"),
    )
}

pub fn write_i32_column(dir: &Path, name: &str, rows: usize) -> Arc<File> {
    let path = dir.join(format!("{name}.d"));
    let mut file = File::create(&path).expect("create column file");
    file.write_all(&vec![0u8; rows * 4]).expect("write column");
    drop(file);
    Arc::new(
        OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .expect("reopen column"),
    )
}

pub fn sorted_index(ts: &[i64]) -> Arc<[TsIndexEntry]> {
    ts.iter()
        .enumerate()
        .map(|(row, &ts)| TsIndexEntry::new(ts, row as u64))
        .collect::<Vec<_>>()
        .into()
}

pub fn ooo_columns(ts: &[i64]) -> Arc<[OooColumn]> {
    let mut ts_bytes = Vec::with_capacity(ts.len() * 8);
    for value in ts {
        ts_bytes.extend_from_slice(&value.to_le_bytes());
    }
    vec![
        OooColumn {
            primary: Bytes::from(vec![0u8; ts.len() * 4]),
            aux: None,
        },
        OooColumn {
            primary: Bytes::from(ts_bytes),
            aux: None,
        },
    ]
    .into()
}

/// `v: Int` at index 0, `ts: Timestamp` (designated) at index 1.
pub fn int_ts_table() -> Arc<dyn TableMeta> {
    Arc::new(TableDesc::new(
        vec![
            ColumnDesc::new("v", ColumnKind::Int),
            ColumnDesc::new("ts", ColumnKind::Timestamp),
        ],
        1,
    ))
}

/// On-disk tail partition plus the writer-side handles a task carries.
pub struct TableFixture {
    pub root: PathBuf,
    pub columns: Arc<[ActiveColumn]>,
    pub table: Arc<dyn TableMeta>,
    pub latch: Arc<DoneLatch>,
}

/// Create `root/<tail_dir>` holding `v.d` and `ts.d` for `tail_ts`, with the
/// open handles serving as the writer's active columns.
pub fn setup_table(root: &Path, tail_dir: &str, tail_ts: &[i64]) -> TableFixture {
    let dir = root.join(tail_dir);
    std::fs::create_dir_all(&dir).expect("tail partition dir");
    let v = write_i32_column(&dir, "v", tail_ts.len());
    let ts = write_i64_column(&dir, "ts", tail_ts);
    let columns: Arc<[ActiveColumn]> = vec![
        ActiveColumn {
            primary: v,
            aux: None,
        },
        ActiveColumn {
            primary: ts,
            aux: None,
        },
    ]
    .into();
    TableFixture {
        root: root.to_path_buf(),
        columns,
        table: int_ts_table(),
        latch: Arc::new(DoneLatch::new()),
    }
}
