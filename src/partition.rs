//! Partition granularity, boundary alignment and directory naming.
//!
//! Partition directories are named from the timestamp of their first row,
//! formatted per granularity (`2020-01-03` for [`PartitionBy::Day`]). A merge
//! produces a sibling staging directory carrying the transaction number,
//! `2020-01-03.42`, which the commit stage later swaps in.

use chrono::{DateTime, Datelike, TimeZone, Utc};

const MICROS_PER_HOUR: i64 = 3_600_000_000;
const MICROS_PER_DAY: i64 = 24 * MICROS_PER_HOUR;

/// Granularity by which a table's rows are split into partitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartitionBy {
    /// One partition per hour.
    Hour,
    /// One partition per calendar day.
    Day,
    /// One partition per calendar month.
    Month,
    /// One partition per calendar year.
    Year,
    /// A single unbounded partition.
    None,
}

impl PartitionBy {
    /// Timestamp of the first instant of the partition containing `ts`.
    pub fn floor(&self, ts: i64) -> i64 {
        match self {
            PartitionBy::Hour => ts - ts.rem_euclid(MICROS_PER_HOUR),
            PartitionBy::Day => ts - ts.rem_euclid(MICROS_PER_DAY),
            PartitionBy::Month => {
                let dt = datetime(ts);
                start_of_month(dt.year(), dt.month()).unwrap_or(ts)
            }
            PartitionBy::Year => {
                let dt = datetime(ts);
                start_of_month(dt.year(), 1).unwrap_or(ts)
            }
            PartitionBy::None => i64::MIN,
        }
    }

    /// Inclusive upper bound of the partition containing `ts`: the last
    /// microsecond before the next partition begins.
    ///
    /// Splice tasks carry these bounds for both the slice and the table tail,
    /// so equality of the two identifies the live tail partition.
    pub fn partition_hi(&self, ts: i64) -> i64 {
        match self {
            PartitionBy::Hour => self.floor(ts) + MICROS_PER_HOUR - 1,
            PartitionBy::Day => self.floor(ts) + MICROS_PER_DAY - 1,
            PartitionBy::Month => {
                let dt = datetime(ts);
                let (year, month) = if dt.month() == 12 {
                    (dt.year() + 1, 1)
                } else {
                    (dt.year(), dt.month() + 1)
                };
                start_of_month(year, month).map(|next| next - 1).unwrap_or(ts)
            }
            PartitionBy::Year => {
                let dt = datetime(ts);
                start_of_month(dt.year() + 1, 1).map(|next| next - 1).unwrap_or(ts)
            }
            PartitionBy::None => i64::MAX,
        }
    }

    /// Directory name of the partition containing `ts`.
    pub fn dir_name(&self, ts: i64) -> String {
        let dt = datetime(ts);
        match self {
            PartitionBy::Hour => dt.format("%Y-%m-%dT%H").to_string(),
            PartitionBy::Day => dt.format("%Y-%m-%d").to_string(),
            PartitionBy::Month => dt.format("%Y-%m").to_string(),
            PartitionBy::Year => dt.format("%Y").to_string(),
            PartitionBy::None => "default".to_string(),
        }
    }
}

/// Name of the staging directory a merge writes into before the commit stage
/// swaps it over the canonical partition directory.
pub fn staging_dir_name(partition: &str, txn: u64) -> String {
    format!("{partition}.{txn}")
}

fn datetime(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(ts).unwrap_or_default()
}

fn start_of_month(year: i32, month: u32) -> Option<i64> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .map(|dt| dt.timestamp_micros())
}
