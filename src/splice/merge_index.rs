//! Merge-index construction for interleaved splice blocks.
//!
//! The index is built once per partition and shared by every column task, so
//! the copy stage replays the same interleaving for each column file without
//! re-deriving it.

use std::mem;

use super::{error::SpliceError, task::TsIndexEntry};

/// High bit of the packed position, tagging rows sourced from the OOO slice.
const OOO_SOURCE_BIT: u64 = 1 << 63;

/// Origin of a merge-index entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeSource {
    /// Existing on-disk row.
    Data,
    /// Row of the OOO slice.
    Ooo,
}

/// One `(timestamp, tagged position)` direction for the copy stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergeEntry {
    ts: i64,
    pos: u64,
}

impl MergeEntry {
    fn data(ts: i64, row: u64) -> Self {
        Self { ts, pos: row }
    }

    fn ooo(ts: i64, row: u64) -> Self {
        Self {
            ts,
            pos: row | OOO_SOURCE_BIT,
        }
    }

    /// Timestamp of the directed row.
    pub fn timestamp(&self) -> i64 {
        self.ts
    }

    /// Which side the row comes from.
    pub fn source(&self) -> MergeSource {
        if self.pos & OOO_SOURCE_BIT == 0 {
            MergeSource::Data
        } else {
            MergeSource::Ooo
        }
    }

    /// Row id within its source.
    pub fn row(&self) -> u64 {
        self.pos & !OOO_SOURCE_BIT
    }
}

/// Ascending `(timestamp, tagged row)` directions covering one partition's
/// merge block.
#[derive(Debug)]
pub struct MergeIndex {
    entries: Vec<MergeEntry>,
}

impl MergeIndex {
    /// Entries in emission order.
    pub fn entries(&self) -> &[MergeEntry] {
        &self.entries
    }

    /// Number of directed rows.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index directs no rows.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the merge index for a `Merge` block.
///
/// The data run is zipped from the mapped timestamps over
/// `[merge_data_lo, merge_data_hi]` with their absolute row ids; the OOO run
/// is the `[merge_ooo_lo, merge_ooo_hi]` slice of the batch index. Ties
/// resolve to the data side, preserving on-disk order when an OOO row lands
/// on an existing timestamp.
pub(crate) fn build(
    data_ts: &[i64],
    sorted: &[TsIndexEntry],
    merge_data_lo: i64,
    merge_data_hi: i64,
    merge_ooo_lo: i64,
    merge_ooo_hi: i64,
) -> Result<MergeIndex, SpliceError> {
    let data_len = (merge_data_hi - merge_data_lo + 1) as usize;
    let ooo_len = (merge_ooo_hi - merge_ooo_lo + 1) as usize;

    let mut scratch = Vec::new();
    reserve(&mut scratch, data_len)?;
    for row in merge_data_lo..=merge_data_hi {
        scratch.push(MergeEntry::data(data_ts[row as usize], row as u64));
    }
    let ooo_run = &sorted[merge_ooo_lo as usize..=merge_ooo_hi as usize];

    let mut entries = Vec::new();
    reserve(&mut entries, data_len + ooo_len)?;
    let (mut d, mut o) = (0, 0);
    while d < scratch.len() && o < ooo_run.len() {
        if scratch[d].ts <= ooo_run[o].ts {
            entries.push(scratch[d]);
            d += 1;
        } else {
            entries.push(MergeEntry::ooo(ooo_run[o].ts, ooo_run[o].row));
            o += 1;
        }
    }
    entries.extend_from_slice(&scratch[d..]);
    for entry in &ooo_run[o..] {
        entries.push(MergeEntry::ooo(entry.ts, entry.row));
    }

    Ok(MergeIndex { entries })
}

fn reserve(buf: &mut Vec<MergeEntry>, len: usize) -> Result<(), SpliceError> {
    buf.try_reserve_exact(len).map_err(|_| SpliceError::Alloc {
        bytes: len * mem::size_of::<MergeEntry>(),
    })
}
