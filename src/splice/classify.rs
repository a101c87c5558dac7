//! Overlap classification of an OOO slice against existing partition data.
//!
//! The classifier decomposes the splice into up to three blocks the copy
//! stage streams sequentially: a prefix sourced wholly from one side, a
//! middle block (interleaved, or again single-sourced when one side's range
//! collapses), and a suffix. All extents are computed here so the copy stage
//! never searches.

use super::{
    search::{bsearch_index, bsearch_ts, ScanBias},
    task::TsIndexEntry,
};

/// Source of the rows inside one plan block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlockKind {
    /// Block absent.
    #[default]
    None,
    /// Rows come from the existing on-disk data.
    Data,
    /// Rows come from the OOO slice.
    Ooo,
    /// Rows interleave both sources via the merge index.
    Merge,
}

/// Timestamp and row bounds feeding the classifier.
///
/// `ooo_ts_max` must be the slice's own largest timestamp (the value at
/// `src_ooo_hi`). Branch selection compares it directly against the data
/// bounds, so a batch-wide maximum taken from a later partition would route
/// a fully-interior slice down the "outruns the data" branches.
#[derive(Clone, Copy, Debug)]
pub struct OverlapBounds {
    /// Smallest existing timestamp of the partition.
    pub data_ts_lo: i64,
    /// Largest existing timestamp of the partition.
    pub data_ts_hi: i64,
    /// Row count of the existing partition data.
    pub src_data_max: i64,
    /// First timestamp of the OOO slice.
    pub ooo_ts_lo: i64,
    /// Last timestamp of the OOO slice.
    pub ooo_ts_max: i64,
    /// First batch row of the slice (inclusive).
    pub src_ooo_lo: i64,
    /// Last batch row of the slice (inclusive).
    pub src_ooo_hi: i64,
}

/// Block decomposition of one partition splice.
///
/// Bounds are inclusive row indices into their respective sources; `-1`
/// marks the bounds of an absent block. The merge block keeps all four
/// bounds even when it degrades to a single source, because the copy stage
/// still needs the collapsed range to stitch the neighbors together.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplicePlan {
    /// Source of the prefix block.
    pub prefix_kind: BlockKind,
    /// First row of the prefix.
    pub prefix_lo: i64,
    /// Last row of the prefix.
    pub prefix_hi: i64,
    /// Source of the middle block.
    pub merge_kind: BlockKind,
    /// First data row of the middle block.
    pub merge_data_lo: i64,
    /// Last data row of the middle block.
    pub merge_data_hi: i64,
    /// First OOO row of the middle block.
    pub merge_ooo_lo: i64,
    /// Last OOO row of the middle block.
    pub merge_ooo_hi: i64,
    /// Source of the suffix block.
    pub suffix_kind: BlockKind,
    /// First row of the suffix.
    pub suffix_lo: i64,
    /// Last row of the suffix.
    pub suffix_hi: i64,
}

impl Default for SplicePlan {
    fn default() -> Self {
        Self {
            prefix_kind: BlockKind::None,
            prefix_lo: -1,
            prefix_hi: -1,
            merge_kind: BlockKind::None,
            merge_data_lo: -1,
            merge_data_hi: -1,
            merge_ooo_lo: -1,
            merge_ooo_hi: -1,
            suffix_kind: BlockKind::None,
            suffix_lo: -1,
            suffix_hi: -1,
        }
    }
}

impl SplicePlan {
    /// Plan for a brand-new partition: the whole slice appends as one block.
    pub fn pure_ooo_append(src_ooo_lo: i64, src_ooo_hi: i64) -> Self {
        Self {
            suffix_kind: BlockKind::Ooo,
            suffix_lo: src_ooo_lo,
            suffix_hi: src_ooo_hi,
            ..Self::default()
        }
    }
}

/// Decompose the overlap of the OOO slice with the existing partition rows.
///
/// `data_ts` are the partition's mapped timestamps, `sorted` the batch-wide
/// timestamp index. Both are non-decreasing. On equal timestamps at a block
/// boundary the data side is kept ahead of the OOO side within merge blocks;
/// an OOO run equal to the partition's first timestamp joins the prefix.
pub fn classify(data_ts: &[i64], sorted: &[TsIndexEntry], b: &OverlapBounds) -> SplicePlan {
    let mut plan = SplicePlan::default();

    if b.ooo_ts_lo > b.data_ts_lo {
        if b.ooo_ts_lo > b.data_ts_hi {
            // slice lands entirely after the existing rows
            plan.suffix_kind = BlockKind::Ooo;
            plan.suffix_lo = b.src_ooo_lo;
            plan.suffix_hi = b.src_ooo_hi;
        } else {
            // data head survives as the prefix
            plan.prefix_kind = BlockKind::Data;
            plan.prefix_lo = 0;
            plan.prefix_hi = bsearch_ts(
                data_ts,
                b.ooo_ts_lo,
                0,
                b.src_data_max - 1,
                ScanBias::Down,
            );
            plan.merge_data_lo = plan.prefix_hi + 1;
            plan.merge_ooo_lo = b.src_ooo_lo;

            if b.ooo_ts_max < b.data_ts_hi {
                // slice ends inside the data; data tail survives as the suffix
                plan.merge_ooo_hi = b.src_ooo_hi;
                plan.merge_data_hi = bsearch_ts(
                    data_ts,
                    b.ooo_ts_max - 1,
                    plan.merge_data_lo,
                    b.src_data_max - 1,
                    ScanBias::Down,
                ) + 1;

                if plan.merge_data_lo < plan.merge_data_hi {
                    plan.merge_kind = BlockKind::Merge;
                } else {
                    // slice implodes between two adjacent existing rows
                    plan.merge_kind = BlockKind::Ooo;
                    plan.merge_data_hi -= 1;
                }

                plan.suffix_kind = BlockKind::Data;
                plan.suffix_lo = plan.merge_data_hi + 1;
                plan.suffix_hi = b.src_data_max - 1;
            } else if b.ooo_ts_max > b.data_ts_hi {
                // slice outruns the data; OOO tail survives as the suffix
                plan.merge_ooo_hi = bsearch_index(
                    sorted,
                    b.data_ts_hi,
                    b.src_ooo_lo,
                    b.src_ooo_hi,
                    ScanBias::Up,
                );
                plan.merge_data_hi = b.src_data_max - 1;
                plan.merge_kind = BlockKind::Merge;
                plan.suffix_kind = BlockKind::Ooo;
                plan.suffix_lo = plan.merge_ooo_hi + 1;
                plan.suffix_hi = b.src_ooo_hi;
            } else {
                // both end on the same timestamp
                plan.merge_kind = BlockKind::Merge;
                plan.merge_ooo_hi = b.src_ooo_hi;
                plan.merge_data_hi = b.src_data_max - 1;
            }
        }
    } else {
        // OOO head survives as the prefix
        plan.prefix_kind = BlockKind::Ooo;
        plan.prefix_lo = b.src_ooo_lo;

        if b.data_ts_lo < b.ooo_ts_max {
            plan.merge_data_lo = 0;
            plan.prefix_hi = bsearch_index(
                sorted,
                b.data_ts_lo,
                b.src_ooo_lo,
                b.src_ooo_hi,
                ScanBias::Down,
            );
            plan.merge_ooo_lo = plan.prefix_hi + 1;

            if b.ooo_ts_max < b.data_ts_hi {
                // slice ends inside the data; data tail survives as the suffix
                plan.merge_kind = BlockKind::Merge;
                plan.merge_ooo_hi = b.src_ooo_hi;
                plan.merge_data_hi = bsearch_ts(
                    data_ts,
                    b.ooo_ts_max,
                    0,
                    b.src_data_max - 1,
                    ScanBias::Down,
                );

                plan.suffix_kind = BlockKind::Data;
                plan.suffix_lo = plan.merge_data_hi + 1;
                plan.suffix_hi = b.src_data_max - 1;
            } else if b.ooo_ts_max > b.data_ts_hi {
                // slice straddles the whole data range
                plan.merge_data_hi = b.src_data_max - 1;
                plan.merge_ooo_hi = bsearch_index(
                    sorted,
                    b.data_ts_hi - 1,
                    plan.merge_ooo_lo,
                    b.src_ooo_hi,
                    ScanBias::Down,
                ) + 1;

                if plan.merge_ooo_lo < plan.merge_ooo_hi {
                    plan.merge_kind = BlockKind::Merge;
                } else {
                    // existing rows implode between two adjacent slice rows
                    plan.merge_kind = BlockKind::Data;
                    plan.merge_ooo_hi -= 1;
                }

                if plan.merge_ooo_hi < b.src_ooo_hi {
                    plan.suffix_kind = BlockKind::Ooo;
                    plan.suffix_lo = plan.merge_ooo_hi + 1;
                    plan.suffix_hi = b.src_ooo_hi.max(plan.suffix_lo);
                } else {
                    plan.suffix_kind = BlockKind::None;
                }
            } else {
                // both end on the same timestamp
                plan.merge_kind = BlockKind::Merge;
                plan.merge_ooo_hi = b.src_ooo_hi;
                plan.merge_data_hi = b.src_data_max - 1;
            }
        } else {
            // whole slice precedes the existing rows
            plan.prefix_hi = b.src_ooo_hi;
            plan.suffix_kind = BlockKind::Data;
            plan.suffix_lo = 0;
            plan.suffix_hi = b.src_data_max - 1;
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(ts: &[i64]) -> Vec<TsIndexEntry> {
        ts.iter()
            .enumerate()
            .map(|(row, &ts)| TsIndexEntry::new(ts, row as u64))
            .collect()
    }

    fn bounds(data_ts: &[i64], ooo_ts: &[i64]) -> OverlapBounds {
        OverlapBounds {
            data_ts_lo: data_ts[0],
            data_ts_hi: *data_ts.last().expect("data"),
            src_data_max: data_ts.len() as i64,
            ooo_ts_lo: ooo_ts[0],
            ooo_ts_max: *ooo_ts.last().expect("ooo"),
            src_ooo_lo: 0,
            src_ooo_hi: ooo_ts.len() as i64 - 1,
        }
    }

    #[test]
    fn slice_entirely_after_data_is_a_pure_suffix() {
        let data = [10, 20, 30];
        let ooo = [40, 50, 60];
        let plan = classify(&data, &index_of(&ooo), &bounds(&data, &ooo));
        assert_eq!(plan.prefix_kind, BlockKind::None);
        assert_eq!(plan.merge_kind, BlockKind::None);
        assert_eq!(plan.suffix_kind, BlockKind::Ooo);
        assert_eq!((plan.suffix_lo, plan.suffix_hi), (0, 2));
    }

    #[test]
    fn slice_entirely_before_data_is_a_pure_prefix() {
        let data = [100, 200, 300, 400, 500];
        let ooo = [40, 50];
        let plan = classify(&data, &index_of(&ooo), &bounds(&data, &ooo));
        assert_eq!(plan.prefix_kind, BlockKind::Ooo);
        assert_eq!((plan.prefix_lo, plan.prefix_hi), (0, 1));
        assert_eq!(plan.merge_kind, BlockKind::None);
        assert_eq!(plan.suffix_kind, BlockKind::Data);
        assert_eq!((plan.suffix_lo, plan.suffix_hi), (0, 4));
    }

    #[test]
    fn equal_endpoints_do_not_merge_when_slice_precedes_data() {
        let data = [100, 200];
        let ooo = [50, 100];
        let plan = classify(&data, &index_of(&ooo), &bounds(&data, &ooo));
        assert_eq!(plan.prefix_kind, BlockKind::Ooo);
        assert_eq!((plan.prefix_lo, plan.prefix_hi), (0, 1));
        assert_eq!(plan.merge_kind, BlockKind::None);
        assert_eq!(plan.suffix_kind, BlockKind::Data);
    }

    #[test]
    fn interleave_in_the_middle_brackets_with_data() {
        let data = [10, 20, 30, 40, 50];
        let ooo = [22, 25, 35];
        let plan = classify(&data, &index_of(&ooo), &bounds(&data, &ooo));
        assert_eq!(plan.prefix_kind, BlockKind::Data);
        assert_eq!((plan.prefix_lo, plan.prefix_hi), (0, 1));
        assert_eq!(plan.merge_kind, BlockKind::Merge);
        assert_eq!((plan.merge_data_lo, plan.merge_data_hi), (2, 3));
        assert_eq!((plan.merge_ooo_lo, plan.merge_ooo_hi), (0, 2));
        assert_eq!(plan.suffix_kind, BlockKind::Data);
        assert_eq!((plan.suffix_lo, plan.suffix_hi), (4, 4));
    }

    #[test]
    fn slice_straddling_the_data_tail_splits_merge_and_suffix() {
        let data = [10, 20, 30];
        let ooo = [25, 35, 45];
        let plan = classify(&data, &index_of(&ooo), &bounds(&data, &ooo));
        assert_eq!(plan.prefix_kind, BlockKind::Data);
        assert_eq!((plan.prefix_lo, plan.prefix_hi), (0, 1));
        assert_eq!(plan.merge_kind, BlockKind::Merge);
        assert_eq!((plan.merge_data_lo, plan.merge_data_hi), (2, 2));
        assert_eq!((plan.merge_ooo_lo, plan.merge_ooo_hi), (0, 0));
        assert_eq!(plan.suffix_kind, BlockKind::Ooo);
        assert_eq!((plan.suffix_lo, plan.suffix_hi), (1, 2));
    }

    #[test]
    fn slice_imploding_between_adjacent_rows_degrades_the_merge() {
        let data = [10, 20, 30, 40];
        let ooo = [24, 26];
        let plan = classify(&data, &index_of(&ooo), &bounds(&data, &ooo));
        assert_eq!(plan.prefix_kind, BlockKind::Data);
        assert_eq!((plan.prefix_lo, plan.prefix_hi), (0, 1));
        // no data row falls inside (24, 26): middle block is pure OOO
        assert_eq!(plan.merge_kind, BlockKind::Ooo);
        assert_eq!((plan.merge_ooo_lo, plan.merge_ooo_hi), (0, 1));
        assert_eq!(plan.merge_data_hi, plan.merge_data_lo - 1);
        assert_eq!(plan.suffix_kind, BlockKind::Data);
        assert_eq!((plan.suffix_lo, plan.suffix_hi), (2, 3));
    }

    #[test]
    fn data_imploding_between_adjacent_slice_rows_degrades_the_merge() {
        // OOO wraps the data entirely, with no OOO row inside the data range
        let data = [30, 31];
        let ooo = [10, 20, 40, 50];
        let plan = classify(&data, &index_of(&ooo), &bounds(&data, &ooo));
        assert_eq!(plan.prefix_kind, BlockKind::Ooo);
        assert_eq!((plan.prefix_lo, plan.prefix_hi), (0, 1));
        assert_eq!(plan.merge_kind, BlockKind::Data);
        assert_eq!((plan.merge_data_lo, plan.merge_data_hi), (0, 1));
        assert_eq!(plan.merge_ooo_hi, plan.merge_ooo_lo - 1);
        assert_eq!(plan.suffix_kind, BlockKind::Ooo);
        assert_eq!((plan.suffix_lo, plan.suffix_hi), (2, 3));
    }

    #[test]
    fn slice_wrapping_the_data_with_interior_rows_merges_fully() {
        let data = [30, 40];
        let ooo = [10, 35, 50, 60];
        let plan = classify(&data, &index_of(&ooo), &bounds(&data, &ooo));
        assert_eq!(plan.prefix_kind, BlockKind::Ooo);
        assert_eq!((plan.prefix_lo, plan.prefix_hi), (0, 0));
        assert_eq!(plan.merge_kind, BlockKind::Merge);
        assert_eq!((plan.merge_data_lo, plan.merge_data_hi), (0, 1));
        // the first slice row at or above the data tail still merges
        assert_eq!((plan.merge_ooo_lo, plan.merge_ooo_hi), (1, 2));
        assert_eq!(plan.suffix_kind, BlockKind::Ooo);
        assert_eq!((plan.suffix_lo, plan.suffix_hi), (3, 3));
    }

    #[test]
    fn matching_tails_leave_no_suffix() {
        let data = [10, 20, 30];
        let ooo = [15, 30];
        let plan = classify(&data, &index_of(&ooo), &bounds(&data, &ooo));
        assert_eq!(plan.prefix_kind, BlockKind::Data);
        assert_eq!((plan.prefix_lo, plan.prefix_hi), (0, 0));
        assert_eq!(plan.merge_kind, BlockKind::Merge);
        assert_eq!((plan.merge_data_lo, plan.merge_data_hi), (1, 2));
        assert_eq!((plan.merge_ooo_lo, plan.merge_ooo_hi), (0, 1));
        assert_eq!(plan.suffix_kind, BlockKind::None);
    }

    #[test]
    fn ooo_rows_equal_to_the_data_head_join_the_prefix() {
        let data = [100, 200, 300];
        let ooo = [50, 100, 100, 150];
        let plan = classify(&data, &index_of(&ooo), &bounds(&data, &ooo));
        assert_eq!(plan.prefix_kind, BlockKind::Ooo);
        // both rows at ts=100 precede the data rows
        assert_eq!((plan.prefix_lo, plan.prefix_hi), (0, 2));
        assert_eq!(plan.merge_kind, BlockKind::Merge);
        assert_eq!((plan.merge_ooo_lo, plan.merge_ooo_hi), (3, 3));
        assert_eq!((plan.merge_data_lo, plan.merge_data_hi), (0, 0));
        assert_eq!(plan.suffix_kind, BlockKind::Data);
        assert_eq!((plan.suffix_lo, plan.suffix_hi), (1, 2));
    }

    #[test]
    fn partition_slices_use_their_row_window() {
        // slice rows 1..=2 of a larger batch target this partition; the
        // batch continues into a later partition at row 3
        let data = [10, 20, 30];
        let batch = [5, 12, 25, 100];
        let sorted = index_of(&batch);
        let b = OverlapBounds {
            data_ts_lo: 10,
            data_ts_hi: 30,
            src_data_max: 3,
            ooo_ts_lo: 12,
            ooo_ts_max: 25, // the slice's own last value, not the batch max
            src_ooo_lo: 1,
            src_ooo_hi: 2,
        };
        let plan = classify(&data, &sorted, &b);
        assert_eq!(plan.prefix_kind, BlockKind::Data);
        assert_eq!((plan.prefix_lo, plan.prefix_hi), (0, 0));
        assert_eq!(plan.merge_kind, BlockKind::Merge);
        assert_eq!((plan.merge_data_lo, plan.merge_data_hi), (1, 2));
        assert_eq!((plan.merge_ooo_lo, plan.merge_ooo_hi), (1, 2));
        // every remaining data row merged: the data suffix collapses empty
        assert_eq!(plan.suffix_kind, BlockKind::Data);
        assert_eq!((plan.suffix_lo, plan.suffix_hi), (3, 2));
    }
}
