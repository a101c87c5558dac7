//! Bisection over timestamp arrays with duplicate-key scan bias.

use std::cmp::Ordering;

use super::task::TsIndexEntry;

/// Which of several equal keys a search resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanBias {
    /// Lowest matching index.
    Up,
    /// Highest matching index.
    Down,
}

/// Locate `value` in `ts[lo..=hi]`.
///
/// When the key is present, the returned index honors `bias` across duplicate
/// runs. When it is absent, the index of the rightmost element strictly below
/// the key is returned, or `lo - 1` when every element in the window exceeds
/// it. Both flavors of the search share this contract, so results compose
/// across the raw and strided arrays.
pub fn bsearch_ts(ts: &[i64], value: i64, lo: i64, hi: i64, bias: ScanBias) -> i64 {
    bsearch_by(|i| ts[i as usize], value, lo, hi, bias)
}

/// [`bsearch_ts`] over `(timestamp, row)` entries, keyed on the timestamp.
pub fn bsearch_index(entries: &[TsIndexEntry], value: i64, lo: i64, hi: i64, bias: ScanBias) -> i64 {
    bsearch_by(|i| entries[i as usize].ts, value, lo, hi, bias)
}

fn bsearch_by(key: impl Fn(i64) -> i64, value: i64, lo: i64, hi: i64, bias: ScanBias) -> i64 {
    debug_assert!(lo >= 0);
    let (mut low, mut high) = (lo, hi);
    while low <= high {
        let mid = low + ((high - low) >> 1);
        match key(mid).cmp(&value) {
            Ordering::Less => low = mid + 1,
            Ordering::Greater => high = mid - 1,
            Ordering::Equal => {
                return match bias {
                    ScanBias::Up => lowest_equal(&key, value, lo, mid),
                    ScanBias::Down => highest_equal(&key, value, mid, hi),
                }
            }
        }
    }
    // absent: `high` settled just below the insertion point
    high
}

fn lowest_equal(key: &impl Fn(i64) -> i64, value: i64, lo: i64, found: i64) -> i64 {
    let (mut low, mut high) = (lo, found);
    while low < high {
        let mid = low + ((high - low) >> 1);
        if key(mid) == value {
            high = mid;
        } else {
            low = mid + 1;
        }
    }
    low
}

fn highest_equal(key: &impl Fn(i64) -> i64, value: i64, found: i64, hi: i64) -> i64 {
    let (mut low, mut high) = (found, hi);
    while low < high {
        let mid = low + ((high - low + 1) >> 1);
        if key(mid) == value {
            low = mid;
        } else {
            high = mid - 1;
        }
    }
    low
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &[i64] = &[10, 20, 20, 20, 30, 40];

    #[test]
    fn present_key_honors_bias() {
        assert_eq!(bsearch_ts(TS, 20, 0, 5, ScanBias::Up), 1);
        assert_eq!(bsearch_ts(TS, 20, 0, 5, ScanBias::Down), 3);
    }

    #[test]
    fn absent_key_resolves_to_the_floor() {
        assert_eq!(bsearch_ts(TS, 25, 0, 5, ScanBias::Up), 3);
        assert_eq!(bsearch_ts(TS, 25, 0, 5, ScanBias::Down), 3);
        assert_eq!(bsearch_ts(TS, 35, 0, 5, ScanBias::Down), 4);
    }

    #[test]
    fn key_below_the_window_lands_before_it() {
        assert_eq!(bsearch_ts(TS, 5, 0, 5, ScanBias::Down), -1);
        assert_eq!(bsearch_ts(TS, 15, 1, 5, ScanBias::Down), 0);
    }

    #[test]
    fn key_above_the_window_lands_on_its_end() {
        assert_eq!(bsearch_ts(TS, 99, 0, 5, ScanBias::Up), 5);
    }

    #[test]
    fn window_bounds_are_respected() {
        // duplicates outside the window must not be scanned into
        assert_eq!(bsearch_ts(TS, 20, 2, 5, ScanBias::Up), 2);
        assert_eq!(bsearch_ts(TS, 20, 0, 2, ScanBias::Down), 2);
    }

    #[test]
    fn strided_search_matches_the_raw_search() {
        let entries: Vec<TsIndexEntry> = TS
            .iter()
            .enumerate()
            .map(|(row, &ts)| TsIndexEntry::new(ts, row as u64))
            .collect();
        for value in [5, 10, 20, 25, 40, 99] {
            for bias in [ScanBias::Up, ScanBias::Down] {
                assert_eq!(
                    bsearch_index(&entries, value, 0, 5, bias),
                    bsearch_ts(TS, value, 0, 5, bias),
                    "value={value} bias={bias:?}"
                );
            }
        }
    }
}
