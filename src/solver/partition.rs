//! Row distribution for the distributed solver.
//!
//! Splits `n` rows into `p` contiguous, balanced ranges. Every worker can
//! compute the full plan locally from `(n, p)`, so no coordination is needed
//! to agree on ownership.

/// Half-open interval `[start, end)` of global row indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

impl RowRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, row: usize) -> bool {
        row >= self.start && row < self.end
    }
}

/// Balanced contiguous partition of `n` rows over `p` workers.
///
/// With `base = n / p` and `remainder = n % p`, the first `remainder`
/// workers get `base + 1` rows and the rest get `base`. When `p > n` the
/// trailing workers own empty ranges.
pub fn plan_rows(n: usize, p: usize) -> Vec<RowRange> {
    assert!(p > 0, "worker group must have at least one member");
    let base = n / p;
    let remainder = n % p;

    let mut ranges = Vec::with_capacity(p);
    let mut offset = 0;
    for worker in 0..p {
        let rows = base + usize::from(worker < remainder);
        ranges.push(RowRange {
            start: offset,
            end: offset + rows,
        });
        offset += rows;
    }
    ranges
}

/// Worker index owning global row `row`.
///
/// Ranges are sorted and contiguous, so this is a binary search.
pub fn owner_of(ranges: &[RowRange], row: usize) -> Option<usize> {
    let idx = ranges.partition_point(|r| r.end <= row);
    ranges.get(idx).filter(|r| r.contains(row)).map(|_| idx)
}

/// Per-worker row counts, scaled by `width` values per row.
pub fn counts(ranges: &[RowRange], width: usize) -> Vec<usize> {
    ranges.iter().map(|r| r.len() * width).collect()
}
