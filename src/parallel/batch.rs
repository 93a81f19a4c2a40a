//! Batch boundaries for chunked simulation.
//!
//! The progress-reporting runner walks these ranges in order, checking for
//! cancellation between them; each range itself runs in parallel.

/// Split `total` items into up to `num_batches` ranges `[start, end)`.
/// Batches are as equal in size as possible; later batches may be smaller.
///
/// # Example
/// ```
/// # use shinsen::parallel::batch_ranges;
/// let ranges = batch_ranges(100, 4);
/// assert_eq!(ranges, vec![(0, 25), (25, 50), (50, 75), (75, 100)]);
/// ```
pub fn batch_ranges(total: usize, num_batches: usize) -> Vec<(usize, usize)> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let num_batches = num_batches.min(total);
    let base = total / num_batches;
    let remainder = total % num_batches;
    let mut ranges = Vec::with_capacity(num_batches);
    let mut start = 0;
    for i in 0..num_batches {
        let size = base + usize::from(i < remainder);
        let end = start + size;
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// Pick a batch count so each batch holds roughly `batch_size` runs.
pub fn batches_for(total: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 1;
    }
    total.div_ceil(batch_size).max(1)
}
