//! Parallel utilities with feature-gated implementations
//!
//! Work is split into contiguous row ranges, one per worker. Worker pools are
//! built with rayon when the `rayon` feature is enabled; otherwise every
//! range runs sequentially on the calling thread.

use std::ops::Range;

/// Check if parallel processing is available
#[cfg(feature = "rayon")]
pub fn is_parallel_available() -> bool {
    true
}

/// Check if parallel processing is available
#[cfg(not(feature = "rayon"))]
pub fn is_parallel_available() -> bool {
    false
}

/// Split `num_rows` rows into at most `parts` contiguous, non-empty ranges
///
/// Range sizes differ by at most one, the first `num_rows % parts` ranges
/// taking the extra row. Zero rows yield no ranges.
pub fn partition_rows(num_rows: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.max(1).min(num_rows);
    if parts == 0 {
        return Vec::new();
    }

    let base = num_rows / parts;
    let extra = num_rows % parts;

    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    for p in 0..parts {
        let len = base + usize::from(p < extra);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// Build a dedicated pool with exactly `num_threads` workers
#[cfg(feature = "rayon")]
pub fn build_pool(num_threads: usize) -> crate::Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("spmm-worker-{i}"))
        .build()
        .map_err(|e| crate::SpmmError::ThreadPool(e.to_string()))
}

/// Parallel for_each over owned work items
#[cfg(feature = "rayon")]
pub fn parallel_for_each<T, F>(items: Vec<T>, f: F)
where
    T: Send,
    F: Fn(T) + Sync + Send,
{
    use rayon::prelude::*;
    items.into_par_iter().for_each(f);
}

/// Sequential for_each (fallback)
#[cfg(not(feature = "rayon"))]
pub fn parallel_for_each<T, F>(items: Vec<T>, f: F)
where
    F: Fn(T),
{
    items.into_iter().for_each(f);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_partition_even() {
        let ranges = partition_rows(8, 4);
        assert_eq!(ranges, vec![0..2, 2..4, 4..6, 6..8]);
    }

    #[test]
    fn test_partition_uneven() {
        let ranges = partition_rows(10, 4);
        assert_eq!(ranges, vec![0..3, 3..6, 6..8, 8..10]);
    }

    #[test]
    fn test_partition_more_parts_than_rows() {
        let ranges = partition_rows(3, 16);
        assert_eq!(ranges, vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn test_partition_degenerate() {
        assert!(partition_rows(0, 4).is_empty());
        assert_eq!(partition_rows(5, 0), vec![0..5]);
        assert_eq!(partition_rows(5, 1), vec![0..5]);
    }

    #[test]
    fn test_partition_covers_all_rows() {
        for rows in 0..40 {
            for parts in 1..9 {
                let ranges = partition_rows(rows, parts);
                let covered: Vec<usize> = ranges.iter().cloned().flatten().collect();
                assert_eq!(covered, (0..rows).collect::<Vec<_>>());

                let lens: Vec<usize> = ranges.iter().map(|r| r.len()).collect();
                if let (Some(max), Some(min)) = (lens.iter().max(), lens.iter().min()) {
                    assert!(max - min <= 1);
                    assert!(*min >= 1);
                }
            }
        }
    }

    #[test]
    fn test_parallel_for_each_visits_all() {
        let counter = AtomicUsize::new(0);
        parallel_for_each((1..=10).collect(), |x: usize| {
            counter.fetch_add(x, Ordering::Relaxed);
        });
        assert_eq!(counter.load(Ordering::Relaxed), 55);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_build_pool_thread_count() {
        let pool = build_pool(3).unwrap();
        assert_eq!(pool.current_num_threads(), 3);
    }
}
