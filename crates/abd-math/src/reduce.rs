//! Deterministic reductions.
//!
//! Parallel kernels compute per-item contributions into an ordered buffer
//! and reduce them here, so the summation order never depends on thread
//! scheduling.

use std::ops::Add;

/// Sums `items` with a fixed pairwise tree.
///
/// Same input order gives bit-identical output regardless of how the
/// items were produced.
pub fn pairwise_sum<T: Copy + Add<Output = T>>(items: &[T], zero: T) -> T {
    match items.len() {
        0 => zero,
        1 => items[0],
        n => {
            let (lo, hi) = items.split_at(n / 2);
            pairwise_sum(lo, zero) + pairwise_sum(hi, zero)
        }
    }
}
