// src/utils/distance.rs

//! Coarse distance between two selections.
//!
//! The score compares the sums of the code points of both strings. It runs
//! in a single pass and is order-insensitive, so two different strings with
//! equal sums (anagrams, shuffled digits) score as identical. Pages that need
//! finer detection should narrow their selection with filters or patterns.

/// Sum of the code points of a string.
fn code_point_sum(s: &str) -> u64 {
    s.chars().map(|c| u64::from(u32::from(c))).sum()
}

/// Distance in `[0, 1]` between two strings, `0` when their sums are equal.
pub fn distance(a: &str, b: &str) -> f64 {
    let sum_a = code_point_sum(a);
    let sum_b = code_point_sum(b);
    if sum_a == sum_b {
        return 0.0;
    }
    let (small, large) = if sum_a < sum_b {
        (sum_a, sum_b)
    } else {
        (sum_b, sum_a)
    };
    1.0 - small as f64 / large as f64
}

/// Whether the distance between two selections exceeds the threshold.
pub fn is_changed(cached: &str, current: &str, threshold: f64) -> bool {
    distance(cached, current) > threshold
}
