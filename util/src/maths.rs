//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;
use std::cmp::Ordering;

/// Return the median of a set of values.
///
/// For an even number of values the mean of the two middle values is returned. If the set is
/// empty `None` is returned. NaNs sort to the end of the set.
pub fn median<T>(values: &[T]) -> Option<T>
where
    T: Float,
{
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| match a.partial_cmp(b) {
        Some(o) => o,
        None if a.is_nan() && !b.is_nan() => Ordering::Greater,
        None if !a.is_nan() && b.is_nan() => Ordering::Less,
        None => Ordering::Equal,
    });

    let mid = sorted.len() / 2;

    if sorted.len() % 2 == 0 {
        let two = T::one() + T::one();
        Some((sorted[mid - 1] + sorted[mid]) / two)
    } else {
        Some(sorted[mid])
    }
}
