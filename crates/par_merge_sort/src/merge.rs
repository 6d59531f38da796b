use std::cmp::Ordering;

use crate::SortError;

/// Merges the sorted halves `data[..mid]` and `data[mid..]` in place.
///
/// Both halves are copied into scratch buffers and interleaved back into
/// `data`. On equal keys the left buffer wins, which keeps the sort stable.
/// Returns `Ok(false)` when the halves were already in order and nothing
/// was moved.
pub(crate) fn merge_halves<T, F>(data: &mut [T], mid: usize, compare: &F) -> Result<bool, SortError>
where
    T: Clone,
    F: Fn(&T, &T) -> Ordering,
{
    debug_assert!(mid <= data.len());
    debug_assert!(is_sorted_by(&data[..mid], compare));
    debug_assert!(is_sorted_by(&data[mid..], compare));

    if mid == 0 || mid == data.len() {
        return Ok(false);
    }
    if compare(&data[mid - 1], &data[mid]) != Ordering::Greater {
        return Ok(false);
    }

    let left = scratch_copy(&data[..mid])?;
    let right = scratch_copy(&data[mid..])?;

    let mut i = 0usize;
    let mut j = 0usize;
    let mut k = 0usize;

    while i < left.len() && j < right.len() {
        if compare(&left[i], &right[j]) != Ordering::Greater {
            data[k] = left[i].clone();
            i += 1;
        } else {
            data[k] = right[j].clone();
            j += 1;
        }
        k += 1;
    }

    if i < left.len() {
        data[k..].clone_from_slice(&left[i..]);
    } else if j < right.len() {
        data[k..].clone_from_slice(&right[j..]);
    }

    Ok(true)
}

fn scratch_copy<T: Clone>(src: &[T]) -> Result<Vec<T>, SortError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(src.len())
        .map_err(|_| SortError::Allocation {
            requested: src.len(),
        })?;
    buf.extend_from_slice(src);
    Ok(buf)
}

pub(crate) fn is_sorted_by<T, F>(data: &[T], compare: &F) -> bool
where
    F: Fn(&T, &T) -> Ordering,
{
    data.windows(2)
        .all(|w| compare(&w[0], &w[1]) != Ordering::Greater)
}
