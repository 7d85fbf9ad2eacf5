// Integer-sequence helpers shared by the delta codec and the intersector.

/// Sort `values` ascending in place.
#[inline]
pub fn sort_ascending(values: &mut [u64]) {
    values.sort_unstable();
}

/// Index of the first element smaller than its predecessor, if any.
pub fn first_descent(values: &[u64]) -> Option<usize> {
    values
        .windows(2)
        .position(|w| w[1] < w[0])
        .map(|i| i + 1)
}

/// Successive differences of an ascending sequence; the first element is
/// taken against 0.
///
/// Input must be sorted ascending.
pub fn deltas(sorted: &[u64]) -> Vec<u64> {
    debug_assert!(sorted.is_sorted(), "deltas require ascending input");
    let mut prev = 0u64;
    sorted
        .iter()
        .map(|&n| {
            let d = n.wrapping_sub(prev);
            prev = n;
            d
        })
        .collect()
}

/// Replace each delta with the running sum up to and including it.
///
/// On overflow returns the index of the first element whose sum does not fit;
/// elements before it have already been rewritten.
pub fn prefix_sum_in_place(values: &mut [u64]) -> Result<(), usize> {
    let mut acc = 0u64;
    for (i, v) in values.iter_mut().enumerate() {
        acc = acc.checked_add(*v).ok_or(i)?;
        *v = acc;
    }
    Ok(())
}
