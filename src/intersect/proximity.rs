// Windowed two-pointer intersection.
//
// For ascending lists A and B, selects every b in B for which some a in A
// satisfies a - lower <= b <= a + upper. Each step advances exactly one
// cursor, so a scan costs at most |A| + |B| steps.

use thiserror::Error;

use crate::vbyte::sequence;

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

/// Inclusive tolerance around each element of the first list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Window {
    /// Distance allowed below `a`.
    pub lower: u64,
    /// Distance allowed above `a`.
    pub upper: u64,
}

impl Window {
    pub const fn new(lower: u64, upper: u64) -> Self {
        Self { lower, upper }
    }

    /// Exact-match window.
    pub const fn exact() -> Self {
        Self::new(0, 0)
    }

    /// Smallest value matched by `a`, saturating at 0.
    #[inline]
    pub const fn low(&self, a: u64) -> u64 {
        a.saturating_sub(self.lower)
    }

    /// Largest value matched by `a`, saturating at `u64::MAX`.
    #[inline]
    pub const fn high(&self, a: u64) -> u64 {
        a.saturating_add(self.upper)
    }

    #[inline]
    pub const fn contains(&self, a: u64, b: u64) -> bool {
        self.low(a) <= b && b <= self.high(a)
    }
}

// ---------------------------------------------------------------------------
// Results and errors
// ---------------------------------------------------------------------------

/// Matched elements of the second list, in list order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntersectionResult {
    matches: Vec<u64>,
    steps: usize,
}

impl IntersectionResult {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn matches(&self) -> &[u64] {
        &self.matches
    }

    pub fn into_matches(self) -> Vec<u64> {
        self.matches
    }

    /// Cursor advances performed by the scan.
    pub fn steps(&self) -> usize {
        self.steps
    }
}

/// Outcome of a count-only scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntersectionCount {
    pub count: usize,
    pub steps: usize,
}

/// Which input list broke the ordering precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::A => f.write_str("first"),
            Side::B => f.write_str("second"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IntersectError {
    /// An input list is not ascending; `index` is the first element smaller
    /// than its predecessor.
    #[error("{side} list is not sorted ascending at index {index}")]
    Unsorted { side: Side, index: usize },
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

/// Collect the elements of `b` lying within `window` of some element of `a`.
///
/// Both lists must be sorted ascending; otherwise nothing is computed and
/// [`IntersectError::Unsorted`] is returned.
pub fn intersect(
    window: Window,
    a: &[u64],
    b: &[u64],
) -> Result<IntersectionResult, IntersectError> {
    check_sorted(a, b)?;
    let mut matches = Vec::new();
    let steps = scan(window, a, b, |v| matches.push(v));
    Ok(IntersectionResult { matches, steps })
}

/// Like [`intersect`] but only counts matches.
pub fn intersect_count(
    window: Window,
    a: &[u64],
    b: &[u64],
) -> Result<IntersectionCount, IntersectError> {
    check_sorted(a, b)?;
    let mut count = 0usize;
    let steps = scan(window, a, b, |_| count += 1);
    Ok(IntersectionCount { count, steps })
}

fn check_sorted(a: &[u64], b: &[u64]) -> Result<(), IntersectError> {
    if let Some(index) = sequence::first_descent(a) {
        return Err(IntersectError::Unsorted {
            side: Side::A,
            index,
        });
    }
    if let Some(index) = sequence::first_descent(b) {
        return Err(IntersectError::Unsorted {
            side: Side::B,
            index,
        });
    }
    Ok(())
}

/// Run the two-pointer scan, calling `on_match` for each selected `b`.
/// Returns the number of cursor advances.
#[inline]
fn scan(window: Window, a: &[u64], b: &[u64], mut on_match: impl FnMut(u64)) -> usize {
    let (mut ia, mut ib) = (0usize, 0usize);
    let mut steps = 0usize;

    while ia < a.len() && ib < b.len() {
        let (va, vb) = (a[ia], b[ib]);
        if vb > window.high(va) {
            // No later b can match this a.
            ia += 1;
        } else {
            if vb >= window.low(va) {
                on_match(vb);
            }
            ib += 1;
        }
        steps += 1;
    }

    steps
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
