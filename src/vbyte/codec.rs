// Sequence-level vbyte codec.
//
// Encodes whole posting lists into a bare stream of vbyte groups (no header,
// no length prefix) and decodes them back, optionally through a delta
// transform for sorted lists.

use super::sequence;
use super::varint::{self, DecodeError};

/// Encode `values` into a new buffer.
///
/// With `delta`, `values` must already be sorted ascending; successive
/// differences are encoded instead of the values themselves. Unsorted input
/// panics in debug builds. In release builds a descent wraps around, and
/// delta decoding then fails with [`DecodeError::DeltaOverflow`]. Use
/// [`sort_and_delta_encode`] when the order is not known.
pub fn encode(values: &[u64], delta: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() + values.len() / 2);
    encode_into(values, delta, &mut out);
    out
}

/// Append the encoding of `values` to `out`. See [`encode`].
pub fn encode_into(values: &[u64], delta: bool, out: &mut Vec<u8>) {
    if delta {
        for d in sequence::deltas(values) {
            varint::encode_u64(d, out);
        }
    } else {
        for &v in values {
            varint::encode_u64(v, out);
        }
    }
}

/// Sort a copy of `values`, then delta-encode it.
pub fn sort_and_delta_encode(values: &[u64]) -> Vec<u8> {
    let mut sorted = values.to_vec();
    sequence::sort_ascending(&mut sorted);
    encode(&sorted, true)
}

/// Decode a whole buffer.
///
/// With `delta`, the decoded differences are prefix-summed so the result is
/// the original ascending list. An empty buffer decodes to an empty list.
pub fn decode(data: &[u8], delta: bool) -> Result<Vec<u64>, DecodeError> {
    let mut out = Vec::with_capacity(data.len() / 2);
    for value in Decoder::new(data) {
        out.push(value?);
    }
    if delta {
        sequence::prefix_sum_in_place(&mut out)
            .map_err(|index| DecodeError::DeltaOverflow { index })?;
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Iterator
// ---------------------------------------------------------------------------

/// Lazy decoder over an encoded buffer.
///
/// Yields one item per value. After the first error the iterator is fused.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
    delta: Option<DeltaState>,
    failed: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct DeltaState {
    acc: u64,
    index: usize,
}

impl<'a> Decoder<'a> {
    /// Decode plain values.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            delta: None,
            failed: false,
        }
    }

    /// Decode a delta-encoded list, yielding the running sums.
    pub fn with_delta(data: &'a [u8]) -> Self {
        Self {
            delta: Some(DeltaState::default()),
            ..Self::new(data)
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl Iterator for Decoder<'_> {
    type Item = Result<u64, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.data.len() {
            return None;
        }
        let item = varint::read_u64(&self.data[self.pos..])
            .map_err(|e| e.rebase(self.pos))
            .and_then(|(value, len)| {
                self.pos += len;
                match &mut self.delta {
                    None => Ok(value),
                    Some(state) => {
                        let index = state.index;
                        state.index += 1;
                        state.acc = state
                            .acc
                            .checked_add(value)
                            .ok_or(DecodeError::DeltaOverflow { index })?;
                        Ok(state.acc)
                    }
                }
            });
        self.failed = item.is_err();
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let remaining = self.data.len() - self.pos;
        (usize::from(remaining > 0), Some(remaining))
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Shape of an encoded list, gathered in one pass without collecting it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListSummary {
    pub values: usize,
    pub bytes: usize,
    pub min: Option<u64>,
    pub max: Option<u64>,
    /// Every value is >= its predecessor.
    pub ascending: bool,
}

pub fn summarize(data: &[u8], delta: bool) -> Result<ListSummary, DecodeError> {
    let decoder = if delta {
        Decoder::with_delta(data)
    } else {
        Decoder::new(data)
    };
    let mut summary = ListSummary {
        bytes: data.len(),
        ascending: true,
        ..Default::default()
    };
    let mut prev = None;
    for value in decoder {
        let v = value?;
        summary.values += 1;
        summary.min = Some(summary.min.map_or(v, |m| m.min(v)));
        summary.max = Some(summary.max.map_or(v, |m| m.max(v)));
        if prev.is_some_and(|p| v < p) {
            summary.ascending = false;
        }
        prev = Some(v);
    }
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "ascending")]
    fn delta_encode_of_unsorted_input_panics_in_debug() {
        encode(&[5, 3], true);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn delta_encode_of_unsorted_input_fails_to_decode() {
        let bytes = encode(&[5, 3], true);
        assert_eq!(
            decode(&bytes, true),
            Err(DecodeError::DeltaOverflow { index: 1 })
        );
    }

    #[test]
    fn sort_and_delta_encode_accepts_unsorted_input() {
        let bytes = sort_and_delta_encode(&[5, 3]);
        assert_eq!(decode(&bytes, true).unwrap(), [3, 5]);
    }

    #[test]
    fn empty_roundtrip() {
        assert!(encode(&[], false).is_empty());
        assert!(sort_and_delta_encode(&[]).is_empty());
        assert_eq!(decode(&[], false).unwrap(), Vec::<u64>::new());
        assert_eq!(decode(&[], true).unwrap(), Vec::<u64>::new());
    }

    #[test]
    fn plain_roundtrip_preserves_order() {
        let values = [500u64, 0, 127, 128, u64::MAX, 7, 7];
        let enc = encode(&values, false);
        assert_eq!(decode(&enc, false).unwrap(), values);
    }

    #[test]
    fn delta_roundtrip_sorts() {
        let values = [900u64, 3, 77, 3, 1 << 40];
        let enc = sort_and_delta_encode(&values);
        assert_eq!(decode(&enc, true).unwrap(), [3, 3, 77, 900, 1 << 40]);
    }

    #[test]
    fn delta_encoding_is_smaller_for_dense_lists() {
        let values: Vec<u64> = (0..1000u64).map(|i| 1_000_000 + i * 3).collect();
        let plain = encode(&values, false);
        let delta = encode(&values, true);
        assert_eq!(plain.len(), 3000);
        // First value takes 3 bytes, every gap of 3 takes one.
        assert_eq!(delta.len(), 3 + 999);
    }

    #[test]
    fn known_bytes() {
        assert_eq!(encode(&[1, 300], false), [0x81, 0x2C, 0x82]);
        // Deltas 5, 0, 1.
        assert_eq!(encode(&[5, 5, 6], true), [0x85, 0x80, 0x81]);
    }

    #[test]
    fn truncated_tail_is_an_error() {
        let mut enc = encode(&[1, 2, 300], false);
        enc.pop();
        assert_eq!(
            decode(&enc, false),
            Err(DecodeError::Truncated {
                offset: 2,
                pending: 1
            })
        );
    }

    #[test]
    fn delta_overflow_is_an_error() {
        let mut enc = encode(&[u64::MAX], false);
        enc.extend(encode(&[1], false));
        assert_eq!(
            decode(&enc, true),
            Err(DecodeError::DeltaOverflow { index: 1 })
        );
        // Plain mode accepts the same bytes.
        assert_eq!(decode(&enc, false).unwrap(), [u64::MAX, 1]);
    }

    #[test]
    fn iterator_matches_bulk_decode() {
        let values = [10u64, 20, 20, 1 << 33];
        let enc = encode(&values, true);
        let streamed: Vec<u64> = Decoder::with_delta(&enc)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(streamed, values);
    }

    #[test]
    fn iterator_fuses_after_error() {
        let data = [0x81, 0x01];
        let mut it = Decoder::new(&data);
        assert_eq!(it.next(), Some(Ok(1)));
        assert_eq!(it.position(), 1);
        assert!(matches!(
            it.next(),
            Some(Err(DecodeError::Truncated { offset: 1, .. }))
        ));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn summary_of_plain_and_delta_lists() {
        let plain = encode(&[40, 2, 900], false);
        let s = summarize(&plain, false).unwrap();
        assert_eq!(s.values, 3);
        assert_eq!(s.bytes, plain.len());
        assert_eq!((s.min, s.max), (Some(2), Some(900)));
        assert!(!s.ascending);

        let delta = sort_and_delta_encode(&[40, 2, 900]);
        let s = summarize(&delta, true).unwrap();
        assert_eq!((s.min, s.max), (Some(2), Some(900)));
        assert!(s.ascending);

        let s = summarize(&[], false).unwrap();
        assert_eq!((s.values, s.min, s.max), (0, None, None));
    }
}
