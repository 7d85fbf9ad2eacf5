// Variable-byte (vbyte) integer encoding.
//
// Base-128, little-endian: least-significant group first.
// Every byte has bit 7 clear except the final byte of a value, which has it
// set. This is the inverse of LEB128, where the high bit marks
// continuation.

use std::io::{self, Write};

use thiserror::Error;

/// Maximum encoded length for a 64-bit value (ceil(64/7) = 10).
pub const MAX_VBYTE_LEN: usize = 10;

/// High bit marking the last byte of a value.
pub const TERMINATOR: u8 = 0x80;

const GROUP_MASK: u8 = 0x7F;

/// The 10th group only holds bit 63.
const LAST_GROUP_MAX: u64 = 1;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode `num` into the front of `buf`.
/// Returns the number of bytes written (1..=10).
#[inline]
pub fn encode_to_array(mut num: u64, buf: &mut [u8; MAX_VBYTE_LEN]) -> usize {
    let mut i = 0;
    loop {
        let low = (num as u8) & GROUP_MASK;
        if num < 128 {
            buf[i] = low | TERMINATOR;
            return i + 1;
        }
        buf[i] = low;
        num >>= 7;
        i += 1;
    }
}

/// Append the encoding of `num` to `out`.
/// Returns the number of bytes written (1..=10).
#[inline]
pub fn encode_u64(num: u64, out: &mut Vec<u8>) -> usize {
    let mut buf = [0u8; MAX_VBYTE_LEN];
    let len = encode_to_array(num, &mut buf);
    out.extend_from_slice(&buf[..len]);
    len
}

/// Encode a `u64` and write to a `Write` sink.
pub fn write_u64<W: Write>(w: &mut W, num: u64) -> io::Result<()> {
    let mut buf = [0u8; MAX_VBYTE_LEN];
    let len = encode_to_array(num, &mut buf);
    w.write_all(&buf[..len])
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode one value from the front of `data`.
/// Returns `(value, bytes_consumed)`.
///
/// Error offsets are relative to `data`.
pub fn read_u64(data: &[u8]) -> Result<(u64, usize), DecodeError> {
    let mut val: u64 = 0;
    for (i, &byte) in data.iter().enumerate() {
        let group = u64::from(byte & GROUP_MASK);
        if i >= MAX_VBYTE_LEN || (i == MAX_VBYTE_LEN - 1 && group > LAST_GROUP_MAX) {
            return Err(DecodeError::Overflow { offset: 0 });
        }
        val |= group << (7 * i);
        if byte & TERMINATOR != 0 {
            return Ok((val, i + 1));
        }
    }
    Err(DecodeError::Truncated {
        offset: 0,
        pending: data.len(),
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Return the encoded byte-length of a `u64` value.
#[inline]
pub fn encoded_len(num: u64) -> usize {
    let bits = 64 - num.leading_zeros();
    (bits.max(1).div_ceil(7) as usize).min(MAX_VBYTE_LEN)
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Failure to decode a vbyte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The buffer ended before the terminating byte of the last value.
    #[error("truncated vbyte input: value at byte {offset} has {pending} byte(s) and no terminator")]
    Truncated { offset: usize, pending: usize },
    /// The value at `offset` does not fit in 64 bits.
    #[error("vbyte overflow: value at byte {offset} exceeds 64 bits")]
    Overflow { offset: usize },
    /// The running sum of a delta-encoded list passed `u64::MAX`.
    #[error("delta overflow: prefix sum at value {index} exceeds 64 bits")]
    DeltaOverflow { index: usize },
}

impl DecodeError {
    /// Shift a slice-relative byte offset by `base`.
    pub(crate) fn rebase(self, base: usize) -> Self {
        match self {
            Self::Truncated { offset, pending } => Self::Truncated {
                offset: offset + base,
                pending,
            },
            Self::Overflow { offset } => Self::Overflow {
                offset: offset + base,
            },
            other => other,
        }
    }
}

impl From<DecodeError> for io::Error {
    fn from(e: DecodeError) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, e)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
