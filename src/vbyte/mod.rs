// Variable-byte posting list codec.
//
// # Modules
//
// - `varint`  : Single-value vbyte encoding (base-128, little-endian,
//              terminator bit on the last byte)
// - `codec`   : Whole-list encode/decode, delta mode, lazy `Decoder`,
//              one-pass `summarize`
// - `sequence`: Sort, difference and prefix-sum helpers

pub mod codec;
pub mod sequence;
pub mod varint;

// Re-export key types for convenience.
pub use codec::{
    Decoder, ListSummary, decode, encode, encode_into, sort_and_delta_encode, summarize,
};
pub use varint::{DecodeError, MAX_VBYTE_LEN, encoded_len};
