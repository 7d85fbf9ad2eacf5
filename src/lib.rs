//! vbprox: variable-byte posting list compression and proximity intersection.
//!
//! The crate provides:
//! - A vbyte codec for `u64` lists with an optional delta mode (`vbyte`)
//! - Windowed two-pointer intersection of sorted lists (`intersect`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use vbprox::intersect::{Window, intersect};
//! use vbprox::vbyte;
//!
//! let a = vbyte::sort_and_delta_encode(&[100, 10, 50]);
//! let b = vbyte::encode(&[8, 12, 60, 95, 200], false);
//!
//! let a = vbyte::decode(&a, true).unwrap();
//! let b = vbyte::decode(&b, false).unwrap();
//!
//! let result = intersect(Window::new(5, 5), &a, &b).unwrap();
//! assert_eq!(result.matches(), [8, 12, 95]);
//! ```

pub mod intersect;
pub mod io;
pub mod vbyte;

#[cfg(feature = "cli")]
pub mod cli;
