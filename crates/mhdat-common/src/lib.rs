//! Common utilities for mhdat.
//!
//! This crate provides the foundational types shared by the mhdat crates:
//!
//! - [`BinaryReader`] - Zero-copy little-endian reading from byte slices
//! - [`ReadExt`] - Fixed-size block and struct reads from byte streams
//! - [`ascii`] - Fixed-width ASCII field decoding

mod error;
mod reader;

pub mod ascii;

pub use error::{Error, Result};
pub use reader::{BinaryReader, ReadExt};

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, KnownLayout};
