//! mhdat - phenomedia MHA archive extraction library.
//!
//! This crate provides a unified interface to the mhdat crates.
//!
//! # Crates
//!
//! - [`mhdat_common`] - Common utilities (binary reading, ASCII fields)
//! - [`mhdat_archive`] - MHA archive decoding and extraction
//!
//! # Example
//!
//! ```no_run
//! use mhdat::prelude::*;
//!
//! let mut archive = MhaArchive::open("mha.dat")?;
//! let data = archive.read_path("gfx/title.bmp")?;
//! println!("{} bytes", data.len());
//! # Ok::<(), mhdat::Error>(())
//! ```

use thiserror::Error;

// Re-export all sub-crates
pub use mhdat_archive as archive;
pub use mhdat_common as common;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use mhdat_archive::{
        extract, extract_with, ArchiveHeader, Entry, EntryKind, ExtractOptions, ExtractReport,
        FileRecord, MhaArchive, TreeIndex,
    };
    pub use mhdat_common::BinaryReader;
}

/// Any error produced by the mhdat crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Archive error.
    #[error(transparent)]
    Archive(#[from] mhdat_archive::Error),

    /// Low-level read error.
    #[error(transparent)]
    Common(#[from] mhdat_common::Error),
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
