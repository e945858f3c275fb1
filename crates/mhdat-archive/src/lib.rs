//! MHA data archive reader for phenomedia games.
//!
//! An MHA archive is a single file holding a tree of directory and file
//! records followed by independently compressed payloads:
//!
//! - A 76-byte header (name, version, size, offset of the first record)
//! - Packed entry records, each with two segments scrambled by a four-pass
//!   byte transform (see [`cipher`])
//! - zlib-framed DEFLATE payloads addressed by absolute offset
//!
//! Opening an archive decodes every record before any payload is touched,
//! because a record's parent may appear anywhere in the listing.
//!
//! # Example
//!
//! ```no_run
//! use mhdat_archive::{extract, ExtractOptions, MhaArchive};
//!
//! let mut archive = MhaArchive::open("mha.dat")?;
//!
//! for entry in archive.files() {
//!     println!("{}", archive.tree().display_path(entry)?);
//! }
//!
//! let report = extract(&mut archive, &ExtractOptions::new("out"))?;
//! println!("{}/{} files", report.succeeded, report.total);
//! # Ok::<(), mhdat_archive::Error>(())
//! ```

mod archive;
mod decoder;
mod decompress;
mod entry;
mod error;
mod extract;
mod header;
mod tree;

pub mod cipher;

#[cfg(test)]
mod test_utils;

pub use archive::MhaArchive;
pub use decoder::{read_entries, DecodeOutcome, EntryDecoder};
pub use decompress::{copy_payload, Framing};
pub use entry::{type_code, Entry, EntryKind, FileRecord, TreeLinks};
pub use error::{Error, ErrorKind, Result};
pub use extract::{
    extract, extract_with, ExtractFailure, ExtractOptions, ExtractReport, FileOutcome,
    DEFAULT_OUTPUT_ROOT,
};
pub use header::ArchiveHeader;
pub use tree::TreeIndex;
