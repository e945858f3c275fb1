//! Error types for the archive crate.

use thiserror::Error;

/// Errors that can occur when reading MHA archives.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] mhdat_common::Error),

    /// The stream ended before the archive header was complete.
    #[error("archive header truncated: needed {needed} bytes")]
    TruncatedHeader { needed: usize },

    /// The stream ended in the middle of an entry record.
    #[error("entry at offset {offset:#x} is truncated")]
    TruncatedEntry { offset: u32 },

    /// An entry carried a type code other than file or directory.
    #[error("unknown entry type {code:#010x} at offset {offset:#x}")]
    UnknownEntryType { offset: u32, code: u32 },

    /// A stream position does not fit the archive's 32-bit offsets.
    #[error("stream position {0:#x} exceeds 32-bit archive offsets")]
    OffsetOverflow(u64),

    /// Two entries claimed the same offset.
    #[error("duplicate entry offset {0:#x}")]
    DuplicateOffset(u32),

    /// An entry's parent offset does not refer to any decoded entry.
    #[error("entry at offset {offset:#x} references missing parent {parent:#x}")]
    MissingParent { offset: u32, parent: u32 },

    /// Following parent links from an entry never reached the root.
    #[error("parent chain of entry at offset {offset:#x} does not terminate")]
    ParentCycle { offset: u32 },

    /// An entry name cannot be used as a path component.
    #[error("entry at offset {offset:#x} has unusable name {name:?}")]
    InvalidName { offset: u32, name: String },

    /// Decompression error.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// Entry not found.
    #[error("entry not found: {0}")]
    EntryNotFound(String),
}

/// Broad classes of failure, deciding whether a run can continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed archive structure. Aborts the run.
    Format,
    /// Broken tree links. Aborts the affected path resolution.
    Reference,
    /// Malformed or truncated payload.
    Decompression,
    /// Filesystem or stream failure.
    Io,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TruncatedHeader { .. }
            | Self::TruncatedEntry { .. }
            | Self::UnknownEntryType { .. }
            | Self::OffsetOverflow(_)
            | Self::DuplicateOffset(_) => ErrorKind::Format,
            Self::MissingParent { .. }
            | Self::ParentCycle { .. }
            | Self::InvalidName { .. }
            | Self::EntryNotFound(_) => ErrorKind::Reference,
            Self::Decompression(_) => ErrorKind::Decompression,
            Self::Io(_) | Self::Common(_) => ErrorKind::Io,
        }
    }

    /// Whether this error invalidates the whole archive.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Format
    }

    /// Whether the input ended before a read completed.
    pub(crate) fn is_eof(&self) -> bool {
        match self {
            Self::Io(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            Self::Common(e) => e.is_eof(),
            _ => false,
        }
    }
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            Error::UnknownEntryType { offset: 76, code: 9 }.kind(),
            ErrorKind::Format
        );
        assert_eq!(
            Error::MissingParent { offset: 76, parent: 4 }.kind(),
            ErrorKind::Reference
        );
        assert_eq!(
            Error::Decompression("bad".into()).kind(),
            ErrorKind::Decompression
        );
        assert!(Error::TruncatedHeader { needed: 76 }.is_fatal());
        assert!(!Error::Decompression("bad".into()).is_fatal());
    }

    #[test]
    fn test_display() {
        let err = Error::UnknownEntryType { offset: 0x4c, code: 7 };
        assert_eq!(err.to_string(), "unknown entry type 0x00000007 at offset 0x4c");
    }
}
