//! Archive entry records.
//!
//! Every record starts with a plaintext type code and three flat-list fields,
//! followed by two scrambled segments:
//!
//! | Segment       | Size (dir / file) | Contents                                  |
//! |---------------|-------------------|-------------------------------------------|
//! | plain         | 16                | type, flags, prev, next                   |
//! | links         | 16                | prev sibling, next sibling, parent, child |
//! | name block    | 80 / 88           | NUL-terminated name; file metadata at 64  |

use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, Immutable, KnownLayout};

/// Size of the scrambled tree link segment.
pub const LINKS_LEN: usize = 16;
/// Maximum name length.
pub const NAME_LEN: usize = 80;
/// Size of a directory's scrambled name block.
pub const DIR_BLOCK_LEN: usize = 80;
/// Size of a file's scrambled name block.
pub const FILE_BLOCK_LEN: usize = 88;
/// Offset of the file metadata inside a file's name block.
pub const FILE_RECORD_OFFSET: usize = FILE_BLOCK_LEN - std::mem::size_of::<RawFileRecord>();

/// Entry type codes found at the start of each record.
pub mod type_code {
    /// A file entry.
    pub const FILE: u32 = 3;
    /// A directory entry.
    pub const DIRECTORY: u32 = 4;
    /// End of the entry listing.
    pub const END: u32 = 0xFFFF_FFFF;
    /// Alternate end-of-listing marker.
    pub const END_ALT: u32 = 0xFDFD_FDFD;

    /// Whether `code` terminates the listing.
    #[inline]
    pub const fn is_terminator(code: u32) -> bool {
        code == END || code == END_ALT
    }
}

/// Descrambled tree link segment.
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct RawTreeLinks {
    pub prev_sibling: U32,
    pub next_sibling: U32,
    pub parent: U32,
    pub first_child: U32,
}

/// Descrambled file metadata, the tail of a file's name block.
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct RawFileRecord {
    pub file_type: U32,
    pub unk2: U32,
    pub unk3: U32,
    pub compressed_size: U32,
    pub decompressed_size: U32,
    pub payload_offset: U32,
}

/// Tree links of an entry. An offset of zero means "none".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TreeLinks {
    pub prev_sibling: u32,
    pub next_sibling: u32,
    pub parent: u32,
    pub first_child: u32,
}

impl From<&RawTreeLinks> for TreeLinks {
    fn from(raw: &RawTreeLinks) -> Self {
        Self {
            prev_sibling: raw.prev_sibling.get(),
            next_sibling: raw.next_sibling.get(),
            parent: raw.parent.get(),
            first_child: raw.first_child.get(),
        }
    }
}

/// Metadata carried only by file entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FileRecord {
    /// File type code.
    pub file_type: u32,
    /// Opaque field.
    pub unk2: u32,
    /// Opaque field.
    pub unk3: u32,
    /// Size of the compressed payload.
    pub compressed_size: u32,
    /// Expected size after decompression.
    pub decompressed_size: u32,
    /// Absolute offset of the compressed payload.
    pub payload_offset: u32,
}

impl From<&RawFileRecord> for FileRecord {
    fn from(raw: &RawFileRecord) -> Self {
        Self {
            file_type: raw.file_type.get(),
            unk2: raw.unk2.get(),
            unk3: raw.unk3.get(),
            compressed_size: raw.compressed_size.get(),
            decompressed_size: raw.decompressed_size.get(),
            payload_offset: raw.payload_offset.get(),
        }
    }
}

/// Directory or file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "lowercase"))]
pub enum EntryKind {
    Directory,
    File(FileRecord),
}

/// A decoded entry record.
///
/// Entries are identified by `offset`, the byte position of the record in
/// the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Entry {
    /// Byte position of this record.
    pub offset: u32,
    /// Record flags.
    pub flags: u32,
    /// Flat-list predecessor. Stored, not interpreted.
    pub offset_prev: u32,
    /// Flat-list successor. Stored, not interpreted.
    pub offset_next: u32,
    /// Tree links.
    pub links: TreeLinks,
    /// Entry name.
    pub name: String,
    /// Directory or file payload metadata.
    pub kind: EntryKind,
}

impl Entry {
    /// Check if this entry is a file.
    #[inline]
    pub fn is_file(&self) -> bool {
        matches!(self.kind, EntryKind::File(_))
    }

    /// Check if this entry is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }

    /// File metadata, if this is a file.
    #[inline]
    pub fn file(&self) -> Option<&FileRecord> {
        match &self.kind {
            EntryKind::File(record) => Some(record),
            EntryKind::Directory => None,
        }
    }

    /// Offset of the parent entry, or `None` at the top level.
    #[inline]
    pub fn parent(&self) -> Option<u32> {
        match self.links.parent {
            0 => None,
            parent => Some(parent),
        }
    }

    /// Type code this entry was stored with.
    pub fn type_code(&self) -> u32 {
        match self.kind {
            EntryKind::File(_) => type_code::FILE,
            EntryKind::Directory => type_code::DIRECTORY,
        }
    }
}
