//! Archive preamble.

use std::io::Read;

use mhdat_common::{ascii, ReadExt};
use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, Immutable, KnownLayout};

use crate::{Error, Result};

/// Size of the archive name field.
pub const NAME_LEN: usize = 64;

/// On-disk layout of the archive preamble.
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct RawArchiveHeader {
    /// NUL-padded ASCII archive name
    pub name: [u8; NAME_LEN],
    /// Format version
    pub version: U32,
    /// Declared archive size in bytes
    pub archive_size: U32,
    /// Offset of the first entry record
    pub root_dir_offset: U32,
}

impl RawArchiveHeader {
    /// Header size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// Decoded archive preamble.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ArchiveHeader {
    /// Archive name.
    pub name: String,
    /// Format version. Not validated.
    pub version: u32,
    /// Declared archive size. Not validated.
    pub archive_size: u32,
    /// Byte offset of the first entry record.
    pub root_dir_offset: u32,
}

impl ArchiveHeader {
    /// Read the header from the current stream position.
    ///
    /// A stream shorter than the header yields [`Error::TruncatedHeader`].
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let raw: RawArchiveHeader = reader.read_struct().map_err(|e| {
            if e.is_eof() {
                Error::TruncatedHeader {
                    needed: RawArchiveHeader::SIZE,
                }
            } else {
                Error::Common(e)
            }
        })?;

        Ok(Self::from(&raw))
    }
}

impl From<&RawArchiveHeader> for ArchiveHeader {
    fn from(raw: &RawArchiveHeader) -> Self {
        Self {
            name: ascii::decode_nul_padded(&raw.name, NAME_LEN),
            version: raw.version.get(),
            archive_size: raw.archive_size.get(),
            root_dir_offset: raw.root_dir_offset.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header_bytes(name: &[u8], version: u32, size: u32, root: u32) -> Vec<u8> {
        let mut data = vec![0u8; NAME_LEN];
        data[..name.len()].copy_from_slice(name);
        data.extend_from_slice(&version.to_le_bytes());
        data.extend_from_slice(&size.to_le_bytes());
        data.extend_from_slice(&root.to_le_bytes());
        data
    }

    #[test]
    fn test_header_size() {
        assert_eq!(RawArchiveHeader::SIZE, 76);
    }

    #[test]
    fn test_read_header() {
        let mut cursor = Cursor::new(header_bytes(b"Schatz", 2, 4096, 76));
        let header = ArchiveHeader::read(&mut cursor).unwrap();

        assert_eq!(header.name, "Schatz");
        assert_eq!(header.version, 2);
        assert_eq!(header.archive_size, 4096);
        assert_eq!(header.root_dir_offset, 76);
        assert_eq!(cursor.position(), 76);
    }

    #[test]
    fn test_full_width_name() {
        let name = [b'x'; NAME_LEN];
        let mut cursor = Cursor::new(header_bytes(&name, 1, 0, 76));
        let header = ArchiveHeader::read(&mut cursor).unwrap();

        assert_eq!(header.name.len(), NAME_LEN);
    }

    #[test]
    fn test_truncated_header() {
        let mut data = header_bytes(b"T", 1, 0, 76);
        data.truncate(70);

        let err = ArchiveHeader::read(&mut Cursor::new(data)).unwrap_err();
        assert!(matches!(err, Error::TruncatedHeader { needed: 76 }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_empty_stream() {
        let err = ArchiveHeader::read(&mut Cursor::new(Vec::new())).unwrap_err();
        assert!(matches!(err, Error::TruncatedHeader { .. }));
    }
}
