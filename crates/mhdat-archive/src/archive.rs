//! MHA archive reader.
//!
//! Opening an archive reads the header and decodes the complete entry
//! listing up front; payloads are decompressed on demand by seeking the same
//! stream.

use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use memmap2::Mmap;

use crate::decoder::read_entries;
use crate::decompress;
use crate::entry::Entry;
use crate::header::ArchiveHeader;
use crate::tree::TreeIndex;
use crate::{Error, Result};

/// An opened MHA archive over any seekable byte source.
pub struct MhaArchive<R> {
    reader: R,
    header: ArchiveHeader,
    tree: TreeIndex,
}

impl MhaArchive<Cursor<Mmap>> {
    /// Open an archive file by memory-mapping it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mmap = unsafe { Mmap::map(&file)? };

        Self::from_reader(Cursor::new(mmap))
    }
}

impl<R: Read + Seek> MhaArchive<R> {
    /// Parse the header and the full entry listing from `reader`.
    pub fn from_reader(mut reader: R) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let header = ArchiveHeader::read(&mut reader)?;

        let entries = read_entries(&mut reader, u64::from(header.root_dir_offset))?;
        let tree = TreeIndex::new(entries)?;

        log::debug!(
            "archive {:?} v{}: {} entries from offset {:#x}",
            header.name,
            header.version,
            tree.len(),
            header.root_dir_offset
        );

        Ok(Self {
            reader,
            header,
            tree,
        })
    }

    /// Get the archive header.
    #[inline]
    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// Get the archive name stored in the header.
    #[inline]
    pub fn name(&self) -> &str {
        &self.header.name
    }

    /// Get the entry tree.
    #[inline]
    pub fn tree(&self) -> &TreeIndex {
        &self.tree
    }

    /// Get the number of entries, directories included.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.tree.len()
    }

    /// Iterate over file entries in listing order.
    #[inline]
    pub fn files(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.tree.files()
    }

    /// Find a file by its `/`-joined path (case-insensitive).
    pub fn find(&self, path: &str) -> Option<&Entry> {
        self.tree.find(path)
    }

    /// Decompress a file's payload into `writer`.
    ///
    /// Returns the number of bytes written. Directories write nothing.
    pub fn copy_to<W: Write + ?Sized>(&mut self, entry: &Entry, writer: &mut W) -> Result<u64> {
        let Some(record) = entry.file() else {
            return Ok(0);
        };

        decompress::copy_payload(
            &mut self.reader,
            u64::from(record.payload_offset),
            u64::from(record.compressed_size),
            writer,
        )
    }

    /// Read a file's decompressed contents.
    pub fn read(&mut self, entry: &Entry) -> Result<Vec<u8>> {
        let record = entry
            .file()
            .ok_or_else(|| Error::EntryNotFound(format!("{} is a directory", entry.name)))?;

        decompress::decompress_payload(
            &mut self.reader,
            u64::from(record.payload_offset),
            u64::from(record.compressed_size),
            record.decompressed_size as usize,
        )
    }

    /// Read a file by its path.
    pub fn read_path(&mut self, path: &str) -> Result<Vec<u8>> {
        let entry = self
            .tree
            .find(path)
            .cloned()
            .ok_or_else(|| Error::EntryNotFound(path.to_string()))?;
        self.read(&entry)
    }

    /// Split into the underlying stream and the decoded tree.
    pub(crate) fn parts_mut(&mut self) -> (&mut R, &TreeIndex) {
        (&mut self.reader, &self.tree)
    }
}

impl<R> std::fmt::Debug for MhaArchive<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MhaArchive")
            .field("name", &self.header.name)
            .field("entries", &self.tree.len())
            .finish()
    }
}
