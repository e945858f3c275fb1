//! Sequential entry record decoder.
//!
//! Records are packed back to back from the root directory offset until a
//! terminator code or the end of the stream. Each call to
//! [`EntryDecoder::decode_next`] consumes exactly one record.

use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use mhdat_common::{BinaryReader, ReadExt};

use crate::cipher;
use crate::entry::{
    type_code, Entry, EntryKind, FileRecord, RawFileRecord, RawTreeLinks, TreeLinks,
    DIR_BLOCK_LEN, FILE_BLOCK_LEN, FILE_RECORD_OFFSET, LINKS_LEN, NAME_LEN,
};
use crate::{Error, Result};

/// Result of decoding one record position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// A directory or file record.
    Entry(Entry),
    /// A terminator code, or the end of the stream.
    EndOfListing,
    /// A type code that is neither file, directory nor terminator.
    UnknownType { offset: u32, code: u32 },
}

/// Reads entry records from a seekable stream.
///
/// As an [`Iterator`] it yields every entry once and then stops for good; an
/// unknown type code or a read failure is yielded as the final item.
pub struct EntryDecoder<'a, R> {
    reader: &'a mut R,
    stream_len: u64,
    finished: bool,
}

impl<'a, R: Read + Seek> EntryDecoder<'a, R> {
    /// Position `reader` at `start` and prepare to decode records from there.
    pub fn new(reader: &'a mut R, start: u64) -> Result<Self> {
        let stream_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(start))?;

        Ok(Self {
            reader,
            stream_len,
            finished: false,
        })
    }

    /// Decode the record at the current stream position.
    pub fn decode_next(&mut self) -> Result<DecodeOutcome> {
        let position = self.reader.stream_position()?;
        if position >= self.stream_len {
            return Ok(DecodeOutcome::EndOfListing);
        }

        let offset = u32::try_from(position).map_err(|_| Error::OffsetOverflow(position))?;

        self.read_record(offset).map_err(|e| {
            if e.is_eof() {
                Error::TruncatedEntry { offset }
            } else {
                e
            }
        })
    }

    fn read_record(&mut self, offset: u32) -> Result<DecodeOutcome> {
        let code = self.reader.read_u32::<LittleEndian>()?;
        if type_code::is_terminator(code) {
            return Ok(DecodeOutcome::EndOfListing);
        }

        let is_file = match code {
            type_code::FILE => true,
            type_code::DIRECTORY => false,
            _ => return Ok(DecodeOutcome::UnknownType { offset, code }),
        };

        let flags = self.reader.read_u32::<LittleEndian>()?;
        let offset_prev = self.reader.read_u32::<LittleEndian>()?;
        let offset_next = self.reader.read_u32::<LittleEndian>()?;

        let mut links = self.reader.read_block(LINKS_LEN)?;
        cipher::decode_in_place(&mut links);
        let raw_links: RawTreeLinks = BinaryReader::new(&links).read_struct()?;

        let block_len = if is_file { FILE_BLOCK_LEN } else { DIR_BLOCK_LEN };
        let mut block = self.reader.read_block(block_len)?;
        cipher::decode_in_place(&mut block);

        let mut block_reader = BinaryReader::new(&block);
        let name = block_reader.read_ascii_in_buffer(NAME_LEN)?;

        let kind = if is_file {
            block_reader.seek(FILE_RECORD_OFFSET);
            let raw: RawFileRecord = block_reader.read_struct()?;
            EntryKind::File(FileRecord::from(&raw))
        } else {
            EntryKind::Directory
        };

        let entry = Entry {
            offset,
            flags,
            offset_prev,
            offset_next,
            links: TreeLinks::from(&raw_links),
            name,
            kind,
        };

        log::debug!(
            "decoded {} {:?} at {:#x} (parent {:#x})",
            if is_file { "file" } else { "directory" },
            entry.name,
            entry.offset,
            entry.links.parent
        );

        Ok(DecodeOutcome::Entry(entry))
    }
}

impl<R: Read + Seek> Iterator for EntryDecoder<'_, R> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.decode_next() {
            Ok(DecodeOutcome::Entry(entry)) => Some(Ok(entry)),
            Ok(DecodeOutcome::EndOfListing) => {
                self.finished = true;
                None
            }
            Ok(DecodeOutcome::UnknownType { offset, code }) => {
                self.finished = true;
                Some(Err(Error::UnknownEntryType { offset, code }))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read + Seek> std::iter::FusedIterator for EntryDecoder<'_, R> {}

/// Decode every entry from `start` to the end of the listing.
pub fn read_entries<R: Read + Seek>(reader: &mut R, start: u64) -> Result<Vec<Entry>> {
    EntryDecoder::new(reader, start)?.collect()
}
