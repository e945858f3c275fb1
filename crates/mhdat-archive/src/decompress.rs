//! Payload decompression.
//!
//! Payloads are DEFLATE streams, normally wrapped in a zlib header. A payload
//! without a valid zlib header is decoded as raw DEFLATE.

use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};

use flate2::read::{DeflateDecoder, ZlibDecoder};

use crate::{Error, Result};

const COPY_BUF_LEN: usize = 64 * 1024;

/// Largest expansion trusted when preallocating for a recorded size.
const MAX_PREALLOC_RATIO: u64 = 16;

/// How a payload's DEFLATE stream is framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// RFC 1950 zlib header and Adler-32 trailer.
    Zlib,
    /// Bare RFC 1951 stream.
    Raw,
}

impl Framing {
    /// Detect framing from the first bytes of a payload.
    pub fn detect(head: &[u8]) -> Self {
        match head {
            [cmf, flg, ..] if is_zlib_header(*cmf, *flg) => Self::Zlib,
            _ => Self::Raw,
        }
    }
}

/// Deflate method in CMF and a valid FCHECK.
fn is_zlib_header(cmf: u8, flg: u8) -> bool {
    cmf & 0x0F == 8 && (u16::from(cmf) << 8 | u16::from(flg)) % 31 == 0
}

/// Decompress the payload at `offset` into `writer`.
///
/// At most `compressed_size` bytes are consumed from `reader`. Returns the
/// number of decompressed bytes written. Corrupt input yields
/// [`Error::Decompression`]; a failing writer yields [`Error::Io`].
pub fn copy_payload<R, W>(
    reader: &mut R,
    offset: u64,
    compressed_size: u64,
    writer: &mut W,
) -> Result<u64>
where
    R: Read + Seek,
    W: Write + ?Sized,
{
    if compressed_size == 0 {
        return Ok(0);
    }

    reader.seek(SeekFrom::Start(offset))?;
    let mut source = BufReader::new(reader.take(compressed_size));
    let framing = Framing::detect(source.fill_buf()?);

    match framing {
        Framing::Zlib => pump(ZlibDecoder::new(source), writer),
        Framing::Raw => pump(DeflateDecoder::new(source), writer),
    }
}

/// Decompress the payload at `offset` into a new buffer.
///
/// `expected_size` only sizes the initial allocation, capped relative to
/// `compressed_size`.
pub fn decompress_payload<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    compressed_size: u64,
    expected_size: usize,
) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(capacity_hint(compressed_size, expected_size));
    copy_payload(reader, offset, compressed_size, &mut output)?;
    Ok(output)
}

fn capacity_hint(compressed_size: u64, expected_size: usize) -> usize {
    let cap = compressed_size.saturating_mul(MAX_PREALLOC_RATIO);
    usize::try_from((expected_size as u64).min(cap)).unwrap_or(0)
}

fn pump<D: Read, W: Write + ?Sized>(mut decoder: D, writer: &mut W) -> Result<u64> {
    let mut buffer = vec![0u8; COPY_BUF_LEN];
    let mut total = 0u64;

    loop {
        let n = decoder
            .read(&mut buffer)
            .map_err(|e| Error::Decompression(e.to_string()))?;
        if n == 0 {
            return Ok(total);
        }
        writer.write_all(&buffer[..n])?;
        total += n as u64;
    }
}
