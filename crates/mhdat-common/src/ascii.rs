//! Fixed-width ASCII field decoding.
//!
//! Archive names are stored in NUL-padded fixed-size buffers. Bytes outside
//! the ASCII range are replaced with `?`.

/// Decode a NUL-terminated ASCII string from a fixed-size buffer.
///
/// Reads up to the first NUL byte, or at most `max_len` bytes when no NUL
/// occurs earlier.
pub fn decode_nul_padded(bytes: &[u8], max_len: usize) -> String {
    let field = &bytes[..bytes.len().min(max_len)];
    let end = memchr::memchr(0, field).unwrap_or(field.len());

    field[..end]
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect()
}
