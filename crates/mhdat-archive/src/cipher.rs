//! Entry header deobfuscation.
//!
//! Two segments of every entry record (the tree links and the name/metadata
//! block) are scrambled with a four-pass byte transform. The first byte is
//! only inverted; every following byte goes through two keystream XORs and
//! two permuting swaps.
//!
//! All key arithmetic is on `u32` with explicit wrapping.

/// Value a rolling key is reset to when it wraps to zero.
const KEY_RESET: u32 = 0x5A3C_96E7;

/// Decode a scrambled block into a new buffer.
pub fn decode(block: &[u8]) -> Vec<u8> {
    let mut buffer = block.to_vec();
    decode_in_place(&mut buffer);
    buffer
}

/// Decode a scrambled block in place.
///
/// An empty block is left untouched.
pub fn decode_in_place(buffer: &mut [u8]) {
    let Some(first) = buffer.first_mut() else {
        return;
    };
    *first = !*first;

    if buffer.len() == 1 {
        return;
    }

    let body = &mut buffer[1..];
    let max_i = body.len() as u32;

    xor_keystream(body, !max_i, |key, odd| key.rotate_right(if odd { 7 } else { 5 }));
    swap_pairs(body);
    xor_keystream(body, max_i, |key, odd| key.rotate_left(if odd { 17 } else { 11 }));
    mirror_swap(body);
}

/// XOR `body` with a rolling key.
///
/// The rotation applied to the key after each byte is selected by the low
/// bit of `rot_seed`, which is shifted right once per byte and reloaded from
/// `rot_seed` when it runs out.
fn xor_keystream(body: &mut [u8], rot_seed: u32, rotate: impl Fn(u32, bool) -> u32) {
    let mut key = 0u32;
    let mut rot_mod = rot_seed;

    for byte in body.iter_mut() {
        *byte ^= key as u8;

        key = rotate(key, rot_mod & 1 != 0).wrapping_add(1);
        if key == 0 {
            key = KEY_RESET;
        }

        rot_mod >>= 1;
        if rot_mod == 0 {
            rot_mod = rot_seed;
        }
    }
}

/// Swap adjacent byte pairs, masking each side. A trailing odd byte is kept.
fn swap_pairs(body: &mut [u8]) {
    for pair in body.chunks_exact_mut(2) {
        let tmp = pair[0] ^ 0x55;
        pair[0] = pair[1] ^ 0xAA;
        pair[1] = tmp;
    }
}

/// Swap bytes mirrored around the middle, masking each side.
fn mirror_swap(body: &mut [u8]) {
    let len = body.len();
    for i in 0..len / 2 {
        let j = len - 1 - i;
        let tmp = body[i] ^ 0xF0;
        body[i] = body[j] ^ 0x0F;
        body[j] = tmp;
    }
}

/// Scramble a block so that [`decode`] restores it. Used to build fixtures.
#[cfg(test)]
pub(crate) fn encode(block: &[u8]) -> Vec<u8> {
    let mut buffer = block.to_vec();
    buffer[0] = !buffer[0];
    if buffer.len() == 1 {
        return buffer;
    }

    let body = &mut buffer[1..];
    let max_i = body.len() as u32;
    let len = body.len();

    for i in 0..len / 2 {
        let j = len - 1 - i;
        let (a, b) = (body[i], body[j]);
        body[i] = b ^ 0xF0;
        body[j] = a ^ 0x0F;
    }
    xor_keystream(body, max_i, |key, odd| key.rotate_left(if odd { 17 } else { 11 }));
    for pair in body.chunks_exact_mut(2) {
        let (a, b) = (pair[0], pair[1]);
        pair[0] = b ^ 0x55;
        pair[1] = a ^ 0xAA;
    }
    xor_keystream(body, !max_i, |key, odd| key.rotate_right(if odd { 7 } else { 5 }));
    buffer
}
