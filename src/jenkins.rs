//! Jenkins lookup2 hashing
//!
//! A faithful rendition of Bob Jenkins' lookup2 mix, the hash behind ring
//! placement in [`HashRing`](crate::HashRing). The output is deterministic
//! for a given input on every platform and in every build, which is the
//! property consistent hashing actually needs; it is emphatically not a
//! cryptographic hash.
//!
//! All state lives in locals, so the functions are freely callable from any
//! thread.

/// Initialization constant from the reference implementation (the golden
/// ratio, an arbitrary value).
const GOLDEN_RATIO: u32 = 0x9e37_79b9;

/// One round of the lookup2 avalanche over the three lanes.
#[inline]
fn mix(mut a: u32, mut b: u32, mut c: u32) -> (u32, u32, u32) {
    a = a.wrapping_sub(b).wrapping_sub(c) ^ (c >> 13);
    b = b.wrapping_sub(c).wrapping_sub(a) ^ (a << 8);
    c = c.wrapping_sub(a).wrapping_sub(b) ^ (b >> 13);
    a = a.wrapping_sub(b).wrapping_sub(c) ^ (c >> 12);
    b = b.wrapping_sub(c).wrapping_sub(a) ^ (a << 16);
    c = c.wrapping_sub(a).wrapping_sub(b) ^ (b >> 5);
    a = a.wrapping_sub(b).wrapping_sub(c) ^ (c >> 3);
    b = b.wrapping_sub(c).wrapping_sub(a) ^ (a << 10);
    c = c.wrapping_sub(a).wrapping_sub(b) ^ (b >> 15);
    (a, b, c)
}

/// Hash an arbitrary byte string to a uniformly distributed `u32`.
///
/// Bytes are consumed little-endian in 12-byte blocks; the input length is
/// folded into the `c` lane, and trailing bytes fill the lanes back up with
/// the low byte of `c` left to the length.
///
/// # Examples
///
/// ```
/// use ordena::jenkins;
///
/// let h = jenkins::hash_bytes(b"silo-42");
/// assert_eq!(h, jenkins::hash_bytes(b"silo-42"));
/// assert_ne!(h, jenkins::hash_bytes(b"silo-43"));
/// ```
pub fn hash_bytes(data: &[u8]) -> u32 {
    let (mut a, mut b, mut c) = (GOLDEN_RATIO, GOLDEN_RATIO, 0u32);

    let mut blocks = data.chunks_exact(12);
    for block in &mut blocks {
        a = a.wrapping_add(u32::from_le_bytes([block[0], block[1], block[2], block[3]]));
        b = b.wrapping_add(u32::from_le_bytes([block[4], block[5], block[6], block[7]]));
        c = c.wrapping_add(u32::from_le_bytes([block[8], block[9], block[10], block[11]]));
        (a, b, c) = mix(a, b, c);
    }

    c = c.wrapping_add(data.len() as u32);
    for (i, &byte) in blocks.remainder().iter().enumerate() {
        let v = byte as u32;
        match i {
            0 => a = a.wrapping_add(v),
            1 => a = a.wrapping_add(v << 8),
            2 => a = a.wrapping_add(v << 16),
            3 => a = a.wrapping_add(v << 24),
            4 => b = b.wrapping_add(v),
            5 => b = b.wrapping_add(v << 8),
            6 => b = b.wrapping_add(v << 16),
            7 => b = b.wrapping_add(v << 24),
            // c's low byte carries the length, so the last three tail
            // bytes land in its upper bytes.
            8 => c = c.wrapping_add(v << 8),
            9 => c = c.wrapping_add(v << 16),
            _ => c = c.wrapping_add(v << 24),
        }
    }

    let (_, _, c) = mix(a, b, c);
    c
}

/// Hash a string over its UTF-8 bytes.
#[inline]
pub fn hash_str(data: &str) -> u32 {
    hash_bytes(data.as_bytes())
}

/// Hash exactly three 64-bit words.
///
/// Produces the same value as [`hash_bytes`] over the 24-byte
/// little-endian concatenation of the words, without touching memory; the
/// halves of each word feed the lanes in block order.
pub fn hash_words(u1: u64, u2: u64, u3: u64) -> u32 {
    let (mut a, mut b, mut c) = (GOLDEN_RATIO, GOLDEN_RATIO, 0u32);

    a = a.wrapping_add(u1 as u32);
    b = b.wrapping_add((u1 >> 32) as u32);
    c = c.wrapping_add(u2 as u32);
    (a, b, c) = mix(a, b, c);

    a = a.wrapping_add((u2 >> 32) as u32);
    b = b.wrapping_add(u3 as u32);
    c = c.wrapping_add((u3 >> 32) as u32);
    (a, b, c) = mix(a, b, c);

    c = c.wrapping_add(24);
    let (_, _, c) = mix(a, b, c);
    c
}
