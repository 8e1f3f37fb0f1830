//! Hash functions available to type descriptors.
//!
//! These are deliberately simple, seedable, non-cryptographic mixers. The
//! seed is always passed in explicitly, usually from a descriptor's context,
//! so two dictionaries never share hidden hashing state.

/// Seed used by the stock descriptors when none is supplied.
pub const DEFAULT_SEED: u32 = 5381;

/// Thomas Wang's 32 bit integer mix.
#[inline]
pub fn int_hash(mut key: u32) -> u32 {
    key = key.wrapping_add(!(key << 15));
    key ^= key >> 10;
    key = key.wrapping_add(key << 3);
    key ^= key >> 6;
    key = key.wrapping_add(!(key << 11));
    key ^= key >> 16;
    key
}

/// Identity hash for integer keys that are already well distributed.
#[inline]
pub fn identity_hash(key: u32) -> u32 {
    key
}

/// MurmurHash2 by Austin Appleby.
///
/// Words are read little-endian regardless of the host so results are stable
/// across platforms. Inputs longer than `u32::MAX` bytes fold their length
/// into the seed modulo 2^32.
pub fn murmur2(data: &[u8], seed: u32) -> u32 {
    const M: u32 = 0x5bd1_e995;
    const R: u32 = 24;

    let mut h = seed ^ (data.len() as u32);

    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        let mut k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);

        h = h.wrapping_mul(M);
        h ^= k;
    }

    let tail = chunks.remainder();
    if tail.len() >= 3 {
        h ^= (tail[2] as u32) << 16;
    }
    if tail.len() >= 2 {
        h ^= (tail[1] as u32) << 8;
    }
    if !tail.is_empty() {
        h ^= tail[0] as u32;
        h = h.wrapping_mul(M);
    }

    h ^= h >> 13;
    h = h.wrapping_mul(M);
    h ^= h >> 15;
    h
}

/// Case-insensitive djb hash (`hash * 33 + c`) over ASCII-lowercased bytes.
pub fn case_hash(data: &[u8], seed: u32) -> u32 {
    data.iter().fold(seed, |h, &c| {
        (h << 5)
            .wrapping_add(h)
            .wrapping_add(c.to_ascii_lowercase() as u32)
    })
}

/// Thomas Wang's 64 bit integer mix.
#[inline]
pub fn mix64(mut h: u64) -> u64 {
    h = (!h).wrapping_add(h << 21);
    h ^= h >> 24;
    h = h.wrapping_add(h << 3).wrapping_add(h << 8);
    h ^= h >> 14;
    h = h.wrapping_add(h << 2).wrapping_add(h << 4);
    h ^= h >> 28;
    h.wrapping_add(h << 31)
}

/// Folds a sequence of integers into one checksum by adding each to the
/// running value and mixing, so that permutations hash differently.
pub(crate) fn fold_mix64(words: &[u64]) -> u64 {
    words
        .iter()
        .fold(0u64, |acc, &w| mix64(acc.wrapping_add(w)))
}
