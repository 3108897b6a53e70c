//! Hash positions for the topic signature.
//!
//! Uses MurmurHash3 with double hashing: `h(i) = h1 + i * h2`, cheaper
//! than k independent hashes and independent enough for a bloom-style
//! filter. Determinism across nodes and restarts is the hard requirement
//! here: every cluster member must derive identical bit positions for
//! the same key.

use std::io::Cursor;

/// Hash a signature key with MurmurHash3 under the given seed.
pub fn murmur_hash(key: &str, seed: u32) -> u64 {
    let mut cursor = Cursor::new(key.as_bytes());
    // 128-bit murmur3, lower 64 bits. Cursor reads cannot fail.
    murmur3::murmur3_x64_128(&mut cursor, seed).unwrap_or(0) as u64
}

/// Compute the k bit positions of a key in an m-bit signature.
pub fn bit_positions(key: &str, hash_count: usize, width_bits: usize) -> Vec<usize> {
    let h1 = murmur_hash(key, 0);
    let h2 = murmur_hash(key, 1);

    (0..hash_count)
        .map(|i| {
            let hash = h1.wrapping_add((i as u64).wrapping_mul(h2));
            (hash % width_bits as u64) as usize
        })
        .collect()
}
