// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// 32-bit mixing hash of `bytes`, salted by `seed`.
///
/// Must stay stable across machines and compilations; placement coordinates
/// are recomputed from the key on every lookup.
pub fn hash32(bytes: &[u8], seed: u32) -> u32 {
    xxhash_rust::xxh32::xxh32(bytes, seed)
}

/// Placement coordinates of a key
///
/// `hash1` selects the candidate bucket in the first table, `hash2` the one in
/// the second table, and `signature` is compared before any full key comparison.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct KeyHash {
    /// Bucket index in the first table
    pub hash1: u32,

    /// Pre-filter stored next to the key
    pub signature: u32,

    /// Bucket index in the second table
    pub hash2: u32,
}

impl KeyHash {
    /// Builds coordinates from caller-supplied values.
    #[must_use]
    pub fn new(hash1: u32, signature: u32, hash2: u32) -> Self {
        Self {
            hash1,
            signature,
            hash2,
        }
    }

    /// Derives the coordinates of `key` for a table with the given index mask.
    ///
    /// The second round is salted with the signature of the first, so two keys
    /// that collide in the first table are unlikely to collide in the second.
    #[must_use]
    pub fn compute(key: &[u8], mask: u32) -> Self {
        let raw = hash32(key, 0);
        let signature = fold(raw);

        Self {
            hash1: raw & mask,
            signature,
            hash2: hash32(key, signature) & mask,
        }
    }

    /// Clamps the bucket indexes into the index range of a table.
    #[must_use]
    pub(crate) fn masked(self, mask: u32) -> Self {
        Self {
            hash1: self.hash1 & mask,
            signature: self.signature,
            hash2: self.hash2 & mask,
        }
    }
}

// NOTE: The low bits of `raw` already pick the bucket, so the signature
// leads with the high bits
fn fold(raw: u32) -> u32 {
    raw.rotate_left(16)
}
