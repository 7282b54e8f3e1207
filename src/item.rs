// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{hash::KeyHash, UserKey, Value};

/// A key together with its placement coordinates
///
/// When the table computes hashes itself (the default), the coordinates
/// carried here are ignored and recomputed from the key bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemKey {
    bytes: UserKey,
    hash: KeyHash,
}

impl ItemKey {
    /// Creates a key whose coordinates are left to the table.
    pub fn new<K: Into<UserKey>>(bytes: K) -> Self {
        Self {
            bytes: bytes.into(),
            hash: KeyHash::default(),
        }
    }

    /// Creates a key with caller-computed coordinates.
    ///
    /// Only meaningful for tables built with `compute_hashes(false)`.
    pub fn with_hash<K: Into<UserKey>>(bytes: K, hash: KeyHash) -> Self {
        Self {
            bytes: bytes.into(),
            hash,
        }
    }

    /// Key bytes
    #[must_use]
    pub fn bytes(&self) -> &UserKey {
        &self.bytes
    }

    /// Placement coordinates
    #[must_use]
    pub fn hash(&self) -> KeyHash {
        self.hash
    }

    pub(crate) fn rehashed(self, hash: KeyHash) -> Self {
        Self {
            bytes: self.bytes,
            hash,
        }
    }
}

impl From<&[u8]> for ItemKey {
    fn from(value: &[u8]) -> Self {
        Self::new(value)
    }
}

impl<const N: usize> From<&[u8; N]> for ItemKey {
    fn from(value: &[u8; N]) -> Self {
        Self::new(value)
    }
}

impl From<&str> for ItemKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&String> for ItemKey {
    fn from(value: &String) -> Self {
        Self::new(value)
    }
}

impl From<Vec<u8>> for ItemKey {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

impl From<UserKey> for ItemKey {
    fn from(value: UserKey) -> Self {
        Self::new(value)
    }
}

impl From<&ItemKey> for ItemKey {
    fn from(value: &ItemKey) -> Self {
        value.clone()
    }
}

impl From<&Item> for ItemKey {
    fn from(value: &Item) -> Self {
        value.key.clone()
    }
}

/// Key-value pair stored in a slot
///
/// The value is an opaque machine word, typically the caller's own
/// identifier for a flow or session record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    key: ItemKey,
    value: Value,
}

impl Item {
    /// Creates an item whose coordinates are left to the table.
    pub fn new<K: Into<UserKey>>(key: K, value: Value) -> Self {
        Self {
            key: ItemKey::new(key),
            value,
        }
    }

    /// Creates an item with caller-computed coordinates.
    pub fn with_hash<K: Into<UserKey>>(key: K, hash: KeyHash, value: Value) -> Self {
        Self {
            key: ItemKey::with_hash(key, hash),
            value,
        }
    }

    /// Key and coordinates
    #[must_use]
    pub fn key(&self) -> &ItemKey {
        &self.key
    }

    /// Key bytes
    #[must_use]
    pub fn key_bytes(&self) -> &[u8] {
        &self.key.bytes
    }

    /// Placement coordinates
    #[must_use]
    pub fn hash(&self) -> KeyHash {
        self.key.hash
    }

    /// Stored value
    #[must_use]
    pub fn value(&self) -> Value {
        self.value
    }

    pub(crate) fn signature(&self) -> u32 {
        self.key.hash.signature
    }

    pub(crate) fn with_key(self, key: ItemKey) -> Self {
        Self {
            key,
            value: self.value,
        }
    }
}
