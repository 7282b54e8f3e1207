#![allow(dead_code)]

use cuckoo_table::{Config, Item, ItemKey, KeyHash};

/// Key with hand-picked coordinates
pub fn stub_key(key: &str, hash1: u32, signature: u32, hash2: u32) -> ItemKey {
    ItemKey::with_hash(key, KeyHash::new(hash1, signature, hash2))
}

/// Item with hand-picked coordinates
pub fn stub_item(key: &str, hash1: u32, signature: u32, hash2: u32, value: u64) -> Item {
    Item::with_hash(key, KeyHash::new(hash1, signature, hash2), value)
}

/// Table that uses the coordinates carried by the keys
pub fn stub_config(table_power: u8) -> Config {
    Config::new(table_power).compute_hashes(false)
}
