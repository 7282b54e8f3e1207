// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{CuckooTable, Item, ItemKey, Location, Stats, Value};
use std::sync::{Arc, Mutex, MutexGuard};

#[cfg(feature = "metrics")]
use crate::Metrics;

/// A cuckoo table behind a single lock
///
/// Cloning the handle is cheap, all clones refer to the same table.
/// Every operation, including lookups, takes the lock exclusively.
///
/// Callbacks run while the lock is held; calling back into the table from an
/// event listener or key comparator deadlocks.
#[derive(Clone, Debug)]
pub struct SharedCuckooTable {
    inner: Arc<Mutex<CuckooTable>>,

    #[cfg(feature = "metrics")]
    metrics: Arc<Metrics>,
}

impl From<CuckooTable> for SharedCuckooTable {
    fn from(table: CuckooTable) -> Self {
        Self {
            #[cfg(feature = "metrics")]
            metrics: table.metrics().clone(),

            inner: Arc::new(Mutex::new(table)),
        }
    }
}

#[allow(clippy::expect_used)]
impl SharedCuckooTable {
    /// Locks the table, e.g. to iterate over its items.
    pub fn lock(&self) -> MutexGuard<'_, CuckooTable> {
        self.inner.lock().expect("lock is poisoned")
    }

    /// Inserts an item.
    ///
    /// # Errors
    ///
    /// See [`CuckooTable::insert`].
    pub fn insert(&self, item: Item) -> crate::Result<()> {
        self.lock().insert(item)
    }

    /// Retrieves the value of a key.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the key is empty.
    pub fn lookup<K: Into<ItemKey>>(&self, key: K) -> crate::Result<Option<Value>> {
        self.lock().lookup(key)
    }

    /// Retrieves the value of a key, and the slot it is stored in.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the key is empty.
    pub fn lookup_verbose<K: Into<ItemKey>>(
        &self,
        key: K,
    ) -> crate::Result<Option<(Value, Location)>> {
        self.lock().lookup_verbose(key)
    }

    /// Removes a key, returning its value.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the key is empty or not present.
    pub fn remove<K: Into<ItemKey>>(&self, key: K) -> crate::Result<Value> {
        self.lock().remove(key)
    }

    /// Removes all items and resets the statistics.
    pub fn flush(&self) {
        self.lock().flush();
    }

    /// Number of stored items
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if no items are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Total number of slots
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// Table statistics, readable without taking the lock.
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Returns a copy of the table statistics.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the crate was built without the `metrics` feature.
    pub fn stats(&self) -> crate::Result<Stats> {
        self.lock().stats()
    }

    /// Renders the table statistics.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the crate was built without the `metrics` feature.
    pub fn stats_dump(&self) -> crate::Result<String> {
        self.lock().stats_dump()
    }

    /// Renders the occupancy of every bucket.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the crate was built without the `metrics` feature.
    pub fn table_dump(&self) -> crate::Result<String> {
        self.lock().table_dump()
    }

    /// Renders the construction parameters.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the crate was built without the `metrics` feature.
    pub fn config_dump(&self) -> crate::Result<String> {
        self.lock().config_dump()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use test_log::test;

    #[test]
    fn shared_table_clones_share_state() -> crate::Result<()> {
        let a = Config::new(4).bucket_size(2).build_shared()?;
        let b = a.clone();

        a.insert(Item::new("x", 1))?;
        assert_eq!(Some(1), b.lookup("x")?);
        assert_eq!(1, b.remove("x")?);
        assert!(a.is_empty());

        Ok(())
    }

    #[test]
    fn shared_table_iterate_under_lock() -> crate::Result<()> {
        let table = Config::new(4).bucket_size(2).build_shared()?;

        for key in ["a", "b", "c"] {
            table.insert(Item::new(key, 0))?;
        }

        assert_eq!(3, table.lock().iter().count());

        Ok(())
    }
}
