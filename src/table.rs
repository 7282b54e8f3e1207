// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    action::{Action, ActionLog},
    displacement::Search,
    table_pair::TablePair,
    Config, Error, Item, ItemKey, KeyHash, Location, Stats, Value,
};

#[cfg(feature = "metrics")]
use {crate::Metrics, std::sync::atomic::Ordering::Relaxed, std::sync::Arc};

/// A fixed-capacity two-table cuckoo hash
///
/// Mutations take `&mut self`, so access is serialized by the borrow checker.
/// Use [`Config::build_shared`] for a handle that can be used from multiple
/// threads.
pub struct CuckooTable {
    config: Config,
    tables: TablePair,

    /// Reused for every insert and remove
    log: ActionLog,

    /// Reused for every insert
    search: Search,

    len: usize,

    #[cfg(feature = "metrics")]
    metrics: Arc<Metrics>,
}

impl std::fmt::Debug for CuckooTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CuckooTable")
            .field("config", &self.config)
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

impl CuckooTable {
    pub(crate) fn create(config: Config) -> crate::Result<Self> {
        config.validate()?;

        let tables = TablePair::new(config.table_power, config.bucket_size)?;

        log::debug!(
            "Created cuckoo table: 2x{} buckets, {} slot(s) per bucket, max depth {}",
            tables.bucket_count(),
            tables.bucket_size(),
            config.effective_max_depth(),
        );

        Ok(Self {
            #[cfg(feature = "metrics")]
            metrics: Arc::new(Metrics::new(config.effective_histogram_buckets())),

            config,
            tables,
            log: ActionLog::default(),
            search: Search::default(),
            len: 0,
        })
    }

    /// Validates the key and fills in its placement coordinates.
    fn resolve(&self, key: ItemKey) -> crate::Result<ItemKey> {
        if key.bytes().is_empty() {
            return Err(Error::InvalidArgument("key is empty"));
        }

        let mask = self.tables.mask();

        let hash = if self.config.compute_hashes {
            KeyHash::compute(key.bytes(), mask)
        } else {
            key.hash().masked(mask)
        };

        Ok(key.rehashed(hash))
    }

    fn find(&self, key: &ItemKey) -> Option<(Location, &Item)> {
        self.tables
            .find(key.bytes(), key.hash(), self.config.key_comparator.as_deref())
    }

    /// Applies the pending actions, then notifies the observers.
    fn commit(&mut self) {
        for action in self.log.iter() {
            log::trace!("Commit: {action}");

            self.tables.apply(action);

            match action {
                Action::Added { .. } => self.len += 1,
                Action::Removed { .. } => self.len -= 1,
                Action::Moved { .. } => {}
            }
        }

        if let Some(listener) = self.config.event_listener.as_mut() {
            for action in self.log.iter() {
                listener.on_action(action);
            }
        }

        #[cfg(feature = "metrics")]
        for action in self.log.iter() {
            self.metrics.observe(action);
        }

        self.log.clear();
    }

    /// Inserts an item.
    ///
    /// If both candidate buckets are full, existing items are relocated to
    /// their other table, moving at most `max_depth` items.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the key is empty, the key is already present
    /// (with lookup-on-insert enabled), or no placement could be found.
    /// The table is not modified in any of these cases.
    pub fn insert(&mut self, item: Item) -> crate::Result<()> {
        let key = self.resolve(item.key().clone())?;
        let item = item.with_key(key);

        #[cfg(feature = "metrics")]
        self.metrics.insert_attempts.fetch_add(1, Relaxed);

        if self.config.lookup_on_insert && self.find(item.key()).is_some() {
            #[cfg(feature = "metrics")]
            self.metrics.insert_duplicates.fetch_add(1, Relaxed);

            return Err(Error::AlreadyExists);
        }

        let max_depth = self.config.effective_max_depth();

        if !self
            .tables
            .plan_insert(&item, max_depth, &mut self.search, &mut self.log)
        {
            log::debug!(
                "No placement for {:?} within {max_depth} relocation(s), {} items stored",
                String::from_utf8_lossy(item.key_bytes()),
                self.len,
            );

            #[cfg(feature = "metrics")]
            self.metrics.insert_full.fetch_add(1, Relaxed);

            return Err(Error::Full);
        }

        let moved = self.log.moved_count();

        self.commit();

        log::trace!(
            "Inserted {:?}, relocated {moved} item(s)",
            String::from_utf8_lossy(item.key_bytes()),
        );

        #[cfg(feature = "metrics")]
        self.metrics.inserted(moved);

        Ok(())
    }

    /// Retrieves the value of a key.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the key is empty.
    pub fn lookup<K: Into<ItemKey>>(&self, key: K) -> crate::Result<Option<Value>> {
        Ok(self.lookup_verbose(key)?.map(|(value, _)| value))
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
        let key = self.resolve(key.into())?;
        let found = self.find(&key).map(|(location, item)| (item.value(), location));

        #[cfg(feature = "metrics")]
        if found.is_some() {
            self.metrics.lookup_hits.fetch_add(1, Relaxed);
        } else {
            self.metrics.lookup_misses.fetch_add(1, Relaxed);
        }

        Ok(found)
    }

    /// Removes a key, returning its value.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the key is empty or not present.
    pub fn remove<K: Into<ItemKey>>(&mut self, key: K) -> crate::Result<Value> {
        let key = self.resolve(key.into())?;

        let Some((from, item)) = self.find(&key).map(|(l, item)| (l, item.clone())) else {
            #[cfg(feature = "metrics")]
            self.metrics.remove_misses.fetch_add(1, Relaxed);

            return Err(Error::NotFound);
        };

        let value = item.value();

        self.log.clear();
        self.log.record(Action::Removed { item, from });
        self.commit();

        #[cfg(feature = "metrics")]
        self.metrics.remove_hits.fetch_add(1, Relaxed);

        Ok(value)
    }

    /// Removes all items and resets the statistics.
    ///
    /// The event listener is not notified.
    pub fn flush(&mut self) {
        log::debug!("Flushing {} item(s)", self.len);

        self.tables.clear();
        self.len = 0;

        #[cfg(feature = "metrics")]
        self.metrics.reset();
    }

    /// Iterates over all items, first table first, in bucket and slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Location, &Item)> + '_ {
        self.tables.iter()
    }

    /// Number of stored items
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no items are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total number of slots
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.tables.capacity()
    }

    /// Slots per bucket
    #[must_use]
    pub fn bucket_size(&self) -> u8 {
        self.tables.bucket_size()
    }

    /// Each table holds `2^table_power` buckets
    #[must_use]
    pub fn table_power(&self) -> u8 {
        self.config.table_power
    }

    /// Coordinates the table computes for `key`.
    #[must_use]
    pub fn hash_key(&self, key: &[u8]) -> KeyHash {
        KeyHash::compute(key, self.tables.mask())
    }

    /// Table statistics.
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
        #[cfg(feature = "metrics")]
        {
            Ok(self.metrics.snapshot())
        }

        #[cfg(not(feature = "metrics"))]
        {
            Err(Error::Unsupported)
        }
    }

    /// Renders the table statistics.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the crate was built without the `metrics` feature.
    pub fn stats_dump(&self) -> crate::Result<String> {
        self.stats().map(|stats| stats.to_string())
    }

    /// Renders the occupancy of every bucket.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the crate was built without the `metrics` feature.
    pub fn table_dump(&self) -> crate::Result<String> {
        #[cfg(feature = "metrics")]
        {
            Ok(crate::metrics::table_dump(&self.tables))
        }

        #[cfg(not(feature = "metrics"))]
        {
            Err(Error::Unsupported)
        }
    }

    /// Renders the construction parameters.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the crate was built without the `metrics` feature.
    pub fn config_dump(&self) -> crate::Result<String> {
        #[cfg(feature = "metrics")]
        {
            Ok(crate::metrics::config_dump(&self.config, &self.tables))
        }

        #[cfg(not(feature = "metrics"))]
        {
            Err(Error::Unsupported)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn table_create_invalid() {
        assert!(matches!(
            Config::new(4).bucket_size(9).build(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn table_insert_lookup() -> crate::Result<()> {
        let mut table = Config::new(4).bucket_size(2).build()?;
        assert!(table.is_empty());
        assert_eq!(64, table.capacity());

        table.insert(Item::new("a", 1))?;
        table.insert(Item::new("b", 2))?;

        assert_eq!(2, table.len());
        assert_eq!(Some(1), table.lookup("a")?);
        assert_eq!(Some(2), table.lookup("b")?);
        assert_eq!(None, table.lookup("c")?);

        Ok(())
    }

    #[test]
    fn table_empty_key() -> crate::Result<()> {
        let mut table = Config::new(2).build()?;

        assert!(matches!(
            table.insert(Item::new("", 1)),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(table.lookup(""), Err(Error::InvalidArgument(_))));
        assert!(matches!(table.remove(""), Err(Error::InvalidArgument(_))));
        assert!(table.is_empty());

        Ok(())
    }

    #[test]
    fn table_remove() -> crate::Result<()> {
        let mut table = Config::new(2).build()?;

        table.insert(Item::new("a", 7))?;
        assert_eq!(7, table.remove("a")?);
        assert_eq!(None, table.lookup("a")?);
        assert!(matches!(table.remove("a"), Err(Error::NotFound)));
        assert!(table.is_empty());

        Ok(())
    }

    #[test]
    fn table_lookup_on_insert() -> crate::Result<()> {
        let mut table = Config::new(2).lookup_on_insert(true).build()?;

        table.insert(Item::new("a", 1))?;
        assert!(matches!(
            table.insert(Item::new("a", 2)),
            Err(Error::AlreadyExists)
        ));
        assert_eq!(Some(1), table.lookup("a")?);
        assert_eq!(1, table.len());

        Ok(())
    }

    #[test]
    fn table_external_hash_masked() -> crate::Result<()> {
        let mut table = Config::new(1).compute_hashes(false).build()?;

        let hash = KeyHash::new(0xFFFF_FFF1, 5, 0xFFFF_FFF0);
        table.insert(Item::with_hash("a", hash, 1))?;

        let (_, location) = table
            .lookup_verbose(ItemKey::with_hash("a", hash))?
            .expect("should exist");
        assert_eq!(Location::new(crate::TableId::First, 1, 0), location);

        Ok(())
    }

    #[test]
    fn table_hash_key_matches_placement() -> crate::Result<()> {
        let mut table = Config::new(6).build()?;
        table.insert(Item::new("flow", 1))?;

        let hash = table.hash_key(b"flow");
        let (_, location) = table.lookup_verbose("flow")?.expect("should exist");

        assert_eq!(location.table.bucket_of(hash), location.bucket);

        Ok(())
    }

    #[test]
    fn table_flush() -> crate::Result<()> {
        let mut table = Config::new(3).bucket_size(2).build()?;

        for idx in 0..8_u64 {
            table.insert(Item::new(format!("key-{idx}"), idx))?;
        }
        assert_eq!(8, table.len());
        assert_eq!(8, table.iter().count());

        table.flush();
        assert!(table.is_empty());
        assert_eq!(0, table.iter().count());
        assert_eq!(None, table.lookup("key-1")?);

        table.insert(Item::new("key-1", 1))?;
        assert_eq!(Some(1), table.lookup("key-1")?);

        Ok(())
    }

    #[test]
    #[cfg(not(feature = "metrics"))]
    fn table_stats_unsupported() -> crate::Result<()> {
        let table = Config::new(1).build()?;

        assert!(matches!(table.stats(), Err(Error::Unsupported)));
        assert!(matches!(table.stats_dump(), Err(Error::Unsupported)));
        assert!(matches!(table.table_dump(), Err(Error::Unsupported)));
        assert!(matches!(table.config_dump(), Err(Error::Unsupported)));

        Ok(())
    }
}
