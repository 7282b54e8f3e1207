// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    bucket::MAX_BUCKET_SIZE,
    listener::{EventListener, KeyComparator},
    table_pair::MAX_TABLE_POWER,
    CuckooTable, Error, SharedCuckooTable,
};

/// Upper bound of the relocation chain length
pub const MAX_DEPTH: u8 = 32;

const DEFAULT_TABLE_POWER: u8 = 10;

/// Table configuration builder
///
/// # Examples
///
/// ```
/// use cuckoo_table::{Config, Item};
///
/// let mut table = Config::new(4).bucket_size(4).max_depth(3).build()?;
///
/// table.insert(Item::new("flow-1", 7))?;
/// assert_eq!(Some(7), table.lookup("flow-1")?);
/// #
/// # Ok::<(), cuckoo_table::Error>(())
/// ```
pub struct Config {
    /// Each table holds `2^table_power` buckets
    pub table_power: u8,

    /// Slots per bucket
    pub bucket_size: u8,

    /// Maximum number of items relocated by a single insert
    pub max_depth: u8,

    /// If `false`, callers must provide the coordinates of every key
    pub compute_hashes: bool,

    /// If `true`, inserting a present key fails with [`Error::AlreadyExists`]
    pub lookup_on_insert: bool,

    /// Number of bins of the relocation histogram
    ///
    /// Defaults to one bin per possible chain length.
    pub histogram_buckets: Option<usize>,

    /// Observer of committed slot mutations
    pub(crate) event_listener: Option<Box<dyn EventListener>>,

    /// Key equality override
    pub(crate) key_comparator: Option<Box<dyn KeyComparator>>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_POWER)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("table_power", &self.table_power)
            .field("bucket_size", &self.bucket_size)
            .field("max_depth", &self.max_depth)
            .field("compute_hashes", &self.compute_hashes)
            .field("lookup_on_insert", &self.lookup_on_insert)
            .field("histogram_buckets", &self.histogram_buckets)
            .field("event_listener", &self.event_listener.is_some())
            .field("key_comparator", &self.key_comparator.is_some())
            .finish()
    }
}

impl Config {
    /// Initializes a new config with `2^table_power` buckets per table.
    #[must_use]
    pub fn new(table_power: u8) -> Self {
        Self {
            table_power,
            bucket_size: 1,
            max_depth: 1,
            compute_hashes: true,
            lookup_on_insert: false,
            histogram_buckets: None,
            event_listener: None,
            key_comparator: None,
        }
    }

    /// Sets the number of slots per bucket.
    ///
    /// A bucket size of 1 is a classic two-choice cuckoo hash.
    ///
    /// Defaults to 1, may be at most 8.
    #[must_use]
    pub fn bucket_size(mut self, n: u8) -> Self {
        self.bucket_size = n;
        self
    }

    /// Sets the maximum relocation chain length of a single insert.
    ///
    /// Values below 1 are treated as 1.
    ///
    /// Defaults to 1, may be at most 32.
    #[must_use]
    pub fn max_depth(mut self, n: u8) -> Self {
        self.max_depth = n;
        self
    }

    /// If disabled, the coordinates carried by [`ItemKey`](crate::ItemKey)s
    /// are used as is (after masking).
    ///
    /// Defaults to `true`.
    #[must_use]
    pub fn compute_hashes(mut self, enabled: bool) -> Self {
        self.compute_hashes = enabled;
        self
    }

    /// Rejects inserts of keys that are already present.
    ///
    /// Without this, inserting a present key stores a second item with the
    /// same key (in the other table), which lookups only return once the
    /// first one was removed.
    ///
    /// Defaults to `false`.
    #[must_use]
    pub fn lookup_on_insert(mut self, enabled: bool) -> Self {
        self.lookup_on_insert = enabled;
        self
    }

    /// Sets the number of bins of the relocation histogram.
    #[must_use]
    pub fn histogram_buckets(mut self, n: usize) -> Self {
        self.histogram_buckets = Some(n);
        self
    }

    /// Installs an observer that is told about every committed slot mutation.
    #[must_use]
    pub fn event_listener<L: EventListener + 'static>(mut self, listener: L) -> Self {
        self.event_listener = Some(Box::new(listener));
        self
    }

    /// Installs a key equality override.
    #[must_use]
    pub fn key_comparator<C: KeyComparator + 'static>(mut self, comparator: C) -> Self {
        self.key_comparator = Some(Box::new(comparator));
        self
    }

    /// Relocation depth actually used by the table.
    #[must_use]
    pub fn effective_max_depth(&self) -> u8 {
        self.max_depth.max(1)
    }

    /// Number of relocation histogram bins actually used by the table.
    #[must_use]
    pub fn effective_histogram_buckets(&self) -> usize {
        self.histogram_buckets
            .unwrap_or_else(|| usize::from(self.effective_max_depth()) + 1)
            .max(1)
    }

    pub(crate) fn validate(&self) -> crate::Result<()> {
        if self.table_power > MAX_TABLE_POWER {
            return Err(Error::InvalidArgument("table power is too large"));
        }

        if !(1..=MAX_BUCKET_SIZE).contains(&self.bucket_size) {
            return Err(Error::InvalidArgument("bucket size is out of range"));
        }

        if self.max_depth > MAX_DEPTH {
            return Err(Error::InvalidArgument("max depth is too large"));
        }

        Ok(())
    }

    /// Creates a table that relies on the caller to serialize access.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the configuration is invalid, or the buckets
    /// could not be allocated.
    pub fn build(self) -> crate::Result<CuckooTable> {
        CuckooTable::create(self)
    }

    /// Creates a table guarded by an internal lock, which can be shared
    /// between threads.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the configuration is invalid, or the buckets
    /// could not be allocated.
    pub fn build_shared(self) -> crate::Result<SharedCuckooTable> {
        self.build().map(SharedCuckooTable::from)
    }
}
