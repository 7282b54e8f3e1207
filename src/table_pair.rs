// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{action::Action, bucket::Bucket, listener::KeyComparator, Item, KeyHash};

/// Upper bound of the table size exponent (2^24 buckets per table)
pub const MAX_TABLE_POWER: u8 = 24;

/// One of the two tables
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableId {
    /// Table indexed by `hash1`
    First,

    /// Table indexed by `hash2`
    Second,
}

impl TableId {
    /// Both tables, in lookup order
    pub const ALL: [Self; 2] = [Self::First, Self::Second];

    /// Returns the table a displaced item moves to.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }

    /// Zero-based table index
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }

    /// Candidate bucket of a key in this table
    #[must_use]
    pub fn bucket_of(self, hash: KeyHash) -> u32 {
        match self {
            Self::First => hash.hash1,
            Self::Second => hash.hash2,
        }
    }
}

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T{}", self.index() + 1)
    }
}

/// Physical address of a slot
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    /// Table
    pub table: TableId,

    /// Bucket index inside the table
    pub bucket: u32,

    /// Slot index inside the bucket
    pub slot: u8,
}

impl Location {
    #[must_use]
    pub(crate) fn new(table: TableId, bucket: u32, slot: u8) -> Self {
        Self {
            table,
            bucket,
            slot,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}:{}]", self.table, self.bucket, self.slot)
    }
}

/// The two slot arenas
///
/// Each table stores its `bucket_count * bucket_size` slots contiguously;
/// bucket `b` owns the slots `b * bucket_size .. (b + 1) * bucket_size`.
pub struct TablePair {
    tables: [Vec<Option<Item>>; 2],
    mask: u32,
    bucket_size: u8,
}

impl TablePair {
    /// Allocates `2^power` buckets of `bucket_size` slots per table.
    pub fn new(power: u8, bucket_size: u8) -> crate::Result<Self> {
        let slot_count = (1_usize << power) * usize::from(bucket_size);

        Ok(Self {
            tables: [Self::allocate(slot_count)?, Self::allocate(slot_count)?],
            mask: (1_u32 << power) - 1,
            bucket_size,
        })
    }

    /// Allocates `slot_count` free slots without aborting on allocation failure.
    fn allocate(slot_count: usize) -> crate::Result<Vec<Option<Item>>> {
        let mut slots = Vec::new();
        slots.try_reserve_exact(slot_count)?;
        slots.resize_with(slot_count, || None);
        Ok(slots)
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    pub fn bucket_size(&self) -> u8 {
        self.bucket_size
    }

    /// Number of buckets per table
    pub fn bucket_count(&self) -> usize {
        self.mask as usize + 1
    }

    /// Total number of slots across both tables
    pub fn capacity(&self) -> usize {
        2 * self.bucket_count() * usize::from(self.bucket_size)
    }

    #[allow(clippy::indexing_slicing)]
    fn slots(&self, table: TableId) -> &[Option<Item>] {
        &self.tables[table.index()]
    }

    /// Iterates over the buckets of one table in ascending order.
    pub fn buckets(&self, table: TableId) -> impl ExactSizeIterator<Item = Bucket<'_>> + '_ {
        self.slots(table)
            .chunks_exact(usize::from(self.bucket_size))
            .map(Bucket::new)
    }

    pub fn bucket(&self, table: TableId, index: u32) -> Option<Bucket<'_>> {
        let size = usize::from(self.bucket_size);
        let start = (index as usize).checked_mul(size)?;
        let end = start.checked_add(size)?;

        self.slots(table).get(start..end).map(Bucket::new)
    }

    pub fn get(&self, location: Location) -> Option<&Item> {
        self.bucket(location.table, location.bucket)
            .and_then(|bucket| bucket.get(location.slot))
    }

    #[allow(clippy::indexing_slicing)]
    fn slot_mut(&mut self, location: Location) -> Option<&mut Option<Item>> {
        if location.slot >= self.bucket_size {
            return None;
        }

        let size = usize::from(self.bucket_size);
        let index = location.bucket as usize * size + usize::from(location.slot);

        self.tables[location.table.index()].get_mut(index)
    }

    /// Scans both candidate buckets of `key` for a matching item.
    ///
    /// Signatures are compared first; the full key is only compared when
    /// they match.
    pub fn find(
        &self,
        key: &[u8],
        hash: KeyHash,
        comparator: Option<&dyn KeyComparator>,
    ) -> Option<(Location, &Item)> {
        for table in TableId::ALL {
            let index = table.bucket_of(hash);

            let Some(bucket) = self.bucket(table, index) else {
                continue;
            };

            for (slot, item) in bucket.active_slots() {
                if item.signature() != hash.signature {
                    continue;
                }

                let stored = item.key_bytes();

                if stored.len() != key.len() {
                    continue;
                }

                let is_match = match comparator {
                    Some(cmp) => cmp.equals(stored, key),
                    None => stored == key,
                };

                if is_match {
                    return Some((Location::new(table, index, slot), item));
                }
            }
        }

        None
    }

    /// Performs the slot mutation described by a committed action.
    pub fn apply(&mut self, action: &Action) {
        match action {
            Action::Added { item, to } => self.occupy(*to, item.clone()),
            Action::Moved { item, from, to } => {
                self.vacate(*from);
                self.occupy(*to, item.clone());
            }
            Action::Removed { from, .. } => {
                self.vacate(*from);
            }
        }
    }

    fn occupy(&mut self, location: Location, item: Item) {
        if let Some(slot) = self.slot_mut(location) {
            debug_assert!(slot.is_none(), "{location} is occupied");
            *slot = Some(item);
        }
    }

    fn vacate(&mut self, location: Location) -> Option<Item> {
        self.slot_mut(location).and_then(Option::take)
    }

    /// Marks every slot of both tables free.
    pub fn clear(&mut self) {
        for table in &mut self.tables {
            table.fill(None);
        }
    }

    /// Iterates over all present items, first table first.
    // NOTE: Bucket count is <= 2^MAX_TABLE_POWER
    #[allow(clippy::cast_possible_truncation)]
    pub fn iter(&self) -> impl Iterator<Item = (Location, &Item)> + '_ {
        TableId::ALL.into_iter().flat_map(move |table| {
            self.buckets(table)
                .enumerate()
                .flat_map(move |(index, bucket)| {
                    bucket.active_slots().map(move |(slot, item)| {
                        (Location::new(table, index as u32, slot), item)
                    })
                })
        })
    }
}
