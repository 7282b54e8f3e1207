// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Placement search
//!
//! Inserting an item looks for a free slot in either candidate bucket, and
//! failing that, for the shortest chain of relocations that ends in a free
//! slot. An evicted occupant always moves to its bucket in the other table.
//!
//! The search is breadth-first over buckets, so the shortest chain wins.
//! Within a level, the first table comes before the second, and occupants
//! are evicted in ascending slot order.
//!
//! Every bucket is visited at most once per insert. A chain therefore never
//! passes through the same bucket twice: no slot is evicted twice, and no
//! bucket receives more than one planned item, so checking signatures
//! against the current bucket contents is exact. The number of bucket scans
//! is also capped by [`scan_budget`], independent of the table size.
//!
//! The search only reads the tables; the resulting log is applied by the
//! caller once a complete chain was found.

use crate::{
    action::{Action, ActionLog},
    table_pair::TablePair,
    HashSet, Item, Location, TableId,
};
use std::collections::VecDeque;

/// A bucket reached by the search
#[derive(Copy, Clone, Debug)]
struct Step {
    table: TableId,
    bucket: u32,

    /// Step the entering item is evicted from, and the slot it leaves there
    parent: Option<(usize, u8)>,

    /// Relocations needed before an item can be written here
    depth: u8,
}

/// Scratch space of the placement search, reused across inserts
#[derive(Default)]
pub struct Search {
    steps: Vec<Step>,
    queue: VecDeque<usize>,
    visited: HashSet<(TableId, u32)>,
    scans: usize,
}

impl Search {
    fn clear(&mut self) {
        self.steps.clear();
        self.queue.clear();
        self.visited.clear();
        self.scans = 0;
    }

    /// Queues a bucket, unless it was already reached in this search.
    fn push(&mut self, step: Step) {
        if self.visited.insert((step.table, step.bucket)) {
            self.queue.push_back(self.steps.len());
            self.steps.push(step);
        }
    }

    /// Number of buckets scanned by the last search
    #[cfg(test)]
    pub fn scans(&self) -> usize {
        self.scans
    }
}

/// Upper bound of bucket scans of a single insert
///
/// Both candidate buckets, plus `2 × bucket_size × max_depth` scans for each
/// of the `max_depth` relocation levels.
pub fn scan_budget(bucket_size: u8, max_depth: u8) -> usize {
    let per_level = 2 * usize::from(bucket_size) * usize::from(max_depth);
    2 + per_level * usize::from(max_depth)
}

impl TablePair {
    /// Searches for a placement of `item` that relocates at most `max_depth`
    /// items.
    ///
    /// Returns `true` and leaves the full chain in `log` on success.
    /// On failure the log is left empty.
    pub fn plan_insert(
        &self,
        item: &Item,
        max_depth: u8,
        search: &mut Search,
        log: &mut ActionLog,
    ) -> bool {
        log.clear();
        search.clear();

        let hash = item.hash();

        for table in TableId::ALL {
            search.push(Step {
                table,
                bucket: table.bucket_of(hash),
                parent: None,
                depth: 0,
            });
        }

        let budget = scan_budget(self.bucket_size(), max_depth);

        while let Some(index) = search.queue.pop_front() {
            if search.scans >= budget {
                log::trace!(
                    "Placement search for {:?} stopped after {budget} bucket scans",
                    String::from_utf8_lossy(item.key_bytes()),
                );
                break;
            }

            search.scans += 1;

            let Some(step) = search.steps.get(index).copied() else {
                continue;
            };

            let Some(entering) = self.entering(item, &search.steps, step) else {
                continue;
            };

            let Some(bucket) = self.bucket(step.table, step.bucket) else {
                continue;
            };

            let signature = entering.signature();

            if !bucket.has_signature(signature, None) {
                if let Some(slot) = bucket.free_slot() {
                    return self.record_chain(item, &search.steps, index, slot, log);
                }
            }

            if step.depth >= max_depth {
                continue;
            }

            let other = step.table.other();

            for (slot, occupant) in bucket.active_slots() {
                // The entering item takes this slot
                if bucket.has_signature(signature, Some(slot)) {
                    continue;
                }

                search.push(Step {
                    table: other,
                    bucket: other.bucket_of(occupant.hash()),
                    parent: Some((index, slot)),
                    depth: step.depth + 1,
                });
            }
        }

        log::trace!(
            "No placement for {:?} with up to {max_depth} relocation(s), {} bucket(s) scanned",
            String::from_utf8_lossy(item.key_bytes()),
            search.scans,
        );

        false
    }

    /// Item that would be written into the bucket of `step`.
    fn entering<'a>(&'a self, item: &'a Item, steps: &[Step], step: Step) -> Option<&'a Item> {
        match step.parent {
            None => Some(item),
            Some((parent, slot)) => {
                let parent = steps.get(parent)?;
                self.get(Location::new(parent.table, parent.bucket, slot))
            }
        }
    }

    /// Records the chain that ends in `slot` of the bucket reached by step
    /// `index`, innermost relocation first.
    fn record_chain(
        &self,
        item: &Item,
        steps: &[Step],
        mut index: usize,
        slot: u8,
        log: &mut ActionLog,
    ) -> bool {
        let Some(last) = steps.get(index) else {
            return false;
        };

        let mut to = Location::new(last.table, last.bucket, slot);

        while let Some(step) = steps.get(index) {
            let Some((parent, slot)) = step.parent else {
                log.record(Action::Added {
                    item: item.clone(),
                    to,
                });
                return true;
            };

            let Some(from) = steps
                .get(parent)
                .map(|parent| Location::new(parent.table, parent.bucket, slot))
            else {
                break;
            };

            let Some(moved) = self.get(from) else {
                break;
            };

            log.record(Action::Moved {
                item: moved.clone(),
                from,
                to,
            });

            to = from;
            index = parent;
        }

        log.clear();
        false
    }
}
