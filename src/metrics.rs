// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{table_pair::TablePair, Action, Config, Stats, TableId};
use std::fmt::Write;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::Relaxed;

/// Table statistics
///
/// Counters are updated by the table and can be read at any time, also from
/// other threads while a shared table is in use.
#[derive(Debug)]
pub struct Metrics {
    /// Number of insert calls
    pub(crate) insert_attempts: AtomicUsize,

    /// Number of inserts that stored their item
    pub(crate) insert_successes: AtomicUsize,

    /// Number of inserts that failed with `Full`
    pub(crate) insert_full: AtomicUsize,

    /// Number of inserts rejected as duplicate
    pub(crate) insert_duplicates: AtomicUsize,

    pub(crate) lookup_hits: AtomicUsize,
    pub(crate) lookup_misses: AtomicUsize,

    pub(crate) remove_hits: AtomicUsize,
    pub(crate) remove_misses: AtomicUsize,

    /// Number of committed `Moved` actions
    relocations: AtomicUsize,

    /// Items currently stored, per table
    items: [AtomicUsize; 2],

    high_watermark: AtomicUsize,

    /// Successful inserts by number of moved items
    histogram: Box<[AtomicUsize]>,
}

#[allow(clippy::cast_precision_loss)]
impl Metrics {
    pub(crate) fn new(histogram_buckets: usize) -> Self {
        Self {
            insert_attempts: AtomicUsize::default(),
            insert_successes: AtomicUsize::default(),
            insert_full: AtomicUsize::default(),
            insert_duplicates: AtomicUsize::default(),
            lookup_hits: AtomicUsize::default(),
            lookup_misses: AtomicUsize::default(),
            remove_hits: AtomicUsize::default(),
            remove_misses: AtomicUsize::default(),
            relocations: AtomicUsize::default(),
            items: [AtomicUsize::default(), AtomicUsize::default()],
            high_watermark: AtomicUsize::default(),
            histogram: (0..histogram_buckets.max(1))
                .map(|_| AtomicUsize::default())
                .collect(),
        }
    }

    /// Accounts for one committed slot mutation.
    pub(crate) fn observe(&self, action: &Action) {
        match action {
            Action::Added { to, .. } => {
                self.table_items(to.table).fetch_add(1, Relaxed);
            }
            Action::Moved { from, to, .. } => {
                self.relocations.fetch_add(1, Relaxed);
                self.table_items(from.table).fetch_sub(1, Relaxed);
                self.table_items(to.table).fetch_add(1, Relaxed);
            }
            Action::Removed { from, .. } => {
                self.table_items(from.table).fetch_sub(1, Relaxed);
            }
        }

        self.high_watermark.fetch_max(self.item_count(), Relaxed);
    }

    /// Accounts for a successful insert that moved `moved` items.
    pub(crate) fn inserted(&self, moved: usize) {
        self.insert_successes.fetch_add(1, Relaxed);

        let last = self.histogram.len().saturating_sub(1);

        if let Some(bin) = self.histogram.get(moved.min(last)) {
            bin.fetch_add(1, Relaxed);
        }
    }

    /// Zeroes every counter.
    pub(crate) fn reset(&self) {
        for counter in [
            &self.insert_attempts,
            &self.insert_successes,
            &self.insert_full,
            &self.insert_duplicates,
            &self.lookup_hits,
            &self.lookup_misses,
            &self.remove_hits,
            &self.remove_misses,
            &self.relocations,
            &self.high_watermark,
        ] {
            counter.store(0, Relaxed);
        }

        for counter in self.items.iter().chain(self.histogram.iter()) {
            counter.store(0, Relaxed);
        }
    }

    fn table_items(&self, table: TableId) -> &AtomicUsize {
        match table {
            TableId::First => &self.items[0],
            TableId::Second => &self.items[1],
        }
    }

    /// Number of items currently stored.
    pub fn item_count(&self) -> usize {
        self.items.iter().map(|counter| counter.load(Relaxed)).sum()
    }

    /// Number of items moved to their other table.
    pub fn relocations(&self) -> usize {
        self.relocations.load(Relaxed)
    }

    /// Lookup efficiency in percent (0.0 - 1.0).
    pub fn lookup_hit_ratio(&self) -> f64 {
        let hits = self.lookup_hits.load(Relaxed) as f64;
        let queries = hits + self.lookup_misses.load(Relaxed) as f64;
        hits / queries
    }

    /// Copies all counters.
    pub fn snapshot(&self) -> Stats {
        Stats {
            insert_attempts: self.insert_attempts.load(Relaxed),
            insert_successes: self.insert_successes.load(Relaxed),
            insert_full: self.insert_full.load(Relaxed),
            insert_duplicates: self.insert_duplicates.load(Relaxed),
            lookup_hits: self.lookup_hits.load(Relaxed),
            lookup_misses: self.lookup_misses.load(Relaxed),
            remove_hits: self.remove_hits.load(Relaxed),
            remove_misses: self.remove_misses.load(Relaxed),
            relocations: self.relocations.load(Relaxed),
            items: [self.items[0].load(Relaxed), self.items[1].load(Relaxed)],
            high_watermark: self.high_watermark.load(Relaxed),
            relocation_histogram: self
                .histogram
                .iter()
                .map(|bin| bin.load(Relaxed))
                .collect(),
        }
    }
}

/// Renders the occupancy of every bucket, followed by how many buckets hold
/// how many items.
pub(crate) fn table_dump(tables: &TablePair) -> String {
    let bucket_size = usize::from(tables.bucket_size());
    let mut out = String::new();

    for table in TableId::ALL {
        let bucket_count = tables.bucket_count();
        let mut fill = vec![0_usize; bucket_size + 1];
        let used = tables
            .buckets(table)
            .map(|b| usize::from(b.len()))
            .sum::<usize>();

        let _ = writeln!(
            out,
            "{table}: {used}/{} slots in {bucket_count} buckets",
            bucket_count * bucket_size,
        );

        for (index, bucket) in tables.buckets(table).enumerate() {
            let cells = (0..tables.bucket_size())
                .map(|slot| if bucket.is_active(slot) { '#' } else { '.' })
                .collect::<String>();

            let _ = writeln!(out, "  {index:>8} {cells}");

            if let Some(count) = fill.get_mut(usize::from(bucket.len())) {
                *count += 1;
            }
        }

        let _ = writeln!(out, "  fill distribution:");

        for (items, count) in fill.iter().enumerate() {
            let _ = writeln!(out, "    {items}/{bucket_size}: {count}");
        }
    }

    out
}

/// Renders the construction parameters of a table.
pub(crate) fn config_dump(config: &Config, tables: &TablePair) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "table_power: {}", config.table_power);
    let _ = writeln!(out, "buckets_per_table: {}", tables.bucket_count());
    let _ = writeln!(out, "bucket_size: {}", config.bucket_size);
    let _ = writeln!(out, "capacity: {}", tables.capacity());
    let _ = writeln!(out, "max_depth: {}", config.effective_max_depth());
    let _ = writeln!(out, "compute_hashes: {}", config.compute_hashes);
    let _ = writeln!(out, "lookup_on_insert: {}", config.lookup_on_insert);
    let _ = writeln!(
        out,
        "histogram_buckets: {}",
        config.effective_histogram_buckets()
    );
    let _ = writeln!(out, "event_listener: {}", config.event_listener.is_some());
    let _ = writeln!(out, "key_comparator: {}", config.key_comparator.is_some());

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Item, Location};
    use test_log::test;

    #[test]
    fn metrics_item_tracking() {
        let metrics = Metrics::new(3);
        let a = Location::new(TableId::First, 0, 0);
        let b = Location::new(TableId::Second, 1, 0);

        metrics.observe(&Action::Added {
            item: Item::new("a", 1),
            to: a,
        });
        metrics.observe(&Action::Moved {
            item: Item::new("a", 1),
            from: a,
            to: b,
        });
        metrics.observe(&Action::Added {
            item: Item::new("b", 2),
            to: a,
        });

        let stats = metrics.snapshot();
        assert_eq!([1, 1], stats.items);
        assert_eq!(1, stats.relocations);
        assert_eq!(2, stats.high_watermark);

        metrics.observe(&Action::Removed {
            item: Item::new("b", 2),
            from: a,
        });
        assert_eq!(1, metrics.item_count());
        assert_eq!(2, metrics.snapshot().high_watermark);
    }

    #[test]
    fn metrics_histogram_clamps() {
        let metrics = Metrics::new(2);

        metrics.inserted(0);
        metrics.inserted(1);
        metrics.inserted(7);

        let stats = metrics.snapshot();
        assert_eq!(vec![1, 2], stats.relocation_histogram);
        assert_eq!(3, stats.insert_successes);

        metrics.reset();
        assert_eq!(Stats {
            relocation_histogram: vec![0, 0],
            ..Default::default()
        }, metrics.snapshot());
    }

    #[test]
    fn metrics_table_dump() -> crate::Result<()> {
        let mut tables = TablePair::new(1, 2)?;

        tables.apply(&Action::Added {
            item: Item::new("a", 1),
            to: Location::new(TableId::First, 1, 1),
        });

        let dump = table_dump(&tables);
        assert!(dump.contains("T1: 1/4 slots in 2 buckets"));
        assert!(dump.contains("        1 .#\n"));
        assert!(dump.contains("T2: 0/4 slots in 2 buckets"));
        assert!(dump.contains("    1/2: 1\n"));

        Ok(())
    }
}
