// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// Point-in-time copy of the table statistics
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Number of insert calls with a valid key
    pub insert_attempts: usize,

    /// Number of inserts that stored their item
    pub insert_successes: usize,

    /// Number of inserts that failed because no placement was found
    pub insert_full: usize,

    /// Number of inserts rejected because the key was already present
    pub insert_duplicates: usize,

    /// Number of lookups that found their key
    pub lookup_hits: usize,

    /// Number of lookups that did not find their key
    pub lookup_misses: usize,

    /// Number of removes that found their key
    pub remove_hits: usize,

    /// Number of removes that did not find their key
    pub remove_misses: usize,

    /// Number of items moved to their other table
    pub relocations: usize,

    /// Items currently stored per table
    pub items: [usize; 2],

    /// Highest number of items stored at the same time
    pub high_watermark: usize,

    /// Successful inserts by relocation chain length
    ///
    /// Bin `i` counts inserts that moved `i` items, the last bin also counts
    /// all longer chains.
    pub relocation_histogram: Vec<usize>,
}

impl Stats {
    /// Items currently stored
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.items.iter().sum()
    }
}

impl std::fmt::Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [t1, t2] = self.items;

        writeln!(
            f,
            "insert: attempts={} ok={} full={} duplicate={}",
            self.insert_attempts, self.insert_successes, self.insert_full, self.insert_duplicates,
        )?;
        writeln!(
            f,
            "lookup: hit={} miss={}",
            self.lookup_hits, self.lookup_misses
        )?;
        writeln!(
            f,
            "remove: hit={} miss={}",
            self.remove_hits, self.remove_misses
        )?;
        writeln!(f, "relocations: {}", self.relocations)?;
        writeln!(
            f,
            "items: T1={t1} T2={t2} total={} high_watermark={}",
            self.total_items(),
            self.high_watermark,
        )?;

        writeln!(f, "relocation chains:")?;

        let last = self.relocation_histogram.len().saturating_sub(1);

        for (moved, count) in self.relocation_histogram.iter().enumerate() {
            if moved == last && last > 0 {
                writeln!(f, "  >={moved}: {count}")?;
            } else {
                writeln!(f, "  {moved}: {count}")?;
            }
        }

        Ok(())
    }
}
