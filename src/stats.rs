//! Named counters for crawl observability
//!
//! The dedup filter reports suppressed duplicates through this sink so the
//! signal stays visible even when duplicate logging is quieted. Counters
//! are lock-free; the sink is shared between the cooperative crawl context
//! and whatever reads the numbers.

use std::collections::HashMap;

use dashmap::DashMap;

/// Increment-by-name counter sink.
pub trait StatsSink: Send + Sync {
    /// Adds 1 to the counter named `key`, creating it at zero first.
    fn inc_value(&self, key: &str);

    /// Current value of the counter named `key`, 0 if never incremented.
    fn value(&self, key: &str) -> u64;
}

/// Default in-memory [`StatsSink`].
#[derive(Debug, Default)]
pub struct MemoryStats {
    counters: DashMap<String, u64>,
}

impl MemoryStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time copy of every counter.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.counters
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }
}

impl StatsSink for MemoryStats {
    fn inc_value(&self, key: &str) {
        *self.counters.entry(key.to_owned()).or_insert(0) += 1;
    }

    fn value(&self, key: &str) -> u64 {
        self.counters.get(key).map_or(0, |entry| *entry.value())
    }
}
