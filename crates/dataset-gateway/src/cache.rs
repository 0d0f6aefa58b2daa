//! Per-session memoization of opened datasets.

use std::collections::HashMap;
use std::sync::Arc;

use forecast_common::ForecastRun;

use crate::source::GriddedSource;

/// Datasets keyed by run. Entries are never evicted: a session only ever
/// touches a handful of runs, and a handle holds coordinates only.
#[derive(Default)]
pub struct DatasetCache {
    entries: HashMap<ForecastRun, Arc<dyn GriddedSource>>,
    hits: u64,
    misses: u64,
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a run, counting the hit or miss.
    pub fn get(&mut self, run: &ForecastRun) -> Option<Arc<dyn GriddedSource>> {
        match self.entries.get(run) {
            Some(dataset) => {
                self.hits += 1;
                metrics::counter!("dataset_cache_hits_total").increment(1);
                Some(Arc::clone(dataset))
            }
            None => {
                self.misses += 1;
                metrics::counter!("dataset_cache_misses_total").increment(1);
                None
            }
        }
    }

    pub fn insert(&mut self, run: ForecastRun, dataset: Arc<dyn GriddedSource>) {
        self.entries.insert(run, dataset);
    }

    pub fn contains(&self, run: &ForecastRun) -> bool {
        self.entries.contains_key(run)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}
