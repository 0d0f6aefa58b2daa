//! Opens runs through a [`DatasetOpener`] and remembers them.

use std::sync::Arc;

use tracing::{debug, info};

use forecast_common::{ForecastResult, ForecastRun};

use crate::cache::{CacheStats, DatasetCache};
use crate::remote::{NomadsConfig, NomadsOpener};
use crate::source::{DatasetOpener, GriddedSource};

/// Dataset access with per-run memoization.
///
/// Each run is opened at most once per gateway. Failed opens are not cached,
/// so a run that appears on the server later can still be opened.
pub struct DatasetGateway {
    opener: Box<dyn DatasetOpener>,
    cache: DatasetCache,
}

impl DatasetGateway {
    pub fn new(opener: impl DatasetOpener + 'static) -> Self {
        Self {
            opener: Box::new(opener),
            cache: DatasetCache::new(),
        }
    }

    /// Gateway backed by a NOMADS server.
    pub fn nomads(config: NomadsConfig) -> ForecastResult<Self> {
        Ok(Self::new(NomadsOpener::new(config)?))
    }

    /// Return the dataset for `run`, opening it on first use.
    pub async fn open(&mut self, run: &ForecastRun) -> ForecastResult<Arc<dyn GriddedSource>> {
        if let Some(dataset) = self.cache.get(run) {
            debug!(run = %run, "Dataset cache hit");
            return Ok(dataset);
        }

        let dataset = self.opener.open(run).await?;
        info!(run = %run, steps = dataset.valid_times().len(), "Dataset cached");
        self.cache.insert(*run, Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn is_cached(&self, run: &ForecastRun) -> bool {
        self.cache.contains(run)
    }
}
