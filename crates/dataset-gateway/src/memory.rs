//! In-memory datasets, for tests and offline rendering.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use forecast_common::{
    BoundingBox, ForecastError, ForecastResult, ForecastRun, ForecastStep, GriddedField,
};

use crate::source::{DatasetOpener, GriddedSource};

/// A run held entirely in memory: one field per variable per step.
#[derive(Debug, Clone)]
pub struct MemoryDataset {
    run: ForecastRun,
    times: Vec<DateTime<Utc>>,
    fields: HashMap<String, Vec<GriddedField>>,
}

impl MemoryDataset {
    pub fn new(run: ForecastRun, times: Vec<DateTime<Utc>>) -> Self {
        Self {
            run,
            times,
            fields: HashMap::new(),
        }
    }

    /// Hourly time axis starting at the run's reference time.
    pub fn hourly(run: ForecastRun, steps: usize) -> Self {
        let start = run.reference_time();
        let times = (0..steps)
            .map(|h| start + Duration::hours(h as i64))
            .collect();
        Self::new(run, times)
    }

    /// Add a variable with one field per step.
    pub fn with_field(mut self, name: &str, slices: Vec<GriddedField>) -> Self {
        self.fields.insert(name.to_string(), slices);
        self
    }

    /// Add a variable holding the same field at every step.
    pub fn with_constant_field(self, name: &str, field: GriddedField) -> Self {
        let slices = vec![field; self.times.len()];
        self.with_field(name, slices)
    }
}

#[async_trait]
impl GriddedSource for MemoryDataset {
    fn run(&self) -> ForecastRun {
        self.run
    }

    fn valid_times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    async fn read_field(
        &self,
        name: &str,
        step: ForecastStep,
        _window: &BoundingBox,
    ) -> ForecastResult<GriddedField> {
        let slices = self
            .fields
            .get(name)
            .ok_or_else(|| ForecastError::MissingField(name.to_string()))?;
        self.valid_time(step)?;
        slices
            .get(step.index())
            .cloned()
            .ok_or(ForecastError::InvalidForecastStep {
                step: step.hour() as i64,
                max: slices.len().saturating_sub(1) as u32,
            })
    }
}

/// Serves prepared datasets and counts how often it was asked to open one.
#[derive(Default)]
pub struct MemoryOpener {
    datasets: HashMap<ForecastRun, Arc<MemoryDataset>>,
    opens: AtomicUsize,
}

impl MemoryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, dataset: MemoryDataset) -> Self {
        self.datasets.insert(dataset.run, Arc::new(dataset));
        self
    }

    /// Number of `open` calls so far, including failed ones.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatasetOpener for MemoryOpener {
    async fn open(&self, run: &ForecastRun) -> ForecastResult<Arc<dyn GriddedSource>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.datasets
            .get(run)
            .map(|d| Arc::clone(d) as Arc<dyn GriddedSource>)
            .ok_or_else(|| ForecastError::RunNotAvailable(run.to_string()))
    }
}
