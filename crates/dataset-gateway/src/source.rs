//! The seam between the pipeline and wherever gridded data comes from.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use forecast_common::{
    BoundingBox, ForecastError, ForecastResult, ForecastRun, ForecastStep, GriddedField,
};

/// A queryable forecast run: named fields over (step, lat, lon) plus a time axis.
#[async_trait]
pub trait GriddedSource: Send + Sync {
    /// The run this dataset belongs to.
    fn run(&self) -> ForecastRun;

    /// Valid time of every forecast step, indexed by step.
    fn valid_times(&self) -> &[DateTime<Utc>];

    /// Whether the dataset exposes a variable with this name.
    fn has_field(&self, name: &str) -> bool;

    /// Read one time slice of `name` covering at least `window`.
    ///
    /// Implementations may return more than the window; callers clip with
    /// [`GriddedField::subset`].
    async fn read_field(
        &self,
        name: &str,
        step: ForecastStep,
        window: &BoundingBox,
    ) -> ForecastResult<GriddedField>;

    /// Valid time for `step`, checked against the time dimension.
    fn valid_time(&self, step: ForecastStep) -> ForecastResult<DateTime<Utc>> {
        let times = self.valid_times();
        times
            .get(step.index())
            .copied()
            .ok_or(ForecastError::InvalidForecastStep {
                step: step.hour() as i64,
                max: times.len().saturating_sub(1) as u32,
            })
    }
}

/// Opens the dataset for a run. Called once per run; results are cached by
/// the [`crate::DatasetGateway`].
#[async_trait]
pub trait DatasetOpener: Send + Sync {
    async fn open(&self, run: &ForecastRun) -> ForecastResult<Arc<dyn GriddedSource>>;
}

#[async_trait]
impl<T: DatasetOpener + ?Sized> DatasetOpener for Arc<T> {
    async fn open(&self, run: &ForecastRun) -> ForecastResult<Arc<dyn GriddedSource>> {
        (**self).open(run).await
    }
}
