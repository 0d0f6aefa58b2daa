//! Dataset gateway caching against in-memory runs.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use dataset_gateway::{DatasetGateway, GriddedSource, MemoryDataset, MemoryOpener};
use forecast_common::{BoundingBox, ForecastError, ForecastRun, ForecastStep, ModelCycle};
use test_utils::{constant_field, sample_run};

fn sabu_box() -> BoundingBox {
    BoundingBox::new(121.5, -11.0, 122.3, -10.0)
}

fn opener_with_sample_run(steps: usize) -> Arc<MemoryOpener> {
    let dataset = MemoryDataset::hourly(sample_run(), steps)
        .with_constant_field("pratesfc", constant_field("pratesfc", &sabu_box(), 0.01));
    Arc::new(MemoryOpener::new().with_dataset(dataset))
}

#[tokio::test]
async fn test_run_opened_once() {
    let opener = opener_with_sample_run(3);
    let mut gateway = DatasetGateway::new(Arc::clone(&opener));

    let first = gateway.open(&sample_run()).await.unwrap();
    let second = gateway.open(&sample_run()).await.unwrap();

    assert_eq!(opener.open_count(), 1);
    assert!(Arc::ptr_eq(&first, &second));

    let stats = gateway.cache_stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn test_distinct_runs_opened_separately() {
    let other = ForecastRun::new(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(), ModelCycle::Z12);
    let opener = Arc::new(
        MemoryOpener::new()
            .with_dataset(MemoryDataset::hourly(sample_run(), 2))
            .with_dataset(MemoryDataset::hourly(other, 2)),
    );
    let mut gateway = DatasetGateway::new(Arc::clone(&opener));

    gateway.open(&sample_run()).await.unwrap();
    gateway.open(&other).await.unwrap();
    gateway.open(&other).await.unwrap();

    assert_eq!(opener.open_count(), 2);
    assert!(gateway.is_cached(&other));
}

#[tokio::test]
async fn test_failed_open_is_not_cached() {
    let opener = Arc::new(MemoryOpener::new());
    let mut gateway = DatasetGateway::new(Arc::clone(&opener));

    for _ in 0..2 {
        let err = gateway.open(&sample_run()).await.err().unwrap();
        assert!(matches!(err, ForecastError::RunNotAvailable(_)));
    }
    assert_eq!(opener.open_count(), 2);
    assert!(!gateway.is_cached(&sample_run()));
}

#[tokio::test]
async fn test_memory_dataset_time_axis() {
    let opener = opener_with_sample_run(4);
    let mut gateway = DatasetGateway::new(opener);
    let dataset = gateway.open(&sample_run()).await.unwrap();

    let step = ForecastStep::new(3).unwrap();
    let valid = dataset.valid_time(step).unwrap();
    assert_eq!(valid, sample_run().reference_time() + Duration::hours(3));

    let beyond = ForecastStep::new(4).unwrap();
    assert!(matches!(
        dataset.valid_time(beyond),
        Err(ForecastError::InvalidForecastStep { step: 4, max: 3 })
    ));
}

#[tokio::test]
async fn test_memory_dataset_missing_field() {
    let opener = opener_with_sample_run(1);
    let mut gateway = DatasetGateway::new(opener);
    let dataset = gateway.open(&sample_run()).await.unwrap();

    let step = ForecastStep::new(0).unwrap();
    assert!(dataset.read_field("pratesfc", step, &sabu_box()).await.is_ok());
    assert!(matches!(
        dataset.read_field("tmp2m", step, &sabu_box()).await,
        Err(ForecastError::MissingField(_))
    ));
}
