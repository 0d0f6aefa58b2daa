//! Shared setup for the service tests.

#![allow(dead_code)]

use std::sync::Arc;

use dataset_gateway::{DatasetGateway, MemoryDataset, MemoryOpener};
use forecast_common::BoundingBox;
use forecast_viewer::config::ViewerConfig;
use forecast_viewer::state::AppState;
use renderer::MapRenderer;
use test_utils::{constant_field, pressure_field, sample_run, temperature_field, wind_fields};

/// Covers every built-in region.
pub const ALL_REGIONS: BoundingBox = BoundingBox::new(94.0, -11.5, 142.0, 6.5);

/// A run with all four parameters: 0.01 kg/m²/s precipitation everywhere,
/// synthetic temperature, wind and pressure.
pub fn sample_dataset() -> MemoryDataset {
    let (u, v) = wind_fields(&ALL_REGIONS);
    MemoryDataset::hourly(sample_run(), 25)
        .with_constant_field("pratesfc", constant_field("pratesfc", &ALL_REGIONS, 0.01))
        .with_constant_field("tmp2m", temperature_field(&ALL_REGIONS))
        .with_constant_field("ugrd10m", u)
        .with_constant_field("vgrd10m", v)
        .with_constant_field("prmslmsl", pressure_field(&ALL_REGIONS))
}

pub fn memory_opener() -> Arc<MemoryOpener> {
    Arc::new(MemoryOpener::new().with_dataset(sample_dataset()))
}

pub fn app_state(opener: &Arc<MemoryOpener>) -> Arc<AppState> {
    Arc::new(AppState::with_gateway(
        DatasetGateway::new(Arc::clone(opener)),
        MapRenderer::default(),
        ViewerConfig::default(),
    ))
}
