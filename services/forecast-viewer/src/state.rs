//! Application state and shared resources.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::{info, warn};

use dataset_gateway::DatasetGateway;
use renderer::{BaseMap, MapRenderer, TextRenderer};

use crate::config::ViewerConfig;
use crate::metrics::MetricsCollector;

/// Shared application state.
///
/// The gateway sits behind an async mutex: one pipeline runs at a time, and
/// the per-run dataset cache lives inside it.
pub struct AppState {
    pub gateway: Mutex<DatasetGateway>,
    pub renderer: MapRenderer,
    pub config: ViewerConfig,
    pub metrics: Arc<MetricsCollector>,
}

impl AppState {
    /// State backed by NOMADS, with font and base map loaded from `config`.
    pub fn new(config: ViewerConfig) -> Result<Self> {
        let gateway = DatasetGateway::nomads(config.nomads.clone())?;
        let renderer = MapRenderer::new(load_font(&config), load_basemap(&config));
        Ok(Self::with_gateway(gateway, renderer, config))
    }

    pub fn with_gateway(
        gateway: DatasetGateway,
        renderer: MapRenderer,
        config: ViewerConfig,
    ) -> Self {
        Self {
            gateway: Mutex::new(gateway),
            renderer,
            config,
            metrics: Arc::new(MetricsCollector::new()),
        }
    }
}

fn load_font(config: &ViewerConfig) -> Option<TextRenderer> {
    if let Some(path) = config.font_path.as_ref() {
        match TextRenderer::from_file(path) {
            Ok(font) => {
                info!(path = %path.display(), "Font loaded");
                return Some(font);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Font unavailable, using embedded font")
            }
        }
    }
    match TextRenderer::embedded() {
        Ok(font) => Some(font),
        Err(e) => {
            warn!(error = %e, "Embedded font unavailable, maps will have no text");
            None
        }
    }
}

fn load_basemap(config: &ViewerConfig) -> BaseMap {
    if let Some(path) = config.basemap_path.as_ref() {
        match BaseMap::from_file(path) {
            Ok(map) => {
                info!(
                    path = %path.display(),
                    land = map.land.len(),
                    borders = map.borders.len(),
                    "Base map loaded"
                );
                return map;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Base map unavailable, using bundled map")
            }
        }
    }
    match BaseMap::bundled() {
        Ok(map) => map,
        Err(e) => {
            warn!(error = %e, "Bundled base map unavailable, drawing ocean only");
            BaseMap::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use forecast_common::{ForecastStep, Parameter, Region};
    use renderer::{Color, MapFrame, PlotSpec, DEFAULT_SIZE};
    use test_utils::constant_field;

    #[test]
    fn test_default_config_draws_land_and_text() {
        let state = AppState::new(ViewerConfig::default()).unwrap();
        assert!(state.renderer.has_font());

        let region = Region::builtin("ntt").unwrap();
        let spec = Parameter::MeanSeaLevelPressure.spec(ForecastStep::new(0).unwrap());
        let field = constant_field("prmsl", &region.bbox, 1010.0);
        let valid = Utc.with_ymd_and_hms(2024, 3, 5, 6, 0, 0).unwrap();
        let plot = PlotSpec::configure(field, None, &spec, &region, &valid, DEFAULT_SIZE).unwrap();
        let img = state.renderer.render_image(&plot).unwrap();

        let frame = MapFrame::layout(plot.size, plot.extent, plot.colorbar.is_some());
        let timor = frame.to_pixel(124.5, -9.7);
        assert_eq!(
            img.get_pixel(timor.x as u32, timor.y as u32).0,
            Color::LIGHT_GRAY.to_rgba().0
        );

        let title_ink = (0..(frame.y0 as u32).saturating_sub(3))
            .flat_map(|y| (0..img.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| img.get_pixel(x, y).0[0] < 128)
            .count();
        assert!(title_ink > 50);
    }

    #[test]
    fn test_bad_paths_fall_back_to_bundled_assets() {
        let config = ViewerConfig {
            font_path: Some("/nonexistent/font.ttf".into()),
            basemap_path: Some("/nonexistent/land.geojson".into()),
            ..ViewerConfig::default()
        };
        assert!(load_font(&config).is_some());
        assert!(!load_basemap(&config).is_empty());
    }
}
