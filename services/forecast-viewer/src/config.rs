//! Service configuration, resolved from command line flags and environment.

use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use dataset_gateway::NomadsConfig;
use renderer::DEFAULT_SIZE;

/// Settings shared by the pipeline and the handlers.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub nomads: NomadsConfig,
    /// The form preselects today (UTC) minus this many days
    pub date_offset_days: i64,
    /// Region id preselected in the form
    pub default_region: String,
    pub image_size: (u32, u32),
    /// TrueType font override; the embedded DejaVu Sans when unset
    pub font_path: Option<PathBuf>,
    /// GeoJSON land polygons and border lines; the bundled regional map when unset
    pub basemap_path: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            nomads: NomadsConfig::default(),
            date_offset_days: 0,
            default_region: "sabu-raijua".to_string(),
            image_size: DEFAULT_SIZE,
            font_path: None,
            basemap_path: None,
        }
    }
}

impl ViewerConfig {
    /// Run date offered by default for a given current UTC date.
    pub fn default_run_date(&self, today: NaiveDate) -> NaiveDate {
        today - Duration::days(self.date_offset_days)
    }
}

/// Parse `WIDTHxHEIGHT`.
pub fn parse_image_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(|c| c == 'x' || c == 'X')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .ok()
            .filter(|n| (100..=4000).contains(n))
            .ok_or_else(|| format!("image dimension '{}' must be 100..=4000", v))
    };
    Ok((parse(w)?, parse(h)?))
}
