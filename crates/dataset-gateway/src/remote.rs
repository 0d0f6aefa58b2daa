//! NOMADS GrADS-DODS access over HTTP.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument};

use forecast_common::bbox::normalize_lon;
use forecast_common::grid::axis_window;
use forecast_common::{
    BoundingBox, ForecastError, ForecastResult, ForecastRun, ForecastStep, GriddedField,
};

use crate::opendap::{self, fill_to_nan, find_array, grads_days_to_utc};
use crate::source::{DatasetOpener, GriddedSource};

/// Default NOMADS endpoint for the hourly 0.25° GFS product.
pub const DEFAULT_BASE_URL: &str = "https://nomads.ncep.noaa.gov/dods/gfs_0p25_1hr";

/// Grid cells of padding around a requested window.
const WINDOW_PADDING_CELLS: f64 = 1.0;

/// Configuration for the NOMADS client.
#[derive(Debug, Clone)]
pub struct NomadsConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    /// HTTP request timeout
    pub request_timeout: Duration,
}

impl Default for NomadsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Dataset URL for a run: `{base}/gfs{YYYYMMDD}/gfs_0p25_1hr_{HH}z`.
pub fn dataset_url(base_url: &str, run: &ForecastRun) -> String {
    format!(
        "{}/gfs{}/gfs_0p25_1hr_{}z",
        base_url.trim_end_matches('/'),
        run.date_compact(),
        run.cycle.label()
    )
}

/// Constraint expression for one time slice over an index window.
pub fn hyperslab_query(
    field: &str,
    step: usize,
    lat_range: (usize, usize),
    lon_range: (usize, usize),
) -> String {
    format!(
        "{}[{}][{}:{}][{}:{}]",
        field, step, lat_range.0, lat_range.1, lon_range.0, lon_range.1
    )
}

/// Opens runs on a NOMADS server.
pub struct NomadsOpener {
    client: Client,
    config: NomadsConfig,
}

impl NomadsOpener {
    pub fn new(config: NomadsConfig) -> ForecastResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ForecastError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl DatasetOpener for NomadsOpener {
    #[instrument(skip(self), fields(run = %run))]
    async fn open(&self, run: &ForecastRun) -> ForecastResult<Arc<dyn GriddedSource>> {
        let url = dataset_url(&self.config.base_url, run);
        info!(url = %url, "Opening GFS dataset");

        let dds = fetch_text(&self.client, &format!("{}.dds", url)).await?;
        let variables = opendap::parse_dds_variables(&dds)?;

        let axes = fetch_text(&self.client, &format!("{}.ascii?time,lat,lon", url)).await?;
        let arrays = opendap::parse_ascii(&axes)?;

        let times = find_array(&arrays, "time")?
            .values
            .iter()
            .map(|&d| {
                grads_days_to_utc(d).ok_or_else(|| {
                    ForecastError::MalformedResponse(format!("invalid time value {}", d))
                })
            })
            .collect::<ForecastResult<Vec<_>>>()?;
        let lats = find_array(&arrays, "lat")?.values.clone();
        let lons = find_array(&arrays, "lon")?.values.clone();

        info!(
            steps = times.len(),
            lats = lats.len(),
            lons = lons.len(),
            variables = variables.len(),
            "GFS dataset opened"
        );

        Ok(Arc::new(RemoteDataset {
            client: self.client.clone(),
            url,
            run: *run,
            variables,
            times,
            lats,
            lons,
        }))
    }
}

/// A run on a NOMADS server. Holds coordinates only; field data is fetched
/// per request as a hyperslab around the requested window.
pub struct RemoteDataset {
    client: Client,
    url: String,
    run: ForecastRun,
    variables: BTreeSet<String>,
    times: Vec<DateTime<Utc>>,
    lats: Vec<f64>,
    lons: Vec<f64>,
}

impl RemoteDataset {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Grid spacing of the longitude axis, for padding windows.
    fn lon_step(&self) -> f64 {
        match self.lons.as_slice() {
            [a, b, ..] => (b - a).abs(),
            _ => 0.25,
        }
    }

    /// Index windows `(lat, lon)` covering `window` plus padding.
    fn index_window(
        &self,
        window: &BoundingBox,
    ) -> ForecastResult<((usize, usize), (usize, usize))> {
        let padded = window.expand(self.lon_step() * WINDOW_PADDING_CELLS);

        let lat_range = axis_window(&self.lats, padded.min_lat, padded.max_lat)
            .ok_or_else(|| ForecastError::EmptySubset(window.to_string()))?;

        let min_lon = normalize_lon(padded.min_lon);
        let max_lon = normalize_lon(padded.max_lon);
        let lon_range = if padded.width() >= 360.0 || min_lon > max_lon {
            // Window wraps the grid seam: take every longitude.
            (0, self.lons.len().saturating_sub(1))
        } else {
            axis_window(&self.lons, min_lon, max_lon)
                .ok_or_else(|| ForecastError::EmptySubset(window.to_string()))?
        };

        Ok((lat_range, lon_range))
    }
}

#[async_trait]
impl GriddedSource for RemoteDataset {
    fn run(&self) -> ForecastRun {
        self.run
    }

    fn valid_times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    fn has_field(&self, name: &str) -> bool {
        self.variables.contains(name)
    }

    #[instrument(skip(self, window), fields(url = %self.url, step = step.hour()))]
    async fn read_field(
        &self,
        name: &str,
        step: ForecastStep,
        window: &BoundingBox,
    ) -> ForecastResult<GriddedField> {
        if !self.has_field(name) {
            return Err(ForecastError::MissingField(name.to_string()));
        }
        self.valid_time(step)?;

        let (lat_range, lon_range) = self.index_window(window)?;
        let query = hyperslab_query(name, step.index(), lat_range, lon_range);
        debug!(query = %query, "Fetching hyperslab");

        let body = fetch_text(&self.client, &format!("{}.ascii?{}", self.url, query)).await?;
        let arrays = opendap::parse_ascii(&body)?;

        let data = find_array(&arrays, name)?;
        // Coordinate maps follow the data; fall back to the cached axes.
        let lats = find_array(&arrays, "lat")
            .map(|a| a.values.clone())
            .unwrap_or_else(|_| self.lats[lat_range.0..=lat_range.1].to_vec());
        let lons = find_array(&arrays, "lon")
            .map(|a| a.values.clone())
            .unwrap_or_else(|_| self.lons[lon_range.0..=lon_range.1].to_vec());

        let values = data.values.iter().map(|&v| fill_to_nan(v)).collect();
        GriddedField::new(name, lats, lons, values)
    }
}

/// GET a text body, mapping transport and status failures to user errors.
async fn fetch_text(client: &Client, url: &str) -> ForecastResult<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ForecastError::FetchFailed(e.to_string()))?;

    match response.status() {
        status if status.is_success() => {}
        StatusCode::NOT_FOUND => return Err(ForecastError::RunNotAvailable(url.to_string())),
        status => {
            return Err(ForecastError::FetchFailed(format!(
                "HTTP {} from {}",
                status, url
            )))
        }
    }

    response
        .text()
        .await
        .map_err(|e| ForecastError::FetchFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use forecast_common::ModelCycle;

    #[test]
    fn test_dataset_url() {
        let run = ForecastRun::new(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(), ModelCycle::Z06);
        assert_eq!(
            dataset_url(DEFAULT_BASE_URL, &run),
            "https://nomads.ncep.noaa.gov/dods/gfs_0p25_1hr/gfs20240305/gfs_0p25_1hr_06z"
        );
        assert_eq!(
            dataset_url("http://localhost:9000/dods/", &run),
            "http://localhost:9000/dods/gfs20240305/gfs_0p25_1hr_06z"
        );
    }

    #[test]
    fn test_hyperslab_query() {
        assert_eq!(
            hyperslab_query("pratesfc", 12, (316, 320), (486, 489)),
            "pratesfc[12][316:320][486:489]"
        );
    }
}
