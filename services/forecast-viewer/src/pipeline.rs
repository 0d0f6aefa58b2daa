//! The request pipeline: resolve the selection, fetch and subset the fields,
//! derive display values, configure the plot and render it.

use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use dataset_gateway::GriddedSource;
use forecast_common::parameter::{Parameter, ParameterSpec};
use forecast_common::{
    BoundingBox, ForecastError, ForecastResult, ForecastRun, ForecastStep, GriddedField,
    ModelCycle, Region,
};
use renderer::PlotSpec;

use crate::config::ViewerConfig;
use crate::state::AppState;

/// Status line shown after a successful render.
pub const DATASET_LOADED: &str = "Dataset berhasil dimuat dari server NOAA.";

/// Query string of `/api/render`. Everything arrives as text and is
/// validated here so bad input surfaces as a user-facing message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderQuery {
    /// Run date, `YYYY-MM-DD`
    pub date: Option<String>,
    /// Run hour: 00, 06, 12 or 18
    pub hour: Option<String>,
    /// Lead time in hours
    pub step: Option<String>,
    pub parameter: Option<String>,
    /// Built-in region id
    pub region: Option<String>,
    /// Custom `min_lon,min_lat,max_lon,max_lat`; overrides `region`
    pub bbox: Option<String>,
}

/// A validated selection.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub spec: ParameterSpec,
    pub run: ForecastRun,
    pub region: Region,
}

impl RenderRequest {
    /// Validate a query. The parameter is resolved first, so an unknown
    /// parameter is reported before anything else is looked at.
    pub fn from_query(
        query: &RenderQuery,
        config: &ViewerConfig,
        today: NaiveDate,
    ) -> ForecastResult<Self> {
        let parameter = Parameter::from_identifier(query.parameter.as_deref().unwrap_or_default())?;
        let step = ForecastStep::new(parse_step(query.step.as_deref())?)?;
        let spec = parameter.spec(step);

        let region = match query.bbox.as_deref() {
            Some(bbox) => Region::custom(BoundingBox::from_query_string(bbox)?)?,
            None => Region::builtin(query.region.as_deref().unwrap_or(&config.default_region))?,
        };

        let run = match query.date.as_deref() {
            Some(date) => ForecastRun::parse(date, query.hour.as_deref().unwrap_or("00"))?,
            None => ForecastRun::new(
                config.default_run_date(today),
                ModelCycle::parse(query.hour.as_deref().unwrap_or("00"))?,
            ),
        };

        Ok(Self { spec, run, region })
    }
}

fn parse_step(step: Option<&str>) -> ForecastResult<i64> {
    match step.map(str::trim) {
        None | Some("") => Ok(0),
        Some(s) => s
            .parse::<i64>()
            .map_err(|_| ForecastError::MalformedForecastStep(s.to_string())),
    }
}

/// A rendered map and what to tell the user about it.
#[derive(Debug, Clone)]
pub struct RenderedMap {
    pub png: Vec<u8>,
    pub title: String,
    pub status: String,
    pub valid_time: DateTime<Utc>,
}

/// The derived field plus the subset inputs it was computed from.
#[derive(Debug, Clone)]
pub struct DerivedField {
    pub field: GriddedField,
    pub inputs: Vec<GriddedField>,
}

impl DerivedField {
    /// U and V components, for vector parameters.
    pub fn components(&self) -> Option<(GriddedField, GriddedField)> {
        match self.inputs.as_slice() {
            [u, v] => Some((u.clone(), v.clone())),
            _ => None,
        }
    }
}

/// Read every field the parameter needs, clip to the region and derive the
/// display values.
pub async fn derive_field(
    source: &dyn GriddedSource,
    spec: &ParameterSpec,
    region: &Region,
) -> ForecastResult<DerivedField> {
    let mut inputs = Vec::with_capacity(spec.fields.len());
    for name in spec.fields {
        let raw = source.read_field(name, spec.step, &region.bbox).await?;
        let subset = raw.subset(&region.bbox)?;
        debug!(
            field = name,
            nx = subset.nx(),
            ny = subset.ny(),
            lat_order = ?subset.lat_order(),
            extent = ?subset.bbox(),
            "Field subset"
        );
        inputs.push(subset);
    }

    let field = spec
        .derivation
        .apply(&inputs, spec.parameter.identifier())?;
    Ok(DerivedField { field, inputs })
}

/// Run the whole pipeline for one request.
#[instrument(skip(state, request), fields(run = %request.run, step = request.spec.step.hour(), region = request.region.id))]
pub async fn render_map(state: &AppState, request: &RenderRequest) -> ForecastResult<RenderedMap> {
    let RenderRequest { spec, run, region } = request;

    // Held until the image is encoded: requests are served one at a time.
    let mut gateway = state.gateway.lock().await;
    let source = gateway.open(run).await?;
    let valid_time = source.valid_time(spec.step)?;

    let derived = derive_field(source.as_ref(), spec, region).await?;
    let components = if spec.is_vector() {
        derived.components()
    } else {
        None
    };

    let plot = PlotSpec::configure(
        derived.field,
        components,
        spec,
        region,
        &valid_time,
        state.config.image_size,
    )?;

    let start = Instant::now();
    let png = state.renderer.render(&plot)?;
    let elapsed = start.elapsed();
    state.metrics.record_render(elapsed.as_micros() as u64);
    drop(gateway);

    info!(
        bytes = png.len(),
        contour = spec.is_contour(),
        render_ms = elapsed.as_millis() as u64,
        "Map rendered"
    );

    Ok(RenderedMap {
        png,
        title: plot.titles.main().unwrap_or_default().to_string(),
        status: DATASET_LOADED.to_string(),
        valid_time,
    })
}
