//! Declarative plot description and the configurator that builds it from a
//! derived field, its parameter bundle and the target region.

use chrono::{DateTime, Utc};

use forecast_common::time::{lead_title, valid_title};
use forecast_common::{
    BoundingBox, ForecastError, ForecastResult, GriddedField, ParameterSpec, Region, RenderMode,
    TitleLayout,
};

use crate::arrows::{ArrowConfig, DEFAULT_ARROW_SCALE};
use crate::colormap::{Color, ColorScale};
use crate::contour::{nice_levels, ContourConfig};

/// Default output size, matching an 8x6 inch figure at 100 dpi.
pub const DEFAULT_SIZE: (u32, u32) = (800, 600);

/// Marker label offset east of the marker, in degrees.
pub const MARKER_LABEL_OFFSET_DEG: f64 = 0.05;

/// U and V components for the arrow overlay.
#[derive(Debug, Clone)]
pub struct VectorLayer {
    pub u: GriddedField,
    pub v: GriddedField,
    pub arrows: ArrowConfig,
}

/// The data layer of a plot.
#[derive(Debug, Clone)]
pub enum PlotLayer {
    /// Pseudo-color cells, optionally with arrows on top.
    Filled {
        field: GriddedField,
        scale: ColorScale,
        vectors: Option<VectorLayer>,
    },
    /// Labeled isolines.
    Contour {
        field: GriddedField,
        config: ContourConfig,
    },
}

/// Title strings. `left` and `right` sit above the map corners; `center`
/// replaces both for centred layouts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Titles {
    pub left: Option<String>,
    pub center: Option<String>,
    pub right: Option<String>,
}

impl Titles {
    /// The main title text, whichever slot it is in.
    pub fn main(&self) -> Option<&str> {
        self.left.as_deref().or(self.center.as_deref())
    }
}

/// Point marker with a text label beside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub lon: f64,
    pub lat: f64,
    pub label: String,
    pub label_offset_deg: f64,
    pub color: Color,
}

/// Vertical colorbar beside the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Colorbar {
    pub scale: ColorScale,
    pub label: String,
}

/// Everything the renderer needs to draw one map.
#[derive(Debug, Clone)]
pub struct PlotSpec {
    pub layer: PlotLayer,
    pub extent: BoundingBox,
    pub titles: Titles,
    pub marker: Marker,
    pub colorbar: Option<Colorbar>,
    pub size: (u32, u32),
}

impl PlotSpec {
    /// Build the plot for a derived field.
    ///
    /// `components` carries the subset U/V fields for vector parameters and is
    /// required when the parameter renders with vectors.
    pub fn configure(
        field: GriddedField,
        components: Option<(GriddedField, GriddedField)>,
        spec: &ParameterSpec,
        region: &Region,
        valid_time: &DateTime<Utc>,
        size: (u32, u32),
    ) -> ForecastResult<PlotSpec> {
        let scale = ColorScale::new(spec.colormap, spec.value_range);

        let (layer, colorbar) = match spec.render_mode {
            RenderMode::Contour { levels } => {
                let (min, max) = field.value_range().ok_or_else(|| {
                    ForecastError::RenderError(format!("no valid values in '{}'", field.name))
                })?;
                let config = ContourConfig {
                    levels: nice_levels(min, max, levels),
                    ..ContourConfig::default()
                };
                (PlotLayer::Contour { field, config }, None)
            }
            RenderMode::Filled => (
                PlotLayer::Filled {
                    field,
                    scale,
                    vectors: None,
                },
                Some(scale),
            ),
            RenderMode::FilledWithVectors => {
                let (u, v) = components.ok_or_else(|| {
                    ForecastError::Internal("vector components missing".to_string())
                })?;
                let arrows = ArrowConfig {
                    stride: region.vector_stride,
                    scale: DEFAULT_ARROW_SCALE,
                    ..ArrowConfig::default()
                };
                (
                    PlotLayer::Filled {
                        field,
                        scale,
                        vectors: Some(VectorLayer { u, v, arrows }),
                    },
                    Some(scale),
                )
            }
        };

        let valid = valid_title(spec.label, valid_time);
        let titles = match region.title_layout {
            TitleLayout::Split => Titles {
                left: Some(valid),
                center: None,
                right: Some(lead_title(spec.step.hour())),
            },
            TitleLayout::Centered => Titles {
                left: None,
                center: Some(valid),
                right: None,
            },
        };

        let poi = region.point_of_interest;
        Ok(PlotSpec {
            layer,
            extent: region.bbox,
            titles,
            marker: Marker {
                lon: poi.lon,
                lat: poi.lat,
                label: poi.name.to_string(),
                label_offset_deg: MARKER_LABEL_OFFSET_DEG,
                color: Color::RED,
            },
            colorbar: colorbar.map(|scale| Colorbar {
                scale,
                label: spec.label.to_string(),
            }),
            size,
        })
    }

    /// Whether the plot draws arrows.
    pub fn has_vectors(&self) -> bool {
        matches!(
            self.layer,
            PlotLayer::Filled {
                vectors: Some(_),
                ..
            }
        )
    }
}
