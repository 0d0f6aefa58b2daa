//! Parameter resolution: which fields to read, how to derive display values,
//! and how the result should be drawn.

use serde::Serialize;

use crate::error::{ForecastError, ForecastResult};
use crate::grid::GriddedField;
use crate::time::ForecastStep;

/// Seconds per hour, for kg/m²/s → mm/h.
pub const SECONDS_PER_HOUR: f32 = 3600.0;
/// Kelvin offset for K → °C.
pub const KELVIN_OFFSET: f32 = 273.15;
/// m/s → knots.
pub const MS_TO_KNOTS: f32 = 1.94384;
/// Pa → hPa.
pub const PA_PER_HPA: f32 = 100.0;

/// The four parameters the viewer offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    PrecipitationRate,
    Temperature2m,
    Wind10m,
    MeanSeaLevelPressure,
}

/// Identifier lookup order. The first identifier contained in the input wins.
const IDENTIFIERS: [(&str, Parameter); 4] = [
    ("pratesfc", Parameter::PrecipitationRate),
    ("tmp2m", Parameter::Temperature2m),
    ("ugrd10m", Parameter::Wind10m),
    ("prmsl", Parameter::MeanSeaLevelPressure),
];

impl Parameter {
    pub fn all() -> &'static [Parameter] {
        &[
            Parameter::PrecipitationRate,
            Parameter::Temperature2m,
            Parameter::Wind10m,
            Parameter::MeanSeaLevelPressure,
        ]
    }

    /// Match free-form UI text such as `"Suhu Permukaan (tmp2m)"`.
    pub fn from_identifier(input: &str) -> ForecastResult<Parameter> {
        let needle = input.to_ascii_lowercase();
        IDENTIFIERS
            .iter()
            .find(|(id, _)| needle.contains(id))
            .map(|(_, p)| *p)
            .ok_or_else(|| ForecastError::InvalidParameter(input.to_string()))
    }

    /// Short identifier matched by [`Parameter::from_identifier`].
    pub fn identifier(&self) -> &'static str {
        match self {
            Parameter::PrecipitationRate => "pratesfc",
            Parameter::Temperature2m => "tmp2m",
            Parameter::Wind10m => "ugrd10m",
            Parameter::MeanSeaLevelPressure => "prmsl",
        }
    }

    /// Text shown in the parameter selector.
    pub fn display_name(&self) -> &'static str {
        match self {
            Parameter::PrecipitationRate => "Curah Hujan per jam (pratesfc)",
            Parameter::Temperature2m => "Suhu Permukaan (tmp2m)",
            Parameter::Wind10m => "Angin Permukaan (ugrd10m & vgrd10m)",
            Parameter::MeanSeaLevelPressure => "Tekanan Permukaan Laut (prmslmsl)",
        }
    }

    /// Rendering bundle for this parameter.
    pub fn spec(&self, step: ForecastStep) -> ParameterSpec {
        match self {
            Parameter::PrecipitationRate => ParameterSpec {
                parameter: *self,
                step,
                fields: &["pratesfc"],
                derivation: Derivation::Convert(UnitConversion::Scale(SECONDS_PER_HOUR)),
                label: "Curah Hujan (mm/jam)",
                colormap: Colormap::Blues,
                value_range: (0.0, 50.0),
                render_mode: RenderMode::Filled,
            },
            Parameter::Temperature2m => ParameterSpec {
                parameter: *self,
                step,
                fields: &["tmp2m"],
                derivation: Derivation::Convert(UnitConversion::Offset(-KELVIN_OFFSET)),
                label: "Suhu (°C)",
                colormap: Colormap::Coolwarm,
                value_range: (-5.0, 35.0),
                render_mode: RenderMode::Filled,
            },
            Parameter::Wind10m => ParameterSpec {
                parameter: *self,
                step,
                fields: &["ugrd10m", "vgrd10m"],
                derivation: Derivation::VectorMagnitude { scale: MS_TO_KNOTS },
                label: "Kecepatan Angin (knot)",
                colormap: Colormap::RdYlGnReversed { bins: 10 },
                value_range: (0.0, 30.0),
                render_mode: RenderMode::FilledWithVectors,
            },
            Parameter::MeanSeaLevelPressure => ParameterSpec {
                parameter: *self,
                step,
                fields: &["prmslmsl"],
                derivation: Derivation::Convert(UnitConversion::Divide(PA_PER_HPA)),
                label: "Tekanan Permukaan Laut (hPa)",
                colormap: Colormap::Cool,
                value_range: (990.0, 1025.0),
                render_mode: RenderMode::Contour { levels: 15 },
            },
        }
    }
}

/// Resolve a UI parameter selection and lead time into a [`ParameterSpec`].
pub fn resolve(identifier: &str, step: ForecastStep) -> ForecastResult<ParameterSpec> {
    Ok(Parameter::from_identifier(identifier)?.spec(step))
}

/// Value-by-value unit conversion of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitConversion {
    /// value * factor
    Scale(f32),
    /// value + offset
    Offset(f32),
    /// value / divisor
    Divide(f32),
}

impl UnitConversion {
    pub fn apply(&self, value: f32) -> f32 {
        match self {
            UnitConversion::Scale(factor) => value * factor,
            UnitConversion::Offset(offset) => value + offset,
            UnitConversion::Divide(divisor) => value / divisor,
        }
    }
}

/// How the display field is derived from the raw field(s).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Derivation {
    /// One field, converted value by value
    Convert(UnitConversion),
    /// sqrt(u² + v²) * scale, from exactly two component fields
    VectorMagnitude { scale: f32 },
}

impl Derivation {
    /// Speed from vector components.
    pub fn magnitude(u: f32, v: f32, scale: f32) -> f32 {
        (u * u + v * v).sqrt() * scale
    }

    /// Derive the display field from the fields named in the spec, in order.
    pub fn apply(&self, fields: &[GriddedField], name: &str) -> ForecastResult<GriddedField> {
        match (self, fields) {
            (Derivation::Convert(conversion), [field]) => {
                Ok(field.map(name, |v| conversion.apply(v)))
            }
            (Derivation::VectorMagnitude { scale }, [u, v]) => {
                let scale = *scale;
                u.zip_map(v, name, |a, b| Self::magnitude(a, b, scale))
            }
            (Derivation::Convert(_), _) => Err(ForecastError::Internal(format!(
                "unit conversion needs 1 field, got {}",
                fields.len()
            ))),
            (Derivation::VectorMagnitude { .. }, _) => Err(ForecastError::Internal(format!(
                "vector magnitude needs 2 components, got {}",
                fields.len()
            ))),
        }
    }
}

/// Named color schemes. Colors themselves live in the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Colormap {
    /// Sequential white-to-blue.
    Blues,
    /// Diverging blue-white-red.
    Coolwarm,
    /// Red-yellow-green reversed, quantized into `bins` classes.
    RdYlGnReversed { bins: usize },
    /// Cyan-to-magenta.
    Cool,
}

/// How the derived field is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderMode {
    /// Pseudo-color raster with a colorbar.
    Filled,
    /// Pseudo-color raster plus direction arrows.
    FilledWithVectors,
    /// Labeled contour lines at `levels` automatically spaced levels.
    Contour { levels: usize },
}

/// Everything needed to fetch, derive and style one parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub parameter: Parameter,
    pub step: ForecastStep,
    /// Dataset variables to read, in derivation order.
    pub fields: &'static [&'static str],
    pub derivation: Derivation,
    pub label: &'static str,
    pub colormap: Colormap,
    pub value_range: (f32, f32),
    pub render_mode: RenderMode,
}

impl ParameterSpec {
    pub fn is_vector(&self) -> bool {
        matches!(self.render_mode, RenderMode::FilledWithVectors)
    }

    pub fn is_contour(&self) -> bool {
        matches!(self.render_mode, RenderMode::Contour { .. })
    }
}
