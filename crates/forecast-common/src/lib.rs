//! Common types shared by the forecast viewer crates: regions, runs,
//! gridded fields and the parameter table.

pub mod bbox;
pub mod error;
pub mod grid;
pub mod parameter;
pub mod region;
pub mod time;

pub use bbox::BoundingBox;
pub use error::{ForecastError, ForecastResult, Severity};
pub use grid::{AxisOrder, GriddedField};
pub use parameter::{Colormap, Derivation, Parameter, ParameterSpec, RenderMode, UnitConversion};
pub use region::{PointOfInterest, Region, TitleLayout};
pub use time::{ForecastRun, ForecastStep, ModelCycle};
