//! Map rendering for gridded forecast fields.
//!
//! A [`PlotSpec`] describes one map: the data layer (filled cells, optional
//! wind arrows, or labeled contours), the region extent, titles, the point
//! marker and the colorbar. [`MapRenderer`] draws it onto a plate carrée
//! frame and encodes PNG.

pub mod arrows;
pub mod basemap;
pub mod colormap;
pub mod contour;
pub mod map;
pub mod plot;
pub mod text;

pub use basemap::BaseMap;
pub use colormap::{Color, ColorScale};
pub use map::{encode_png, MapFrame, MapRenderer};
pub use plot::{PlotLayer, PlotSpec, Titles, DEFAULT_SIZE};
pub use text::TextRenderer;
