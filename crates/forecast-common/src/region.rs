//! Map regions offered by the viewer.

use serde::Serialize;

use crate::bbox::BoundingBox;
use crate::error::{ForecastError, ForecastResult};

/// A named location annotated on every map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointOfInterest {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

/// Sabu Raijua regency, East Nusa Tenggara.
pub const SABU_RAIJUA: PointOfInterest = PointOfInterest {
    name: "Sabu Raijua",
    lat: -10.525,
    lon: 121.85,
};

/// How the map title is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleLayout {
    /// Valid-time title on the left, model lead time on the right.
    Split,
    /// Valid-time title only, centred.
    Centered,
}

/// A fixed map window plus its cosmetic settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Region {
    pub id: &'static str,
    pub name: &'static str,
    pub bbox: BoundingBox,
    pub point_of_interest: PointOfInterest,
    /// Draw a wind arrow every `vector_stride` grid points.
    pub vector_stride: usize,
    pub title_layout: TitleLayout,
}

/// Local district: Sabu Raijua.
pub const SABU_RAIJUA_REGION: Region = Region {
    id: "sabu-raijua",
    name: "Kabupaten Sabu Raijua",
    bbox: BoundingBox::new(121.5, -11.0, 122.3, -10.0),
    point_of_interest: SABU_RAIJUA,
    vector_stride: 2,
    title_layout: TitleLayout::Split,
};

/// Province: Nusa Tenggara Timur.
pub const NTT_REGION: Region = Region {
    id: "ntt",
    name: "Provinsi Nusa Tenggara Timur",
    bbox: BoundingBox::new(118.5, -11.5, 125.5, -7.5),
    point_of_interest: SABU_RAIJUA,
    vector_stride: 5,
    title_layout: TitleLayout::Split,
};

/// National: Indonesia.
pub const INDONESIA_REGION: Region = Region {
    id: "indonesia",
    name: "Indonesia",
    bbox: BoundingBox::new(94.0, -11.5, 142.0, 6.5),
    point_of_interest: SABU_RAIJUA,
    vector_stride: 5,
    title_layout: TitleLayout::Centered,
};

/// Boxes wider than this many degrees get the sparse arrow stride.
const WIDE_REGION_DEGREES: f64 = 2.0;

impl Region {
    /// All built-in regions, local first.
    pub fn all() -> &'static [Region] {
        &[SABU_RAIJUA_REGION, NTT_REGION, INDONESIA_REGION]
    }

    /// Look up a built-in region by id (case-insensitive).
    pub fn builtin(id: &str) -> ForecastResult<Region> {
        Self::all()
            .iter()
            .find(|r| r.id.eq_ignore_ascii_case(id.trim()))
            .copied()
            .ok_or_else(|| ForecastError::UnknownRegion(id.to_string()))
    }

    /// An ad-hoc region for a user supplied box.
    pub fn custom(bbox: BoundingBox) -> ForecastResult<Region> {
        bbox.validate()?;
        let wide = bbox.width() > WIDE_REGION_DEGREES || bbox.height() > WIDE_REGION_DEGREES;
        Ok(Region {
            id: "custom",
            name: "Custom",
            bbox,
            point_of_interest: SABU_RAIJUA,
            vector_stride: if wide { 5 } else { 2 },
            title_layout: TitleLayout::Split,
        })
    }

    /// Whether the point of interest falls inside the map window.
    pub fn shows_point_of_interest(&self) -> bool {
        self.bbox
            .contains_point(self.point_of_interest.lon, self.point_of_interest.lat)
    }
}
