//! Land polygons and border lines from a GeoJSON file.
//!
//! Polygons become filled land with a coastline outline; line strings are
//! drawn as dotted political borders. Any other geometry is ignored.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use forecast_common::ForecastError;

/// Generalised coastlines of the Maritime Continent (about 90..150°E,
/// 25°S..25°N) and the land borders of Indonesia.
const BUNDLED_GEOJSON: &str = include_str!("../assets/basemap.geojson");

/// A `(lon, lat)` polyline or ring.
pub type Line = Vec<(f64, f64)>;

#[derive(Debug, Error)]
pub enum BaseMapError {
    #[error("Failed to read base map: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<BaseMapError> for ForecastError {
    fn from(err: BaseMapError) -> Self {
        ForecastError::RenderError(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeoJson {
    FeatureCollection {
        features: Vec<GeoJson>,
    },
    Feature {
        geometry: Option<Box<GeoJson>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJson>,
    },
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
    LineString {
        coordinates: Vec<Vec<f64>>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    #[serde(other)]
    Other,
}

/// Base map layers in geographic coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseMap {
    /// Each polygon is an outer ring followed by its holes
    pub land: Vec<Vec<Line>>,
    pub borders: Vec<Line>,
}

impl BaseMap {
    /// Ocean only.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_geojson_str(s: &str) -> Result<Self, BaseMapError> {
        let root: GeoJson = serde_json::from_str(s)?;
        let mut map = BaseMap::default();
        map.collect(root);
        Ok(map)
    }

    /// The compiled-in regional base map.
    pub fn bundled() -> Result<Self, BaseMapError> {
        Self::from_geojson_str(BUNDLED_GEOJSON)
    }

    pub fn from_file(path: &Path) -> Result<Self, BaseMapError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&content)
    }

    pub fn is_empty(&self) -> bool {
        self.land.is_empty() && self.borders.is_empty()
    }

    fn collect(&mut self, object: GeoJson) {
        match object {
            GeoJson::FeatureCollection { features } => {
                features.into_iter().for_each(|f| self.collect(f))
            }
            GeoJson::Feature { geometry } => {
                if let Some(geometry) = geometry {
                    self.collect(*geometry);
                }
            }
            GeoJson::GeometryCollection { geometries } => {
                geometries.into_iter().for_each(|g| self.collect(g))
            }
            GeoJson::Polygon { coordinates } => self.push_polygon(coordinates),
            GeoJson::MultiPolygon { coordinates } => {
                coordinates.into_iter().for_each(|p| self.push_polygon(p))
            }
            GeoJson::LineString { coordinates } => self.push_border(coordinates),
            GeoJson::MultiLineString { coordinates } => {
                coordinates.into_iter().for_each(|l| self.push_border(l))
            }
            GeoJson::Other => {}
        }
    }

    fn push_polygon(&mut self, rings: Vec<Vec<Vec<f64>>>) {
        let rings: Vec<Line> = rings
            .into_iter()
            .map(to_line)
            .filter(|r| r.len() >= 3)
            .collect();
        if !rings.is_empty() {
            self.land.push(rings);
        }
    }

    fn push_border(&mut self, positions: Vec<Vec<f64>>) {
        let line = to_line(positions);
        if line.len() >= 2 {
            self.borders.push(line);
        }
    }
}

fn to_line(positions: Vec<Vec<f64>>) -> Line {
    positions
        .into_iter()
        .filter_map(|p| match p.as_slice() {
            [lon, lat, ..] => Some((*lon, *lat)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_collection() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "Sabu"},
                 "geometry": {"type": "Polygon", "coordinates": [[[121.7,-10.6],[122.0,-10.6],[122.0,-10.4],[121.7,-10.6]]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "LineString", "coordinates": [[124.9,-9.2],[125.1,-9.5]]}},
                {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [121.85,-10.525]}},
                {"type": "Feature", "properties": {}, "geometry": null}
            ]
        }"#;
        let map = BaseMap::from_geojson_str(json).unwrap();
        assert_eq!(map.land.len(), 1);
        assert_eq!(map.land[0][0].len(), 4);
        assert_eq!(map.borders.len(), 1);
    }

    #[test]
    fn test_bundled_map_covers_nusa_tenggara() {
        let map = BaseMap::bundled().unwrap();
        assert!(map.land.len() > 20);
        assert_eq!(map.borders.len(), 4);
        let has_ring_around = |lon: f64, lat: f64| {
            map.land.iter().any(|rings| {
                let (min_lon, max_lon, min_lat, max_lat) = rings[0].iter().fold(
                    (f64::MAX, f64::MIN, f64::MAX, f64::MIN),
                    |(a, b, c, d), &(x, y)| (a.min(x), b.max(x), c.min(y), d.max(y)),
                );
                lon > min_lon && lon < max_lon && lat > min_lat && lat < max_lat
            })
        };
        assert!(has_ring_around(121.85, -10.525));
        assert!(has_ring_around(124.5, -9.7));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            BaseMap::from_geojson_str("{not json"),
            Err(BaseMapError::Json(_))
        ));
    }
}
