//! Geographic bounding boxes used to clip global fields to an area of interest.

use serde::{Deserialize, Serialize};

/// A geographic bounding box in degrees (EPSG:4326).
///
/// Longitudes may be given either in -180..180 or 0..360; comparisons against
/// grid axes go through [`normalize_lon`] so both conventions work.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub const fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Parse a `min_lon,min_lat,max_lon,max_lat` string.
    pub fn from_query_string(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let parse = |p: &str| {
            p.trim()
                .parse::<f64>()
                .map_err(|_| BboxParseError::InvalidNumber(p.to_string()))
        };

        let bbox = Self {
            min_lon: parse(parts[0])?,
            min_lat: parse(parts[1])?,
            max_lon: parse(parts[2])?,
            max_lat: parse(parts[3])?,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Check the `lat_min < lat_max` and `lon_min < lon_max` invariant.
    pub fn validate(&self) -> Result<(), BboxParseError> {
        let finite = [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.min_lat >= self.max_lat || self.min_lon >= self.max_lon {
            return Err(BboxParseError::Degenerate(self.to_string()));
        }
        if self.min_lat < -90.0 || self.max_lat > 90.0 {
            return Err(BboxParseError::Degenerate(self.to_string()));
        }
        Ok(())
    }

    /// Width of the bounding box in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height of the bounding box in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Check if a point is contained within this bbox (bounds inclusive).
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        let lon = self.align_lon(lon);
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Grow the box by `margin` degrees on every side.
    pub fn expand(&self, margin: f64) -> BoundingBox {
        BoundingBox {
            min_lon: self.min_lon - margin,
            min_lat: (self.min_lat - margin).max(-90.0),
            max_lon: self.max_lon + margin,
            max_lat: (self.max_lat + margin).min(90.0),
        }
    }

    /// Extent in plotting order: `[lon_min, lon_max, lat_min, lat_max]`.
    pub fn extent(&self) -> [f64; 4] {
        [self.min_lon, self.max_lon, self.min_lat, self.max_lat]
    }

    /// Bring a longitude into the same convention as this box.
    pub fn align_lon(&self, lon: f64) -> f64 {
        if self.min_lon < 0.0 && lon > 180.0 {
            lon - 360.0
        } else if self.min_lon >= 0.0 && lon < 0.0 {
            lon + 360.0
        } else {
            lon
        }
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// Normalize a longitude into the 0..360 range used by GFS grids.
pub fn normalize_lon(lon: f64) -> f64 {
    let l = lon % 360.0;
    if l < 0.0 {
        l + 360.0
    } else {
        l
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid bounding box format: {0}. Expected 'min_lon,min_lat,max_lon,max_lat'")]
    InvalidFormat(String),

    #[error("Invalid number in bounding box: {0}")]
    InvalidNumber(String),

    #[error("Degenerate bounding box: {0}")]
    Degenerate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_bbox() {
        let bbox = BoundingBox::from_query_string("121.5,-11.0,122.3,-10.0").unwrap();
        assert_eq!(bbox.min_lon, 121.5);
        assert_eq!(bbox.min_lat, -11.0);
        assert_eq!(bbox.max_lon, 122.3);
        assert_eq!(bbox.max_lat, -10.0);
    }

    #[test]
    fn test_degenerate_rejected() {
        assert!(BoundingBox::new(10.0, 5.0, 10.0, 6.0).validate().is_err());
        assert!(BoundingBox::new(10.0, 6.0, 11.0, 5.0).validate().is_err());
    }

    #[test]
    fn test_normalize_lon() {
        assert_eq!(normalize_lon(-60.0), 300.0);
        assert_eq!(normalize_lon(121.5), 121.5);
        assert_eq!(normalize_lon(360.0), 0.0);
    }
}
