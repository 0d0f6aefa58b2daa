//! Gridded fields on regular lat/lon grids and spatial subsetting.

use crate::bbox::BoundingBox;
use crate::error::{ForecastError, ForecastResult};
use serde::{Deserialize, Serialize};

/// Tolerance for comparing float coordinates against box edges.
const COORD_EPSILON: f64 = 1e-6;

/// Direction of a coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisOrder {
    Ascending,
    Descending,
}

impl AxisOrder {
    /// Detect the direction of a coordinate array. Single-point axes are ascending.
    pub fn detect(axis: &[f64]) -> AxisOrder {
        match (axis.first(), axis.last()) {
            (Some(first), Some(last)) if last < first => AxisOrder::Descending,
            _ => AxisOrder::Ascending,
        }
    }
}

/// A single time slice of a named field, indexed by (latitude, longitude).
///
/// Values are stored row-major: `values[j * nx + i]` where `j` indexes
/// `lats` and `i` indexes `lons`. The latitude axis keeps the source's native
/// order, which for GFS products may be north-to-south.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GriddedField {
    pub name: String,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    pub values: Vec<f32>,
}

impl GriddedField {
    /// Create a field, checking that the value count matches the axes.
    pub fn new(
        name: impl Into<String>,
        lats: Vec<f64>,
        lons: Vec<f64>,
        values: Vec<f32>,
    ) -> ForecastResult<Self> {
        let name = name.into();
        if values.len() != lats.len() * lons.len() {
            return Err(ForecastError::MalformedResponse(format!(
                "{}: {} values for a {}x{} grid",
                name,
                values.len(),
                lats.len(),
                lons.len()
            )));
        }
        Ok(Self {
            name,
            lats,
            lons,
            values,
        })
    }

    /// Create a field filled with a single value.
    pub fn constant(name: impl Into<String>, lats: Vec<f64>, lons: Vec<f64>, value: f32) -> Self {
        let values = vec![value; lats.len() * lons.len()];
        Self {
            name: name.into(),
            lats,
            lons,
            values,
        }
    }

    /// Number of longitude points.
    pub fn nx(&self) -> usize {
        self.lons.len()
    }

    /// Number of latitude points.
    pub fn ny(&self) -> usize {
        self.lats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at longitude index `i`, latitude index `j`.
    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        if i >= self.nx() || j >= self.ny() {
            return None;
        }
        self.values.get(j * self.nx() + i).copied()
    }

    pub fn lat_order(&self) -> AxisOrder {
        AxisOrder::detect(&self.lats)
    }

    /// Bounding box spanned by the grid points.
    pub fn bbox(&self) -> Option<BoundingBox> {
        let (min_lat, max_lat) = min_max(&self.lats)?;
        let (min_lon, max_lon) = min_max(&self.lons)?;
        Some(BoundingBox::new(min_lon, min_lat, max_lon, max_lat))
    }

    /// Minimum and maximum of the non-NaN values.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.values
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Apply `f` to every value, keeping the coordinates.
    pub fn map<F>(&self, name: impl Into<String>, f: F) -> GriddedField
    where
        F: Fn(f32) -> f32,
    {
        GriddedField {
            name: name.into(),
            lats: self.lats.clone(),
            lons: self.lons.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combine two fields on the same grid point by point.
    pub fn zip_map<F>(
        &self,
        other: &GriddedField,
        name: impl Into<String>,
        f: F,
    ) -> ForecastResult<GriddedField>
    where
        F: Fn(f32, f32) -> f32,
    {
        if self.lats != other.lats || self.lons != other.lons {
            return Err(ForecastError::Internal(format!(
                "grid mismatch between '{}' and '{}'",
                self.name, other.name
            )));
        }
        Ok(GriddedField {
            name: name.into(),
            lats: self.lats.clone(),
            lons: self.lons.clone(),
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    /// Restrict the field to `bbox`, bounds inclusive.
    ///
    /// Nearest-cell selection only. Latitude rows keep their native order, so
    /// a north-to-south axis yields a north-to-south subset. Longitudes are
    /// compared in the box's convention (-180..180 or 0..360) and returned in
    /// ascending order of that convention.
    pub fn subset(&self, bbox: &BoundingBox) -> ForecastResult<GriddedField> {
        let rows: Vec<usize> = self
            .lats
            .iter()
            .enumerate()
            .filter(|(_, &lat)| {
                lat >= bbox.min_lat - COORD_EPSILON && lat <= bbox.max_lat + COORD_EPSILON
            })
            .map(|(j, _)| j)
            .collect();

        let mut cols: Vec<(usize, f64)> = self
            .lons
            .iter()
            .enumerate()
            .map(|(i, &lon)| (i, bbox.align_lon(lon)))
            .filter(|(_, lon)| {
                *lon >= bbox.min_lon - COORD_EPSILON && *lon <= bbox.max_lon + COORD_EPSILON
            })
            .collect();
        cols.sort_by(|a, b| a.1.total_cmp(&b.1));

        if rows.is_empty() || cols.is_empty() {
            return Err(ForecastError::EmptySubset(bbox.to_string()));
        }

        let nx = self.nx();
        let mut values = Vec::with_capacity(rows.len() * cols.len());
        for &j in &rows {
            for &(i, _) in &cols {
                values.push(self.values[j * nx + i]);
            }
        }

        Ok(GriddedField {
            name: self.name.clone(),
            lats: rows.iter().map(|&j| self.lats[j]).collect(),
            lons: cols.iter().map(|&(_, lon)| lon).collect(),
            values,
        })
    }
}

/// Inclusive index window `(start, end)` of `axis` covering `lo..=hi`.
///
/// Works for ascending and descending axes; the returned indices always
/// satisfy `start <= end`. Returns `None` if no coordinate falls inside.
pub fn axis_window(axis: &[f64], lo: f64, hi: f64) -> Option<(usize, usize)> {
    let inside: Vec<usize> = axis
        .iter()
        .enumerate()
        .filter(|(_, &v)| v >= lo - COORD_EPSILON && v <= hi + COORD_EPSILON)
        .map(|(i, _)| i)
        .collect();
    Some((*inside.first()?, *inside.last()?))
}

fn min_max(axis: &[f64]) -> Option<(f64, f64)> {
    let first = *axis.first()?;
    Some(
        axis.iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

/// Common grid definitions for NWP models.
pub mod grids {
    /// Native spacing of the GFS 0.25° products.
    pub const GFS_0P25_STEP: f64 = 0.25;

    /// GFS 0.25° latitudes as served by NOMADS OPeNDAP (-90 to 90).
    pub fn gfs_0p25_lats() -> Vec<f64> {
        (0..721).map(|j| -90.0 + j as f64 * GFS_0P25_STEP).collect()
    }

    /// GFS 0.25° longitudes (0 to 359.75).
    pub fn gfs_0p25_lons() -> Vec<f64> {
        (0..1440).map(|i| i as f64 * GFS_0P25_STEP).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(lats: Vec<f64>, lons: Vec<f64>) -> GriddedField {
        let n = lats.len() * lons.len();
        GriddedField::new("t", lats, lons, (0..n).map(|v| v as f32).collect()).unwrap()
    }

    #[test]
    fn test_gfs_axes() {
        let lats = grids::gfs_0p25_lats();
        let lons = grids::gfs_0p25_lons();
        assert_eq!(lats.len(), 721);
        assert_eq!(lons.len(), 1440);
        assert!((lats[720] - 90.0).abs() < 1e-9);
        assert!((lons[1439] - 359.75).abs() < 1e-9);
    }

    #[test]
    fn test_axis_order_detect() {
        assert_eq!(AxisOrder::detect(&[-11.0, -10.0]), AxisOrder::Ascending);
        assert_eq!(AxisOrder::detect(&[-10.0, -11.0]), AxisOrder::Descending);
        assert_eq!(AxisOrder::detect(&[5.0]), AxisOrder::Ascending);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let err = GriddedField::new("x", vec![0.0, 1.0], vec![0.0], vec![1.0]);
        assert!(matches!(err, Err(ForecastError::MalformedResponse(_))));
    }

    #[test]
    fn test_subset_inclusive_bounds() {
        let f = field(vec![0.0, 0.25, 0.5, 0.75], vec![10.0, 10.25, 10.5]);
        let s = f.subset(&BoundingBox::new(10.25, 0.25, 10.5, 0.5)).unwrap();
        assert_eq!(s.lats, vec![0.25, 0.5]);
        assert_eq!(s.lons, vec![10.25, 10.5]);
        assert_eq!(s.values, vec![4.0, 5.0, 7.0, 8.0]);
    }

    #[test]
    fn test_axis_window_descending() {
        let axis = [1.0, 0.75, 0.5, 0.25, 0.0];
        assert_eq!(axis_window(&axis, 0.25, 0.75), Some((1, 3)));
        assert_eq!(axis_window(&axis, 5.0, 6.0), None);
    }

    #[test]
    fn test_value_range_ignores_nan() {
        let f = GriddedField::new("x", vec![0.0], vec![0.0, 1.0, 2.0], vec![3.0, f32::NAN, -1.0])
            .unwrap();
        assert_eq!(f.value_range(), Some((-1.0, 3.0)));
    }
}
