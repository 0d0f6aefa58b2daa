//! Test data generators for creating synthetic weather-like data.
//!
//! The `create_*` functions return raw row-major value grids. The `*_field`
//! functions wrap them in a [`GriddedField`] on a GFS 0.25° window around a
//! bounding box, with latitudes ascending as NOMADS serves them.

use forecast_common::grid::grids::GFS_0P25_STEP;
use forecast_common::{BoundingBox, GriddedField};

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0); // col=1, row=0
/// assert_eq!(grid[10], 1.0);   // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a test grid with temperature-like values in Kelvin.
///
/// The values range from 290K to 310K, a tropical gradient from the first
/// row/column to the last.
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f32 / width.max(1) as f32;
            let y_factor = row as f32 / height.max(1) as f32;
            data.push(290.0 + x_factor * 10.0 + y_factor * 10.0);
        }
    }
    data
}

/// Creates a U-component wind grid (west-east component), varying by row.
pub fn create_u_wind_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for _col in 0..width {
            let lat_factor = (row as f32 / height.max(1) as f32 - 0.5) * 2.0; // -1 to 1
            data.push(lat_factor * 10.0);
        }
    }
    data
}

/// Creates a V-component wind grid (south-north component), varying by column.
pub fn create_v_wind_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            let lon_factor = (col as f32 / width.max(1) as f32 - 0.5) * 2.0; // -1 to 1
            data.push(lon_factor * 8.0);
        }
    }
    data
}

/// Creates a grid of precipitation rates in kg/m²/s.
///
/// Deterministic for a given seed. Most cells are dry; wet cells reach
/// about 0.01 kg/m²/s (36 mm/h).
pub fn create_precipitation_grid(width: usize, height: usize, seed: u32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let hash = simple_hash(col as u32, row as u32, seed);
            let rate = if hash % 4 == 0 {
                (hash % 1000) as f32 / 100_000.0
            } else {
                0.0
            };
            data.push(rate);
        }
    }
    data
}

/// Creates a mean sea level pressure grid in Pa: a low in the middle of the
/// window, rising towards the edges.
pub fn create_pressure_grid(width: usize, height: usize) -> Vec<f32> {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let max_dist = (center_x * center_x + center_y * center_y).sqrt().max(1.0);

    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let dx = col as f32 - center_x;
            let dy = row as f32 - center_y;
            let dist = (dx * dx + dy * dy).sqrt() / max_dist;
            data.push(100_400.0 + dist * 1_200.0);
        }
    }
    data
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Creates a grid with NaN at the given `(col, row)` positions, zeros elsewhere.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    nan_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = vec![0.0f32; width * height];
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f32::NAN;
        }
    }
    data
}

/// GFS 0.25° coordinates covering `bbox` plus one cell on every side.
///
/// Latitudes ascend south to north; longitudes stay in the box's convention.
pub fn gfs_window_axes(bbox: &BoundingBox) -> (Vec<f64>, Vec<f64>) {
    let axis = |lo: f64, hi: f64| -> Vec<f64> {
        let start = (lo / GFS_0P25_STEP).floor() as i64 - 1;
        let end = (hi / GFS_0P25_STEP).ceil() as i64 + 1;
        (start..=end).map(|k| k as f64 * GFS_0P25_STEP).collect()
    };
    (
        axis(bbox.min_lat, bbox.max_lat),
        axis(bbox.min_lon, bbox.max_lon),
    )
}

fn window_field(
    name: &str,
    bbox: &BoundingBox,
    generate: impl FnOnce(usize, usize) -> Vec<f32>,
) -> GriddedField {
    let (lats, lons) = gfs_window_axes(bbox);
    let values = generate(lons.len(), lats.len());
    GriddedField::new(name, lats, lons, values).expect("generator shape matches axes")
}

/// Constant-valued field over a GFS window.
pub fn constant_field(name: &str, bbox: &BoundingBox, value: f32) -> GriddedField {
    window_field(name, bbox, |w, h| create_constant_grid(w, h, value))
}

/// `tmp2m`-like field in Kelvin.
pub fn temperature_field(bbox: &BoundingBox) -> GriddedField {
    window_field("tmp2m", bbox, create_temperature_grid)
}

/// `pratesfc`-like field in kg/m²/s.
pub fn precipitation_field(bbox: &BoundingBox, seed: u32) -> GriddedField {
    window_field("pratesfc", bbox, |w, h| create_precipitation_grid(w, h, seed))
}

/// `prmslmsl`-like field in Pa.
pub fn pressure_field(bbox: &BoundingBox) -> GriddedField {
    window_field("prmslmsl", bbox, create_pressure_grid)
}

/// `ugrd10m` and `vgrd10m`-like fields in m/s.
pub fn wind_fields(bbox: &BoundingBox) -> (GriddedField, GriddedField) {
    (
        window_field("ugrd10m", bbox, create_u_wind_grid),
        window_field("vgrd10m", bbox, create_v_wind_grid),
    )
}

/// The same field with its latitude axis reversed (north to south).
pub fn flip_latitudes(field: &GriddedField) -> GriddedField {
    let nx = field.nx();
    let lats: Vec<f64> = field.lats.iter().rev().copied().collect();
    let values: Vec<f32> = field
        .values
        .chunks(nx.max(1))
        .rev()
        .flatten()
        .copied()
        .collect();
    GriddedField::new(field.name.clone(), lats, field.lons.clone(), values)
        .expect("flipped shape matches")
}
