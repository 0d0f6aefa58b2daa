//! Color maps for filled rasters and colorbars.

use forecast_common::Colormap;

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const LIGHT_GRAY: Color = Color::rgb(211, 211, 211);
    pub const LIGHT_BLUE: Color = Color::rgb(173, 216, 230);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }
}

/// Linear color interpolation
pub fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;

    Color::new(
        ((color1.r as f32 * t_inv) + (color2.r as f32 * t)).round() as u8,
        ((color1.g as f32 * t_inv) + (color2.g as f32 * t)).round() as u8,
        ((color1.b as f32 * t_inv) + (color2.b as f32 * t)).round() as u8,
        ((color1.a as f32 * t_inv) + (color2.a as f32 * t)).round() as u8,
    )
}

const BLUES: &[Color] = &[
    Color::rgb(0xf7, 0xfb, 0xff),
    Color::rgb(0xde, 0xeb, 0xf7),
    Color::rgb(0xc6, 0xdb, 0xef),
    Color::rgb(0x9e, 0xca, 0xe1),
    Color::rgb(0x6b, 0xae, 0xd6),
    Color::rgb(0x42, 0x92, 0xc6),
    Color::rgb(0x21, 0x71, 0xb5),
    Color::rgb(0x08, 0x51, 0x9c),
    Color::rgb(0x08, 0x30, 0x6b),
];

const COOLWARM: &[Color] = &[
    Color::rgb(59, 76, 192),
    Color::rgb(141, 176, 254),
    Color::rgb(221, 221, 221),
    Color::rgb(244, 154, 123),
    Color::rgb(180, 4, 38),
];

// Green (low) to red (high).
const RDYLGN_REVERSED: &[Color] = &[
    Color::rgb(0x00, 0x68, 0x37),
    Color::rgb(0x1a, 0x98, 0x50),
    Color::rgb(0x66, 0xbd, 0x63),
    Color::rgb(0xa6, 0xd9, 0x6a),
    Color::rgb(0xd9, 0xef, 0x8b),
    Color::rgb(0xff, 0xff, 0xbf),
    Color::rgb(0xfe, 0xe0, 0x8b),
    Color::rgb(0xfd, 0xae, 0x61),
    Color::rgb(0xf4, 0x6d, 0x43),
    Color::rgb(0xd7, 0x30, 0x27),
    Color::rgb(0xa5, 0x00, 0x26),
];

const COOL: &[Color] = &[Color::rgb(0, 255, 255), Color::rgb(255, 0, 255)];

fn stops(colormap: Colormap) -> &'static [Color] {
    match colormap {
        Colormap::Blues => BLUES,
        Colormap::Coolwarm => COOLWARM,
        Colormap::RdYlGnReversed { .. } => RDYLGN_REVERSED,
        Colormap::Cool => COOL,
    }
}

/// Evenly spaced stops, linearly interpolated.
fn sample_stops(stops: &[Color], t: f32) -> Color {
    match stops {
        [] => Color::transparent(),
        [only] => *only,
        _ => {
            let pos = t.clamp(0.0, 1.0) * (stops.len() - 1) as f32;
            let lower = (pos.floor() as usize).min(stops.len() - 2);
            interpolate_color(stops[lower], stops[lower + 1], pos - lower as f32)
        }
    }
}

/// Color at normalized position `t` in `0..=1`.
///
/// Discretized maps snap `t` to one of `bins` classes, each drawn with the
/// color at the class's position in the continuous map.
pub fn sample(colormap: Colormap, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    match colormap {
        Colormap::RdYlGnReversed { bins } if bins > 1 => {
            let class = ((t * bins as f32).floor() as usize).min(bins - 1);
            sample_stops(stops(colormap), class as f32 / (bins - 1) as f32)
        }
        _ => sample_stops(stops(colormap), t),
    }
}

/// A colormap stretched over a fixed value range. Values outside the range
/// take the end colors; NaN has no color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub colormap: Colormap,
    pub min: f32,
    pub max: f32,
}

impl ColorScale {
    pub fn new(colormap: Colormap, (min, max): (f32, f32)) -> Self {
        Self { colormap, min, max }
    }

    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        let range = if range.abs() < 0.001 { 1.0 } else { range };
        ((value - self.min) / range).clamp(0.0, 1.0)
    }

    pub fn color_for(&self, value: f32) -> Option<Color> {
        if value.is_nan() {
            return None;
        }
        Some(sample(self.colormap, self.normalize(value)))
    }
}

/// Render grid data as RGBA pixels, one pixel per cell.
///
/// # Arguments
/// - `data`: 2D grid of values (row-major order)
/// - `width`: Number of columns
/// - `height`: Number of rows
/// - `scale`: Value-to-color mapping; NaN cells stay transparent
///
/// # Returns
/// RGBA pixel data (4 bytes per pixel)
pub fn render_grid(data: &[f32], width: usize, height: usize, scale: &ColorScale) -> Vec<u8> {
    let mut pixels = vec![0u8; width * height * 4];

    for (idx, &value) in data.iter().take(width * height).enumerate() {
        if let Some(color) = scale.color_for(value) {
            let pixel_idx = idx * 4;
            pixels[pixel_idx] = color.r;
            pixels[pixel_idx + 1] = color.g;
            pixels[pixel_idx + 2] = color.b;
            pixels[pixel_idx + 3] = color.a;
        }
    }

    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_color_midpoint() {
        let c = interpolate_color(Color::BLACK, Color::WHITE, 0.5);
        assert_eq!(c, Color::rgb(128, 128, 128));
    }

    #[test]
    fn test_sample_stops_endpoints() {
        assert_eq!(sample_stops(COOL, 0.0), Color::rgb(0, 255, 255));
        assert_eq!(sample_stops(COOL, 1.0), Color::rgb(255, 0, 255));
        assert_eq!(sample_stops(COOL, 7.0), Color::rgb(255, 0, 255));
    }
}
