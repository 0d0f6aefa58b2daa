//! Text drawing with a TrueType font, compiled in or loaded at runtime.

use std::path::Path;

use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};

use forecast_common::{ForecastError, ForecastResult};

use crate::colormap::Color;

/// Horizontal alignment relative to the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

/// Vertical alignment relative to the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

/// DejaVu Sans, used when no font file is configured.
const EMBEDDED_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// A loaded font.
pub struct TextRenderer {
    font: Font<'static>,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer").finish_non_exhaustive()
    }
}

impl TextRenderer {
    pub fn from_bytes(data: Vec<u8>) -> ForecastResult<Self> {
        Font::try_from_vec(data)
            .map(|font| Self { font })
            .ok_or_else(|| ForecastError::RenderError("invalid TrueType font".to_string()))
    }

    /// The compiled-in DejaVu Sans.
    pub fn embedded() -> ForecastResult<Self> {
        Font::try_from_bytes(EMBEDDED_FONT)
            .map(|font| Self { font })
            .ok_or_else(|| ForecastError::RenderError("embedded font is invalid".to_string()))
    }

    pub fn from_file(path: &Path) -> ForecastResult<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Rendered `(width, height)` in pixels.
    pub fn measure(&self, text: &str, size: f32) -> (i32, i32) {
        text_size(Scale::uniform(size), &self.font, text)
    }

    /// Draw `text` aligned to `(x, y)`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &self,
        img: &mut RgbaImage,
        text: &str,
        x: f32,
        y: f32,
        size: f32,
        color: Color,
        h: HAlign,
        v: VAlign,
    ) {
        let (w, ht) = self.measure(text, size);
        let left = match h {
            HAlign::Left => x,
            HAlign::Center => x - w as f32 / 2.0,
            HAlign::Right => x - w as f32,
        };
        let top = match v {
            VAlign::Top => y,
            VAlign::Middle => y - ht as f32 / 2.0,
            VAlign::Bottom => y - ht as f32,
        };
        draw_text_mut(
            img,
            color.to_rgba(),
            left.round() as i32,
            top.round() as i32,
            Scale::uniform(size),
            &self.font,
            text,
        );
    }

    /// Draw `text` rotated 90° counter-clockwise, centred on `(cx, cy)`.
    pub fn draw_vertical(
        &self,
        img: &mut RgbaImage,
        text: &str,
        cx: f32,
        cy: f32,
        size: f32,
        color: Color,
    ) {
        let (w, h) = self.measure(text, size);
        if w <= 0 || h <= 0 {
            return;
        }
        let mut strip = RgbaImage::from_pixel(w as u32 + 2, h as u32 + 2, Rgba([0, 0, 0, 0]));
        draw_text_mut(
            &mut strip,
            color.to_rgba(),
            1,
            1,
            Scale::uniform(size),
            &self.font,
            text,
        );
        let rotated = imageops::rotate270(&strip);
        let x = cx - rotated.width() as f32 / 2.0;
        let y = cy - rotated.height() as f32 / 2.0;
        imageops::overlay(img, &rotated, x.round() as i64, y.round() as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_font_bytes() {
        assert!(TextRenderer::from_bytes(b"not a font".to_vec()).is_err());
    }

    #[test]
    fn test_embedded_font_measures_text() {
        let font = TextRenderer::embedded().unwrap();
        let (w, h) = font.measure("GFS t+012", 14.0);
        assert!(w > 40 && h > 8, "measured {}x{}", w, h);
    }

    #[test]
    fn test_missing_font_file() {
        let err = TextRenderer::from_file(Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(matches!(err, ForecastError::Internal(_)));
    }
}
