//! Map composition: lays out the frame, draws every layer of a [`PlotSpec`]
//! and encodes the result as PNG.

use std::time::Instant;

use image::codecs::png::PngEncoder;
use image::{imageops, ColorType, ImageEncoder, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect as PixelRect;
use tiny_skia::{
    FillRule, LineCap, LineJoin, Mask, Paint, PathBuilder, Pixmap, Rect, Stroke, StrokeDash,
    Transform,
};
use tracing::debug;

use forecast_common::grid::grids::GFS_0P25_STEP;
use forecast_common::{BoundingBox, ForecastError, ForecastResult, GriddedField};

use crate::arrows::{arrow_positions, draw_arrows, Arrow};
use crate::basemap::{BaseMap, Line};
use crate::colormap::{render_grid, Color, ColorScale};
use crate::contour::{
    draw_segment_label, generate_all_contours, label_positions, nice_ticks, stroke_contours,
    Point,
};
use crate::plot::{Colorbar, PlotLayer, PlotSpec, VectorLayer};
use crate::text::{HAlign, TextRenderer, VAlign};

const MARGIN_TOP: f32 = 40.0;
const MARGIN_SIDE: f32 = 20.0;
const MARGIN_BOTTOM: f32 = 20.0;
const COLORBAR_GAP: f32 = 14.0;
const COLORBAR_WIDTH: f32 = 18.0;
const COLORBAR_COLUMN: f32 = 110.0;

const TITLE_SIZE: f32 = 14.0;
const MARKER_LABEL_SIZE: f32 = 11.0;
const TICK_LABEL_SIZE: f32 = 12.0;
const MARKER_RADIUS: f32 = 4.0;
const COASTLINE_WIDTH: f32 = 1.1;

/// Pixel placement of the map area. Longitude and latitude share one scale
/// (plate carrée), so the frame keeps the extent's aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapFrame {
    pub x0: f32,
    pub y0: f32,
    pub width: f32,
    pub height: f32,
    pub extent: BoundingBox,
}

impl MapFrame {
    pub fn layout(size: (u32, u32), extent: BoundingBox, with_colorbar: bool) -> MapFrame {
        let right = if with_colorbar {
            COLORBAR_COLUMN
        } else {
            MARGIN_SIDE
        };
        let avail_w = (size.0 as f32 - MARGIN_SIDE - right).max(1.0);
        let avail_h = (size.1 as f32 - MARGIN_TOP - MARGIN_BOTTOM).max(1.0);

        let px_per_deg =
            (avail_w / extent.width() as f32).min(avail_h / extent.height() as f32);
        let width = extent.width() as f32 * px_per_deg;
        let height = extent.height() as f32 * px_per_deg;

        MapFrame {
            x0: MARGIN_SIDE + (avail_w - width) / 2.0,
            y0: MARGIN_TOP + (avail_h - height) / 2.0,
            width,
            height,
            extent,
        }
    }

    pub fn x1(&self) -> f32 {
        self.x0 + self.width
    }

    pub fn y1(&self) -> f32 {
        self.y0 + self.height
    }

    pub fn to_pixel(&self, lon: f64, lat: f64) -> Point {
        let lon = self.extent.align_lon(lon);
        let fx = (lon - self.extent.min_lon) / self.extent.width();
        let fy = (self.extent.max_lat - lat) / self.extent.height();
        Point::new(
            self.x0 + fx as f32 * self.width,
            self.y0 + fy as f32 * self.height,
        )
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x0 && p.x <= self.x1() && p.y >= self.y0 && p.y <= self.y1()
    }

    fn rect(&self) -> Option<Rect> {
        Rect::from_xywh(self.x0, self.y0, self.width, self.height)
    }
}

/// Draws [`PlotSpec`]s. Holds the optional font and base map, both loaded
/// once at startup.
#[derive(Debug, Default)]
pub struct MapRenderer {
    font: Option<TextRenderer>,
    basemap: BaseMap,
}

impl MapRenderer {
    pub fn new(font: Option<TextRenderer>, basemap: BaseMap) -> Self {
        Self { font, basemap }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Render to PNG bytes.
    pub fn render(&self, spec: &PlotSpec) -> ForecastResult<Vec<u8>> {
        let img = self.render_image(spec)?;
        encode_png(&img)
    }

    /// Render to an RGBA image.
    pub fn render_image(&self, spec: &PlotSpec) -> ForecastResult<RgbaImage> {
        let start = Instant::now();
        let (width, height) = spec.size;
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            ForecastError::RenderError(format!("invalid image size {}x{}", width, height))
        })?;
        pixmap.fill(Color::WHITE.to_skia());

        let frame = MapFrame::layout(spec.size, spec.extent, spec.colorbar.is_some());
        let frame_rect = frame
            .rect()
            .ok_or_else(|| ForecastError::RenderError("empty map frame".to_string()))?;
        let mut mask = Mask::new(width, height)
            .ok_or_else(|| ForecastError::RenderError("mask allocation failed".to_string()))?;
        mask.fill_path(
            &PathBuilder::from_rect(frame_rect),
            FillRule::Winding,
            false,
            Transform::identity(),
        );

        fill_rect(&mut pixmap, frame_rect, Color::LIGHT_BLUE, None);
        self.draw_land(&mut pixmap, &frame, &mask);

        let mut contour_labels = Vec::new();
        match &spec.layer {
            PlotLayer::Filled { field, scale, .. } => {
                draw_cells(&mut pixmap, field, scale, &frame, &mask);
                self.draw_lines(&mut pixmap, &frame, &mask);
            }
            PlotLayer::Contour { field, config } => {
                self.draw_lines(&mut pixmap, &frame, &mask);
                let contours: Vec<_> = generate_all_contours(
                    &field.values,
                    field.nx(),
                    field.ny(),
                    config,
                )
                .iter()
                .map(|c| c.map_points(|p| grid_to_pixel(field, &frame, p)))
                .collect();
                stroke_contours(&mut pixmap, &contours, config);

                for label in label_positions(&contours, config, width as usize, height as usize)
                {
                    let (w, h) = match &self.font {
                        Some(font) => font.measure(&label.text, config.label_font_size),
                        None => (
                            (label.text.len() as f32 * config.label_font_size * 0.7) as i32,
                            config.label_font_size as i32,
                        ),
                    };
                    let pad = 2.0;
                    if let Some(bg) = Rect::from_xywh(
                        label.x - w as f32 / 2.0 - pad,
                        label.y - h as f32 / 2.0 - pad,
                        w as f32 + pad * 2.0,
                        h as f32 + pad * 2.0,
                    ) {
                        fill_rect(&mut pixmap, bg, Color::new(255, 255, 255, 220), Some(&mask));
                    }
                    if self.font.is_none() {
                        draw_segment_label(
                            &mut pixmap,
                            label.x,
                            label.y,
                            &label.text,
                            config.label_font_size,
                            config.line_color,
                        );
                    }
                    contour_labels.push((label, config.label_font_size, config.line_color));
                }
            }
        }

        if let PlotLayer::Filled {
            vectors: Some(vectors),
            ..
        } = &spec.layer
        {
            draw_vectors(&mut pixmap, vectors, &frame, &mask);
        }

        let marker_at = frame.to_pixel(spec.marker.lon, spec.marker.lat);
        let show_marker = frame.contains(marker_at);
        if show_marker {
            if let Some(circle) =
                PathBuilder::from_circle(marker_at.x, marker_at.y, MARKER_RADIUS)
            {
                let mut paint = Paint::default();
                paint.set_color(spec.marker.color.to_skia());
                paint.anti_alias = true;
                pixmap.fill_path(&circle, &paint, FillRule::Winding, Transform::identity(), None);
            }
        }

        stroke_rect(&mut pixmap, frame_rect, Color::BLACK, 1.0);

        let mut img = to_image(&pixmap);

        if let Some(colorbar) = &spec.colorbar {
            self.draw_colorbar(&mut img, colorbar, &frame);
        }

        if let Some(font) = &self.font {
            for (label, size, color) in &contour_labels {
                font.draw(&mut img, &label.text, label.x, label.y, *size, *color, HAlign::Center, VAlign::Middle);
            }

            if show_marker {
                let at = frame.to_pixel(
                    spec.marker.lon + spec.marker.label_offset_deg,
                    spec.marker.lat,
                );
                font.draw(
                    &mut img,
                    &spec.marker.label,
                    at.x,
                    at.y,
                    MARKER_LABEL_SIZE,
                    spec.marker.color,
                    HAlign::Left,
                    VAlign::Bottom,
                );
            }

            let title_y = frame.y0 - 6.0;
            if let Some(left) = &spec.titles.left {
                font.draw(&mut img, left, frame.x0, title_y, TITLE_SIZE, Color::BLACK, HAlign::Left, VAlign::Bottom);
            }
            if let Some(center) = &spec.titles.center {
                let cx = frame.x0 + frame.width / 2.0;
                font.draw(&mut img, center, cx, title_y, TITLE_SIZE, Color::BLACK, HAlign::Center, VAlign::Bottom);
            }
            if let Some(right) = &spec.titles.right {
                font.draw(&mut img, right, frame.x1(), title_y, TITLE_SIZE, Color::BLACK, HAlign::Right, VAlign::Bottom);
            }
        }

        debug!(
            width,
            height,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Map rendered"
        );
        Ok(img)
    }

    fn draw_land(&self, pixmap: &mut Pixmap, frame: &MapFrame, mask: &Mask) {
        let mut paint = Paint::default();
        paint.set_color(Color::LIGHT_GRAY.to_skia());
        paint.anti_alias = true;

        for polygon in &self.basemap.land {
            let mut pb = PathBuilder::new();
            for ring in polygon {
                append_line(&mut pb, frame, ring, true);
            }
            if let Some(path) = pb.finish() {
                pixmap.fill_path(&path, &paint, FillRule::EvenOdd, Transform::identity(), Some(mask));
            }
        }
    }

    /// Coastlines (land outlines) and dotted borders.
    fn draw_lines(&self, pixmap: &mut Pixmap, frame: &MapFrame, mask: &Mask) {
        let mut paint = Paint::default();
        paint.set_color(Color::BLACK.to_skia());
        paint.anti_alias = true;

        let coast = Stroke {
            width: COASTLINE_WIDTH,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        let mut pb = PathBuilder::new();
        for ring in self.basemap.land.iter().flatten() {
            append_line(&mut pb, frame, ring, true);
        }
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &paint, &coast, Transform::identity(), Some(mask));
        }

        let dotted = Stroke {
            width: 1.0,
            line_cap: LineCap::Round,
            dash: StrokeDash::new(vec![1.0, 3.0], 0.0),
            ..Stroke::default()
        };
        let mut pb = PathBuilder::new();
        for line in &self.basemap.borders {
            append_line(&mut pb, frame, line, false);
        }
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &paint, &dotted, Transform::identity(), Some(mask));
        }
    }

    fn draw_colorbar(&self, img: &mut RgbaImage, colorbar: &Colorbar, frame: &MapFrame) {
        let scale = &colorbar.scale;
        let x = (frame.x1() + COLORBAR_GAP).round() as i64;
        let y = frame.y0.round() as i64;
        let bar_w = COLORBAR_WIDTH as usize;
        let bar_h = frame.height.round().max(1.0) as usize;

        // Top row holds the maximum.
        let data: Vec<f32> = (0..bar_h)
            .flat_map(|row| {
                let t = 1.0 - (row as f32 + 0.5) / bar_h as f32;
                std::iter::repeat(scale.min + t * (scale.max - scale.min)).take(bar_w)
            })
            .collect();
        let pixels = render_grid(&data, bar_w, bar_h, scale);
        if let Some(strip) = RgbaImage::from_raw(bar_w as u32, bar_h as u32, pixels) {
            imageops::overlay(img, &strip, x, y);
        }

        let black = Color::BLACK.to_rgba();
        draw_hollow_rect_mut(
            img,
            PixelRect::at(x as i32, y as i32).of_size(bar_w as u32, bar_h as u32),
            black,
        );

        let right = (x + bar_w as i64) as f32;
        let mut widest = 0;
        for tick in nice_ticks(scale.min, scale.max, 6) {
            let ty = y as f32 + (1.0 - scale.normalize(tick)) * (bar_h as f32 - 1.0);
            draw_line_segment_mut(img, (right, ty), (right + 4.0, ty), black);
            if let Some(font) = &self.font {
                let text = format_tick(tick);
                widest = widest.max(font.measure(&text, TICK_LABEL_SIZE).0);
                font.draw(img, &text, right + 6.0, ty, TICK_LABEL_SIZE, Color::BLACK, HAlign::Left, VAlign::Middle);
            }
        }

        if let Some(font) = &self.font {
            let cx = right + 6.0 + widest as f32 + 12.0;
            let cy = y as f32 + bar_h as f32 / 2.0;
            font.draw_vertical(img, &colorbar.label, cx, cy, TICK_LABEL_SIZE, Color::BLACK);
        }
    }
}

fn format_tick(value: f32) -> String {
    if value.fract().abs() < 1e-3 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

/// Encode an RGBA image as PNG.
pub fn encode_png(img: &RgbaImage) -> ForecastResult<Vec<u8>> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(img.as_raw(), img.width(), img.height(), ColorType::Rgba8)
        .map_err(|e| ForecastError::RenderError(format!("PNG encoding failed: {}", e)))?;
    Ok(bytes)
}

fn to_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    img
}

fn fill_rect(pixmap: &mut Pixmap, rect: Rect, color: Color, mask: Option<&Mask>) {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = false;
    pixmap.fill_rect(rect, &paint, Transform::identity(), mask);
}

fn stroke_rect(pixmap: &mut Pixmap, rect: Rect, color: Color, width: f32) {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    let stroke = Stroke {
        width,
        ..Stroke::default()
    };
    pixmap.stroke_path(
        &PathBuilder::from_rect(rect),
        &paint,
        &stroke,
        Transform::identity(),
        None,
    );
}

fn append_line(pb: &mut PathBuilder, frame: &MapFrame, line: &Line, close: bool) {
    let mut points = line.iter().map(|&(lon, lat)| frame.to_pixel(lon, lat));
    let Some(first) = points.next() else {
        return;
    };
    pb.move_to(first.x, first.y);
    for p in points {
        pb.line_to(p.x, p.y);
    }
    if close {
        pb.close();
    }
}

/// Cell boundaries for centre coordinates: midpoints between neighbours,
/// extended by half a spacing at both ends.
pub fn cell_edges(axis: &[f64]) -> Vec<f64> {
    match axis {
        [] => vec![],
        [only] => vec![only - GFS_0P25_STEP / 2.0, only + GFS_0P25_STEP / 2.0],
        _ => {
            let n = axis.len();
            let mut edges = Vec::with_capacity(n + 1);
            edges.push(axis[0] - (axis[1] - axis[0]) / 2.0);
            edges.extend(axis.windows(2).map(|w| (w[0] + w[1]) / 2.0));
            edges.push(axis[n - 1] + (axis[n - 1] - axis[n - 2]) / 2.0);
            edges
        }
    }
}

/// Pseudo-color cells, one rectangle per grid point. NaN cells stay empty.
fn draw_cells(
    pixmap: &mut Pixmap,
    field: &GriddedField,
    scale: &ColorScale,
    frame: &MapFrame,
    mask: &Mask,
) {
    let lon_edges = cell_edges(&field.lons);
    let lat_edges = cell_edges(&field.lats);
    let nx = field.nx();

    for (j, lat_pair) in lat_edges.windows(2).enumerate() {
        for (i, lon_pair) in lon_edges.windows(2).enumerate() {
            let Some(color) = scale.color_for(field.values[j * nx + i]) else {
                continue;
            };
            let a = frame.to_pixel(lon_pair[0], lat_pair[0]);
            let b = frame.to_pixel(lon_pair[1], lat_pair[1]);
            let rect = Rect::from_ltrb(
                a.x.min(b.x).floor(),
                a.y.min(b.y).floor(),
                a.x.max(b.x).ceil(),
                a.y.max(b.y).ceil(),
            );
            if let Some(rect) = rect {
                fill_rect(pixmap, rect, color, Some(mask));
            }
        }
    }
}

fn draw_vectors(pixmap: &mut Pixmap, vectors: &VectorLayer, frame: &MapFrame, mask: &Mask) {
    let (u, v) = (&vectors.u, &vectors.v);
    let arrows: Vec<Arrow> = arrow_positions(u.nx(), u.ny(), vectors.arrows.stride)
        .into_iter()
        .filter_map(|(i, j)| {
            let (uu, vv) = (u.get(i, j)?, v.get(i, j)?);
            if uu.is_nan() || vv.is_nan() {
                return None;
            }
            let tail = frame.to_pixel(u.lons[i], u.lats[j]);
            Some(Arrow::from_uv(tail, uu, vv, vectors.arrows.scale, frame.width))
        })
        .collect();
    draw_arrows(pixmap, &arrows, &vectors.arrows, frame.width, Some(mask));
}

/// Map a point in grid index space (column, row) to pixels.
fn grid_to_pixel(field: &GriddedField, frame: &MapFrame, p: Point) -> Point {
    frame.to_pixel(axis_at(&field.lons, p.x), axis_at(&field.lats, p.y))
}

/// Coordinate at fractional index `pos`, linearly interpolated.
fn axis_at(axis: &[f64], pos: f32) -> f64 {
    if axis.len() < 2 {
        return axis.first().copied().unwrap_or(0.0);
    }
    let pos = (pos as f64).clamp(0.0, (axis.len() - 1) as f64);
    let lower = (pos.floor() as usize).min(axis.len() - 2);
    let t = pos - lower as f64;
    axis[lower] + t * (axis[lower + 1] - axis[lower])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_edges() {
        assert_eq!(cell_edges(&[0.0, 1.0, 2.0]), vec![-0.5, 0.5, 1.5, 2.5]);
        assert_eq!(cell_edges(&[2.0, 1.0]), vec![2.5, 1.5, 0.5]);
        assert!(cell_edges(&[]).is_empty());
    }

    #[test]
    fn test_axis_at() {
        assert_eq!(axis_at(&[-11.0, -10.75, -10.5], 1.5), -10.625);
        assert_eq!(axis_at(&[10.0, 20.0], 5.0), 20.0);
    }

    #[test]
    fn test_frame_keeps_aspect() {
        let extent = BoundingBox::new(118.5, -11.5, 125.5, -7.5);
        let frame = MapFrame::layout((800, 600), extent, true);
        let ratio = frame.width / frame.height;
        assert!((ratio - 7.0 / 4.0).abs() < 1e-3);
        let corner = frame.to_pixel(118.5, -7.5);
        assert!((corner.x - frame.x0).abs() < 1e-3);
        assert!((corner.y - frame.y0).abs() < 1e-3);
    }
}
