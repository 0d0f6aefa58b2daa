//! Contour line (isoline) generation using the marching squares algorithm.
//!
//! Contours are traced in grid index space (`x` = column, `y` = row) and
//! mapped to pixels by the caller, so the same lines work for ascending and
//! descending latitude axes.

use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::colormap::Color;

/// A point in 2D space (grid or pixel coordinates)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A line segment between two points
#[derive(Debug, Clone)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// A complete contour line (polyline)
#[derive(Debug, Clone)]
pub struct Contour {
    pub level: f32,
    pub points: Vec<Point>,
    pub closed: bool,
}

impl Contour {
    /// The same line with every point transformed.
    pub fn map_points(&self, f: impl Fn(Point) -> Point) -> Contour {
        Contour {
            level: self.level,
            points: self.points.iter().map(|&p| f(p)).collect(),
            closed: self.closed,
        }
    }

    /// Total length along the polyline.
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }
}

/// Configuration for contour rendering
#[derive(Debug, Clone)]
pub struct ContourConfig {
    /// Contour levels to draw
    pub levels: Vec<f32>,
    /// Line width in pixels
    pub line_width: f32,
    pub line_color: Color,
    /// Number of smoothing passes (0 = no smoothing)
    pub smoothing_passes: u32,
    /// Whether to place labels on contour lines
    pub labels_enabled: bool,
    pub label_font_size: f32,
    /// Minimum spacing between labels along a line (in pixels)
    pub label_spacing: f32,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            levels: vec![],
            line_width: 1.1,
            line_color: Color::BLACK,
            smoothing_passes: 1,
            labels_enabled: true,
            label_font_size: 11.0,
            label_spacing: 150.0,
        }
    }
}

/// Contour labels are integers, truncated toward zero.
pub fn format_level(level: f32) -> String {
    format!("{}", level.trunc() as i64)
}

/// Smallest of 1, 2, 2.5, 5 or 10 times a power of ten that splits
/// `range` into at most `count` intervals.
pub fn nice_step(range: f64, count: usize) -> f64 {
    let raw = range / count.max(1) as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude)
}

fn nice_multiples(min: f32, max: f32, count: usize) -> Vec<f64> {
    if count == 0 || !min.is_finite() || !max.is_finite() || max <= min {
        return vec![];
    }
    let (lo, hi) = (min as f64, max as f64);
    let step = nice_step(hi - lo, count);
    let first = (lo / step - 1e-9).ceil() as i64;
    let last = (hi / step + 1e-9).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

/// Up to `count` evenly spaced levels at nice values strictly inside
/// `(min, max)`.
pub fn nice_levels(min: f32, max: f32, count: usize) -> Vec<f32> {
    nice_multiples(min, max, count)
        .into_iter()
        .filter(|level| *level > min as f64 && *level < max as f64)
        .map(|level| level as f32)
        .collect()
}

/// Nice tick values across `[min, max]`, ends included when they fall on a
/// multiple of the step.
pub fn nice_ticks(min: f32, max: f32, count: usize) -> Vec<f32> {
    nice_multiples(min, max, count)
        .into_iter()
        .map(|tick| tick as f32)
        .collect()
}

/// Marching squares algorithm to generate contour lines
///
/// # Arguments
/// * `data` - Grid data in row-major order
/// * `width` - Grid width
/// * `height` - Grid height
/// * `level` - Contour level to extract
///
/// # Returns
/// Vector of line segments representing the contour
pub fn march_squares(data: &[f32], width: usize, height: usize, level: f32) -> Vec<Segment> {
    if width < 2 || height < 2 || data.len() != width * height {
        return vec![];
    }

    let mut segments = Vec::new();

    for y in 0..(height - 1) {
        for x in 0..(width - 1) {
            let tl = data[y * width + x];
            let tr = data[y * width + x + 1];
            let bl = data[(y + 1) * width + x];
            let br = data[(y + 1) * width + x + 1];

            // Cells touching missing data produce no line
            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            let mut cell_index = 0;
            if tl >= level {
                cell_index |= 1;
            }
            if tr >= level {
                cell_index |= 2;
            }
            if br >= level {
                cell_index |= 4;
            }
            if bl >= level {
                cell_index |= 8;
            }

            segments.extend(get_cell_segments(
                cell_index, x as f32, y as f32, tl, tr, br, bl, level,
            ));
        }
    }

    segments
}

/// Get line segments for a marching squares cell
///
/// Uses linear interpolation to find where the contour crosses cell edges
#[allow(clippy::too_many_arguments)]
fn get_cell_segments(
    cell_index: u8,
    x: f32,
    y: f32,
    tl: f32,
    tr: f32,
    br: f32,
    bl: f32,
    level: f32,
) -> Vec<Segment> {
    let top = interpolate_edge(x, y, x + 1.0, y, tl, tr, level);
    let right = interpolate_edge(x + 1.0, y, x + 1.0, y + 1.0, tr, br, level);
    let bottom = interpolate_edge(x, y + 1.0, x + 1.0, y + 1.0, bl, br, level);
    let left = interpolate_edge(x, y, x, y + 1.0, tl, bl, level);

    match cell_index {
        0 | 15 => vec![],
        1 | 14 => vec![Segment { start: left, end: top }],
        2 | 13 => vec![Segment { start: top, end: right }],
        3 | 12 => vec![Segment { start: left, end: right }],
        4 | 11 => vec![Segment { start: right, end: bottom }],
        5 => vec![
            // Saddle
            Segment { start: left, end: top },
            Segment { start: right, end: bottom },
        ],
        6 | 9 => vec![Segment { start: top, end: bottom }],
        7 | 8 => vec![Segment { start: left, end: bottom }],
        10 => vec![
            // Saddle
            Segment { start: top, end: right },
            Segment { start: left, end: bottom },
        ],
        _ => vec![],
    }
}

/// Linearly interpolate between two edge points based on data values
fn interpolate_edge(
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    val1: f32,
    val2: f32,
    level: f32,
) -> Point {
    if (val2 - val1).abs() < 1e-6 {
        return Point::new((x1 + x2) / 2.0, (y1 + y2) / 2.0);
    }

    let t = ((level - val1) / (val2 - val1)).clamp(0.0, 1.0);
    Point::new(x1 + t * (x2 - x1), y1 + t * (y2 - y1))
}

/// Connect line segments into continuous polylines
///
/// Takes a collection of unordered segments and chains them end to end.
pub fn connect_segments(segments: Vec<Segment>, level: f32) -> Vec<Contour> {
    let epsilon = 0.001;
    let mut contours = Vec::new();
    let mut used = vec![false; segments.len()];

    for start_idx in 0..segments.len() {
        if used[start_idx] {
            continue;
        }

        let mut points = vec![segments[start_idx].start, segments[start_idx].end];
        used[start_idx] = true;

        let mut current_end = segments[start_idx].end;
        loop {
            let next = segments.iter().enumerate().find_map(|(i, seg)| {
                if used[i] {
                    None
                } else if seg.start.distance(&current_end) < epsilon {
                    Some((i, seg.end))
                } else if seg.end.distance(&current_end) < epsilon {
                    Some((i, seg.start))
                } else {
                    None
                }
            });
            match next {
                Some((i, point)) => {
                    used[i] = true;
                    points.push(point);
                    current_end = point;
                }
                None => break,
            }
        }

        let closed = points[0].distance(&current_end) < epsilon;
        contours.push(Contour {
            level,
            points,
            closed,
        });
    }

    contours
}

/// Apply Chaikin's corner cutting algorithm for smoothing
pub fn smooth_contour(contour: &Contour, iterations: u32) -> Contour {
    if iterations == 0 || contour.points.len() < 3 {
        return contour.clone();
    }

    let mut points = contour.points.clone();

    for _ in 0..iterations {
        let n = points.len();
        let pairs = if contour.closed { n } else { n - 1 };
        let mut new_points = Vec::with_capacity(pairs * 2 + 2);

        if !contour.closed {
            new_points.push(points[0]);
        }
        for i in 0..pairs {
            let p1 = points[i];
            let p2 = points[(i + 1) % n];
            new_points.push(Point::new(0.75 * p1.x + 0.25 * p2.x, 0.75 * p1.y + 0.25 * p2.y));
            new_points.push(Point::new(0.25 * p1.x + 0.75 * p2.x, 0.25 * p1.y + 0.75 * p2.y));
        }
        if !contour.closed {
            new_points.push(points[n - 1]);
        }

        points = new_points;
    }

    Contour {
        level: contour.level,
        points,
        closed: contour.closed,
    }
}

/// Generate all contours for the configured levels, in grid index space.
pub fn generate_all_contours(
    data: &[f32],
    width: usize,
    height: usize,
    config: &ContourConfig,
) -> Vec<Contour> {
    let mut all_contours = Vec::new();

    for &level in &config.levels {
        let segments = march_squares(data, width, height, level);
        for contour in connect_segments(segments, level) {
            all_contours.push(smooth_contour(&contour, config.smoothing_passes));
        }
    }

    tracing::debug!(
        levels = config.levels.len(),
        contours = all_contours.len(),
        points = all_contours.iter().map(|c| c.points.len()).sum::<usize>(),
        "Generated contours"
    );

    all_contours
}

/// Stroke contours (already in pixel coordinates) onto a pixmap.
pub fn stroke_contours(pixmap: &mut Pixmap, contours: &[Contour], config: &ContourConfig) {
    let mut paint = Paint::default();
    paint.set_color(config.line_color.to_skia());
    paint.anti_alias = true;

    let stroke = Stroke {
        width: config.line_width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    for contour in contours {
        let Some((first, rest)) = contour.points.split_first() else {
            continue;
        };
        let mut pb = PathBuilder::new();
        pb.move_to(first.x, first.y);
        for point in rest {
            pb.line_to(point.x, point.y);
        }
        if contour.closed {
            pb.close();
        }
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }
}

/// Position and text for a contour label
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPosition {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

/// Choose label positions along contours (pixel coordinates), evenly spaced
/// along each line, away from the image edges and from each other.
pub fn label_positions(
    contours: &[Contour],
    config: &ContourConfig,
    width: usize,
    height: usize,
) -> Vec<LabelPosition> {
    let mut positions: Vec<LabelPosition> = Vec::new();
    if !config.labels_enabled {
        return positions;
    }

    let margin = config.label_font_size * 2.0;
    let min_distance = config.label_font_size * 4.0;

    for contour in contours {
        let total_length = contour.length();
        if total_length < config.label_spacing * 0.5 {
            continue;
        }

        let text = format_level(contour.level);
        let num_labels = ((total_length / config.label_spacing).floor() as usize).max(1);
        let spacing = total_length / (num_labels as f32 + 1.0);

        let mut accumulated = 0.0;
        let mut next_label_at = spacing;
        let mut placed = 0;

        for pair in contour.points.windows(2) {
            let (p1, p2) = (pair[0], pair[1]);
            let segment_length = p1.distance(&p2);

            while placed < num_labels && accumulated + segment_length >= next_label_at {
                let t = if segment_length > 0.0 {
                    (next_label_at - accumulated) / segment_length
                } else {
                    0.0
                };
                let x = p1.x + t * (p2.x - p1.x);
                let y = p1.y + t * (p2.y - p1.y);

                let inside = x > margin
                    && x < width as f32 - margin
                    && y > margin
                    && y < height as f32 - margin;
                let overlaps = positions
                    .iter()
                    .any(|pos| (pos.x - x).powi(2) + (pos.y - y).powi(2) < min_distance.powi(2));

                if inside && !overlaps {
                    positions.push(LabelPosition {
                        x,
                        y,
                        text: text.clone(),
                    });
                }

                next_label_at += spacing;
                placed += 1;
            }

            accumulated += segment_length;
        }
    }

    positions
}

/// Draw digits, minus signs and points as stroked seven-segment glyphs,
/// centred on `(x, y)`. Used for contour labels when no font is loaded.
pub fn draw_segment_label(
    pixmap: &mut Pixmap,
    x: f32,
    y: f32,
    text: &str,
    font_size: f32,
    color: Color,
) {
    let char_width = font_size * 0.6;
    let char_spacing = font_size * 0.1;
    let text_width = text.chars().count() as f32 * (char_width + char_spacing) - char_spacing;

    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;

    let stroke = Stroke {
        width: char_width * 0.15,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    let start_x = x - text_width / 2.0;
    for (i, ch) in text.chars().enumerate() {
        let cx = start_x + i as f32 * (char_width + char_spacing) + char_width / 2.0;
        let mut pb = PathBuilder::new();
        for ((x1, y1), (x2, y2)) in glyph_segments(ch, char_width / 2.0, font_size / 2.0) {
            pb.move_to(cx + x1, y + y1);
            pb.line_to(cx + x2, y + y2);
        }
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }
}

type GlyphSegment = ((f32, f32), (f32, f32));

/// Seven-segment strokes for a character, relative to its centre.
fn glyph_segments(ch: char, hw: f32, hh: f32) -> Vec<GlyphSegment> {
    let top = ((-hw, -hh), (hw, -hh));
    let middle = ((-hw, 0.0), (hw, 0.0));
    let bottom = ((-hw, hh), (hw, hh));
    let upper_left = ((-hw, -hh), (-hw, 0.0));
    let upper_right = ((hw, -hh), (hw, 0.0));
    let lower_left = ((-hw, 0.0), (-hw, hh));
    let lower_right = ((hw, 0.0), (hw, hh));

    match ch {
        '0' => vec![top, upper_right, lower_right, bottom, lower_left, upper_left],
        '1' => vec![((0.0, -hh), (0.0, hh))],
        '2' => vec![top, upper_right, middle, lower_left, bottom],
        '3' => vec![top, upper_right, middle, lower_right, bottom],
        '4' => vec![upper_left, middle, upper_right, lower_right],
        '5' => vec![top, upper_left, middle, lower_right, bottom],
        '6' => vec![top, upper_left, lower_left, bottom, lower_right, middle],
        '7' => vec![top, ((hw, -hh), (0.0, hh))],
        '8' => vec![top, upper_right, lower_right, bottom, lower_left, upper_left, middle],
        '9' => vec![middle, upper_left, top, upper_right, lower_right],
        '-' => vec![middle],
        '.' => vec![((0.0, hh * 0.7), (0.0, hh * 0.8))],
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_edge() {
        let p = interpolate_edge(0.0, 0.0, 1.0, 0.0, 0.0, 10.0, 5.0);
        assert!((p.x - 0.5).abs() < 0.01);
        assert!((p.y - 0.0).abs() < 0.01);
    }

    #[test]
    fn test_saddle_yields_two_segments() {
        let segments = get_cell_segments(5, 0.0, 0.0, 10.0, 0.0, 10.0, 0.0, 5.0);
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_glyphs() {
        assert_eq!(glyph_segments('8', 1.0, 2.0).len(), 7);
        assert!(glyph_segments('x', 1.0, 2.0).is_empty());
    }

    #[test]
    fn test_format_level_truncates() {
        assert_eq!(format_level(1008.0), "1008");
        assert_eq!(format_level(1008.75), "1008");
        assert_eq!(format_level(-0.5), "0");
    }
}
