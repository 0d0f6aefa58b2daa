//! Wind direction arrows drawn from U/V components.
//!
//! Arrow length is proportional to speed: a vector of magnitude `scale`
//! (in data units) spans the full plot width. Shaft and head proportions
//! are expressed in shaft widths.

use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

use crate::colormap::Color;
use crate::contour::Point;

/// Data units per plot width.
pub const DEFAULT_ARROW_SCALE: f32 = 500.0;

/// Configuration for arrow rendering
#[derive(Debug, Clone)]
pub struct ArrowConfig {
    /// Draw an arrow every `stride` grid points in both directions
    pub stride: usize,
    /// Data units per plot width
    pub scale: f32,
    /// Shaft width as a fraction of the plot width
    pub width_fraction: f32,
    pub head_width: f32,
    pub head_length: f32,
    pub head_axis_length: f32,
    pub color: Color,
}

impl Default for ArrowConfig {
    fn default() -> Self {
        Self {
            stride: 2,
            scale: DEFAULT_ARROW_SCALE,
            width_fraction: 0.002,
            head_width: 3.0,
            head_length: 5.0,
            head_axis_length: 4.5,
            color: Color::BLACK,
        }
    }
}

/// Grid indices `(i, j)` that carry an arrow: every `stride`-th column and
/// row starting from the first.
pub fn arrow_positions(nx: usize, ny: usize, stride: usize) -> Vec<(usize, usize)> {
    let stride = stride.max(1);
    (0..ny)
        .step_by(stride)
        .flat_map(|j| (0..nx).step_by(stride).map(move |i| (i, j)))
        .collect()
}

/// One arrow in pixel space, drawn from its tail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrow {
    pub tail: Point,
    /// Pixel offset from tail to tip (y grows downward)
    pub dx: f32,
    pub dy: f32,
}

impl Arrow {
    /// Arrow for a (u, v) vector at `tail`. North-pointing `v` points up.
    pub fn from_uv(tail: Point, u: f32, v: f32, scale: f32, plot_width: f32) -> Arrow {
        let factor = plot_width / scale;
        Arrow {
            tail,
            dx: u * factor,
            dy: -v * factor,
        }
    }

    pub fn length(&self) -> f32 {
        (self.dx * self.dx + self.dy * self.dy).sqrt()
    }

    /// Outline polygon: shaft plus notched head, in pixel coordinates.
    pub fn outline(&self, shaft_width: f32, config: &ArrowConfig) -> Vec<Point> {
        let length = self.length();
        let mut head_length = config.head_length * shaft_width;
        let mut head_axis = config.head_axis_length * shaft_width;
        let mut head_half = config.head_width * shaft_width / 2.0;
        // Short arrows shrink the head to fit
        if length < head_length && head_length > 0.0 {
            let k = length / head_length;
            head_length *= k;
            head_axis *= k;
            head_half *= k;
        }
        let half = shaft_width / 2.0;

        let local = [
            (0.0, -half),
            (length - head_axis, -half),
            (length - head_length, -head_half),
            (length, 0.0),
            (length - head_length, head_half),
            (length - head_axis, half),
            (0.0, half),
        ];

        let (sin, cos) = if length > 0.0 {
            (self.dy / length, self.dx / length)
        } else {
            (0.0, 1.0)
        };
        local
            .iter()
            .map(|&(ax, ay)| {
                Point::new(
                    self.tail.x + ax * cos - ay * sin,
                    self.tail.y + ax * sin + ay * cos,
                )
            })
            .collect()
    }
}

/// Fill arrows onto a pixmap.
pub fn draw_arrows(
    pixmap: &mut Pixmap,
    arrows: &[Arrow],
    config: &ArrowConfig,
    plot_width: f32,
    mask: Option<&tiny_skia::Mask>,
) {
    let shaft_width = (config.width_fraction * plot_width).max(1.0);
    let mut paint = Paint::default();
    paint.set_color(config.color.to_skia());
    paint.anti_alias = true;

    for arrow in arrows.iter().filter(|a| a.length() > 0.0) {
        let outline = arrow.outline(shaft_width, config);
        let Some((first, rest)) = outline.split_first() else {
            continue;
        };
        let mut pb = PathBuilder::new();
        pb.move_to(first.x, first.y);
        for p in rest {
            pb.line_to(p.x, p.y);
        }
        pb.close();
        if let Some(path) = pb.finish() {
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), mask);
        }
    }
}
