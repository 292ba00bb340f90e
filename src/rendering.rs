// Rendering primitives shared by renderers and the canvas

use crate::data_types::Rgba;
use crate::layout::Extent;
use crate::scales::ChartScale;
use crate::units::Units;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanned by a column (horizontal) and a row (vertical) extent.
    pub fn from_extents(horizontal: Extent, vertical: Extent) -> Self {
        Self::new(
            horizontal.min,
            vertical.min,
            horizontal.width(),
            vertical.width(),
        )
    }

    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        let (x0, x1) = (a.0.min(b.0), a.0.max(b.0));
        let (y0, y1) = (a.1.min(b.1), a.1.max(b.1));
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, (px, py): (f64, f64)) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn inflate(&self, by: f64) -> Rect {
        Rect::new(
            self.x - by,
            self.y - by,
            self.width + 2.0 * by,
            self.height + 2.0 * by,
        )
    }
}

/// Row-major RGBA raster, row 0 at the top.
#[derive(Clone, Debug, PartialEq)]
pub struct RgbaImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Rgba>,
}

impl RgbaImage {
    pub fn new(width: usize, height: usize, fill: Rgba) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width * height],
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        self.pixels[y * self.width + x]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgba) {
        self.pixels[y * self.width + x] = color;
    }
}

/// Drawing surface. Coordinates are device pixels.
pub trait Painter {
    /// `None` removes the clip.
    fn set_clip(&mut self, clip: Option<Rect>);

    fn stroke_polyline(&mut self, points: &[(f64, f64)], color: Rgba, width: f64);

    fn fill_rect(&mut self, rect: Rect, color: Rgba);

    fn draw_image(&mut self, rect: Rect, image: &Arc<RgbaImage>);

    fn draw_text(&mut self, at: (f64, f64), text: &str, color: Rgba);
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clip(Option<Rect>),
    Polyline {
        points: Vec<(f64, f64)>,
        color: Rgba,
        width: f64,
    },
    FillRect {
        rect: Rect,
        color: Rgba,
    },
    Image {
        rect: Rect,
        image: Arc<RgbaImage>,
    },
    Text {
        at: (f64, f64),
        text: String,
        color: Rgba,
    },
}

/// Painter that records commands; used for headless output and tests.
#[derive(Clone, Debug, Default)]
pub struct DisplayList {
    pub commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn polylines(&self) -> impl Iterator<Item = &[(f64, f64)]> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Polyline { points, .. } => Some(points.as_slice()),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = (&Rect, &Arc<RgbaImage>)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Image { rect, image } => Some((rect, image)),
            _ => None,
        })
    }
}

impl Painter for DisplayList {
    fn set_clip(&mut self, clip: Option<Rect>) {
        self.commands.push(DrawCommand::Clip(clip));
    }

    fn stroke_polyline(&mut self, points: &[(f64, f64)], color: Rgba, width: f64) {
        if points.len() < 2 {
            return;
        }
        self.commands.push(DrawCommand::Polyline {
            points: points.to_vec(),
            color,
            width,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn draw_image(&mut self, rect: Rect, image: &Arc<RgbaImage>) {
        self.commands.push(DrawCommand::Image {
            rect,
            image: image.clone(),
        });
    }

    fn draw_text(&mut self, at: (f64, f64), text: &str, color: Rgba) {
        self.commands.push(DrawCommand::Text {
            at,
            text: text.to_string(),
            color,
        });
    }
}

const GLYPH_SIZE: f64 = 8.0;

/// Draws the small error marker and a one-line message in the top-left
/// corner of `clip`, in place of data.
pub fn paint_message(painter: &mut dyn Painter, clip: Rect, message: &str) {
    let glyph = Rect::new(clip.x + 4.0, clip.y + 4.0, GLYPH_SIZE, GLYPH_SIZE);
    painter.fill_rect(glyph, Rgba::RED);
    painter.draw_text(
        (glyph.right() + 4.0, glyph.y + GLYPH_SIZE),
        message,
        Rgba::BLACK,
    );
}

/// Labels the ticks of a horizontal axis along the bottom of `plot`, with a
/// faint grid line per tick.
pub fn paint_x_ticks(
    painter: &mut dyn Painter,
    plot: Rect,
    scale: &ChartScale,
    units: &Units,
    ticks: &[f64],
    font_height: f64,
) {
    for tick in ticks {
        let px = scale.map(*tick);
        if px < plot.x - 0.5 || px > plot.right() + 0.5 {
            continue;
        }
        painter.stroke_polyline(
            &[(px, plot.y + 0.5), (px, plot.bottom() - 0.5)],
            Rgba(0, 0, 0, 25),
            1.0,
        );
        painter.draw_text(
            (px, plot.bottom() + font_height),
            &scale.format_tick(*tick, units),
            Rgba::BLACK,
        );
    }
}

/// Labels the ticks of a vertical axis to the left of `plot`.
pub fn paint_y_ticks(
    painter: &mut dyn Painter,
    plot: Rect,
    scale: &ChartScale,
    units: &Units,
    ticks: &[f64],
) {
    for tick in ticks {
        let py = scale.map(*tick);
        if py < plot.y - 0.5 || py > plot.bottom() + 0.5 {
            continue;
        }
        painter.stroke_polyline(
            &[(plot.x + 0.5, py), (plot.right() - 0.5, py)],
            Rgba(0, 0, 0, 25),
            1.0,
        );
        painter.draw_text((plot.x - 4.0, py), &scale.format_tick(*tick, units), Rgba::BLACK);
    }
}
