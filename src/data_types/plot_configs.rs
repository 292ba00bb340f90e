use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    pub const BLACK: Rgba = Rgba(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba(255, 255, 255, 255);
    pub const BLUE: Rgba = Rgba(0, 0, 255, 255);
    pub const RED: Rgba = Rgba(255, 0, 0, 255);
    pub const TRANSPARENT: Rgba = Rgba(0, 0, 0, 0);

    pub fn lerp(self, other: Rgba, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgba(
            mix(self.0, other.0),
            mix(self.1, other.1),
            mix(self.2, other.2),
            mix(self.3, other.3),
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesConfig {
    pub color: Rgba,
    pub line_width: f64,
    /// Half-width, in pixels, of the band reported as the selection area.
    pub selection_tolerance: f64,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            color: Rgba::BLACK,
            line_width: 1.0,
            selection_tolerance: 3.0,
        }
    }
}

/// Maps a z value onto a colour gradient.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorBar {
    pub min: f64,
    pub max: f64,
    pub log: bool,
    pub low: Rgba,
    pub high: Rgba,
    /// Colour for bins that received no data.
    pub fill: Rgba,
}

impl Default for ColorBar {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 1.0,
            log: false,
            low: Rgba::BLUE,
            high: Rgba::RED,
            fill: Rgba::TRANSPARENT,
        }
    }
}

impl ColorBar {
    pub fn color(&self, z: f64) -> Rgba {
        if !z.is_finite() {
            return self.fill;
        }
        let t = if self.log {
            if z <= 0.0 || self.min <= 0.0 {
                return self.fill;
            }
            (z.log10() - self.min.log10()) / (self.max.log10() - self.min.log10())
        } else {
            (z - self.min) / (self.max - self.min)
        };
        if t.is_nan() {
            return self.fill;
        }
        self.low.lerp(self.high, t)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct SpectrogramConfig {
    pub color_bar: ColorBar,
}
