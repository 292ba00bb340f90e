use crate::error::{GraphError, Result};
use crate::scales::ChartScale;
use crate::units::Units;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Immutable snapshot of an axis, taken when a data request is issued.
/// Two requests are "the same" when their mementos compare equal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisMemento {
    pub min: f64,
    pub max: f64,
    pub log: bool,
    pub units: Units,
    pub orientation: Orientation,
    pub pixel_min: f64,
    pub pixel_max: f64,
}

impl AxisMemento {
    pub fn pixel_span(&self) -> f64 {
        (self.pixel_max - self.pixel_min).abs()
    }

    /// Data units per pixel. Log axes report decades per pixel.
    pub fn resolution(&self) -> Option<f64> {
        let pixels = self.pixel_span();
        if pixels <= 0.0 {
            return None;
        }
        let span = if self.log {
            self.max.log10() - self.min.log10()
        } else {
            self.max - self.min
        };
        (span.is_finite() && span > 0.0).then(|| span / pixels)
    }

    pub fn scale(&self) -> ChartScale {
        let range = match self.orientation {
            Orientation::Horizontal => (self.pixel_min, self.pixel_max),
            // Screen y grows downward, so the data minimum sits at the bottom.
            Orientation::Vertical => (self.pixel_max, self.pixel_min),
        };
        if self.log {
            ChartScale::new_log((self.min, self.max), range)
        } else {
            ChartScale::new_linear((self.min, self.max), range)
        }
    }
}

/// State for a single plot axis.
#[derive(Clone, Debug, PartialEq)]
pub struct DasAxis {
    pub min: f64,
    pub max: f64,
    pub log: bool,
    pub units: Units,
    pub orientation: Orientation,
    pub min_limit: Option<f64>,
    pub max_limit: Option<f64>,
    cached_ticks: Vec<f64>,
    last_tick_domain: (f64, f64),
}

impl DasAxis {
    pub fn new(min: f64, max: f64, units: Units, orientation: Orientation) -> Self {
        Self {
            min,
            max,
            log: false,
            units,
            orientation,
            min_limit: None,
            max_limit: None,
            cached_ticks: vec![],
            last_tick_domain: (0.0, 0.0),
        }
    }

    pub fn horizontal(min: f64, max: f64, units: Units) -> Self {
        Self::new(min, max, units, Orientation::Horizontal)
    }

    pub fn vertical(min: f64, max: f64, units: Units) -> Self {
        Self::new(min, max, units, Orientation::Vertical)
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn set_range(&mut self, min: f64, max: f64) -> Result<()> {
        if !(min < max) {
            return Err(GraphError::configuration(format!(
                "axis range [{min}, {max}] is empty"
            )));
        }
        if self.log && min <= 0.0 {
            return Err(GraphError::configuration(format!(
                "log axis needs a positive minimum, got {min}"
            )));
        }
        self.min = min;
        self.max = max;
        self.cached_ticks.clear();
        Ok(())
    }

    pub fn set_log(&mut self, log: bool) -> Result<()> {
        if log && self.min <= 0.0 {
            return Err(GraphError::configuration(format!(
                "cannot make axis with minimum {} logarithmic",
                self.min
            )));
        }
        self.log = log;
        self.cached_ticks.clear();
        Ok(())
    }

    pub fn memento(&self, pixel_min: f64, pixel_max: f64) -> AxisMemento {
        let (min, max) = self.clamped_bounds();
        AxisMemento {
            min,
            max,
            log: self.log,
            units: self.units,
            orientation: self.orientation,
            pixel_min,
            pixel_max,
        }
    }

    pub fn ticks(&mut self, count: usize) -> &[f64] {
        let (min, max) = self.clamped_bounds();
        let domain_changed = (min - self.last_tick_domain.0).abs() > (max - min) * 0.001
            || (max - self.last_tick_domain.1).abs() > (max - min) * 0.001;

        if domain_changed || self.cached_ticks.is_empty() {
            let scale = if self.log {
                ChartScale::new_log((min, max), (0.0, 1.0))
            } else {
                ChartScale::new_linear((min, max), (0.0, 1.0))
            };
            self.cached_ticks = scale.ticks(count);
            self.last_tick_domain = (min, max);
        }
        &self.cached_ticks
    }

    /// Returns the clamped bounds for rendering.
    pub fn clamped_bounds(&self) -> (f64, f64) {
        let mut c_min = self.min;
        let mut c_max = self.max;
        if let Some(l) = self.min_limit {
            c_min = c_min.max(l);
            c_max = c_max.max(l);
        }
        if let Some(l) = self.max_limit {
            c_max = c_max.min(l);
            c_min = c_min.min(l);
        }
        (c_min, c_max)
    }

    /// Zoom about `pivot_data`, keeping it at `pivot_pct` of the axis.
    /// Log axes zoom in log space.
    pub fn zoom_at(&mut self, pivot_data: f64, pivot_pct: f64, factor: f64) {
        if self.log && pivot_data > 0.0 {
            let span = (self.max.log10() - self.min.log10()) * factor;
            let lo = pivot_data.log10() - span * pivot_pct;
            self.min = 10f64.powf(lo);
            self.max = 10f64.powf(lo + span);
        } else {
            let new_span = self.span() * factor;
            self.min = pivot_data - new_span * pivot_pct;
            self.max = self.min + new_span;
        }
        self.cached_ticks.clear();
    }

    pub fn pan(&mut self, delta_data: f64) {
        self.min += delta_data;
        self.max += delta_data;
        self.cached_ticks.clear();
    }

    /// Moves to the adjacent interval of the same width (das2 "scan").
    pub fn scan_next(&mut self) {
        if self.log {
            let ratio = self.max / self.min;
            self.min = self.max;
            self.max *= ratio;
            self.cached_ticks.clear();
        } else {
            self.pan(self.span());
        }
    }

    pub fn scan_previous(&mut self) {
        if self.log {
            let ratio = self.max / self.min;
            self.max = self.min;
            self.min /= ratio;
            self.cached_ticks.clear();
        } else {
            self.pan(-self.span());
        }
    }

    /// Applies limits, preserving the span where possible.
    pub fn clamp(&mut self) {
        let (Some(min_l), Some(max_l)) = (self.min_limit, self.max_limit) else {
            if let Some(l) = self.min_limit {
                if self.min < l {
                    let s = self.span();
                    self.min = l;
                    self.max = l + s;
                }
            }
            if let Some(l) = self.max_limit {
                if self.max > l {
                    let s = self.span();
                    self.max = l;
                    self.min = l - s;
                }
            }
            self.cached_ticks.clear();
            return;
        };

        let limit_span = max_l - min_l;
        let current_span = self.span();

        if current_span <= limit_span {
            if self.min < min_l {
                self.min = min_l;
                self.max = min_l + current_span;
            } else if self.max > max_l {
                self.max = max_l;
                self.min = max_l - current_span;
            }
        } else if self.min > min_l {
            self.min = min_l;
            self.max = min_l + current_span;
        } else if self.max < max_l {
            self.max = max_l;
            self.min = max_l - current_span;
        }
        self.cached_ticks.clear();
    }
}
