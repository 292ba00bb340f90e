use crate::utils::date_formatter::{format_time, label_for_span};
use crate::units::Units;
use plotters::coord::combinators::{IntoLogRange, LogCoord};
use plotters::coord::ranged1d::Ranged;
use plotters::coord::types::RangedCoordf64;

/// Data-to-pixel mapping for one axis.
#[derive(Clone, Debug, PartialEq)]
pub enum ChartScale {
    Linear { domain: (f64, f64), range: (f64, f64) },
    Log { domain: (f64, f64), range: (f64, f64) },
}

fn widen_degenerate(min: f64, max: f64) -> (f64, f64) {
    if (max - min).abs() < f64::EPSILON {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    }
}

impl ChartScale {
    pub fn new_linear(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self::Linear {
            domain: widen_degenerate(domain.0, domain.1),
            range,
        }
    }

    /// Log scales need a strictly positive domain, otherwise `map` yields 0.
    pub fn new_log(domain: (f64, f64), range: (f64, f64)) -> Self {
        let (mut d_min, mut d_max) = domain;
        if (d_max - d_min).abs() < f64::EPSILON {
            d_min /= 10.0;
            d_max *= 10.0;
        }
        Self::Log {
            domain: (d_min, d_max),
            range,
        }
    }

    pub fn is_log(&self) -> bool {
        matches!(self, Self::Log { .. })
    }

    /// Fractional pixel position; rebinning needs more than the whole
    /// pixels `Ranged::map` yields.
    pub fn map(&self, value: f64) -> f64 {
        let res = match self {
            Self::Linear { domain, range } => {
                range.0 + (value - domain.0) / (domain.1 - domain.0) * (range.1 - range.0)
            }
            Self::Log { domain, range } => {
                let (l0, l1) = (domain.0.log10(), domain.1.log10());
                range.0 + (value.log10() - l0) / (l1 - l0) * (range.1 - range.0)
            }
        };
        if res.is_nan() || res.is_infinite() {
            0.0
        } else {
            res
        }
    }

    pub fn invert(&self, pixel: f64) -> f64 {
        let res = match self {
            Self::Linear { domain, range } => {
                domain.0 + (pixel - range.0) / (range.1 - range.0) * (domain.1 - domain.0)
            }
            Self::Log { domain, range } => {
                let (l0, l1) = (domain.0.log10(), domain.1.log10());
                10f64.powf(l0 + (pixel - range.0) / (range.1 - range.0) * (l1 - l0))
            }
        };
        if res.is_finite() {
            res
        } else {
            0.0
        }
    }

    pub fn range(&self) -> (f64, f64) {
        match self {
            Self::Linear { range, .. } | Self::Log { range, .. } => *range,
        }
    }

    pub fn domain(&self) -> (f64, f64) {
        match self {
            Self::Linear { domain, .. } | Self::Log { domain, .. } => *domain,
        }
    }

    /// Pixel distance covered by one data unit, or by one decade on log scales.
    pub fn pixels_per_unit(&self) -> f64 {
        let (d0, d1) = self.domain();
        let (r0, r1) = self.range();
        let span = match self {
            Self::Linear { .. } => d1 - d0,
            Self::Log { .. } => d1.log10() - d0.log10(),
        };
        if span == 0.0 {
            0.0
        } else {
            (r1 - r0).abs() / span.abs()
        }
    }

    /// At most `count` round values inside the domain: 1/2/5 steps on
    /// linear scales, decades (with subdivisions when room allows) on log ones.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (d0, d1) = self.domain();
        let (lo, hi) = (d0.min(d1), d0.max(d1));
        if !lo.is_finite() || !hi.is_finite() {
            return Vec::new();
        }
        let count = count.max(2);
        match self {
            Self::Linear { .. } => linear_ticks(lo, hi, count),
            Self::Log { .. } => {
                if lo <= 0.0 {
                    return Vec::new();
                }
                let coord: LogCoord<f64> = (lo..hi).log_scale().into();
                let ticks = coord.key_points(count);
                if ticks.len() < 2 {
                    linear_ticks(lo, hi, count)
                } else {
                    ticks
                }
            }
        }
    }

    pub fn format_tick(&self, value: f64, units: &Units) -> String {
        if let Some(seconds) = units.to_unix_seconds(value) {
            let (d_min, d_max) = self.domain();
            let span_sec = units
                .to_unix_seconds(d_max)
                .zip(units.to_unix_seconds(d_min))
                .map(|(a, b)| (a - b).abs())
                .unwrap_or(0.0);
            return format_time(seconds, label_for_span(span_sec));
        }

        if value.abs() < 0.001 && value.abs() > 0.0 {
            format!("{:.4}", value)
        } else if value.abs() > 1000.0 {
            format!("{:.0}", value)
        } else {
            format!("{:.2}", value)
        }
    }

    pub fn update_domain(&mut self, min: f64, max: f64) {
        match self {
            Self::Linear { domain, .. } => *domain = widen_degenerate(min, max),
            Self::Log { domain, .. } => *domain = (min, max),
        }
    }

    pub fn update_range(&mut self, min: f64, max: f64) {
        match self {
            Self::Linear { range, .. } | Self::Log { range, .. } => *range = (min, max),
        }
    }

    /// Returns (m, c) such that screen = value * m + c.
    /// Only exact for Linear scales; log scales return the identity.
    pub fn get_linear_coeffs(&self) -> (f64, f64) {
        match self {
            Self::Linear { domain, range } => {
                let m = (range.1 - range.0) / (domain.1 - domain.0);
                (m, range.0 - m * domain.0)
            }
            Self::Log { .. } => (1.0, 0.0),
        }
    }
}

fn linear_ticks(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    RangedCoordf64::from(lo..hi).key_points(count)
}
