//! Coordinate projection from data values (with units) to device pixels.

use crate::data_types::AxisMemento;
use crate::scales::ChartScale;
use crate::units::{UnitConversionError, Units};

/// One axis' mapping, built from a memento so it cannot drift from the
/// state the cached data was requested against.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisTransform {
    scale: ChartScale,
    units: Units,
}

impl AxisTransform {
    pub fn new(scale: ChartScale, units: Units) -> Self {
        Self { scale, units }
    }

    pub fn from_memento(memento: &AxisMemento) -> Self {
        Self {
            scale: memento.scale(),
            units: memento.units,
        }
    }

    pub fn scale(&self) -> &ChartScale {
        &self.scale
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// Pixel position of `value` expressed in `units`.
    pub fn to_pixels(&self, value: f64, units: &Units) -> Result<f64, UnitConversionError> {
        let value = units.convert(value, &self.units)?;
        Ok(self.scale.map(value))
    }

    /// Like `to_pixels` for a value already in axis units.
    pub fn map(&self, value: f64) -> f64 {
        self.scale.map(value)
    }

    pub fn to_data(&self, pixel: f64) -> f64 {
        self.scale.invert(pixel)
    }

    /// Pixel interval covered by the axis, low to high.
    pub fn pixel_bounds(&self) -> (f64, f64) {
        let (a, b) = self.scale.range();
        (a.min(b), a.max(b))
    }
}

/// Pair of transforms used to paint one plot element.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotTransform {
    pub x: AxisTransform,
    pub y: AxisTransform,
}

impl PlotTransform {
    pub fn new(x: AxisTransform, y: AxisTransform) -> Self {
        Self { x, y }
    }

    pub fn data_to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        (self.x.map(x), self.y.map(y))
    }

    pub fn screen_to_data(&self, px: f64, py: f64) -> (f64, f64) {
        (self.x.to_data(px), self.y.to_data(py))
    }
}
