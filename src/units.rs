//! Minimal physical-units collaborator: enough to convert axis and dataset
//! values into a common unit before mapping to pixels.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Seconds between 1970-01-01 and 2000-01-01 (UTC).
const Y2000_OFFSET_SECONDS: f64 = 946_684_800.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dimension {
    Dimensionless,
    /// Time location, base unit is seconds since 1970.
    TimeLocation,
    /// Time duration, base unit is seconds.
    Duration,
    Frequency,
    Decibel,
}

#[derive(Clone, Debug, PartialEq, Error)]
#[error("cannot convert {from} to {to}")]
pub struct UnitConversionError {
    pub from: &'static str,
    pub to: &'static str,
}

/// A unit expressed as an affine map onto its dimension's base unit:
/// `base = value * factor + offset`.
#[derive(Clone, Copy, Debug)]
pub struct Units {
    id: &'static str,
    dimension: Dimension,
    factor: f64,
    offset: f64,
}

impl PartialEq for Units {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Units {}

impl std::hash::Hash for Units {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Units {
    pub const DIMENSIONLESS: Units = Units::new("", Dimension::Dimensionless, 1.0, 0.0);
    pub const SECONDS: Units = Units::new("s", Dimension::Duration, 1.0, 0.0);
    pub const MILLISECONDS: Units = Units::new("ms", Dimension::Duration, 1e-3, 0.0);
    pub const MICROSECONDS: Units = Units::new("microseconds", Dimension::Duration, 1e-6, 0.0);
    pub const T1970: Units = Units::new("t1970", Dimension::TimeLocation, 1.0, 0.0);
    pub const MS1970: Units = Units::new("ms1970", Dimension::TimeLocation, 1e-3, 0.0);
    pub const T2000: Units =
        Units::new("t2000", Dimension::TimeLocation, 1.0, Y2000_OFFSET_SECONDS);
    pub const US2000: Units =
        Units::new("us2000", Dimension::TimeLocation, 1e-6, Y2000_OFFSET_SECONDS);
    pub const HERTZ: Units = Units::new("Hz", Dimension::Frequency, 1.0, 0.0);
    pub const KILOHERTZ: Units = Units::new("kHz", Dimension::Frequency, 1e3, 0.0);
    pub const DECIBELS: Units = Units::new("dB", Dimension::Decibel, 1.0, 0.0);

    const ALL: [Units; 11] = [
        Self::DIMENSIONLESS,
        Self::SECONDS,
        Self::MILLISECONDS,
        Self::MICROSECONDS,
        Self::T1970,
        Self::MS1970,
        Self::T2000,
        Self::US2000,
        Self::HERTZ,
        Self::KILOHERTZ,
        Self::DECIBELS,
    ];

    const fn new(id: &'static str, dimension: Dimension, factor: f64, offset: f64) -> Self {
        Self {
            id,
            dimension,
            factor,
            offset,
        }
    }

    pub fn by_id(id: &str) -> Option<Units> {
        Self::ALL.iter().copied().find(|u| u.id == id)
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn is_time_location(&self) -> bool {
        self.dimension == Dimension::TimeLocation
    }

    pub fn is_convertible_to(&self, other: &Units) -> bool {
        self.dimension == other.dimension
    }

    /// Converts `value` expressed in `self` into `to`.
    pub fn convert(&self, value: f64, to: &Units) -> Result<f64, UnitConversionError> {
        convert(value, self, to)
    }

    /// Value in seconds since 1970, for time locations. Used for tick labels.
    pub fn to_unix_seconds(&self, value: f64) -> Option<f64> {
        self.is_time_location()
            .then(|| value * self.factor + self.offset)
    }
}

pub fn convert(value: f64, from: &Units, to: &Units) -> Result<f64, UnitConversionError> {
    if from == to {
        return Ok(value);
    }
    if from.dimension != to.dimension {
        return Err(UnitConversionError {
            from: from.id,
            to: to.id,
        });
    }
    let base = value * from.factor + from.offset;
    Ok((base - to.offset) / to.factor)
}

impl Default for Units {
    fn default() -> Self {
        Self::DIMENSIONLESS
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id)
    }
}

impl Serialize for Units {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id)
    }
}

impl<'de> Deserialize<'de> for Units {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = String::deserialize(deserializer)?;
        Units::by_id(&id).ok_or_else(|| serde::de::Error::custom(format!("unknown units {id:?}")))
    }
}
