//! The `<n>%<+n>em<+n>pt` offset algebra used to place rows and columns.

use crate::error::{GraphError, Result};
use crate::utils::format_number;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resolved pixel interval `[min, max)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// A region can be drawn into only when it has positive width.
    pub fn is_usable(&self) -> bool {
        self.min < self.max
    }
}

/// One boundary: a fraction of the parent plus font and pixel offsets.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct PositionSpec {
    pub norm: f64,
    pub em: f64,
    pub pt: f64,
}

impl PositionSpec {
    pub const fn new(norm: f64, em: f64, pt: f64) -> Self {
        Self { norm, em, pt }
    }

    pub const fn norm(norm: f64) -> Self {
        Self::new(norm, 0.0, 0.0)
    }

    pub fn resolve(&self, parent: Extent, font_height: f64) -> f64 {
        parent.min + self.norm * parent.width() + self.em * font_height + self.pt
    }
}

/// Both boundaries of a row or column.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Geometry {
    pub min: PositionSpec,
    pub max: PositionSpec,
}

impl Geometry {
    pub const fn new(min: PositionSpec, max: PositionSpec) -> Self {
        Self { min, max }
    }

    pub const fn normalized(min: f64, max: f64) -> Self {
        Self::new(PositionSpec::norm(min), PositionSpec::norm(max))
    }

    pub fn resolve(&self, parent: Extent, font_height: f64) -> Extent {
        Extent::new(
            self.min.resolve(parent, font_height),
            self.max.resolve(parent, font_height),
        )
    }
}

impl FromStr for Geometry {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        let (min, max) = parse_range(s)?;
        Ok(Self::new(min, max))
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.min, self.max)
    }
}

/// Parses `"<min spec>,<max spec>"`.
pub fn parse_range(s: &str) -> Result<(PositionSpec, PositionSpec)> {
    let mut parts = s.split(',');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(min), Some(max), None) => Ok((min.parse()?, max.parse()?)),
        _ => Err(GraphError::parse(s, "expected two comma-separated positions")),
    }
}

impl FromStr for PositionSpec {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        let mut spec = PositionSpec::default();
        let bytes = s.as_bytes();
        let mut pos = 0;

        loop {
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            if pos >= bytes.len() {
                break;
            }

            let start = pos;
            if bytes[pos] == b'+' || bytes[pos] == b'-' {
                pos += 1;
            }
            while pos < bytes.len() && (bytes[pos].is_ascii_digit() || bytes[pos] == b'.') {
                pos += 1;
            }
            let number = s[start..pos].trim_start_matches(['+', '-']);
            if !number.bytes().any(|b| b.is_ascii_digit()) {
                return Err(GraphError::parse(&s[start..], "expected a number"));
            }
            let value: f64 = s[start..pos]
                .parse()
                .map_err(|_| GraphError::parse(&s[start..pos], "malformed number"))?;

            let rest = &s[pos..];
            if rest.starts_with('%') {
                spec.norm += value / 100.0;
                pos += 1;
            } else if rest.starts_with("em") {
                spec.em += value;
                pos += 2;
            } else if rest.starts_with("pt") || rest.starts_with("px") {
                spec.pt += value;
                pos += 2;
            } else {
                return Err(GraphError::parse(
                    &s[start..],
                    "expected %, em or pt after number",
                ));
            }
        }

        Ok(spec)
    }
}

impl fmt::Display for PositionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clauses = [
            (self.norm * 100.0, "%"),
            (self.em, "em"),
            (self.pt, "pt"),
        ];
        let mut first = true;
        for (value, suffix) in clauses {
            if value == 0.0 {
                continue;
            }
            if !first && value > 0.0 {
                f.write_str("+")?;
            }
            write!(f, "{}{}", format_number(value), suffix)?;
            first = false;
        }
        if first {
            f.write_str("0%")?;
        }
        Ok(())
    }
}
