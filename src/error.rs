//! Error taxonomy shared by the layout, reduction and renderer layers.

use std::io::ErrorKind;
use thiserror::Error;

pub use crate::units::UnitConversionError;

/// Recoverable data failures. A renderer shows these inline instead of data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransientDataError {
    #[error("request cancelled")]
    Cancelled,
    #[error("interrupted: {0}")]
    Interrupted(String),
    #[error("no data in interval {start} to {end}")]
    NoDataInInterval { start: f64, end: f64 },
}

#[derive(Debug, Error)]
pub enum GraphError {
    /// Cyclic or missing layout parent, bad rank/shape, bad weights.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("cannot parse layout spec at {offending:?}: {reason}")]
    Parse { offending: String, reason: String },

    #[error("invalid reduction window [{min}, {max}] for axis of length {len}")]
    InvalidWindow { min: usize, max: usize, len: usize },

    #[error(transparent)]
    UnitConversion(#[from] UnitConversionError),

    #[error(transparent)]
    TransientData(#[from] TransientDataError),

    #[error("unexpected error: {0:#}")]
    Unexpected(eyre::Report),
}

impl GraphError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn parse(offending: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            offending: offending.into(),
            reason: reason.into(),
        }
    }

    /// Sorts a data-source report into the soft or the escalated bucket.
    pub fn from_report(report: eyre::Report) -> Self {
        if let Some(transient) = report.downcast_ref::<TransientDataError>() {
            return Self::TransientData(transient.clone());
        }
        if let Some(units) = report.downcast_ref::<UnitConversionError>() {
            return Self::UnitConversion(units.clone());
        }
        if let Some(io) = report.downcast_ref::<std::io::Error>() {
            if matches!(io.kind(), ErrorKind::Interrupted | ErrorKind::TimedOut) {
                return Self::TransientData(TransientDataError::Interrupted(io.to_string()));
            }
        }
        Self::Unexpected(report)
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientData(_))
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
