use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Session-wide settings for a canvas and everything hanging off it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Height of one em, in pixels.
    pub font_height: f64,
    pub leveler: LevelerConfig,
    pub collapse: CollapseConfig,
    pub loader: LoaderConfig,
    pub ticks: TickConfig,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            canvas_width: 640.0,
            canvas_height: 480.0,
            font_height: 12.0,
            leveler: LevelerConfig::default(),
            collapse: CollapseConfig::default(),
            loader: LoaderConfig::default(),
            ticks: TickConfig::default(),
        }
    }
}

impl GraphConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).wrap_err("invalid graph configuration")
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading {}", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).wrap_err("serializing graph configuration")
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelerConfig {
    /// Normalized gap between consecutive children.
    pub inter_margin: f64,
    /// Smallest normalized width a child can be dragged down to.
    pub min_child_fraction: f64,
}

impl Default for LevelerConfig {
    fn default() -> Self {
        Self {
            inter_margin: 0.0,
            min_child_fraction: 0.02,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollapseConfig {
    /// Incremental updates allowed before a full recomputation is forced.
    pub refresh_interval: usize,
}

impl Default for CollapseConfig {
    fn default() -> Self {
        Self {
            refresh_interval: 64,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Request intrinsic data and skip rebinning.
    pub full_resolution: bool,
    pub use_cache: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            full_resolution: false,
            use_cache: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Minimum distance between two major ticks, in pixels.
    pub min_spacing_px: f64,
    pub max_ticks: usize,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            min_spacing_px: 50.0,
            max_ticks: 12,
        }
    }
}
