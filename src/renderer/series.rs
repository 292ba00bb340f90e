// Line renderer for rank-1 series

use super::{HasSelectionArea, Renderer};
use crate::data_types::{tags_to_vec, DataSet, SeriesConfig};
use crate::error::{GraphError, Result, TransientDataError};
use crate::rebin::{min_max_series, RebinDescriptor};
use crate::rendering::{Painter, Rect};
use crate::transform::PlotTransform;
use crate::units::Units;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug)]
struct Series {
    x: Vec<f64>,
    x_units: Units,
    y: Vec<f64>,
    y_units: Units,
}

/// Polyline through a rank-1 dataset against its x tags (indices when the
/// dataset has none). Dense data is reduced to the min and max of every
/// pixel column before drawing.
#[derive(Debug)]
pub struct SeriesRenderer {
    name: String,
    config: SeriesConfig,
    dataset: Option<Arc<dyn DataSet>>,
    series: Option<Series>,
    exception: Option<TransientDataError>,
    path_cache: Mutex<Option<(PlotTransform, Arc<Vec<(f64, f64)>>)>>,
}

impl SeriesRenderer {
    pub fn new(name: impl Into<String>, config: SeriesConfig) -> Self {
        Self {
            name: name.into(),
            config,
            dataset: None,
            series: None,
            exception: None,
            path_cache: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SeriesConfig {
        &self.config
    }

    /// Screen-space path for `transform`, reused while the transform is
    /// unchanged.
    pub fn path(&self, transform: &PlotTransform) -> Result<Arc<Vec<(f64, f64)>>> {
        let mut cache = self.path_cache.lock();
        if let Some((key, path)) = cache.as_ref() {
            if key == transform {
                return Ok(path.clone());
            }
        }
        let path = Arc::new(self.build_path(transform)?);
        *cache = Some((transform.clone(), path.clone()));
        Ok(path)
    }

    fn build_path(&self, transform: &PlotTransform) -> Result<Vec<(f64, f64)>> {
        let Some(series) = &self.series else {
            return Ok(vec![]);
        };
        let x_units = transform.x.units();
        let x = series
            .x
            .iter()
            .map(|v| series.x_units.convert(*v, &x_units))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let ddx = RebinDescriptor::from_transform(&transform.x)?;
        let points = if x.len() > 2 * ddx.n_bins {
            min_max_series(&x, &series.y, &ddx)
        } else {
            x.iter()
                .zip(&series.y)
                .filter(|(_, y)| !y.is_nan())
                .map(|(x, y)| (*x, *y))
                .collect()
        };

        points
            .into_iter()
            .map(|(x, y)| -> Result<(f64, f64)> {
                let py = transform.y.to_pixels(y, &series.y_units)?;
                Ok((transform.x.map(x), py))
            })
            .collect()
    }
}

impl Renderer for SeriesRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_data_set(&mut self, dataset: Arc<dyn DataSet>) -> Result<()> {
        if dataset.rank() != 1 {
            return Err(GraphError::configuration(format!(
                "series renderer {} needs rank 1 data, got rank {}",
                self.name,
                dataset.rank()
            )));
        }
        let y = tags_to_vec(dataset.as_ref());
        let (x, x_units) = match dataset.depend(0) {
            Some(tags) => (tags_to_vec(tags), tags.units()),
            None => ((0..y.len()).map(|i| i as f64).collect(), Units::DIMENSIONLESS),
        };
        self.series = Some(Series {
            x,
            x_units,
            y,
            y_units: dataset.units(),
        });
        self.dataset = Some(dataset);
        self.exception = None;
        *self.path_cache.lock() = None;
        Ok(())
    }

    fn data_set(&self) -> Option<&Arc<dyn DataSet>> {
        self.dataset.as_ref()
    }

    fn set_exception(&mut self, error: TransientDataError) {
        self.exception = Some(error);
    }

    fn exception(&self) -> Option<&TransientDataError> {
        self.exception.as_ref()
    }

    fn paint(&self, painter: &mut dyn Painter, transform: &PlotTransform) -> Result<()> {
        let path = self.path(transform)?;
        painter.stroke_polyline(&path, self.config.color, self.config.line_width);
        Ok(())
    }

    fn as_selection_area(&self) -> Option<&dyn HasSelectionArea> {
        Some(self)
    }
}

impl HasSelectionArea for SeriesRenderer {
    /// One box per path segment, widened by the selection tolerance.
    fn selection_area(&self, transform: &PlotTransform) -> Vec<Rect> {
        let Ok(path) = self.path(transform) else {
            return vec![];
        };
        let tolerance = self.config.selection_tolerance;
        match path.len() {
            0 => vec![],
            1 => vec![Rect::from_corners(path[0], path[0]).inflate(tolerance)],
            _ => path
                .windows(2)
                .map(|w| Rect::from_corners(w[0], w[1]).inflate(tolerance))
                .collect(),
        }
    }
}
