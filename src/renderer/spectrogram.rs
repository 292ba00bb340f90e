// Colour-mapped table renderer, optionally collapsing a rank-3 cube

use super::{HasSelectionArea, Renderer};
use crate::collapse::CollapseEngine;
use crate::config::CollapseConfig;
use crate::data_types::{tags_to_vec, DataSet, SpectrogramConfig};
use crate::error::{GraphError, Result, TransientDataError};
use crate::rebin::{average_table, RebinDescriptor};
use crate::rendering::{Painter, Rect, RgbaImage};
use crate::transform::PlotTransform;
use crate::units::Units;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
struct Table {
    data: Arc<dyn DataSet>,
    x: Vec<f64>,
    x_units: Units,
    y: Vec<f64>,
    y_units: Units,
}

impl Table {
    fn new(data: Arc<dyn DataSet>) -> Self {
        let tags = |axis: usize| match data.depend(axis) {
            Some(t) => (tags_to_vec(t), t.units()),
            None => (
                (0..data.length(axis)).map(|i| i as f64).collect(),
                Units::DIMENSIONLESS,
            ),
        };
        let (x, x_units) = tags(0);
        let (y, y_units) = tags(1);
        Self {
            data,
            x,
            x_units,
            y,
            y_units,
        }
    }
}

#[derive(Debug)]
struct CachedImage {
    transform: PlotTransform,
    rect: Rect,
    image: Arc<RgbaImage>,
}

#[derive(Debug)]
pub struct SpectrogramRenderer {
    name: String,
    config: SpectrogramConfig,
    dataset: Option<Arc<dyn DataSet>>,
    table: Option<Table>,
    collapse_axis: Option<usize>,
    collapse_config: CollapseConfig,
    collapse: Option<CollapseEngine>,
    exception: Option<TransientDataError>,
    image: Mutex<Option<CachedImage>>,
    rebuilds: AtomicUsize,
}

impl SpectrogramRenderer {
    pub fn new(name: impl Into<String>, config: SpectrogramConfig) -> Self {
        Self {
            name: name.into(),
            config,
            dataset: None,
            table: None,
            collapse_axis: None,
            collapse_config: CollapseConfig::default(),
            collapse: None,
            exception: None,
            image: Mutex::new(None),
            rebuilds: AtomicUsize::new(0),
        }
    }

    /// Accept rank-3 data and draw the mean over a window of `axis`.
    pub fn with_collapse(mut self, axis: usize, config: CollapseConfig) -> Self {
        self.collapse_axis = Some(axis);
        self.collapse_config = config;
        self
    }

    pub fn config(&self) -> &SpectrogramConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SpectrogramConfig) {
        self.config = config;
        self.invalidate();
    }

    pub fn collapse(&self) -> Option<&CollapseEngine> {
        self.collapse.as_ref()
    }

    /// How many times the image has been resampled.
    pub fn image_rebuilds(&self) -> usize {
        self.rebuilds.load(Ordering::Relaxed)
    }

    /// Moves the collapse window; the image is rebuilt only if the reduced
    /// table actually changed.
    pub fn set_window(&mut self, min: usize, max: usize) -> Result<()> {
        let Some(engine) = self.collapse.as_mut() else {
            return Err(GraphError::configuration(format!(
                "spectrogram {} has no collapse axis",
                self.name
            )));
        };
        engine.set_window(min, max)?;
        if engine.take_dirty() {
            if let Some(reduced) = engine.reduced() {
                self.table = Some(Table::new(Arc::new(reduced.clone())));
            }
            self.invalidate();
        }
        Ok(())
    }

    fn invalidate(&self) {
        *self.image.lock() = None;
    }

    fn build_image(&self, table: &Table, transform: &PlotTransform) -> Result<CachedImage> {
        let to_axis = |tags: &[f64], from: Units, to: Units| {
            tags.iter()
                .map(|v| from.convert(*v, &to))
                .collect::<std::result::Result<Vec<_>, _>>()
        };
        let x = to_axis(&table.x, table.x_units, transform.x.units())?;
        let y = to_axis(&table.y, table.y_units, transform.y.units())?;

        let ddx = RebinDescriptor::from_transform(&transform.x)?;
        let ddy = RebinDescriptor::from_transform(&transform.y)?;
        let rebinned = average_table(table.data.as_ref(), &x, &y, &ddx, &ddy)?;

        let color_bar = &self.config.color_bar;
        let mut image = RgbaImage::new(ddx.n_bins, ddy.n_bins, color_bar.fill);
        // Bin 0 holds the smallest value; on a vertical axis it goes at the
        // bottom unless the scale runs the other way.
        let y_range = transform.y.scale().range();
        let y_flipped = y_range.0 > y_range.1;
        for ix in 0..ddx.n_bins {
            for iy in 0..ddy.n_bins {
                let row = if y_flipped { ddy.n_bins - 1 - iy } else { iy };
                image.set_pixel(ix, row, color_bar.color(rebinned.value(ix, iy)));
            }
        }

        let (x0, _) = transform.x.pixel_bounds();
        let (y0, _) = transform.y.pixel_bounds();
        let rect = Rect::new(x0, y0, ddx.n_bins as f64, ddy.n_bins as f64);
        self.rebuilds.fetch_add(1, Ordering::Relaxed);
        debug!(renderer = %self.name, nx = ddx.n_bins, ny = ddy.n_bins, "spectrogram image rebuilt");
        Ok(CachedImage {
            transform: transform.clone(),
            rect,
            image: Arc::new(image),
        })
    }
}

impl Renderer for SpectrogramRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_data_set(&mut self, dataset: Arc<dyn DataSet>) -> Result<()> {
        let rank = dataset.rank();
        match self.collapse_axis {
            Some(axis) => {
                if rank != 3 {
                    return Err(GraphError::configuration(format!(
                        "spectrogram {} collapses rank 3 data, got rank {rank}",
                        self.name
                    )));
                }
                // A rejected source leaves the current engine and window in place.
                match self.collapse.as_mut() {
                    Some(engine) => engine.set_source(dataset.clone())?,
                    None => {
                        self.collapse = Some(CollapseEngine::new(
                            dataset.clone(),
                            axis,
                            &self.collapse_config,
                        )?)
                    }
                }
                let last = self
                    .collapse
                    .as_ref()
                    .map_or(0, |engine| engine.axis_length().saturating_sub(1));
                self.table = None;
                self.dataset = Some(dataset);
                self.set_window(0, last)?;
            }
            None => {
                if rank != 2 {
                    return Err(GraphError::configuration(format!(
                        "spectrogram {} needs rank 2 data, got rank {rank}",
                        self.name
                    )));
                }
                self.table = Some(Table::new(dataset.clone()));
                self.dataset = Some(dataset);
                self.invalidate();
            }
        }
        self.exception = None;
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
        let Some(table) = &self.table else {
            return Ok(());
        };
        let mut cache = self.image.lock();
        let stale = cache.as_ref().map_or(true, |c| &c.transform != transform);
        if stale {
            *cache = Some(self.build_image(table, transform)?);
        }
        if let Some(cached) = cache.as_ref() {
            painter.draw_image(cached.rect, &cached.image);
        }
        Ok(())
    }

    fn as_selection_area(&self) -> Option<&dyn HasSelectionArea> {
        Some(self)
    }
}

impl HasSelectionArea for SpectrogramRenderer {
    fn selection_area(&self, transform: &PlotTransform) -> Vec<Rect> {
        let Some(table) = &self.table else {
            return vec![];
        };
        let bounds = |tags: &[f64]| {
            tags.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            })
        };
        let (x0, x1) = bounds(&table.x);
        let (y0, y1) = bounds(&table.y);
        let corners = (
            transform.x.to_pixels(x0, &table.x_units),
            transform.y.to_pixels(y0, &table.y_units),
            transform.x.to_pixels(x1, &table.x_units),
            transform.y.to_pixels(y1, &table.y_units),
        );
        match corners {
            (Ok(ax), Ok(ay), Ok(bx), Ok(by)) if x0 <= x1 && y0 <= y1 => {
                vec![Rect::from_corners((ax, ay), (bx, by))]
            }
            _ => vec![],
        }
    }
}
