//! Renderers and the pipeline that feeds them.

pub mod pipeline;
pub mod series;
pub mod spectrogram;

pub use pipeline::{default_error_handler, ErrorHandler, RenderPipeline};
pub use series::SeriesRenderer;
pub use spectrogram::SpectrogramRenderer;

use crate::data_types::DataSet;
use crate::error::{Result, TransientDataError};
use crate::rendering::{paint_message, Painter, Rect};
use crate::transform::PlotTransform;
use std::sync::Arc;
use tracing::warn;

/// Draws one dataset into a plot element.
pub trait Renderer: Send {
    fn name(&self) -> &str;

    /// Validates and installs `dataset`, clearing any pending exception.
    /// Shape and rank problems are reported here, not at paint time.
    fn set_data_set(&mut self, dataset: Arc<dyn DataSet>) -> Result<()>;

    fn data_set(&self) -> Option<&Arc<dyn DataSet>>;

    /// Marks the renderer as failed; `render` shows the message instead of data.
    fn set_exception(&mut self, error: TransientDataError);

    fn exception(&self) -> Option<&TransientDataError>;

    fn paint(&self, painter: &mut dyn Painter, transform: &PlotTransform) -> Result<()>;

    /// Renderers that can be picked with the mouse expose their outline here.
    fn as_selection_area(&self) -> Option<&dyn HasSelectionArea> {
        None
    }
}

/// Pixel regions that count as "on" the rendered data.
pub trait HasSelectionArea {
    fn selection_area(&self, transform: &PlotTransform) -> Vec<Rect>;

    fn hit(&self, transform: &PlotTransform, point: (f64, f64)) -> bool {
        self.selection_area(transform)
            .iter()
            .any(|r| r.contains(point))
    }
}

/// Paints `renderer` clipped to `clip`. Never fails: errors become an inline
/// message.
pub fn render(
    renderer: &dyn Renderer,
    painter: &mut dyn Painter,
    transform: &PlotTransform,
    clip: Rect,
) {
    painter.set_clip(Some(clip));
    if let Some(exception) = renderer.exception() {
        paint_message(painter, clip, &exception.to_string());
    } else if renderer.data_set().is_some() {
        if let Err(e) = renderer.paint(painter, transform) {
            warn!(renderer = renderer.name(), error = %e, "paint failed");
            paint_message(painter, clip, &e.to_string());
        }
    }
    painter.set_clip(None);
}
