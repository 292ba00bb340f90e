use super::{render, Renderer};
use crate::data_types::{AxisMemento, DataSet};
use crate::error::{GraphError, Result};
use crate::loader::{DataLoader, LoaderEvent, LoaderState, UpdateAction};
use crate::rendering::{Painter, Rect};
use crate::transform::PlotTransform;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

/// Receives errors a renderer cannot show inline.
pub type ErrorHandler = Arc<dyn Fn(&GraphError) + Send + Sync>;

pub fn default_error_handler() -> ErrorHandler {
    Arc::new(|e| error!(error = %e, "unhandled plot error"))
}

/// A renderer plus the loader that keeps it supplied.
pub struct RenderPipeline {
    renderer: Box<dyn Renderer>,
    loader: Option<DataLoader>,
    error_handler: ErrorHandler,
}

impl std::fmt::Debug for RenderPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPipeline")
            .field("renderer", &self.renderer.name())
            .field("loader", &self.loader)
            .finish()
    }
}

impl RenderPipeline {
    pub fn new(renderer: Box<dyn Renderer>) -> Self {
        Self {
            renderer,
            loader: None,
            error_handler: default_error_handler(),
        }
    }

    pub fn with_loader(mut self, loader: DataLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = handler;
        self
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    pub fn renderer_mut(&mut self) -> &mut dyn Renderer {
        self.renderer.as_mut()
    }

    pub fn loader(&self) -> Option<&DataLoader> {
        self.loader.as_ref()
    }

    pub fn loader_mut(&mut self) -> Option<&mut DataLoader> {
        self.loader.as_mut()
    }

    pub fn state(&self) -> LoaderState {
        self.loader
            .as_ref()
            .map_or(LoaderState::Idle, DataLoader::state)
    }

    /// Installs data directly, bypassing the loader.
    pub fn set_data_set(&mut self, dataset: Arc<dyn DataSet>) -> Result<()> {
        self.renderer.set_data_set(dataset)
    }

    /// Called whenever the x axis may have changed.
    pub fn update(&mut self, x_axis: &AxisMemento) -> UpdateAction {
        match &mut self.loader {
            Some(loader) => loader.update(x_axis),
            None => UpdateAction::Unchanged,
        }
    }

    /// Applies whatever the loader finished since the last call. Returns
    /// true when the renderer received new data or a new exception.
    pub fn process_events(&mut self) -> bool {
        let event = self.loader.as_mut().and_then(DataLoader::poll);
        event.is_some_and(|e| self.apply(e))
    }

    /// Blocking variant of `process_events` for batch output.
    pub fn wait_for_data(&mut self, timeout: Duration) -> bool {
        let event = self.loader.as_mut().and_then(|l| l.wait(timeout));
        event.is_some_and(|e| self.apply(e))
    }

    fn apply(&mut self, event: LoaderEvent) -> bool {
        match event {
            LoaderEvent::Loaded { dataset, .. } => match self.renderer.set_data_set(dataset) {
                Ok(()) => true,
                Err(e) => {
                    (self.error_handler)(&e);
                    false
                }
            },
            LoaderEvent::Failed {
                error: GraphError::TransientData(soft),
                ..
            } => {
                self.renderer.set_exception(soft);
                true
            }
            LoaderEvent::Failed { error, .. } => {
                (self.error_handler)(&error);
                false
            }
        }
    }

    pub fn render(&self, painter: &mut dyn Painter, transform: &PlotTransform, clip: Rect) {
        render(self.renderer.as_ref(), painter, transform, clip);
    }
}
