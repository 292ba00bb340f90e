//! Top-level container: layout, plot elements and the state they share.

use crate::cache::DataSetCache;
use crate::config::GraphConfig;
use crate::data_types::{DasAxis, SpectrogramConfig};
use crate::error::{GraphError, Result};
use crate::layout::{Geometry, LayoutArena, Leveler, NodeId, NodeKind};
use crate::loader::{DataLoader, DataSource, UpdateAction};
use crate::renderer::{RenderPipeline, SpectrogramRenderer};
use crate::rendering::{paint_x_ticks, paint_y_ticks, Painter, Rect};
use crate::tick_master::{TickCoordinator, TickKey};
use crate::transform::{AxisTransform, PlotTransform};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// One plot: a row/column cell, its two axes and a renderer pipeline.
#[derive(Debug)]
pub struct PlotElement {
    pub row: NodeId,
    pub column: NodeId,
    pub x_axis: DasAxis,
    pub y_axis: DasAxis,
    pub pipeline: RenderPipeline,
    tick_key: TickKey,
}

#[derive(Debug)]
pub struct Canvas {
    config: GraphConfig,
    arena: LayoutArena,
    cache: Arc<DataSetCache>,
    ticks: Arc<TickCoordinator>,
    elements: BTreeMap<ElementId, PlotElement>,
    next_element: usize,
}

impl Canvas {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            arena: LayoutArena::from_config(&config),
            cache: Arc::new(DataSetCache::new()),
            ticks: Arc::new(TickCoordinator::new(config.ticks.clone())),
            elements: BTreeMap::new(),
            next_element: 0,
            config,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn arena(&self) -> &LayoutArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut LayoutArena {
        &mut self.arena
    }

    pub fn cache(&self) -> &Arc<DataSetCache> {
        &self.cache
    }

    pub fn tick_coordinator(&self) -> &Arc<TickCoordinator> {
        &self.ticks
    }

    /// Adds a top-level row from a `"min,max"` position string.
    pub fn add_row(&mut self, spec: &str) -> Result<NodeId> {
        let geometry: Geometry = spec.parse()?;
        self.arena.insert(NodeKind::Row, geometry, None)
    }

    pub fn add_column(&mut self, spec: &str) -> Result<NodeId> {
        let geometry: Geometry = spec.parse()?;
        self.arena.insert(NodeKind::Column, geometry, None)
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.config.canvas_width = width;
        self.config.canvas_height = height;
        self.arena.set_canvas_size(width, height);
    }

    /// Leveler over `bounding` using the canvas' margin and minimum-width settings.
    pub fn leveler(&self, bounding: NodeId) -> Result<Leveler> {
        Leveler::new(&self.arena, bounding, &self.config.leveler)
    }

    /// Spectrogram that collapses `axis` of rank 3 data, refreshed per the
    /// canvas' collapse settings.
    pub fn collapsing_spectrogram(
        &self,
        name: impl Into<String>,
        config: SpectrogramConfig,
        axis: usize,
    ) -> SpectrogramRenderer {
        SpectrogramRenderer::new(name, config).with_collapse(axis, self.config.collapse.clone())
    }

    /// Loader wired to this canvas' cache and loader settings.
    pub fn loader(&self, source: Arc<dyn DataSource>) -> DataLoader {
        DataLoader::new(source, &self.config.loader, Some(self.cache.clone()))
    }

    pub fn add_element(
        &mut self,
        row: NodeId,
        column: NodeId,
        x_axis: DasAxis,
        y_axis: DasAxis,
        pipeline: RenderPipeline,
    ) -> Result<ElementId> {
        if self.arena.kind(row)? != NodeKind::Row {
            return Err(GraphError::configuration(format!("{row:?} is not a row")));
        }
        if self.arena.kind(column)? != NodeKind::Column {
            return Err(GraphError::configuration(format!(
                "{column:?} is not a column"
            )));
        }
        let width = self.arena.extent(column)?.width();
        let tick_key = self.ticks.register(width);
        let id = ElementId(self.next_element);
        self.next_element += 1;
        self.elements.insert(
            id,
            PlotElement {
                row,
                column,
                x_axis,
                y_axis,
                pipeline,
                tick_key,
            },
        );
        Ok(id)
    }

    /// Detaches an element; its axis no longer limits the shared tick count.
    pub fn remove_element(&mut self, id: ElementId) -> Result<PlotElement> {
        let element = self
            .elements
            .remove(&id)
            .ok_or_else(|| GraphError::configuration(format!("unknown plot element {id:?}")))?;
        self.ticks.unregister(element.tick_key);
        debug!(?id, renderer = element.pipeline.renderer().name(), "element removed");
        Ok(element)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn element(&self, id: ElementId) -> Option<&PlotElement> {
        self.elements.get(&id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut PlotElement> {
        self.elements.get_mut(&id)
    }

    pub fn plot_rect(&self, id: ElementId) -> Result<Rect> {
        let element = self.get(id)?;
        plot_rect(&self.arena, element)
    }

    pub fn transform(&self, id: ElementId) -> Result<PlotTransform> {
        let element = self.get(id)?;
        let rect = plot_rect(&self.arena, element)?;
        Ok(element_transform(element, rect))
    }

    fn get(&self, id: ElementId) -> Result<&PlotElement> {
        self.elements
            .get(&id)
            .ok_or_else(|| GraphError::configuration(format!("unknown plot element {id:?}")))
    }

    /// Pushes the current axis state of every element to its pipeline.
    /// Returns how many requests were issued.
    pub fn update(&mut self) -> Result<usize> {
        let invalidated = self.arena.drain_invalidated();
        if !invalidated.is_empty() {
            debug!(nodes = invalidated.len(), "layout changed");
        }
        let mut issued = 0;
        for element in self.elements.values_mut() {
            let rect = plot_rect(&self.arena, element)?;
            self.ticks.update_length(element.tick_key, rect.width);
            let memento = element.x_axis.memento(rect.x, rect.right());
            if let UpdateAction::Issued { .. } = element.pipeline.update(&memento) {
                issued += 1;
            }
        }
        Ok(issued)
    }

    /// Hands finished loads to their renderers. Returns how many changed.
    pub fn process_events(&mut self) -> usize {
        self.elements
            .values_mut()
            .map(|e| e.pipeline.process_events())
            .filter(|changed| *changed)
            .count()
    }

    /// Blocks until every pending request resolved or `timeout` passed.
    pub fn wait_for_data(&mut self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        self.elements
            .values_mut()
            .map(|e| {
                let remaining = deadline.saturating_duration_since(Instant::now());
                e.pipeline.wait_for_data(remaining)
            })
            .filter(|changed| *changed)
            .count()
    }

    /// Paints every element clipped to its cell, then its tick labels.
    pub fn paint(&mut self, painter: &mut dyn Painter) -> Result<()> {
        let font_height = self.arena.font_height();
        for element in self.elements.values_mut() {
            let rect = plot_rect(&self.arena, element)?;
            if rect.width <= 0.0 || rect.height <= 0.0 {
                debug!(renderer = element.pipeline.renderer().name(), "cell collapsed, skipped");
                continue;
            }
            let transform = element_transform(element, rect);
            element.pipeline.render(painter, &transform, rect);

            let x_ticks = self.ticks.ticks(transform.x.scale());
            paint_x_ticks(
                painter,
                rect,
                transform.x.scale(),
                &element.x_axis.units,
                &x_ticks,
                font_height,
            );
            let y_count = ((rect.height / self.config.ticks.min_spacing_px.max(1.0)) as usize)
                .clamp(2, self.config.ticks.max_ticks.max(2));
            let y_units = element.y_axis.units;
            let y_ticks = element.y_axis.ticks(y_count).to_vec();
            paint_y_ticks(painter, rect, transform.y.scale(), &y_units, &y_ticks);
        }
        Ok(())
    }
}

fn plot_rect(arena: &LayoutArena, element: &PlotElement) -> Result<Rect> {
    Ok(Rect::from_extents(
        arena.extent(element.column)?,
        arena.extent(element.row)?,
    ))
}

fn element_transform(element: &PlotElement, rect: Rect) -> PlotTransform {
    let x = element.x_axis.memento(rect.x, rect.right());
    let y = element.y_axis.memento(rect.y, rect.bottom());
    PlotTransform::new(AxisTransform::from_memento(&x), AxisTransform::from_memento(&y))
}
