//! Rows and columns stored in an arena and addressed by generational handles.
//!
//! A node's extent is computed lazily and cached. Changing a node (or the
//! canvas) clears the cache of the node and of every node whose parent chain
//! runs through it; the affected handles are queued for
//! [`LayoutArena::drain_invalidated`] so renderers can react.

use super::spec::{Extent, Geometry};
use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Vertical extent, normalized against the canvas height.
    Row,
    /// Horizontal extent, normalized against the canvas width.
    Column,
}

#[derive(Debug)]
struct LayoutNode {
    kind: NodeKind,
    geometry: Geometry,
    parent: Option<NodeId>,
    dependents: Vec<NodeId>,
    cached: Cell<Option<Extent>>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<LayoutNode>,
}

#[derive(Debug)]
pub struct LayoutArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    canvas_width: f64,
    canvas_height: f64,
    font_height: f64,
    invalidated: BTreeSet<NodeId>,
}

impl LayoutArena {
    pub fn new(canvas_width: f64, canvas_height: f64, font_height: f64) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            canvas_width,
            canvas_height,
            font_height,
            invalidated: BTreeSet::new(),
        }
    }

    pub fn from_config(config: &GraphConfig) -> Self {
        Self::new(config.canvas_width, config.canvas_height, config.font_height)
    }

    pub fn font_height(&self) -> f64 {
        self.font_height
    }

    pub fn canvas_size(&self) -> (f64, f64) {
        (self.canvas_width, self.canvas_height)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    fn node(&self, id: NodeId) -> Result<&LayoutNode> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or_else(|| GraphError::configuration(format!("unknown layout node {id:?}")))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut LayoutNode> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or_else(|| GraphError::configuration(format!("unknown layout node {id:?}")))
    }

    pub fn add_row(&mut self, geometry: Geometry) -> NodeId {
        self.allocate(NodeKind::Row, geometry, None)
    }

    pub fn add_column(&mut self, geometry: Geometry) -> NodeId {
        self.allocate(NodeKind::Column, geometry, None)
    }

    /// Adds a node positioned relative to `parent`.
    pub fn insert(
        &mut self,
        kind: NodeKind,
        geometry: Geometry,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        if let Some(p) = parent {
            self.check_parent_kind(kind, p)?;
        }
        let id = self.allocate(kind, geometry, parent);
        if let Some(p) = parent {
            self.node_mut(p)?.dependents.push(id);
        }
        Ok(id)
    }

    fn allocate(&mut self, kind: NodeKind, geometry: Geometry, parent: Option<NodeId>) -> NodeId {
        let node = LayoutNode {
            kind,
            geometry,
            parent,
            dependents: Vec::new(),
            cached: Cell::new(None),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index: (self.slots.len() - 1) as u32,
                generation: 0,
            }
        }
    }

    /// Removes a node. Nodes that still have dependents cannot be removed.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        let node = self.node(id)?;
        if !node.dependents.is_empty() {
            return Err(GraphError::configuration(format!(
                "layout node {id:?} still has {} dependents",
                node.dependents.len()
            )));
        }
        let parent = node.parent;
        if let Some(parent) = parent {
            if let Ok(p) = self.node_mut(parent) {
                p.dependents.retain(|d| *d != id);
            }
        }
        let slot = &mut self.slots[id.index as usize];
        slot.node = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.invalidated.remove(&id);
        Ok(())
    }

    pub fn kind(&self, id: NodeId) -> Result<NodeKind> {
        Ok(self.node(id)?.kind)
    }

    pub fn geometry(&self, id: NodeId) -> Result<Geometry> {
        Ok(self.node(id)?.geometry)
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    pub fn dependents(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.node(id)?.dependents)
    }

    pub fn set_geometry(&mut self, id: NodeId, geometry: Geometry) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.geometry == geometry {
            return Ok(());
        }
        node.geometry = geometry;
        self.invalidate(id);
        Ok(())
    }

    fn check_parent_kind(&self, kind: NodeKind, parent: NodeId) -> Result<()> {
        let parent_kind = self.node(parent)?.kind;
        if parent_kind != kind {
            return Err(GraphError::configuration(format!(
                "a {kind:?} cannot be positioned relative to a {parent_kind:?}"
            )));
        }
        Ok(())
    }

    /// Re-parents `id`. Rejects parents whose own chain leads back to `id`.
    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) -> Result<()> {
        let kind = self.node(id)?.kind;
        if let Some(p) = parent {
            self.check_parent_kind(kind, p)?;
            let mut cursor = Some(p);
            let mut steps = 0;
            while let Some(c) = cursor {
                if c == id {
                    warn!(?id, ?parent, "rejecting cyclic layout parent");
                    return Err(GraphError::configuration(format!(
                        "making {p:?} the parent of {id:?} creates a cycle"
                    )));
                }
                steps += 1;
                if steps > self.slots.len() {
                    return Err(GraphError::configuration("layout parent chain does not terminate"));
                }
                cursor = self.node(c)?.parent;
            }
        }

        let old = self.node(id)?.parent;
        if old == parent {
            return Ok(());
        }
        if let Some(old) = old {
            if let Ok(o) = self.node_mut(old) {
                o.dependents.retain(|d| *d != id);
            }
        }
        if let Some(p) = parent {
            self.node_mut(p)?.dependents.push(id);
        }
        self.node_mut(id)?.parent = parent;
        self.invalidate(id);
        Ok(())
    }

    pub fn set_canvas_size(&mut self, width: f64, height: f64) {
        if (width, height) == (self.canvas_width, self.canvas_height) {
            return;
        }
        self.canvas_width = width;
        self.canvas_height = height;
        self.invalidate_all();
    }

    pub fn set_font_height(&mut self, font_height: f64) {
        if font_height == self.font_height {
            return;
        }
        self.font_height = font_height;
        self.invalidate_all();
    }

    fn invalidate_all(&mut self) {
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(node) = &slot.node {
                node.cached.set(None);
                self.invalidated.insert(NodeId {
                    index: index as u32,
                    generation: slot.generation,
                });
            }
        }
    }

    fn invalidate(&mut self, id: NodeId) {
        let mut stack = vec![id];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            if let Ok(node) = self.node(current) {
                node.cached.set(None);
                stack.extend(node.dependents.iter().copied());
            }
            self.invalidated.insert(current);
        }
        debug!(?id, count = seen.len(), "layout invalidated");
    }

    /// Handles whose extent changed since the last call.
    pub fn drain_invalidated(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.invalidated).into_iter().collect()
    }

    fn root_extent(&self, kind: NodeKind) -> Extent {
        match kind {
            NodeKind::Row => Extent::new(0.0, self.canvas_height),
            NodeKind::Column => Extent::new(0.0, self.canvas_width),
        }
    }

    /// Parent chain of `id`, nearest first, including `id` itself.
    fn chain(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut chain = vec![id];
        let mut cursor = self.node(id)?.parent;
        while let Some(p) = cursor {
            if chain.len() > self.slots.len() {
                return Err(GraphError::configuration(format!(
                    "cyclic layout parent chain at {id:?}"
                )));
            }
            chain.push(p);
            cursor = self.node(p)?.parent;
        }
        Ok(chain)
    }

    /// Computes the pixel extent of `id` without touching the cache.
    pub fn resolve(&self, id: NodeId) -> Result<Extent> {
        let chain = self.chain(id)?;
        let root = self.node(*chain.last().unwrap_or(&id))?;
        let mut extent = self.root_extent(root.kind);
        for node_id in chain.iter().rev() {
            extent = self.node(*node_id)?.geometry.resolve(extent, self.font_height);
        }
        Ok(extent)
    }

    /// Cached pixel extent of `id`, recomputed after invalidation.
    pub fn extent(&self, id: NodeId) -> Result<Extent> {
        let node = self.node(id)?;
        if let Some(cached) = node.cached.get() {
            return Ok(cached);
        }
        let chain = self.chain(id)?;

        // Start from the nearest ancestor that still has a cached extent.
        let mut start = chain.len();
        let mut extent = None;
        for (i, node_id) in chain.iter().enumerate().skip(1) {
            if let Some(c) = self.node(*node_id)?.cached.get() {
                start = i;
                extent = Some(c);
                break;
            }
        }
        let mut extent = match extent {
            Some(e) => e,
            None => self.root_extent(node.kind),
        };
        for node_id in chain[..start].iter().rev() {
            let n = self.node(*node_id)?;
            extent = n.geometry.resolve(extent, self.font_height);
            n.cached.set(Some(extent));
        }
        Ok(extent)
    }
}
