//! Weighted partition of a region into adjacent rows (or columns).

use super::arena::{LayoutArena, NodeId, NodeKind};
use super::spec::Geometry;
use crate::config::LevelerConfig;
use crate::error::{GraphError, Result};
use tracing::debug;

/// A boundary drag, in normalized coordinates of the bounding region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Boundary {
    Min(f64),
    Max(f64),
}

#[derive(Clone, Debug, PartialEq)]
struct LevelChild {
    node: NodeId,
    weight: f64,
    min: f64,
    max: f64,
}

/// Lays out children so that they tile the bounding node:
/// `min(i + 1) == max(i) + inter_margin`, first min 0, last max 1.
#[derive(Clone, Debug)]
pub struct Leveler {
    kind: NodeKind,
    bounding: NodeId,
    inter_margin: f64,
    min_child_fraction: f64,
    children: Vec<LevelChild>,
}

impl Leveler {
    pub fn new(arena: &LayoutArena, bounding: NodeId, config: &LevelerConfig) -> Result<Self> {
        if !(0.0..1.0).contains(&config.inter_margin) {
            return Err(GraphError::configuration(format!(
                "inter margin {} must be in [0, 1)",
                config.inter_margin
            )));
        }
        if !(config.min_child_fraction > 0.0 && config.min_child_fraction < 1.0) {
            return Err(GraphError::configuration(format!(
                "minimum child fraction {} must be in (0, 1)",
                config.min_child_fraction
            )));
        }
        Ok(Self {
            kind: arena.kind(bounding)?,
            bounding,
            inter_margin: config.inter_margin,
            min_child_fraction: config.min_child_fraction,
            children: Vec::new(),
        })
    }

    pub fn bounding(&self) -> NodeId {
        self.bounding
    }

    pub fn inter_margin(&self) -> f64 {
        self.inter_margin
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Children in boundary order.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().map(|c| c.node)
    }

    pub fn weight(&self, node: NodeId) -> Option<f64> {
        self.child(node).map(|c| c.weight)
    }

    /// Normalized `(min, max)` of a child within the bounding region.
    pub fn bounds(&self, node: NodeId) -> Option<(f64, f64)> {
        self.child(node).map(|c| (c.min, c.max))
    }

    fn child(&self, node: NodeId) -> Option<&LevelChild> {
        self.children.iter().find(|c| c.node == node)
    }

    fn index_of(&self, node: NodeId) -> Result<usize> {
        self.children
            .iter()
            .position(|c| c.node == node)
            .ok_or_else(|| GraphError::configuration(format!("{node:?} is not managed by this leveler")))
    }

    /// Sum of the weights of the first `index` children.
    pub fn integrate_weight(&self, index: usize) -> f64 {
        self.children.iter().take(index).map(|c| c.weight).sum()
    }

    fn available(&self, count: usize) -> f64 {
        1.0 - count.saturating_sub(1) as f64 * self.inter_margin
    }

    /// Inserts a child before the first child whose centre lies above `position`.
    pub fn add_child(&mut self, arena: &mut LayoutArena, position: f64, weight: f64) -> Result<NodeId> {
        if !(weight.is_finite() && weight > 0.0) {
            return Err(GraphError::configuration(format!(
                "child weight must be positive, got {weight}"
            )));
        }
        let count = self.children.len() + 1;
        if self.available(count) < count as f64 * self.min_child_fraction {
            return Err(GraphError::configuration(format!(
                "no room for {count} children with margin {}",
                self.inter_margin
            )));
        }

        let index = self
            .children
            .iter()
            .position(|c| (c.min + c.max) / 2.0 > position)
            .unwrap_or(self.children.len());
        let node = arena.insert(self.kind, Geometry::normalized(0.0, 1.0), Some(self.bounding))?;
        self.children.insert(
            index,
            LevelChild {
                node,
                weight,
                min: 0.0,
                max: 1.0,
            },
        );
        self.relayout(arena)?;
        debug!(?node, index, weight, "leveler child added");
        Ok(node)
    }

    pub fn remove_child(&mut self, arena: &mut LayoutArena, node: NodeId) -> Result<()> {
        let index = self.index_of(node)?;
        arena.remove(node)?;
        self.children.remove(index);
        self.relayout(arena)
    }

    pub fn set_weight(&mut self, arena: &mut LayoutArena, node: NodeId, weight: f64) -> Result<()> {
        if !(weight.is_finite() && weight > 0.0) {
            return Err(GraphError::configuration(format!(
                "child weight must be positive, got {weight}"
            )));
        }
        let index = self.index_of(node)?;
        self.children[index].weight = weight;
        self.relayout(arena)
    }

    /// Drags one boundary of `node`. Neighbours on the dragged side share the
    /// remaining space in proportion to their weights, then every weight is
    /// reset to its child's new width.
    ///
    /// The position is clamped so that the dragged child and every child on
    /// the dragged side keep at least `min_child_fraction` of width. The
    /// lightest neighbour sets the limit, since space is split by weight.
    pub fn set_child_boundary(
        &mut self,
        arena: &mut LayoutArena,
        node: NodeId,
        boundary: Boundary,
    ) -> Result<()> {
        let i = self.index_of(node)?;
        let n = self.children.len();
        if n <= 1 {
            return Ok(());
        }
        let m = self.inter_margin;
        let min_w = self.min_child_fraction;

        let mut widths: Vec<f64> = self.children.iter().map(|c| c.max - c.min).collect();

        match boundary {
            Boundary::Max(p) => {
                if i == n - 1 {
                    return Ok(());
                }
                let above = (n - 1 - i) as f64;
                let Some(reserve) = Self::reserve(&self.children[i + 1..], min_w) else {
                    return Ok(());
                };
                let lo = self.children[i].min + min_w;
                let hi = 1.0 - above * m - reserve;
                if lo > hi {
                    return Ok(());
                }
                let p = p.clamp(lo, hi);
                widths[i] = p - self.children[i].min;

                let region = 1.0 - (p + m) - (above - 1.0) * m;
                let total: f64 = self.children[i + 1..].iter().map(|c| c.weight).sum();
                // Cumulative share f_j places boundary j at start*(1-f_j) + end*f_j.
                let mut previous = 0.0;
                let mut cumulative = 0.0;
                for j in i + 1..n {
                    cumulative += self.children[j].weight;
                    let f = cumulative / total;
                    widths[j] = (f - previous) * region;
                    previous = f;
                }
            }
            Boundary::Min(p) => {
                if i == 0 {
                    return Ok(());
                }
                let below = i as f64;
                let Some(reserve) = Self::reserve(&self.children[..i], min_w) else {
                    return Ok(());
                };
                let lo = below * m + reserve;
                let hi = self.children[i].max - min_w;
                if lo > hi {
                    return Ok(());
                }
                let p = p.clamp(lo, hi);
                widths[i] = self.children[i].max - p;

                let region = (p - m) - (below - 1.0) * m;
                let total: f64 = self.children[..i].iter().map(|c| c.weight).sum();
                let mut previous = 0.0;
                let mut cumulative = 0.0;
                for j in 0..i {
                    cumulative += self.children[j].weight;
                    let f = cumulative / total;
                    widths[j] = (f - previous) * region;
                    previous = f;
                }
            }
        }

        for (child, width) in self.children.iter_mut().zip(widths) {
            child.weight = width;
        }
        self.relayout(arena)
    }

    /// Space `side` needs so that its lightest child, receiving its weight
    /// share, still gets `min_w`. `None` when the side carries no weight.
    fn reserve(side: &[LevelChild], min_w: f64) -> Option<f64> {
        let total: f64 = side.iter().map(|c| c.weight).sum();
        let lightest = side.iter().map(|c| c.weight).fold(f64::INFINITY, f64::min);
        (total > 0.0 && lightest > 0.0).then(|| min_w * total / lightest)
    }

    /// Recomputes every boundary from the weights and pushes them to the arena.
    fn relayout(&mut self, arena: &mut LayoutArena) -> Result<()> {
        let n = self.children.len();
        if n == 0 {
            return Ok(());
        }
        let total = self.integrate_weight(n);
        if total <= 0.0 {
            return Ok(());
        }
        let available = self.available(n);
        let mut cursor = 0.0;
        let mut cumulative = 0.0;
        for (i, child) in self.children.iter_mut().enumerate() {
            cumulative += child.weight;
            child.min = cursor;
            child.max = if i == n - 1 {
                1.0
            } else {
                cumulative / total * available + i as f64 * self.inter_margin
            };
            cursor = child.max + self.inter_margin;
        }
        for child in &self.children {
            arena.set_geometry(child.node, Geometry::normalized(child.min, child.max))?;
        }
        Ok(())
    }
}
