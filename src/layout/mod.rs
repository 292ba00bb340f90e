//! Row/column layout: position algebra, the node arena and the leveler.

pub mod arena;
pub mod leveler;
pub mod spec;

pub use arena::{LayoutArena, NodeId, NodeKind};
pub use leveler::{Boundary, Leveler};
pub use spec::{parse_range, Extent, Geometry, PositionSpec};
