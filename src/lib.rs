//! das2_graph: layout algebra, data reduction and the renderer pipeline
//! behind das2 scientific plots.

pub mod cache;
pub mod canvas;
pub mod collapse;
pub mod config;
pub mod data_types;
pub mod error;
pub mod layout;
pub mod loader;
pub mod rebin;
pub mod renderer;
pub mod rendering;
pub mod scales;
pub mod tick_master;
pub mod transform;
pub mod units;
pub mod utils;

pub use cache::{CacheTag, DataSetCache};
pub use canvas::{Canvas, ElementId, PlotElement};
pub use collapse::CollapseEngine;
pub use config::GraphConfig;
pub use data_types::{AxisMemento, DasAxis, DataSet, DenseDataSet, Orientation};
pub use error::{GraphError, Result, TransientDataError};
pub use layout::{Geometry, LayoutArena, Leveler, NodeId, NodeKind, PositionSpec};
pub use loader::{DataLoader, DataSource, LoadRequest, ProgressMonitor};
pub use renderer::{HasSelectionArea, RenderPipeline, Renderer, SeriesRenderer, SpectrogramRenderer};
pub use rendering::{DisplayList, Painter, Rect};
pub use units::Units;
