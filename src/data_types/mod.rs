pub mod axis;
pub mod dataset;
pub mod plot_configs;

pub use axis::*;
pub use dataset::*;
pub use plot_configs::*;
