//! Shared tick density for axes that are drawn together.
//!
//! Stacked panels should label their x axes with the same number of ticks,
//! so the count is decided once for every registered axis: the shortest axis
//! limits how many labels fit.

use crate::config::TickConfig;
use crate::scales::ChartScale;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickKey(u64);

#[derive(Debug)]
pub struct TickCoordinator {
    config: TickConfig,
    axes: RwLock<HashMap<TickKey, f64>>,
    next: AtomicU64,
}

impl TickCoordinator {
    pub fn new(config: TickConfig) -> Self {
        Self {
            config,
            axes: RwLock::new(HashMap::new()),
            next: AtomicU64::new(0),
        }
    }

    pub fn register(&self, pixel_length: f64) -> TickKey {
        let key = TickKey(self.next.fetch_add(1, Ordering::Relaxed));
        self.axes.write().insert(key, pixel_length);
        key
    }

    pub fn update_length(&self, key: TickKey, pixel_length: f64) {
        if let Some(length) = self.axes.write().get_mut(&key) {
            *length = pixel_length;
        }
    }

    pub fn unregister(&self, key: TickKey) {
        self.axes.write().remove(&key);
    }

    pub fn len(&self) -> usize {
        self.axes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.read().is_empty()
    }

    /// Ticks every registered axis should aim for.
    pub fn tick_count(&self) -> usize {
        let max = self.config.max_ticks.max(2);
        let shortest = self
            .axes
            .read()
            .values()
            .copied()
            .fold(f64::INFINITY, f64::min);
        if !shortest.is_finite() || self.config.min_spacing_px <= 0.0 {
            return max;
        }
        ((shortest / self.config.min_spacing_px).floor() as usize).clamp(2, max)
    }

    pub fn ticks(&self, scale: &ChartScale) -> Vec<f64> {
        scale.ticks(self.tick_count())
    }
}

impl Default for TickCoordinator {
    fn default() -> Self {
        Self::new(TickConfig::default())
    }
}
