//! Dataset cache shared by every loader of a canvas.

use crate::data_types::DataSet;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Data range plus resolution for one descriptor. `resolution: None` means
/// intrinsic (full) resolution, which is finer than any rebinned resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheTag {
    pub descriptor: String,
    pub start: f64,
    pub end: f64,
    pub resolution: Option<f64>,
}

impl CacheTag {
    pub fn new(descriptor: impl Into<String>, range: (f64, f64), resolution: Option<f64>) -> Self {
        Self {
            descriptor: descriptor.into(),
            start: range.0,
            end: range.1,
            resolution,
        }
    }

    /// Data stored under `self` can serve a request for `other`.
    pub fn contains(&self, other: &CacheTag) -> bool {
        let finer = match (self.resolution, other.resolution) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(mine), Some(theirs)) => mine <= theirs,
        };
        self.descriptor == other.descriptor
            && self.start <= other.start
            && self.end >= other.end
            && finer
    }
}

#[derive(Debug, Default)]
pub struct DataSetCache {
    entries: RwLock<HashMap<String, Vec<(CacheTag, Arc<dyn DataSet>)>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl DataSetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn have_stored(&self, tag: &CacheTag) -> bool {
        self.entries
            .read()
            .get(&tag.descriptor)
            .is_some_and(|list| list.iter().any(|(stored, _)| stored.contains(tag)))
    }

    pub fn retrieve(&self, tag: &CacheTag) -> Option<Arc<dyn DataSet>> {
        let found = self.entries.read().get(&tag.descriptor).and_then(|list| {
            list.iter()
                .find(|(stored, _)| stored.contains(tag))
                .map(|(_, ds)| ds.clone())
        });
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(descriptor = %tag.descriptor, "cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Inserts unless an entry already covers `tag`; returns the dataset
    /// that ends up cached for it.
    pub fn store(&self, tag: CacheTag, dataset: Arc<dyn DataSet>) -> Arc<dyn DataSet> {
        let mut entries = self.entries.write();
        let list = entries.entry(tag.descriptor.clone()).or_default();
        if let Some((_, existing)) = list.iter().find(|(stored, _)| stored.contains(&tag)) {
            return existing.clone();
        }
        debug!(descriptor = %tag.descriptor, start = tag.start, end = tag.end, "cache store");
        list.push((tag, dataset.clone()));
        dataset
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.read().values().map(Vec::len).sum(),
        }
    }
}
