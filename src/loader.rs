//! Request/response protocol between a renderer pipeline and its data source.
//!
//! Each [`DataLoader`] tracks at most one request. Work runs on the rayon
//! pool and reports back over a channel, tagged with the request id it was
//! issued for; anything that does not match the tracked id is stale and is
//! dropped without reaching the renderer.

use crate::cache::{CacheTag, DataSetCache};
use crate::config::LoaderConfig;
use crate::data_types::{AxisMemento, DataSet};
use crate::error::{GraphError, TransientDataError};
use crossbeam::channel::{self, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

/// Cooperative cancellation handle shared between the loader and a worker.
#[derive(Clone, Debug, Default)]
pub struct ProgressMonitor {
    cancelled: Arc<AtomicBool>,
}

impl ProgressMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once cancelled; data sources call this between chunks.
    pub fn check(&self) -> eyre::Result<()> {
        if self.is_cancelled() {
            Err(TransientDataError::Cancelled.into())
        } else {
            Ok(())
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoadRequest {
    pub id: RequestId,
    pub axis: AxisMemento,
    /// Data units per pixel, `None` for intrinsic resolution.
    pub resolution: Option<f64>,
}

impl LoadRequest {
    pub fn range(&self) -> (f64, f64) {
        (self.axis.min, self.axis.max)
    }

    pub fn cache_tag(&self, descriptor: &str) -> CacheTag {
        CacheTag::new(descriptor, self.range(), self.resolution)
    }
}

/// Something that can produce a dataset for an axis interval.
pub trait DataSource: Send + Sync {
    /// Stable identifier used as the cache key prefix.
    fn descriptor(&self) -> &str;

    /// Blocking load, run on a worker thread. Should poll `monitor`.
    fn load(&self, request: &LoadRequest, monitor: &ProgressMonitor)
        -> eyre::Result<Arc<dyn DataSet>>;
}

#[derive(Debug)]
struct LoadResponse {
    id: RequestId,
    result: eyre::Result<Arc<dyn DataSet>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoaderState {
    Idle,
    RequestPending(RequestId),
    Fulfilled(RequestId),
    Cancelled(RequestId),
    Failed(RequestId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateAction {
    /// Axis state unchanged, nothing issued.
    Unchanged,
    Issued {
        id: RequestId,
        cancelled: Option<RequestId>,
    },
}

#[derive(Debug)]
pub enum LoaderEvent {
    Loaded {
        id: RequestId,
        dataset: Arc<dyn DataSet>,
    },
    Failed {
        id: RequestId,
        error: GraphError,
    },
}

#[derive(Debug)]
struct Tracked {
    request: LoadRequest,
    monitor: ProgressMonitor,
}

pub struct DataLoader {
    source: Arc<dyn DataSource>,
    cache: Option<Arc<DataSetCache>>,
    full_resolution: bool,
    tx: Sender<LoadResponse>,
    rx: Receiver<LoadResponse>,
    next_id: u64,
    current: Option<Tracked>,
    state: LoaderState,
    issued: u64,
    discarded: u64,
}

impl std::fmt::Debug for DataLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataLoader")
            .field("descriptor", &self.source.descriptor())
            .field("state", &self.state)
            .field("issued", &self.issued)
            .field("discarded", &self.discarded)
            .finish()
    }
}

impl DataLoader {
    pub fn new(
        source: Arc<dyn DataSource>,
        config: &LoaderConfig,
        cache: Option<Arc<DataSetCache>>,
    ) -> Self {
        let (tx, rx) = channel::unbounded();
        Self {
            source,
            cache: cache.filter(|_| config.use_cache),
            full_resolution: config.full_resolution,
            tx,
            rx,
            next_id: 0,
            current: None,
            state: LoaderState::Idle,
            issued: 0,
            discarded: 0,
        }
    }

    pub fn state(&self) -> LoaderState {
        self.state
    }

    pub fn current_request(&self) -> Option<&LoadRequest> {
        self.current.as_ref().map(|t| &t.request)
    }

    pub fn requests_issued(&self) -> u64 {
        self.issued
    }

    /// Responses dropped because they belonged to superseded requests.
    pub fn responses_discarded(&self) -> u64 {
        self.discarded
    }

    pub fn set_full_resolution(&mut self, full: bool) {
        self.full_resolution = full;
    }

    /// Issues a request for `axis` unless the tracked one already matches.
    /// A pending request for different axis state is cancelled first.
    pub fn update(&mut self, axis: &AxisMemento) -> UpdateAction {
        if let Some(tracked) = &self.current {
            if &tracked.request.axis == axis {
                return UpdateAction::Unchanged;
            }
        }

        let cancelled = self.cancel_pending();

        let id = RequestId(self.next_id);
        self.next_id += 1;
        let request = LoadRequest {
            id,
            axis: axis.clone(),
            resolution: if self.full_resolution {
                None
            } else {
                axis.resolution()
            },
        };
        let monitor = ProgressMonitor::new();
        self.dispatch(&request, &monitor);
        self.current = Some(Tracked { request, monitor });
        self.state = LoaderState::RequestPending(id);
        self.issued += 1;
        UpdateAction::Issued { id, cancelled }
    }

    /// Cancels the pending request and forgets the tracked axis state, so the
    /// next `update` issues a request even for identical axes.
    pub fn reset(&mut self) {
        self.cancel_pending();
        self.current = None;
        self.state = LoaderState::Idle;
    }

    fn cancel_pending(&mut self) -> Option<RequestId> {
        match (self.state, &self.current) {
            (LoaderState::RequestPending(id), Some(tracked)) => {
                tracked.monitor.cancel();
                info!(?id, descriptor = self.source.descriptor(), "request cancelled");
                Some(id)
            }
            _ => None,
        }
    }

    fn dispatch(&self, request: &LoadRequest, monitor: &ProgressMonitor) {
        let tag = request.cache_tag(self.source.descriptor());
        if let Some(cache) = &self.cache {
            if let Some(dataset) = cache.retrieve(&tag) {
                let _ = self.tx.send(LoadResponse {
                    id: request.id,
                    result: Ok(dataset),
                });
                return;
            }
        }

        debug!(id = ?request.id, range = ?request.range(), resolution = ?request.resolution, "request issued");
        let source = self.source.clone();
        let cache = self.cache.clone();
        let tx = self.tx.clone();
        let request = request.clone();
        let monitor = monitor.clone();
        rayon::spawn(move || {
            let result = monitor.check().and_then(|_| source.load(&request, &monitor));
            if let (Ok(dataset), Some(cache)) = (&result, &cache) {
                if !monitor.is_cancelled() {
                    cache.store(tag, dataset.clone());
                }
            }
            // The loader may be gone already; nobody is waiting then.
            let _ = tx.send(LoadResponse {
                id: request.id,
                result,
            });
        });
    }

    /// Drains finished work without blocking. Returns the outcome of the
    /// tracked request if it arrived.
    pub fn poll(&mut self) -> Option<LoaderEvent> {
        let mut latest = None;
        while let Ok(response) = self.rx.try_recv() {
            if let Some(event) = self.accept(response) {
                latest = Some(event);
            }
        }
        latest
    }

    /// Blocks until the tracked request resolves or `timeout` elapses.
    pub fn wait(&mut self, timeout: Duration) -> Option<LoaderEvent> {
        let deadline = Instant::now() + timeout;
        loop {
            if !matches!(self.state, LoaderState::RequestPending(_)) {
                return None;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            let response = self.rx.recv_timeout(remaining).ok()?;
            if let Some(event) = self.accept(response) {
                return Some(event);
            }
        }
    }

    fn accept(&mut self, response: LoadResponse) -> Option<LoaderEvent> {
        let tracked_id = self.current.as_ref().map(|t| t.request.id);
        if tracked_id != Some(response.id) || self.state != LoaderState::RequestPending(response.id) {
            self.discarded += 1;
            debug!(id = ?response.id, tracked = ?tracked_id, "discarding stale response");
            return None;
        }

        let id = response.id;
        match response.result {
            Ok(dataset) => {
                self.state = LoaderState::Fulfilled(id);
                debug!(?id, "request fulfilled");
                Some(LoaderEvent::Loaded { id, dataset })
            }
            Err(report) => {
                let error = GraphError::from_report(report);
                self.state = match &error {
                    GraphError::TransientData(TransientDataError::Cancelled) => {
                        LoaderState::Cancelled(id)
                    }
                    _ => LoaderState::Failed(id),
                };
                debug!(?id, %error, "request failed");
                Some(LoaderEvent::Failed { id, error })
            }
        }
    }
}
