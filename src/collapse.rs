//! Sliding-window mean reduction of one dataset axis (spectrogram collapse).
//!
//! The reduced dataset holds, for every remaining coordinate, the mean of the
//! source over the inclusive window `[min, max]` of the reduction axis. When
//! the window moves and the old and new windows overlap, the running mean is
//! updated one edge element at a time instead of being summed again.

use crate::config::CollapseConfig;
use crate::data_types::{tags_to_vec, DataSet, DenseDataSet};
use crate::error::{GraphError, Result};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recompute {
    Unchanged,
    Full,
    Incremental,
}

#[derive(Debug)]
pub struct CollapseEngine {
    source: Arc<dyn DataSet>,
    axis: usize,
    shape: Vec<usize>,
    window: Option<(usize, usize)>,
    reduced: DenseDataSet,
    refresh_interval: usize,
    incremental_runs: usize,
    last: Recompute,
    dirty: bool,
}

impl CollapseEngine {
    /// `axis` must be one of the first three axes of a rank >= 2 source.
    pub fn new(source: Arc<dyn DataSet>, axis: usize, config: &CollapseConfig) -> Result<Self> {
        let reduced = Self::template(source.as_ref(), axis)?;
        Ok(Self {
            shape: source.shape(),
            source,
            axis,
            window: None,
            reduced,
            refresh_interval: config.refresh_interval.max(1),
            incremental_runs: 0,
            last: Recompute::Unchanged,
            dirty: true,
        })
    }

    fn template(source: &dyn DataSet, axis: usize) -> Result<DenseDataSet> {
        let rank = source.rank();
        if rank < 2 {
            return Err(GraphError::configuration(format!(
                "collapse needs a rank 2 or higher dataset, got rank {rank}"
            )));
        }
        if axis >= rank.min(3) {
            return Err(GraphError::configuration(format!(
                "cannot collapse axis {axis} of a rank {rank} dataset"
            )));
        }
        let shape = source.shape();
        if shape[axis] == 0 {
            return Err(GraphError::configuration("cannot collapse an empty axis"));
        }
        let out_shape: Vec<usize> = shape
            .iter()
            .enumerate()
            .filter(|(a, _)| *a != axis)
            .map(|(_, n)| *n)
            .collect();
        let len = out_shape.iter().product();
        let mut reduced = DenseDataSet::new(out_shape, vec![f64::NAN; len])?.with_units(source.units());
        for (out_axis, src_axis) in (0..rank).filter(|a| *a != axis).enumerate() {
            if let Some(tags) = source.depend(src_axis) {
                reduced = reduced.with_depend(out_axis, DenseDataSet::rank1(tags_to_vec(tags)))?;
            }
        }
        Ok(reduced)
    }

    /// Replaces the source wholesale; the next `set_window` recomputes fully.
    pub fn set_source(&mut self, source: Arc<dyn DataSet>) -> Result<()> {
        self.reduced = Self::template(source.as_ref(), self.axis)?;
        self.shape = source.shape();
        self.source = source;
        self.window = None;
        self.incremental_runs = 0;
        self.dirty = true;
        Ok(())
    }

    pub fn source(&self) -> &Arc<dyn DataSet> {
        &self.source
    }

    pub fn axis(&self) -> usize {
        self.axis
    }

    pub fn axis_length(&self) -> usize {
        self.shape[self.axis]
    }

    pub fn window(&self) -> Option<(usize, usize)> {
        self.window
    }

    /// How the last `set_window` call produced its result.
    pub fn last_recompute(&self) -> Recompute {
        self.last
    }

    pub fn reduced(&self) -> Option<&DenseDataSet> {
        self.window.map(|_| &self.reduced)
    }

    /// Tag values spanned by the current window, when the axis has tags.
    pub fn window_range(&self) -> Option<(f64, f64)> {
        let (min, max) = self.window?;
        let tags = self.source.depend(self.axis)?;
        Some((tags.value(&[min]), tags.value(&[max])))
    }

    /// Returns and clears the "reduced data changed" flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn set_window(&mut self, min: usize, max: usize) -> Result<&DenseDataSet> {
        let len = self.axis_length();
        if max < min || max >= len {
            return Err(GraphError::InvalidWindow { min, max, len });
        }
        let new = (min, max);

        let mode = match self.window {
            Some(prev) if prev == new => Recompute::Unchanged,
            Some(prev) if min != max && self.can_slide(prev, new) => Recompute::Incremental,
            _ => Recompute::Full,
        };

        match mode {
            Recompute::Unchanged => {}
            Recompute::Full => {
                self.recompute_full(new);
                self.incremental_runs = 0;
            }
            Recompute::Incremental => {
                // `can_slide` only returns true when a previous window exists.
                let prev = self.window.unwrap_or(new);
                self.recompute_incremental(prev, new);
                self.incremental_runs += 1;
            }
        }
        if mode != Recompute::Unchanged {
            debug!(?mode, min, max, axis = self.axis, "collapse window updated");
            self.dirty = true;
        }
        self.last = mode;
        self.window = Some(new);
        Ok(&self.reduced)
    }

    fn can_slide(&self, (pmin, pmax): (usize, usize), (nmin, nmax): (usize, usize)) -> bool {
        let overlap =
            (nmax as i64 - pmin as i64) * (pmax as i64 - nmin as i64) > 0;
        let edge_work = pmin.abs_diff(nmin) + pmax.abs_diff(nmax);
        overlap
            && edge_work < nmax - nmin + 1
            && self.incremental_runs < self.refresh_interval
    }

    fn recompute_full(&mut self, (min, max): (usize, usize)) {
        let source = self.source.as_ref();
        let (shape, axis) = (&self.shape, self.axis);
        let count = (max - min + 1) as f64;
        self.reduced
            .values_mut()
            .par_iter_mut()
            .enumerate()
            .for_each_init(
                || vec![0usize; shape.len()],
                |index, (outer, slot)| {
                    decode_outer(outer, shape, axis, index);
                    if min == max {
                        index[axis] = min;
                        *slot = source.value(index);
                        return;
                    }
                    let mut sum = 0.0;
                    for k in min..=max {
                        index[axis] = k;
                        sum += source.value(index);
                    }
                    *slot = sum / count;
                },
            );
    }

    fn recompute_incremental(&mut self, prev: (usize, usize), new: (usize, usize)) {
        let source = self.source.as_ref();
        let (shape, axis) = (&self.shape, self.axis);
        self.reduced
            .values_mut()
            .par_iter_mut()
            .enumerate()
            .for_each_init(
                || vec![0usize; shape.len()],
                |index, (outer, slot)| {
                    decode_outer(outer, shape, axis, index);
                    *slot = slide_mean(*slot, prev, new, |k| {
                        index[axis] = k;
                        source.value(index)
                    });
                },
            );
    }
}

/// Writes the source index of output coordinate `outer` into `index`,
/// leaving the slot for `axis` to the caller.
fn decode_outer(mut outer: usize, shape: &[usize], axis: usize, index: &mut [usize]) {
    for a in (0..shape.len()).rev() {
        if a == axis {
            continue;
        }
        index[a] = outer % shape[a];
        outer /= shape[a];
    }
}

/// Moves a running mean from window `prev` to the overlapping window `new`.
/// The left edge is adjusted first, then the right edge against the new
/// left bound. `count` is always the number of elements currently averaged.
pub fn slide_mean(
    mean: f64,
    (pmin, pmax): (usize, usize),
    (nmin, nmax): (usize, usize),
    mut at: impl FnMut(usize) -> f64,
) -> f64 {
    let mut mean = mean;

    if pmin > nmin {
        for k in (nmin..pmin).rev() {
            let count = (pmax - k) as f64;
            mean = (at(k) + count * mean) / (count + 1.0);
        }
    } else if pmin < nmin {
        for k in pmin..nmin {
            let count = (pmax - k + 1) as f64;
            mean = (count * mean - at(k)) / (count - 1.0);
        }
    }

    if pmax < nmax {
        for k in pmax + 1..=nmax {
            let count = (k - nmin) as f64;
            mean = (at(k) + count * mean) / (count + 1.0);
        }
    } else if pmax > nmax {
        for k in (nmax + 1..=pmax).rev() {
            let count = (k - nmin + 1) as f64;
            mean = (count * mean - at(k)) / (count - 1.0);
        }
    }

    mean
}
