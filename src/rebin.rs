//! Resampling onto pixel-aligned bins.

use crate::data_types::DataSet;
use crate::error::{GraphError, Result};
use crate::transform::AxisTransform;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// `n_bins` equal-width bins over `[min, max)`, in log space when `log`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RebinDescriptor {
    pub min: f64,
    pub max: f64,
    pub n_bins: usize,
    pub log: bool,
}

impl RebinDescriptor {
    pub fn new(min: f64, max: f64, n_bins: usize, log: bool) -> Result<Self> {
        if n_bins == 0 || !(min < max) || (log && min <= 0.0) {
            return Err(GraphError::configuration(format!(
                "bad rebin geometry: {n_bins} bins over [{min}, {max}] (log: {log})"
            )));
        }
        Ok(Self {
            min,
            max,
            n_bins,
            log,
        })
    }

    /// One bin per device pixel covered by `transform`.
    pub fn from_transform(transform: &AxisTransform) -> Result<Self> {
        let (p0, p1) = transform.pixel_bounds();
        let n_bins = (p1 - p0).ceil().max(1.0) as usize;
        let (a, b) = (transform.to_data(p0), transform.to_data(p1));
        Self::new(a.min(b), a.max(b), n_bins, transform.scale().is_log())
    }

    fn to_space(&self, value: f64) -> f64 {
        if self.log {
            value.log10()
        } else {
            value
        }
    }

    pub fn bin_of(&self, value: f64) -> Option<usize> {
        if !value.is_finite() || (self.log && value <= 0.0) {
            return None;
        }
        let (lo, hi) = (self.to_space(self.min), self.to_space(self.max));
        let f = (self.to_space(value) - lo) / (hi - lo);
        if !(0.0..1.0).contains(&f) {
            return None;
        }
        Some(((f * self.n_bins as f64) as usize).min(self.n_bins - 1))
    }

    pub fn bin_center(&self, bin: usize) -> f64 {
        let (lo, hi) = (self.to_space(self.min), self.to_space(self.max));
        let c = lo + (bin as f64 + 0.5) * (hi - lo) / self.n_bins as f64;
        if self.log {
            10f64.powf(c)
        } else {
            c
        }
    }
}

/// Averaged table: `values[ix * ny + iy]`, NaN where no data landed.
#[derive(Clone, Debug, PartialEq)]
pub struct RebinnedTable {
    pub nx: usize,
    pub ny: usize,
    pub values: Vec<f64>,
    pub weights: Vec<f64>,
}

impl RebinnedTable {
    pub fn value(&self, ix: usize, iy: usize) -> f64 {
        self.values[ix * self.ny + iy]
    }
}

/// Averages a rank-2 table (`table[i, j]` at `x_tags[i]`, `y_tags[j]`) into
/// the bins described by `ddx` and `ddy`. NaN samples are ignored.
pub fn average_table(
    table: &dyn DataSet,
    x_tags: &[f64],
    y_tags: &[f64],
    ddx: &RebinDescriptor,
    ddy: &RebinDescriptor,
) -> Result<RebinnedTable> {
    if table.rank() != 2 || table.length(0) != x_tags.len() || table.length(1) != y_tags.len() {
        return Err(GraphError::configuration(format!(
            "table of shape {:?} does not match {} x tags and {} y tags",
            table.shape(),
            x_tags.len(),
            y_tags.len()
        )));
    }
    let (nx, ny) = (ddx.n_bins, ddy.n_bins);
    let y_bins: Vec<Option<usize>> = y_tags.iter().map(|y| ddy.bin_of(*y)).collect();

    let (sums, weights) = (0..x_tags.len())
        .into_par_iter()
        .fold(
            || (vec![0.0; nx * ny], vec![0.0; nx * ny]),
            |(mut sums, mut weights), i| {
                if let Some(ix) = ddx.bin_of(x_tags[i]) {
                    for (j, iy) in y_bins.iter().enumerate() {
                        let Some(iy) = *iy else { continue };
                        let z = table.value(&[i, j]);
                        if z.is_nan() {
                            continue;
                        }
                        sums[ix * ny + iy] += z;
                        weights[ix * ny + iy] += 1.0;
                    }
                }
                (sums, weights)
            },
        )
        .reduce(
            || (vec![0.0; nx * ny], vec![0.0; nx * ny]),
            |(mut s1, mut w1), (s2, w2)| {
                for (a, b) in s1.iter_mut().zip(s2) {
                    *a += b;
                }
                for (a, b) in w1.iter_mut().zip(w2) {
                    *a += b;
                }
                (s1, w1)
            },
        );

    let values = sums
        .par_iter()
        .zip(weights.par_iter())
        .map(|(s, w)| if *w > 0.0 { s / w } else { f64::NAN })
        .collect();

    Ok(RebinnedTable {
        nx,
        ny,
        values,
        weights,
    })
}

/// Keeps the minimum and maximum sample of every bin, in x order.
pub fn min_max_series(x: &[f64], y: &[f64], ddx: &RebinDescriptor) -> Vec<(f64, f64)> {
    let mut bins: Vec<Option<((f64, f64), (f64, f64))>> = vec![None; ddx.n_bins];
    for (&xv, &yv) in x.iter().zip(y) {
        if yv.is_nan() {
            continue;
        }
        let Some(bin) = ddx.bin_of(xv) else { continue };
        let entry = bins[bin].get_or_insert(((xv, yv), (xv, yv)));
        if yv < entry.0 .1 {
            entry.0 = (xv, yv);
        }
        if yv > entry.1 .1 {
            entry.1 = (xv, yv);
        }
    }

    let mut out = Vec::with_capacity(ddx.n_bins * 2);
    for (lo, hi) in bins.into_iter().flatten() {
        if lo == hi {
            out.push(lo);
        } else if lo.0 <= hi.0 {
            out.push(lo);
            out.push(hi);
        } else {
            out.push(hi);
            out.push(lo);
        }
    }
    out
}
