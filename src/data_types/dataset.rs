use crate::error::{GraphError, Result};
use crate::units::Units;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read-only access to a rectangular dataset addressed by multi-index.
pub trait DataSet: Send + Sync + std::fmt::Debug {
    fn rank(&self) -> usize;

    fn length(&self, axis: usize) -> usize;

    /// Scalar at `index`; `index.len()` must equal `rank()`.
    fn value(&self, index: &[usize]) -> f64;

    fn units(&self) -> Units {
        Units::DIMENSIONLESS
    }

    /// Tags describing `axis` (das2 `DEPEND_n`), if any.
    fn depend(&self, _axis: usize) -> Option<&dyn DataSet> {
        None
    }

    fn property(&self, _name: &str) -> Option<&serde_json::Value> {
        None
    }

    fn shape(&self) -> Vec<usize> {
        (0..self.rank()).map(|axis| self.length(axis)).collect()
    }
}

/// Row-major, in-memory dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DenseDataSet {
    shape: Vec<usize>,
    values: Vec<f64>,
    #[serde(default)]
    units: Units,
    #[serde(default)]
    depends: Vec<Option<DenseDataSet>>,
    #[serde(default)]
    properties: BTreeMap<String, serde_json::Value>,
}

impl DenseDataSet {
    pub fn new(shape: Vec<usize>, values: Vec<f64>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if shape.is_empty() || expected != values.len() {
            return Err(GraphError::configuration(format!(
                "shape {:?} needs {} values, got {}",
                shape,
                expected,
                values.len()
            )));
        }
        Ok(Self {
            depends: vec![None; shape.len()],
            shape,
            values,
            units: Units::DIMENSIONLESS,
            properties: BTreeMap::new(),
        })
    }

    pub fn rank1(values: Vec<f64>) -> Self {
        Self {
            shape: vec![values.len()],
            values,
            units: Units::DIMENSIONLESS,
            depends: vec![None],
            properties: BTreeMap::new(),
        }
    }

    /// Builds a dataset by evaluating `f` at every multi-index.
    pub fn from_fn(shape: Vec<usize>, f: impl Fn(&[usize]) -> f64) -> Self {
        let len: usize = shape.iter().product();
        let mut values = Vec::with_capacity(len);
        let mut index = vec![0; shape.len()];
        for _ in 0..len {
            values.push(f(&index));
            for axis in (0..shape.len()).rev() {
                index[axis] += 1;
                if index[axis] < shape[axis] {
                    break;
                }
                index[axis] = 0;
            }
        }
        Self {
            depends: vec![None; shape.len()],
            shape,
            values,
            units: Units::DIMENSIONLESS,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    /// Attaches rank-1 tags to `axis`.
    pub fn with_depend(mut self, axis: usize, tags: DenseDataSet) -> Result<Self> {
        if axis >= self.shape.len() {
            return Err(GraphError::configuration(format!(
                "no axis {} in rank {} dataset",
                axis,
                self.shape.len()
            )));
        }
        if tags.shape.len() != 1 || tags.shape[0] != self.shape[axis] {
            return Err(GraphError::configuration(format!(
                "tags for axis {} must be rank 1 with length {}, got shape {:?}",
                axis, self.shape[axis], tags.shape
            )));
        }
        self.depends[axis] = Some(tags);
        Ok(self)
    }

    pub fn with_property(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn flat_index(&self, index: &[usize]) -> usize {
        debug_assert_eq!(index.len(), self.shape.len());
        index
            .iter()
            .zip(&self.shape)
            .fold(0, |acc, (&i, &n)| acc * n + i)
    }
}

impl DataSet for DenseDataSet {
    fn rank(&self) -> usize {
        self.shape.len()
    }

    fn length(&self, axis: usize) -> usize {
        self.shape.get(axis).copied().unwrap_or(0)
    }

    fn value(&self, index: &[usize]) -> f64 {
        self.values[self.flat_index(index)]
    }

    fn units(&self) -> Units {
        self.units
    }

    fn depend(&self, axis: usize) -> Option<&dyn DataSet> {
        self.depends
            .get(axis)
            .and_then(|d| d.as_ref())
            .map(|d| d as &dyn DataSet)
    }

    fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties.get(name)
    }

    fn shape(&self) -> Vec<usize> {
        self.shape.clone()
    }
}

/// Copies rank-1 tags into a vector.
pub fn tags_to_vec(tags: &dyn DataSet) -> Vec<f64> {
    (0..tags.length(0)).map(|i| tags.value(&[i])).collect()
}
