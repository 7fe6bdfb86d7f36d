//! Field samples on the mesh
//!
//! Every diagnostic works on one canonical representation, [`Field`]: an
//! owned `ArrayD<f64>` whose axes are tagged with [`Dim`] and ordered
//! `time, depth, node`. Missing values are `NaN`.
//!
//! [`DataArray`] is the labeled form handed out by the data accessor. Its
//! values are loaded on first access. Raw `ndarray` arrays are accepted too;
//! their axes are inferred from the number of dimensions. The [`AsField`]
//! trait turns any of these into a private [`Field`] copy, so diagnostics
//! never touch the caller's array.

use crate::errors::{FesomError, Result};
use crate::mesh::Mesh;
use ndarray::{Array, ArrayD, Axis, Dimension, IxDyn};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Named axis of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dim {
    Time,
    Depth,
    Node,
}

impl Dim {
    /// Map a NetCDF dimension name onto a field axis
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "time" | "t" => Some(Self::Time),
            "nz1" | "nz" | "nz_1" | "depth" | "level" => Some(Self::Depth),
            "nod2" | "nod2d" | "nod_n" | "node" | "nodes" => Some(Self::Node),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Depth => "depth",
            Self::Node => "node",
        }
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical numeric field with explicit dimension metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    values: ArrayD<f64>,
    dims: Vec<Dim>,
    time: Option<Vec<f64>>,
}

impl Field {
    /// Wrap `values` whose axes are `dims`, in that order
    ///
    /// # Errors
    ///
    /// Fails when the number of dims does not match the array or a dim repeats.
    pub fn new(values: ArrayD<f64>, dims: Vec<Dim>) -> Result<Self> {
        if values.ndim() != dims.len() {
            return Err(FesomError::dimensionality(
                "field",
                format!(
                    "{} dimension names for an array with {} dimensions",
                    dims.len(),
                    values.ndim()
                ),
            ));
        }
        let mut sorted = dims.clone();
        sorted.sort();
        sorted.dedup();
        if sorted.len() != dims.len() {
            return Err(FesomError::dimensionality(
                "field",
                format!("repeated dimension in {}", describe_dims(&dims)),
            ));
        }
        Ok(Self {
            values,
            dims,
            time: None,
        })
    }

    /// Attach time coordinate values
    ///
    /// # Errors
    ///
    /// Fails when the field has no time axis or the lengths differ.
    pub fn with_time(mut self, time: Vec<f64>) -> Result<Self> {
        let ntime = self
            .len_of(Dim::Time)
            .ok_or_else(|| FesomError::dimensionality("field", "time values without a time axis"))?;
        if ntime != time.len() {
            return Err(FesomError::shape("time coordinate", ntime, time.len()));
        }
        self.time = Some(time);
        Ok(self)
    }

    pub fn values(&self) -> &ArrayD<f64> {
        &self.values
    }

    pub fn into_values(self) -> ArrayD<f64> {
        self.values
    }

    pub fn dims(&self) -> &[Dim] {
        &self.dims
    }

    pub fn time(&self) -> Option<&[f64]> {
        self.time.as_deref()
    }

    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    pub fn axis(&self, dim: Dim) -> Option<usize> {
        self.dims.iter().position(|&d| d == dim)
    }

    pub fn has(&self, dim: Dim) -> bool {
        self.axis(dim).is_some()
    }

    pub fn len_of(&self, dim: Dim) -> Option<usize> {
        self.axis(dim).map(|axis| self.values.len_of(Axis(axis)))
    }

    /// Reorder the axes to `time, depth, node`
    #[must_use]
    pub fn canonical(self) -> Self {
        let mut order: Vec<usize> = (0..self.dims.len()).collect();
        order.sort_by_key(|&i| self.dims[i]);
        if order.iter().enumerate().all(|(i, &o)| i == o) {
            return self;
        }
        let dims = order.iter().map(|&i| self.dims[i]).collect();
        let values = self
            .values
            .permuted_axes(IxDyn(&order))
            .as_standard_layout()
            .into_owned();
        Self {
            values,
            dims,
            time: self.time,
        }
    }

    /// Add a leading time axis of length one when the field has none
    #[must_use]
    pub fn with_time_axis(self) -> Self {
        if self.has(Dim::Time) {
            return self;
        }
        let mut dims = Vec::with_capacity(self.dims.len() + 1);
        dims.push(Dim::Time);
        dims.extend_from_slice(&self.dims);
        Self {
            values: self.values.insert_axis(Axis(0)),
            dims,
            time: None,
        }
    }

    /// Number of time steps, one for fields without a time axis
    pub fn ntime(&self) -> usize {
        self.len_of(Dim::Time).unwrap_or(1)
    }

    /// Check that the node axis exists and matches the mesh
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` when the node count differs from the mesh.
    pub fn check_nodes(&self, mesh: &Mesh) -> Result<()> {
        match self.len_of(Dim::Node) {
            Some(n) if n == mesh.n2d => Ok(()),
            Some(n) => Err(FesomError::shape("mesh nodes", mesh.n2d, n)),
            None => Err(FesomError::dimensionality(
                "field",
                format!("no node dimension in {}", describe_dims(&self.dims)),
            )),
        }
    }
}

pub(crate) fn describe_dims(dims: &[Dim]) -> String {
    let names: Vec<&str> = dims.iter().map(|d| d.as_str()).collect();
    format!("({})", names.join(", "))
}

type Loader = Arc<dyn Fn() -> Result<ArrayD<f64>> + Send + Sync>;

/// Labeled array: values plus dimension names, time coordinate and attributes
///
/// Values are loaded at most once, on first access.
#[derive(Clone)]
pub struct DataArray {
    pub name: String,
    pub attrs: HashMap<String, JsonValue>,
    dims: Vec<Dim>,
    shape: Vec<usize>,
    time: Option<Vec<f64>>,
    values: OnceLock<ArrayD<f64>>,
    loader: Option<Loader>,
}

impl fmt::Debug for DataArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataArray")
            .field("name", &self.name)
            .field("dims", &self.dims)
            .field("shape", &self.shape)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl DataArray {
    /// Labeled view of an already materialized field
    pub fn from_field(name: impl Into<String>, field: Field) -> Self {
        let shape = field.shape().to_vec();
        let Field { values, dims, time } = field;
        Self {
            name: name.into(),
            attrs: HashMap::new(),
            dims,
            shape,
            time,
            values: OnceLock::from(values),
            loader: None,
        }
    }

    /// Labeled array whose values are produced by `loader` on first access
    ///
    /// `loader` must return an array of exactly `shape`.
    pub fn lazy(
        name: impl Into<String>,
        dims: Vec<Dim>,
        shape: Vec<usize>,
        time: Option<Vec<f64>>,
        loader: impl Fn() -> Result<ArrayD<f64>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            attrs: HashMap::new(),
            dims,
            shape,
            time,
            values: OnceLock::new(),
            loader: Some(Arc::new(loader)),
        }
    }

    #[must_use]
    pub fn with_attrs(mut self, attrs: HashMap<String, JsonValue>) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn dims(&self) -> &[Dim] {
        &self.dims
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn time(&self) -> Option<&[f64]> {
        self.time.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.values.get().is_some()
    }

    /// Load the values if needed and return them
    ///
    /// # Errors
    ///
    /// Propagates the loader's error, or `ShapeMismatch` if it returned an
    /// array of the wrong shape.
    pub fn load(&self) -> Result<&ArrayD<f64>> {
        if let Some(values) = self.values.get() {
            return Ok(values);
        }
        let loader = self.loader.as_ref().ok_or_else(|| {
            FesomError::InvalidArgument(format!("data array '{}' has no values", self.name))
        })?;
        let values = loader()?;
        if values.shape() != self.shape.as_slice() {
            return Err(FesomError::shape(
                format!("elements of '{}'", self.name),
                self.shape.iter().product(),
                values.len(),
            ));
        }
        Ok(self.values.get_or_init(|| values))
    }

    /// Materialize into a plain array
    ///
    /// # Errors
    ///
    /// Propagates load errors.
    pub fn compute(self) -> Result<ArrayD<f64>> {
        self.load()?;
        match self.values.into_inner() {
            Some(values) => Ok(values),
            None => Err(FesomError::InvalidArgument(
                "data array lost its values".to_string(),
            )),
        }
    }

    /// Copy into the canonical representation
    ///
    /// # Errors
    ///
    /// Propagates load errors.
    pub fn to_field(&self) -> Result<Field> {
        let field = Field::new(self.load()?.clone(), self.dims.clone())?;
        match &self.time {
            Some(time) if field.has(Dim::Time) => field.with_time(time.clone()),
            _ => Ok(field),
        }
    }
}

/// Output of the data accessor: labeled (lazy) or raw (materialized)
#[derive(Debug, Clone)]
pub enum FieldData {
    Labeled(DataArray),
    Raw(ArrayD<f64>),
}

impl FieldData {
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Labeled(da) => da.shape(),
            Self::Raw(values) => values.shape(),
        }
    }

    pub fn is_labeled(&self) -> bool {
        matches!(self, Self::Labeled(_))
    }

    /// Materialize into a plain array in canonical axis order
    ///
    /// # Errors
    ///
    /// Propagates load errors of a labeled array.
    pub fn into_array(self) -> Result<ArrayD<f64>> {
        match self {
            Self::Labeled(da) => Ok(da.to_field()?.canonical().into_values()),
            Self::Raw(values) => Ok(values),
        }
    }
}

/// Anything a diagnostic can consume as a field on a mesh
pub trait AsField {
    /// Produce an owned, canonical copy checked against `mesh`
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` when the node axis does not match the mesh and
    /// `InvalidDimensionality` when the axes cannot be identified.
    fn to_field(&self, mesh: &Mesh) -> Result<Field>;
}

impl AsField for Field {
    fn to_field(&self, mesh: &Mesh) -> Result<Field> {
        let field = self.clone().canonical();
        field.check_nodes(mesh)?;
        Ok(field)
    }
}

impl AsField for DataArray {
    fn to_field(&self, mesh: &Mesh) -> Result<Field> {
        let field = DataArray::to_field(self)?.canonical();
        field.check_nodes(mesh)?;
        Ok(field)
    }
}

/// Raw arrays carry no names; their axes are read as `(node)`,
/// `(time, node)` or `(time, depth, node)`.
impl<D: Dimension> AsField for Array<f64, D> {
    fn to_field(&self, mesh: &Mesh) -> Result<Field> {
        let dims = match self.ndim() {
            1 => vec![Dim::Node],
            2 => vec![Dim::Time, Dim::Node],
            3 => vec![Dim::Time, Dim::Depth, Dim::Node],
            n => {
                return Err(FesomError::dimensionality(
                    "raw array",
                    format!("expected 1 to 3 dimensions, got {n}"),
                ))
            }
        };
        let field = Field::new(self.to_owned().into_dyn(), dims)?;
        field.check_nodes(mesh)?;
        Ok(field)
    }
}

impl AsField for FieldData {
    fn to_field(&self, mesh: &Mesh) -> Result<Field> {
        match self {
            Self::Labeled(da) => AsField::to_field(da, mesh),
            Self::Raw(values) => values.to_field(mesh),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn canonical_reorders_node_before_depth() {
        // Stored as (time, node, depth), the FESOM2 output layout.
        let values = Array3::from_shape_fn((2, 3, 4), |(t, n, k)| (t * 100 + n * 10 + k) as f64);
        let field = Field::new(values.into_dyn(), vec![Dim::Time, Dim::Node, Dim::Depth])
            .unwrap()
            .canonical();
        assert_eq!(field.dims(), &[Dim::Time, Dim::Depth, Dim::Node]);
        assert_eq!(field.shape(), &[2, 4, 3]);
        assert_eq!(field.values()[[1, 3, 2]], 123.0);
    }

    #[test]
    fn time_axis_added_once() {
        let field = Field::new(array![1.0, 2.0].into_dyn(), vec![Dim::Node]).unwrap();
        let field = field.with_time_axis().with_time_axis();
        assert_eq!(field.dims(), &[Dim::Time, Dim::Node]);
        assert_eq!(field.shape(), &[1, 2]);
    }

    #[test]
    fn repeated_dims_rejected() {
        let err = Field::new(ArrayD::zeros(IxDyn(&[2, 2])), vec![Dim::Node, Dim::Node]);
        assert!(matches!(err, Err(FesomError::InvalidDimensionality { .. })));
    }

    #[test]
    fn lazy_array_loads_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let da = DataArray::lazy("x", vec![Dim::Node], vec![3], None, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(array![1.0, 2.0, 3.0].into_dyn())
        });
        assert!(!da.is_loaded());
        assert_eq!(da.load().unwrap().sum(), 6.0);
        assert_eq!(da.load().unwrap().sum(), 6.0);
        assert!(da.is_loaded());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn lazy_array_shape_checked() {
        let da = DataArray::lazy("x", vec![Dim::Node], vec![4], None, || {
            Ok(array![1.0, 2.0].into_dyn())
        });
        assert!(matches!(da.load(), Err(FesomError::ShapeMismatch { .. })));
    }
}
