//! Results store abstraction
//!
//! Model output is organised as one record per variable per year. The
//! [`ResultsSource`] trait is the seam between the data accessor and the
//! storage format: [`crate::netcdf_io::NetCDFResults`] reads FESOM2 NetCDF
//! files, [`MemoryResults`] keeps records in memory.

use crate::errors::{FesomError, Result};
use crate::field::{Dim, Field};
use ndarray::ArrayD;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Description of one stored record, available without reading its values
#[derive(Debug, Clone, PartialEq)]
pub struct RecordInfo {
    pub variable: String,
    pub year: i32,
    /// Axes in stored order
    pub dims: Vec<Dim>,
    pub shape: Vec<usize>,
    /// Time coordinate values, when the record has a time axis
    pub time: Option<Vec<f64>>,
    pub attributes: HashMap<String, JsonValue>,
}

impl RecordInfo {
    pub fn len_of(&self, dim: Dim) -> Option<usize> {
        self.dims
            .iter()
            .position(|&d| d == dim)
            .map(|axis| self.shape[axis])
    }
}

/// Read access to a results store
pub trait ResultsSource: fmt::Debug + Send + Sync {
    /// Describe the record of `variable` for `year`
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when there is no such record.
    fn describe(&self, variable: &str, year: i32) -> Result<RecordInfo>;

    /// Read all values of the record, in stored axis order, with missing
    /// values as `NaN`
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when there is no such record, or a storage error.
    fn read(&self, variable: &str, year: i32) -> Result<ArrayD<f64>>;
}

/// Results kept in memory, mostly for tests and synthetic data
#[derive(Debug, Default, Clone)]
pub struct MemoryResults {
    records: HashMap<(String, i32), (RecordInfo, ArrayD<f64>)>,
}

impl MemoryResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `field` as the record of `variable` for `year`
    pub fn insert(&mut self, variable: &str, year: i32, field: Field) {
        let info = RecordInfo {
            variable: variable.to_string(),
            year,
            dims: field.dims().to_vec(),
            shape: field.shape().to_vec(),
            time: field.time().map(<[f64]>::to_vec),
            attributes: HashMap::new(),
        };
        self.records
            .insert((variable.to_string(), year), (info, field.into_values()));
    }

    fn get(&self, variable: &str, year: i32) -> Result<&(RecordInfo, ArrayD<f64>)> {
        self.records
            .get(&(variable.to_string(), year))
            .ok_or_else(|| FesomError::NotFound {
                variable: variable.to_string(),
                year,
                path: PathBuf::from(format!("memory:{variable}/{year}")),
            })
    }
}

impl ResultsSource for MemoryResults {
    fn describe(&self, variable: &str, year: i32) -> Result<RecordInfo> {
        Ok(self.get(variable, year)?.0.clone())
    }

    fn read(&self, variable: &str, year: i32) -> Result<ArrayD<f64>> {
        Ok(self.get(variable, year)?.1.clone())
    }
}
