//! NetCDF I/O: reading FESOM2 results and writing diagnostic outputs
//!
//! Results are stored as one file per variable and year, named
//! `{variable}.{runid}.{year}.nc`. Outputs written by [`NetCDFWriter`] carry
//! a `history` attribute with the creation time.

use crate::data_source::{RecordInfo, ResultsSource};
use crate::diagnostics::TimeSeries;
use crate::errors::{FesomError, Result};
use crate::field::Dim;
use crate::meshdiag::MeshDiag;
use chrono::Utc;
use ndarray::{Array1, Array2, ArrayD, ArrayView1};
use netcdf::{create, AttributeValue, File, Variable};
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default run identifier used in FESOM2 output file names
pub const DEFAULT_RUNID: &str = "fesom";

/// File name of the record of `variable` for `year`
pub fn results_file_name(variable: &str, runid: &str, year: i32) -> String {
    format!("{variable}.{runid}.{year}.nc")
}

/// Convert a NetCDF attribute value to JSON
pub fn attribute_to_json(value: AttributeValue) -> Option<JsonValue> {
    let json = match value {
        AttributeValue::Str(s) => json!(s),
        AttributeValue::Strs(s) => json!(s),
        AttributeValue::Float(v) => json!(f64::from(v)),
        AttributeValue::Floats(v) => json!(v.into_iter().map(f64::from).collect::<Vec<_>>()),
        AttributeValue::Double(v) => json!(v),
        AttributeValue::Doubles(v) => json!(v),
        AttributeValue::Int(v) => json!(v),
        AttributeValue::Ints(v) => json!(v),
        AttributeValue::Short(v) => json!(v),
        AttributeValue::Shorts(v) => json!(v),
        AttributeValue::Uint(v) => json!(v),
        AttributeValue::Uints(v) => json!(v),
        AttributeValue::Ushort(v) => json!(v),
        AttributeValue::Ushorts(v) => json!(v),
        AttributeValue::Uchar(v) => json!(v),
        AttributeValue::Uchars(v) => json!(v),
        _ => return None,
    };
    Some(json)
}

fn attribute_f64(var: &Variable, name: &str) -> Option<f64> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(f64::from(v)),
        AttributeValue::Int(v) => Some(f64::from(v)),
        AttributeValue::Short(v) => Some(f64::from(v)),
        _ => None,
    }
}

fn dimension_names(var: &Variable) -> Vec<String> {
    var.dimensions().iter().map(|d| d.name().to_string()).collect()
}

fn dimension_lengths(var: &Variable) -> Vec<usize> {
    var.dimensions()
        .iter()
        .map(netcdf::Dimension::len)
        .collect()
}

/// Read a whole variable as `f64`, mapping fill values to `NaN` and applying
/// `scale_factor`/`add_offset` when present.
pub(crate) fn read_values(var: &Variable) -> Result<ArrayD<f64>> {
    let shape = dimension_lengths(var);
    let raw = var.get_values::<f64, _>(..)?;
    let mut data = ArrayD::from_shape_vec(shape, raw)?;

    let missing: Vec<f64> = ["_FillValue", "missing_value"]
        .iter()
        .filter_map(|name| attribute_f64(var, name))
        .collect();
    let scale = attribute_f64(var, "scale_factor").unwrap_or(1.0);
    let offset = attribute_f64(var, "add_offset").unwrap_or(0.0);

    data.mapv_inplace(|v| {
        let is_missing = missing
            .iter()
            .any(|&m| v == m || (m.abs() > 1e30 && ((v - m) / m).abs() < 1e-6));
        if is_missing {
            f64::NAN
        } else {
            v * scale + offset
        }
    });
    Ok(data)
}

/// Read a variable by name together with its dimension names
pub(crate) fn read_named(file: &File, name: &str) -> Result<Option<(ArrayD<f64>, Vec<String>)>> {
    match file.variable(name) {
        Some(var) => Ok(Some((read_values(&var)?, dimension_names(&var)))),
        None => Ok(None),
    }
}

/// FESOM2 results directory
#[derive(Debug, Clone)]
pub struct NetCDFResults {
    dir: PathBuf,
    runid: String,
}

impl NetCDFResults {
    pub fn new(dir: impl Into<PathBuf>, runid: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            runid: runid.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record of `variable` for `year`
    pub fn record_path(&self, variable: &str, year: i32) -> PathBuf {
        self.dir.join(results_file_name(variable, &self.runid, year))
    }

    fn open(&self, variable: &str, year: i32) -> Result<File> {
        let path = self.record_path(variable, year);
        if !path.is_file() {
            return Err(FesomError::NotFound {
                variable: variable.to_string(),
                year,
                path,
            });
        }
        debug!(path = %path.display(), "opening results record");
        Ok(netcdf::open(&path)?)
    }
}

impl ResultsSource for NetCDFResults {
    fn describe(&self, variable: &str, year: i32) -> Result<RecordInfo> {
        let file = self.open(variable, year)?;
        let var = file
            .variable(variable)
            .ok_or_else(|| FesomError::VariableNotFound {
                var: variable.to_string(),
            })?;

        let dims = dimension_names(&var)
            .iter()
            .map(|name| {
                Dim::from_name(name).ok_or_else(|| FesomError::UnknownDimension {
                    var: variable.to_string(),
                    dim: name.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let shape = dimension_lengths(&var);

        let mut attributes = HashMap::new();
        for attr in var.attributes() {
            match attr.value() {
                Ok(value) => {
                    if let Some(json) = attribute_to_json(value) {
                        attributes.insert(attr.name().to_string(), json);
                    }
                }
                Err(e) => warn!(attribute = attr.name(), error = %e, "skipping unreadable attribute"),
            }
        }

        let ntime = dims
            .iter()
            .position(|&d| d == Dim::Time)
            .map(|axis| shape[axis]);
        let time = match (ntime, file.variable("time")) {
            (Some(n), Some(time_var)) => {
                let values = time_var.get_values::<f64, _>(..)?;
                (values.len() == n).then_some(values)
            }
            _ => None,
        };

        Ok(RecordInfo {
            variable: variable.to_string(),
            year,
            dims,
            shape,
            time,
            attributes,
        })
    }

    fn read(&self, variable: &str, year: i32) -> Result<ArrayD<f64>> {
        let file = self.open(variable, year)?;
        let var = file
            .variable(variable)
            .ok_or_else(|| FesomError::VariableNotFound {
                var: variable.to_string(),
            })?;
        read_values(&var)
    }
}

/// Writer for diagnostic results
pub struct NetCDFWriter<'a> {
    output_path: &'a Path,
}

impl<'a> NetCDFWriter<'a> {
    /// Create a new NetCDF writer
    pub fn new(output_path: &'a Path) -> Self {
        Self { output_path }
    }

    fn create(&self) -> Result<netcdf::FileMut> {
        if self.output_path.exists() {
            fs::remove_file(self.output_path)?;
        }
        Ok(create(self.output_path)?)
    }

    fn finish(file: &mut netcdf::FileMut) -> Result<()> {
        file.add_attribute(
            "history",
            format!("Created by fesom_diag on {}", Utc::now().to_rfc3339()),
        )?;
        Ok(())
    }

    /// Write a diagnostic time series, e.g. the output of `ice_ext`
    pub fn write_time_series(&self, series: &TimeSeries) -> Result<()> {
        let mut file = self.create()?;
        file.add_dimension("time", series.values.len())?;

        if let Some(time) = &series.time {
            let mut time_var = file.add_variable::<f64>("time", &["time"])?;
            time_var.put(Array1::from(time.clone()).view(), ..)?;
        }

        let mut var = file.add_variable::<f64>(&series.name, &["time"])?;
        var.put_attribute("units", series.units.as_str())?;
        var.put(series.values.view(), ..)?;

        Self::finish(&mut file)
    }

    /// Write a Hovmöller matrix with its depth coordinate
    pub fn write_hovmoller(
        &self,
        name: &str,
        hovm: &Array2<f64>,
        time: Option<&[f64]>,
        depths: ArrayView1<f64>,
    ) -> Result<()> {
        if depths.len() != hovm.ncols() {
            return Err(FesomError::shape("depth coordinate", hovm.ncols(), depths.len()));
        }

        let mut file = self.create()?;
        file.add_dimension("time", hovm.nrows())?;
        file.add_dimension("nz1", hovm.ncols())?;

        if let Some(time) = time.filter(|t| t.len() == hovm.nrows()) {
            let mut time_var = file.add_variable::<f64>("time", &["time"])?;
            time_var.put(ArrayView1::from(time), ..)?;
        }

        let mut depth_var = file.add_variable::<f64>("nz1", &["nz1"])?;
        depth_var.put_attribute("units", "m")?;
        depth_var.put_attribute("positive", "down")?;
        depth_var.put(depths, ..)?;

        let mut var = file.add_variable::<f64>(name, &["time", "nz1"])?;
        var.put_attribute("long_name", "area weighted horizontal mean")?;
        var.put(hovm.view(), ..)?;

        Self::finish(&mut file)
    }

    /// Write mesh diagnostics in the layout of `fesom.mesh.diag.nc`
    pub fn write_meshdiag(&self, diag: &MeshDiag) -> Result<()> {
        let mut file = self.create()?;
        file.add_dimension("nz", diag.nz())?;
        file.add_dimension("nz1", diag.nz1())?;
        file.add_dimension("nod_n", diag.nod_area.ncols())?;
        file.add_dimension("elem_n", diag.elem_area.len())?;

        let mut zbar = file.add_variable::<f64>("zbar", &["nz"])?;
        zbar.put_attribute("units", "m")?;
        zbar.put(diag.zbar.mapv(|z| -z).view(), ..)?;

        let mut z = file.add_variable::<f64>("Z", &["nz1"])?;
        z.put_attribute("units", "m")?;
        z.put(diag.z.mapv(|z| -z).view(), ..)?;

        let mut nod_area = file.add_variable::<f64>("nod_area", &["nz", "nod_n"])?;
        nod_area.put_attribute("units", "m2")?;
        nod_area.put(diag.nod_area.view(), ..)?;

        let mut elem_area = file.add_variable::<f64>("elem_area", &["elem_n"])?;
        elem_area.put_attribute("units", "m2")?;
        elem_area.put(diag.elem_area.view(), ..)?;

        Self::finish(&mut file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_follow_fesom_layout() {
        assert_eq!(results_file_name("temp", "fesom", 1948), "temp.fesom.1948.nc");
    }

    #[test]
    fn missing_record_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let results = NetCDFResults::new(dir.path(), DEFAULT_RUNID);
        match results.describe("a_ice", 1948) {
            Err(FesomError::NotFound { variable, year, path }) => {
                assert_eq!(variable, "a_ice");
                assert_eq!(year, 1948);
                assert!(path.ends_with("a_ice.fesom.1948.nc"));
            }
            other => panic!("Expected NotFound error, got {other:?}"),
        }
    }

    #[test]
    fn attributes_convert_to_json() {
        assert_eq!(attribute_to_json(AttributeValue::Str("m".into())), Some(json!("m")));
        assert_eq!(attribute_to_json(AttributeValue::Float(0.5)), Some(json!(0.5)));
        assert_eq!(attribute_to_json(AttributeValue::Ints(vec![1, 2])), Some(json!([1, 2])));
    }
}
