//! Data accessor
//!
//! [`get_data`] reads one variable for one or more years, optionally picks a
//! single depth level, and either reduces over time or keeps every time step.
//! Reductions keep a time axis of length one, so a time-mean temperature
//! field is still `(time, depth, node)` and a time-mean ice field is still
//! `(time, node)`.

use crate::data_source::{RecordInfo, ResultsSource};
use crate::errors::{FesomError, Result};
use crate::field::{describe_dims, DataArray, Dim, Field, FieldData};
use crate::mesh::Mesh;
use crate::netcdf_io::{NetCDFResults, DEFAULT_RUNID};
use crate::statistics::{StatOperation, StatisticalReduction};
use ndarray::{concatenate, Array1, ArrayD, Axis};
use std::ops::RangeInclusive;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// How the time dimension is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum How {
    /// Mean over all time steps of all requested years
    #[default]
    Mean,
    /// Maximum over time
    Max,
    /// Minimum over time
    Min,
    /// Keep every time step, in year order
    Ori,
}

impl How {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Max => "max",
            Self::Min => "min",
            Self::Ori => "ori",
        }
    }

    /// Time reduction applied by this mode, if any
    #[must_use]
    pub const fn operation(self) -> Option<StatOperation> {
        match self {
            Self::Mean => Some(StatOperation::Mean),
            Self::Max => Some(StatOperation::Max),
            Self::Min => Some(StatOperation::Min),
            Self::Ori => None,
        }
    }
}

impl FromStr for How {
    type Err = FesomError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mean" => Ok(Self::Mean),
            "max" => Ok(Self::Max),
            "min" => Ok(Self::Min),
            "ori" => Ok(Self::Ori),
            other => Err(FesomError::InvalidArgument(format!(
                "unknown aggregation '{other}', expected mean, max, min or ori"
            ))),
        }
    }
}

/// Ordered list of model years
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Years(Vec<i32>);

impl Years {
    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }
}

impl From<i32> for Years {
    fn from(year: i32) -> Self {
        Self(vec![year])
    }
}

impl From<Vec<i32>> for Years {
    fn from(years: Vec<i32>) -> Self {
        Self(years)
    }
}

impl From<&[i32]> for Years {
    fn from(years: &[i32]) -> Self {
        Self(years.to_vec())
    }
}

impl<const N: usize> From<[i32; N]> for Years {
    fn from(years: [i32; N]) -> Self {
        Self(years.to_vec())
    }
}

impl From<RangeInclusive<i32>> for Years {
    fn from(years: RangeInclusive<i32>) -> Self {
        Self(years.collect())
    }
}

/// Options of [`get_data`]
#[derive(Debug, Clone, PartialEq)]
pub struct DataOptions {
    /// Depth in metres; the nearest level is selected. Ignored for fields
    /// without a vertical dimension.
    pub depth: Option<f64>,
    pub how: How,
    /// `true` returns a materialized raw array, `false` a lazy labeled array
    pub compute: bool,
    /// Run identifier in the file names
    pub runid: String,
    /// Time indices to keep inside every yearly record
    pub records: Option<Vec<usize>>,
}

impl Default for DataOptions {
    fn default() -> Self {
        Self {
            depth: None,
            how: How::Mean,
            compute: false,
            runid: DEFAULT_RUNID.to_string(),
            records: None,
        }
    }
}

/// Everything needed to assemble the values once the records are known.
#[derive(Debug, Clone)]
struct ReadPlan {
    variable: String,
    years: Vec<i32>,
    records: Option<Vec<usize>>,
    depth_index: Option<usize>,
    operation: Option<StatOperation>,
}

impl ReadPlan {
    fn execute(&self, source: &dyn ResultsSource, infos: &[RecordInfo]) -> Result<Field> {
        let mut parts: Vec<ArrayD<f64>> = Vec::with_capacity(self.years.len());
        let mut times: Option<Vec<f64>> = Some(Vec::new());

        for (&year, info) in self.years.iter().zip(infos) {
            let values = source.read(&self.variable, year)?;
            if values.shape() != info.shape.as_slice() {
                return Err(FesomError::shape(
                    format!("elements of {} {year}", self.variable),
                    info.shape.iter().product(),
                    values.len(),
                ));
            }
            let mut field = Field::new(values, info.dims.clone())?;
            if let Some(time) = &info.time {
                field = field.with_time(time.clone())?;
            }
            let field = field.canonical().with_time_axis();

            let selected: Vec<usize> = match &self.records {
                Some(records) => records.clone(),
                None => (0..field.ntime()).collect(),
            };
            times = match (times, field.time()) {
                (Some(mut acc), Some(time)) => {
                    acc.extend(selected.iter().map(|&i| time[i]));
                    Some(acc)
                }
                _ => None,
            };

            let mut values = field.values().select(Axis(0), &selected);
            if let (Some(k), Some(axis)) = (self.depth_index, field.axis(Dim::Depth)) {
                values = values.index_axis_move(Axis(axis), k);
            }
            parts.push(values);
        }

        let views: Vec<_> = parts.iter().map(|p| p.view()).collect();
        let mut values = concatenate(Axis(0), &views)?;

        if let Some(operation) = self.operation {
            values = values.reduce_keep_axis(0, operation)?;
            times = None;
        }

        let field = Field::new(values, self.output_dims(infos))?;
        match times {
            Some(time) => field.with_time(time),
            None => Ok(field),
        }
    }

    fn output_dims(&self, infos: &[RecordInfo]) -> Vec<Dim> {
        let has_depth = infos
            .first()
            .is_some_and(|info| info.dims.contains(&Dim::Depth));
        let mut dims = vec![Dim::Time];
        if has_depth && self.depth_index.is_none() {
            dims.push(Dim::Depth);
        }
        dims.push(Dim::Node);
        dims
    }
}

/// Depth of every level of a vertical dimension of length `n`
fn level_depths(mesh: &Mesh, n: usize) -> Result<Array1<f64>> {
    if n == mesh.nlayers() {
        Ok(mesh.layer_depths())
    } else if n == mesh.nlev() {
        Ok(mesh.zlev.clone())
    } else {
        Err(FesomError::shape("depth levels", mesh.nlayers(), n))
    }
}

/// Index of the level closest to `depth`
fn nearest_level(levels: &Array1<f64>, depth: f64) -> usize {
    levels
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(best, dist), (i, &z)| {
            let d = (z.abs() - depth.abs()).abs();
            if d < dist {
                (i, d)
            } else {
                (best, dist)
            }
        })
        .0
}

fn non_time_shape(info: &RecordInfo) -> Vec<(Dim, usize)> {
    let mut shape: Vec<(Dim, usize)> = info
        .dims
        .iter()
        .zip(&info.shape)
        .filter(|&(&d, _)| d != Dim::Time)
        .map(|(&d, &n)| (d, n))
        .collect();
    shape.sort();
    shape
}

/// Read `variable` for `years` from a FESOM2 results directory
///
/// # Arguments
///
/// * `results_path` - Directory with `{variable}.{runid}.{year}.nc` files
/// * `variable` - Variable name, e.g. `"temp"` or `"a_ice"`
/// * `years` - One year or an ordered list of years
/// * `mesh` - Mesh the results live on
/// * `options` - Depth selection, time treatment and output representation
///
/// # Errors
///
/// Returns `NotFound` if a year has no record, `ShapeMismatch` if the
/// records do not fit the mesh or each other.
pub fn get_data(
    results_path: impl AsRef<Path>,
    variable: &str,
    years: impl Into<Years>,
    mesh: &Mesh,
    options: &DataOptions,
) -> Result<FieldData> {
    let source = NetCDFResults::new(results_path.as_ref(), options.runid.clone());
    get_data_from(Arc::new(source), variable, years, mesh, options)
}

/// [`get_data`] over any [`ResultsSource`]
///
/// # Errors
///
/// See [`get_data`].
pub fn get_data_from(
    source: Arc<dyn ResultsSource>,
    variable: &str,
    years: impl Into<Years>,
    mesh: &Mesh,
    options: &DataOptions,
) -> Result<FieldData> {
    let years = years.into().0;
    if years.is_empty() {
        return Err(FesomError::InvalidArgument(
            "at least one year is required".to_string(),
        ));
    }
    info!(variable, ?years, how = options.how.as_str(), "reading data");

    let infos = years
        .iter()
        .map(|&year| source.describe(variable, year))
        .collect::<Result<Vec<_>>>()?;

    let first = &infos[0];
    let layout = non_time_shape(first);
    for info in &infos {
        match info.len_of(Dim::Node) {
            Some(n) if n == mesh.n2d => {}
            Some(n) => return Err(FesomError::shape("mesh nodes", mesh.n2d, n)),
            None => {
                return Err(FesomError::dimensionality(
                    "get_data",
                    format!(
                        "variable '{variable}' has no node dimension: {}",
                        describe_dims(&info.dims)
                    ),
                ))
            }
        }
        if non_time_shape(info) != layout {
            return Err(FesomError::InvalidArgument(format!(
                "record of '{variable}' for {} has a different layout than {}",
                info.year, first.year
            )));
        }
        if let Some(records) = &options.records {
            let ntime = info.len_of(Dim::Time).unwrap_or(1);
            if let Some(&bad) = records.iter().find(|&&r| r >= ntime) {
                return Err(FesomError::InvalidArgument(format!(
                    "record {bad} requested, {} {} has {ntime}",
                    variable, info.year
                )));
            }
        }
    }

    let depth_index = match (options.depth, first.len_of(Dim::Depth)) {
        (Some(depth), Some(n)) => {
            if !depth.is_finite() {
                return Err(FesomError::InvalidArgument(format!("invalid depth {depth}")));
            }
            let levels = level_depths(mesh, n)?;
            let index = nearest_level(&levels, depth);
            debug!(depth, index, level = levels[index], "selected depth level");
            Some(index)
        }
        _ => None,
    };

    let plan = ReadPlan {
        variable: variable.to_string(),
        years,
        records: options.records.clone(),
        depth_index,
        operation: options.how.operation(),
    };

    if options.compute {
        let field = plan.execute(source.as_ref(), &infos)?;
        return Ok(FieldData::Raw(field.into_values()));
    }

    let dims = plan.output_dims(&infos);
    let ntime = match plan.operation {
        Some(_) => 1,
        None => infos
            .iter()
            .map(|info| match &plan.records {
                Some(records) => records.len(),
                None => info.len_of(Dim::Time).unwrap_or(1),
            })
            .sum(),
    };
    let mut shape = vec![ntime];
    if dims.contains(&Dim::Depth) {
        shape.push(first.len_of(Dim::Depth).unwrap_or(0));
    }
    shape.push(mesh.n2d);

    let time = match plan.operation {
        Some(_) => None,
        None => infos
            .iter()
            .map(|info| {
                let time = info.time.as_ref()?;
                Some(match &plan.records {
                    Some(records) => records.iter().map(|&i| time[i]).collect::<Vec<_>>(),
                    None => time.clone(),
                })
            })
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.concat()),
    };

    let attrs = first.attributes.clone();
    let loader = move || plan.execute(source.as_ref(), &infos).map(Field::into_values);
    Ok(FieldData::Labeled(
        DataArray::lazy(variable, dims, shape, time, loader).with_attrs(attrs),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn how_parses() {
        assert_eq!("ori".parse::<How>().unwrap(), How::Ori);
        assert_eq!(How::default(), How::Mean);
        assert!("median".parse::<How>().is_err());
        assert_eq!(How::Ori.operation(), None);
    }

    #[test]
    fn years_conversions() {
        assert_eq!(Years::from(1948).as_slice(), &[1948]);
        assert_eq!(Years::from(1948..=1950).as_slice(), &[1948, 1949, 1950]);
        assert_eq!(Years::from([1949, 1948]).as_slice(), &[1949, 1948]);
    }

    #[test]
    fn nearest_level_uses_absolute_depth() {
        let levels = Array1::from(vec![5.0, 15.0, 35.0]);
        assert_eq!(nearest_level(&levels, 0.0), 0);
        assert_eq!(nearest_level(&levels, -14.0), 1);
        assert_eq!(nearest_level(&levels, 1000.0), 2);
    }
}
