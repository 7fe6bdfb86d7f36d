//! Sea-ice integrals
//!
//! All three integrals share one operator: a sum over the nodes of one
//! hemisphere of `f(value) × node_area`, evaluated per time step. They differ
//! only in `f`. Extent counts the full node area where concentration is above
//! a threshold; area and volume weight the area by the field itself.

use crate::errors::{FesomError, Result};
use crate::field::{describe_dims, AsField, Dim};
use crate::mesh::Mesh;
use crate::statistics::weighted_sum_rows;
use ndarray::{Array1, Ix2};
use tracing::debug;

/// Concentration above which a node counts as ice covered
pub const EXTENT_THRESHOLD: f64 = 0.15;

/// Hemisphere an integral is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Hemisphere {
    /// Nodes with latitude above zero
    #[default]
    North,
    /// Nodes with latitude below zero
    South,
}

impl Hemisphere {
    fn contains(self, lat: f64) -> bool {
        match self {
            Self::North => lat > 0.0,
            Self::South => lat < 0.0,
        }
    }

    const fn suffix(self) -> char {
        match self {
            Self::North => 'n',
            Self::South => 's',
        }
    }
}

/// Options for the sea-ice integrals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IceOptions {
    pub hemisphere: Hemisphere,
    /// Concentration threshold of `ice_ext`
    pub extent_threshold: f64,
    /// Values below this do not contribute to `ice_area` and `ice_vol`
    pub min_value: f64,
}

impl Default for IceOptions {
    fn default() -> Self {
        Self {
            hemisphere: Hemisphere::North,
            extent_threshold: EXTENT_THRESHOLD,
            min_value: 0.0,
        }
    }
}

/// One value per time step, with the name and units of the diagnostic
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub name: String,
    pub units: String,
    pub time: Option<Vec<f64>>,
    pub values: Array1<f64>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn integrate<F, T>(
    operation: &str,
    data: &F,
    mesh: &Mesh,
    options: &IceOptions,
    name: &str,
    units: &str,
    transform: T,
) -> Result<TimeSeries>
where
    F: AsField + ?Sized,
    T: Fn(f64) -> f64 + Sync,
{
    let field = data.to_field(mesh)?;
    if field.has(Dim::Depth) {
        return Err(FesomError::dimensionality(
            operation,
            format!(
                "expected a 2-D (time, node) field, got {}",
                describe_dims(field.dims())
            ),
        ));
    }
    let field = field.with_time_axis();
    let time = field.time().map(<[f64]>::to_vec);
    let values = field.into_values().into_dimensionality::<Ix2>()?;

    let hemisphere = options.hemisphere;
    let weights: Array1<f64> = mesh
        .node_area
        .iter()
        .zip(mesh.lat.iter())
        .map(|(&area, &lat)| if hemisphere.contains(lat) { area } else { 0.0 })
        .collect();

    let values = weighted_sum_rows(values.view(), weights.view(), transform);
    debug!(operation, steps = values.len(), "integrated ice field");

    Ok(TimeSeries {
        name: format!("{name}{}", hemisphere.suffix()),
        units: units.to_string(),
        time,
        values,
    })
}

/// Sea-ice extent of the northern hemisphere, m²
///
/// # Errors
///
/// Returns `ShapeMismatch` if the node axis does not match the mesh and
/// `InvalidDimensionality` for fields with a depth axis.
pub fn ice_ext<F: AsField + ?Sized>(data: &F, mesh: &Mesh) -> Result<TimeSeries> {
    ice_ext_with(data, mesh, &IceOptions::default())
}

/// Sea-ice extent: area of nodes whose concentration exceeds the threshold
///
/// # Errors
///
/// See [`ice_ext`].
pub fn ice_ext_with<F: AsField + ?Sized>(
    data: &F,
    mesh: &Mesh,
    options: &IceOptions,
) -> Result<TimeSeries> {
    let threshold = options.extent_threshold;
    integrate("ice_ext", data, mesh, options, "siextent", "m2", |v| {
        if v > threshold {
            1.0
        } else {
            0.0
        }
    })
}

/// Sea-ice area of the northern hemisphere, m²
///
/// # Errors
///
/// See [`ice_ext`].
pub fn ice_area<F: AsField + ?Sized>(data: &F, mesh: &Mesh) -> Result<TimeSeries> {
    ice_area_with(data, mesh, &IceOptions::default())
}

/// Sea-ice area: concentration-weighted node area
///
/// # Errors
///
/// See [`ice_ext`].
pub fn ice_area_with<F: AsField + ?Sized>(
    data: &F,
    mesh: &Mesh,
    options: &IceOptions,
) -> Result<TimeSeries> {
    let min = options.min_value;
    integrate("ice_area", data, mesh, options, "siarea", "m2", move |v| {
        field_weight(v, min)
    })
}

/// Sea-ice volume of the northern hemisphere, m³
///
/// # Errors
///
/// See [`ice_ext`].
pub fn ice_vol<F: AsField + ?Sized>(data: &F, mesh: &Mesh) -> Result<TimeSeries> {
    ice_vol_with(data, mesh, &IceOptions::default())
}

/// Sea-ice volume: thickness-weighted node area
///
/// # Errors
///
/// See [`ice_ext`].
pub fn ice_vol_with<F: AsField + ?Sized>(
    data: &F,
    mesh: &Mesh,
    options: &IceOptions,
) -> Result<TimeSeries> {
    let min = options.min_value;
    integrate("ice_vol", data, mesh, options, "sivol", "m3", move |v| {
        field_weight(v, min)
    })
}

fn field_weight(v: f64, min: f64) -> f64 {
    if v.is_finite() && v >= min {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    // Four nodes, two north and two south of the equator.
    fn mesh() -> Mesh {
        Mesh::from_parts(
            "mem",
            vec![0.0, 1.0, 0.0, 1.0],
            vec![1.0, 1.0, -1.0, -1.0],
            vec![[0, 1, 2], [1, 3, 2]],
            vec![0.0, 10.0],
            None,
        )
        .unwrap()
    }

    #[test]
    fn extent_counts_area_above_threshold() {
        let mesh = mesh();
        let data = array![[0.1, 0.9, 1.0, 1.0], [0.2, 0.2, 0.0, 0.0]];
        let ext = ice_ext(&data, &mesh).unwrap();
        assert_eq!(ext.name, "siextentn");
        assert_eq!(ext.len(), 2);
        assert!((ext.values[0] - mesh.node_area[1]).abs() < 1e-6);
        assert!((ext.values[1] - (mesh.node_area[0] + mesh.node_area[1])).abs() < 1e-6);
    }

    #[test]
    fn area_weights_by_concentration() {
        let mesh = mesh();
        let data = array![[0.5, f64::NAN, 1.0, 1.0]];
        let area = ice_area(&data, &mesh).unwrap();
        assert!((area.values[0] - 0.5 * mesh.node_area[0]).abs() < 1e-6);

        let south = IceOptions {
            hemisphere: Hemisphere::South,
            ..IceOptions::default()
        };
        let area = ice_area_with(&data, &mesh, &south).unwrap();
        assert_eq!(area.name, "siareas");
        assert!((area.values[0] - (mesh.node_area[2] + mesh.node_area[3])).abs() < 1e-6);
    }

    #[test]
    fn volume_is_the_same_operator() {
        let mesh = mesh();
        let data = array![[2.0, 3.0, 0.0, 0.0]];
        let vol = ice_vol(&data, &mesh).unwrap();
        let area = ice_area(&data, &mesh).unwrap();
        assert_eq!(vol.values, area.values);
        assert_eq!(vol.units, "m3");
    }

    #[test]
    fn caller_array_untouched() {
        let mesh = mesh();
        let data = array![[0.1, 0.9, 0.5, 0.05]];
        let before = data.clone();
        ice_ext(&data, &mesh).unwrap();
        assert_eq!(data, before);
    }

    #[test]
    fn node_count_must_match_mesh() {
        let mesh = mesh();
        let data = Array2::<f64>::zeros((1, 5));
        match ice_area(&data, &mesh) {
            Err(FesomError::ShapeMismatch { expected, found, .. }) => {
                assert_eq!((expected, found), (4, 5));
            }
            other => panic!("Expected ShapeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn depth_axis_rejected() {
        let mesh = mesh();
        let data = ndarray::Array3::<f64>::zeros((1, 2, 4));
        assert!(matches!(
            ice_vol(&data, &mesh),
            Err(FesomError::InvalidDimensionality { .. })
        ));
    }
}
