//! Hovmöller aggregation: area-weighted horizontal means per depth level

use crate::errors::{FesomError, Result};
use crate::field::{describe_dims, AsField, Dim};
use crate::mesh::Mesh;
use crate::meshdiag::{get_meshdiag, MeshDiag};
use crate::statistics::{nanmean, weighted_mean_rows};
use ndarray::{s, Array2, Axis, Ix3};
use std::borrow::Cow;
use tracing::debug;

/// Reduce a (time, depth, node) field to a (time, depth) matrix
///
/// Each entry is Σ value × area / Σ area over the nodes that have a finite
/// value and a positive area at that depth. Areas are row `k` of
/// `meshdiag.nod_area`; when no diagnostics are given they are computed
/// from the mesh.
///
/// # Errors
///
/// Returns `InvalidDimensionality` when the field has no depth axis,
/// `ShapeMismatch` when its node axis does not match the mesh or it has more
/// depth levels than the diagnostics.
pub fn hovm_data<F: AsField + ?Sized>(
    data: &F,
    mesh: &Mesh,
    meshdiag: Option<&MeshDiag>,
) -> Result<Array2<f64>> {
    let field = data.to_field(mesh)?;
    if !field.has(Dim::Depth) {
        return Err(FesomError::dimensionality(
            "hovm_data",
            format!(
                "expected a 3-D (time, depth, node) field, got {}",
                describe_dims(field.dims())
            ),
        ));
    }
    let values = field.with_time_axis().into_values().into_dimensionality::<Ix3>()?;
    let (ntime, ndepth, _) = values.dim();

    let diag = match meshdiag {
        Some(diag) => Cow::Borrowed(diag),
        None => Cow::Owned(get_meshdiag(mesh, None)?),
    };
    if diag.nod_area.ncols() != mesh.n2d {
        return Err(FesomError::Mismatch {
            what: "nodes".to_string(),
            mesh: mesh.n2d,
            file: diag.nod_area.ncols(),
        });
    }
    if ndepth > diag.nod_area.nrows() {
        return Err(FesomError::shape(
            "depth levels",
            diag.nod_area.nrows(),
            ndepth,
        ));
    }
    let weights = diag.nod_area.slice(s![..ndepth, ..]);

    let mut hovm = Array2::<f64>::zeros((ntime, ndepth));
    for (slab, mut row) in values.axis_iter(Axis(0)).zip(hovm.rows_mut()) {
        row.assign(&weighted_mean_rows(slab, weights));
    }
    debug!(ntime, ndepth, "computed Hovmöller matrix");
    Ok(hovm)
}

/// Mean of the finite entries of a Hovmöller matrix
pub fn hovm_mean(hovm: &Array2<f64>) -> f64 {
    nanmean(hovm.iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, Array3};

    fn mesh() -> Mesh {
        Mesh::from_parts(
            "mem",
            vec![0.0, 1.0, 0.0, 1.0, 2.0],
            vec![0.0, 0.0, 1.0, 1.0, 0.0],
            vec![[0, 1, 2], [1, 3, 2], [1, 4, 3]],
            vec![0.0, 10.0, 30.0, 60.0],
            Some(vec![60.0, 60.0, 60.0, 60.0, 10.0]),
        )
        .unwrap()
    }

    #[test]
    fn constant_field_gives_constant_profile() {
        let mesh = mesh();
        let data = Array3::<f64>::from_elem((2, 3, 5), 4.0);
        let hovm = hovm_data(&data, &mesh, None).unwrap();
        assert_eq!(hovm.dim(), (2, 3));
        assert!(hovm.iter().all(|&v| (v - 4.0).abs() < 1e-12));
        assert!((hovm_mean(&hovm) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn missing_nodes_leave_the_denominator() {
        let mesh = mesh();
        let diag = MeshDiag::compute(&mesh);
        let mut data = Array3::<f64>::from_elem((1, 3, 5), 1.0);
        // Below-bottom values at the shallow node.
        data.slice_mut(s![.., 1.., 4]).fill(f64::NAN);
        data.slice_mut(s![.., 0, 4]).fill(11.0);
        let hovm = hovm_data(&data, &mesh, Some(&diag)).unwrap();

        let area = diag.nod_area.row(0);
        let expected = (area.sum() - area[4] + 11.0 * area[4]) / area.sum();
        assert!((hovm[[0, 0]] - expected).abs() < 1e-9);
        assert!((hovm[[0, 1]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mean_first_matches_mean_after() {
        let mesh = mesh();
        let data = Array::from_shape_fn((3, 3, 5), |(t, k, n)| (t * 7 + k * 3 + n) as f64);
        let per_step = hovm_data(&data, &mesh, None).unwrap();
        let averaged = data.mean_axis(Axis(0)).unwrap().insert_axis(Axis(0));
        let first = hovm_data(&averaged, &mesh, None).unwrap();
        assert_eq!(first.dim(), (1, 3));
        assert!((hovm_mean(&first) - hovm_mean(&per_step)).abs() < 1e-9);
    }

    #[test]
    fn two_dimensional_field_rejected() {
        let mesh = mesh();
        let data = Array2::<f64>::zeros((2, 5));
        match hovm_data(&data, &mesh, None) {
            Err(FesomError::InvalidDimensionality { operation, .. }) => {
                assert_eq!(operation, "hovm_data");
            }
            other => panic!("Expected InvalidDimensionality, got {other:?}"),
        }
    }

    #[test]
    fn too_many_levels() {
        let mesh = mesh();
        let data = Array3::<f64>::zeros((1, 5, 5));
        assert!(matches!(
            hovm_data(&data, &mesh, None),
            Err(FesomError::ShapeMismatch { .. })
        ));
    }
}
