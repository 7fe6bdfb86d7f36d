//! Mesh diagnostics: horizontal areas and volumes per depth level
//!
//! A [`MeshDiag`] is either computed from the mesh geometry or read from a
//! precomputed `fesom.mesh.diag.nc` file. In both cases `nod_area` row `k`
//! holds the area of every node's control volume at the top of layer `k`,
//! zero where the node lies below the bottom.

use crate::errors::{FesomError, Result};
use crate::mesh::{element_area, lumped_node_area, Mesh};
use crate::netcdf_io::read_named;
use ndarray::{s, Array1, Array2, ArrayView1, Axis};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default file name of precomputed diagnostics inside a mesh directory
pub const MESHDIAG_FILE: &str = "fesom.mesh.diag.nc";

/// Where a [`MeshDiag`] came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagSource {
    Computed,
    File(PathBuf),
}

/// Structured mesh diagnostics dataset
#[derive(Debug, Clone)]
pub struct MeshDiag {
    /// Depth levels, m, positive down (nz)
    pub zbar: Array1<f64>,
    /// Layer mid depths, m, positive down (nz1)
    pub z: Array1<f64>,
    /// Node area per level (nz × n2d), m²
    pub nod_area: Array2<f64>,
    /// Element areas (e2d), m²
    pub elem_area: Array1<f64>,
    /// Node volume per layer (nz1 × n2d), m³
    pub nod_volume: Array2<f64>,
    pub source: DiagSource,
}

impl MeshDiag {
    /// Number of depth levels
    pub fn nz(&self) -> usize {
        self.zbar.len()
    }

    /// Number of layers
    pub fn nz1(&self) -> usize {
        self.z.len()
    }

    /// Node areas at the surface
    pub fn surface_area(&self) -> ArrayView1<f64> {
        self.nod_area.row(0)
    }

    /// Node areas at the top of layer `k`
    pub fn layer_area(&self, k: usize) -> Option<ArrayView1<f64>> {
        (k < self.nod_area.nrows()).then(|| self.nod_area.row(k))
    }

    /// Ocean volume, m³
    pub fn total_volume(&self) -> f64 {
        self.nod_volume.sum()
    }

    fn volumes(zbar: &Array1<f64>, nod_area: &Array2<f64>) -> Array2<f64> {
        let nz1 = zbar.len().saturating_sub(1);
        let mut volume = nod_area.slice(s![..nz1, ..]).to_owned();
        for (k, mut row) in volume.axis_iter_mut(Axis(0)).enumerate() {
            row *= zbar[k + 1] - zbar[k];
        }
        volume
    }

    /// Compute diagnostics from the mesh geometry
    pub fn compute(mesh: &Mesh) -> Self {
        let nz = mesh.nlev();
        let node_levels = mesh.node_levels();
        // An element reaches as deep as its shallowest node.
        let elem_levels: Vec<usize> = mesh
            .elem
            .iter()
            .map(|e| e.iter().map(|&n| node_levels[n]).min().unwrap_or(0))
            .collect();

        let lon = mesh.lon.to_vec();
        let lat = mesh.lat.to_vec();
        let elem_area: Array1<f64> = mesh
            .elem
            .iter()
            .map(|e| element_area(&lon, &lat, e))
            .collect();

        let mut nod_area = Array2::<f64>::zeros((nz.max(1), mesh.n2d));
        nod_area.row_mut(0).assign(&mesh.node_area);
        for k in 1..nz {
            let row = lumped_node_area(&lon, &lat, &mesh.elem, |e| k + 1 < elem_levels[e]);
            nod_area.row_mut(k).assign(&row);
        }

        let zbar = mesh.zlev.clone();
        let nod_volume = Self::volumes(&zbar, &nod_area);
        Self {
            z: mesh.layer_depths(),
            zbar,
            nod_area,
            elem_area,
            nod_volume,
            source: DiagSource::Computed,
        }
    }

    /// Read precomputed diagnostics and check them against the mesh
    ///
    /// # Errors
    ///
    /// Returns `Mismatch` when node, element or level counts disagree with
    /// the mesh, `VariableNotFound` when a required variable is absent.
    pub fn from_file(mesh: &Mesh, path: &Path) -> Result<Self> {
        let file = netcdf::open(path)?;
        let required = |name: &str| {
            read_named(&file, name)?.ok_or_else(|| FesomError::VariableNotFound {
                var: name.to_string(),
            })
        };

        let (zbar, _) = required("zbar")?;
        let zbar: Array1<f64> = zbar.iter().map(|z| z.abs()).collect();
        if zbar.len() != mesh.nlev() {
            return Err(FesomError::Mismatch {
                what: "depth levels".to_string(),
                mesh: mesh.nlev(),
                file: zbar.len(),
            });
        }

        let (nod_area, dims) = required("nod_area")?;
        let nod_area = nod_area.into_dimensionality::<ndarray::Ix2>()?;
        // Accept both (nz, nod_n) and (nod_n, nz) layouts.
        let nod_area = if dims.first().is_some_and(|d| d.starts_with("nod")) {
            nod_area.reversed_axes().as_standard_layout().into_owned()
        } else {
            nod_area
        };
        if nod_area.ncols() != mesh.n2d {
            return Err(FesomError::Mismatch {
                what: "nodes".to_string(),
                mesh: mesh.n2d,
                file: nod_area.ncols(),
            });
        }
        if nod_area.nrows() < zbar.len().saturating_sub(1) {
            return Err(FesomError::Mismatch {
                what: "node area levels".to_string(),
                mesh: zbar.len(),
                file: nod_area.nrows(),
            });
        }
        let nod_area = nod_area.mapv(|a| if a.is_finite() { a } else { 0.0 });

        let (elem_area, _) = required("elem_area")?;
        if elem_area.len() != mesh.e2d {
            return Err(FesomError::Mismatch {
                what: "elements".to_string(),
                mesh: mesh.e2d,
                file: elem_area.len(),
            });
        }
        let elem_area = elem_area.into_dimensionality::<ndarray::Ix1>()?;

        let z: Array1<f64> = match read_named(&file, "Z")? {
            Some((z, _)) => z.iter().map(|z| z.abs()).collect(),
            None => zbar
                .iter()
                .zip(zbar.iter().skip(1))
                .map(|(top, bottom)| 0.5 * (top + bottom))
                .collect(),
        };

        let nod_volume = Self::volumes(&zbar, &nod_area);
        Ok(Self {
            zbar,
            z,
            nod_area,
            elem_area,
            nod_volume,
            source: DiagSource::File(path.to_path_buf()),
        })
    }
}

/// Mesh diagnostics for `mesh`
///
/// # Arguments
///
/// * `mesh` - The mesh the diagnostics describe
/// * `meshdiag` - Optional precomputed diagnostics file; when absent the
///   diagnostics are computed from the mesh geometry
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not match the mesh.
pub fn get_meshdiag(mesh: &Mesh, meshdiag: Option<&Path>) -> Result<MeshDiag> {
    match meshdiag {
        Some(path) => {
            info!(path = %path.display(), "reading mesh diagnostics");
            MeshDiag::from_file(mesh, path)
        }
        None => {
            debug!(n2d = mesh.n2d, nlev = mesh.nlev(), "computing mesh diagnostics");
            Ok(MeshDiag::compute(mesh))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip() -> Mesh {
        // Three triangles; node 4 is shallow, so the last triangle has one layer.
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
    fn surface_row_matches_mesh_areas() {
        let mesh = strip();
        let diag = MeshDiag::compute(&mesh);
        assert_eq!(diag.nz(), 4);
        assert_eq!(diag.nz1(), 3);
        assert_eq!(diag.surface_area(), mesh.node_area.view());
        assert_eq!(diag.source, DiagSource::Computed);
    }

    #[test]
    fn deep_rows_drop_shallow_elements() {
        let mesh = strip();
        let diag = MeshDiag::compute(&mesh);
        // Node 4 only belongs to the shallow triangle.
        assert!(diag.nod_area[[0, 4]] > 0.0);
        assert_eq!(diag.nod_area[[1, 4]], 0.0);
        // Deepest level is never the top of a layer.
        assert!(diag.nod_area.row(3).iter().all(|&a| a == 0.0));
        // Nodes 0 and 2 sit on the deep triangles only.
        assert!((diag.nod_area[[2, 0]] - diag.nod_area[[0, 0]]).abs() < 1e-6);
    }

    #[test]
    fn volumes_use_layer_thickness() {
        let mesh = strip();
        let diag = MeshDiag::compute(&mesh);
        let expected: f64 = (0..3)
            .map(|k| diag.nod_area.row(k).sum() * (diag.zbar[k + 1] - diag.zbar[k]))
            .sum();
        assert!((diag.total_volume() - expected).abs() / expected < 1e-12);
        assert_eq!(diag.layer_area(3).map(|a| a.len()), Some(5));
        assert!(diag.layer_area(4).is_none());
    }
}
