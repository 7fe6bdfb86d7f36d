//! Unstructured FESOM2 mesh
//!
//! A [`Mesh`] is read once from a mesh directory holding `nod2d.out`,
//! `elem2d.out` and `aux3d.out`, and is immutable afterwards. Repeated loads
//! of the same directory should go through a [`MeshCache`].

pub mod cache;
pub mod geometry;
pub mod reader;
pub mod rotation;

pub use cache::MeshCache;
pub use rotation::DEFAULT_ABG;

use crate::errors::{FesomError, Result};
use ndarray::Array1;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Options controlling how a mesh directory is interpreted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshConfig {
    /// Euler angles (degrees) of the rotated model frame. `None` means the
    /// node coordinates are already geographic.
    pub abg: Option<[f64; 3]>,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            abg: Some(DEFAULT_ABG),
        }
    }
}

impl MeshConfig {
    /// Configuration for meshes stored in geographic coordinates
    pub fn geographic() -> Self {
        Self { abg: None }
    }
}

/// In-memory representation of a FESOM2 mesh
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Directory the mesh was read from
    pub path: PathBuf,
    /// Number of surface nodes
    pub n2d: usize,
    /// Number of surface elements
    pub e2d: usize,
    /// Geographic longitude of every node, degrees
    pub lon: Array1<f64>,
    /// Geographic latitude of every node, degrees
    pub lat: Array1<f64>,
    /// Node flags from `nod2d.out` (coast/open boundary markers)
    pub node_flags: Vec<i32>,
    /// Zero-based node indices of every element
    pub elem: Vec<[usize; 3]>,
    /// Surface area of each node's control volume, m²
    pub node_area: Array1<f64>,
    /// Depth levels, metres, positive downwards, surface first
    pub zlev: Array1<f64>,
    /// Bottom depth of each node, metres, when `aux3d.out` provides it
    pub topo: Option<Array1<f64>>,
}

impl Mesh {
    /// Assemble a mesh from its parts, validating the invariants
    ///
    /// Node areas are computed from the elements on a sphere of
    /// [`geometry::EARTH_RADIUS`].
    ///
    /// # Errors
    ///
    /// Returns an error when coordinates, elements or levels are inconsistent.
    pub fn from_parts(
        path: impl Into<PathBuf>,
        lon: Vec<f64>,
        lat: Vec<f64>,
        elem: Vec<[usize; 3]>,
        zlev: Vec<f64>,
        topo: Option<Vec<f64>>,
    ) -> Result<Self> {
        let n2d = lon.len();
        if lat.len() != n2d {
            return Err(FesomError::shape("latitudes", n2d, lat.len()));
        }
        if let Some(bad) = elem.iter().flatten().find(|&&i| i >= n2d) {
            return Err(FesomError::InvalidArgument(format!(
                "element references node {bad}, mesh has {n2d} nodes"
            )));
        }
        if zlev.first().is_some_and(|&z| z != 0.0) || zlev.windows(2).any(|w| w[1] <= w[0]) {
            return Err(FesomError::InvalidArgument(
                "depth levels must start at 0 and increase strictly".to_string(),
            ));
        }
        if let Some(topo) = &topo {
            if topo.len() != n2d {
                return Err(FesomError::shape("bottom depths", n2d, topo.len()));
            }
        }

        let node_area = lumped_node_area(&lon, &lat, &elem, |_| true);

        Ok(Self {
            path: path.into(),
            n2d,
            e2d: elem.len(),
            lon: Array1::from(lon),
            lat: Array1::from(lat),
            node_flags: vec![0; n2d],
            elem,
            node_area,
            zlev: Array1::from(zlev),
            topo: topo.map(Array1::from),
        })
    }

    /// Number of depth levels
    pub fn nlev(&self) -> usize {
        self.zlev.len()
    }

    /// Number of layers between depth levels
    pub fn nlayers(&self) -> usize {
        self.zlev.len().saturating_sub(1)
    }

    /// Mid depths of the layers between consecutive levels
    pub fn layer_depths(&self) -> Array1<f64> {
        self.zlev
            .iter()
            .zip(self.zlev.iter().skip(1))
            .map(|(top, bottom)| 0.5 * (top + bottom))
            .collect()
    }

    /// Number of levels that lie at or above the bottom of each node
    ///
    /// Without bottom depths every node spans the full column.
    pub fn node_levels(&self) -> Vec<usize> {
        match &self.topo {
            Some(topo) => topo
                .iter()
                .map(|&bottom| {
                    self.zlev
                        .iter()
                        .take_while(|&&z| z <= bottom + 1e-6)
                        .count()
                })
                .collect(),
            None => vec![self.nlev(); self.n2d],
        }
    }

    /// Total ocean surface area, m²
    pub fn total_area(&self) -> f64 {
        self.node_area.sum()
    }
}

/// Sum one third of each selected element's area onto its nodes.
pub(crate) fn lumped_node_area(
    lon: &[f64],
    lat: &[f64],
    elem: &[[usize; 3]],
    include: impl Fn(usize) -> bool,
) -> Array1<f64> {
    let mut area = Array1::<f64>::zeros(lon.len());
    for (e, nodes) in elem.iter().enumerate() {
        if !include(e) {
            continue;
        }
        let third = element_area(lon, lat, nodes) / 3.0;
        for &n in nodes {
            area[n] += third;
        }
    }
    area
}

pub(crate) fn element_area(lon: &[f64], lat: &[f64], nodes: &[usize; 3]) -> f64 {
    geometry::spherical_triangle_area(
        (*nodes).map(|n| (lon[n], lat[n])),
        geometry::EARTH_RADIUS,
    )
}

/// Load a FESOM2 mesh from a directory
///
/// # Arguments
///
/// * `path` - Directory containing `nod2d.out`, `elem2d.out` and `aux3d.out`
/// * `config` - Coordinate rotation settings
///
/// # Errors
///
/// Returns an error if a mesh file is missing or malformed.
pub fn load_mesh(path: impl AsRef<Path>, config: &MeshConfig) -> Result<Mesh> {
    let dir = path.as_ref();
    info!(path = %dir.display(), "loading mesh");

    let reader::RawNodes {
        mut lon,
        mut lat,
        flags,
    } = reader::read_nodes(dir)?;
    if let Some(abg) = config.abg {
        rotation::rotated_to_geographic(abg, &mut lon, &mut lat);
    }

    let elem = reader::read_elements(dir, lon.len())?;
    let levels = reader::read_levels(dir, lon.len())?;

    let mut mesh = Mesh::from_parts(dir, lon, lat, elem, levels.zlev, levels.topo)?;
    mesh.node_flags = flags;

    debug!(
        n2d = mesh.n2d,
        e2d = mesh.e2d,
        nlev = mesh.nlev(),
        "mesh loaded"
    );
    Ok(mesh)
}
