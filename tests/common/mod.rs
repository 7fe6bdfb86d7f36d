//! Synthetic FESOM2 mesh and results shared by the integration tests.
#![allow(dead_code)]

use fesom_diag::mesh::{load_mesh, Mesh, MeshConfig};
use ndarray::{Array2, Array3};
use netcdf::create;
use std::fs;
use std::path::Path;

pub const NODES: usize = 9;
pub const LEVELS: [f64; 4] = [0.0, 10.0, 30.0, 60.0];
pub const MISSING: f64 = -9999.0;
/// Node whose bottom is at the first level
pub const SHALLOW: usize = 8;
pub const TIME: [f64; 2] = [0.0, 182.5];

/// A 3x3 node grid, one row south of the equator and two rows north.
pub fn write_mesh(dir: &Path) {
    let lats = [-1.0, 1.0, 2.0];
    let mut nod2d = format!("{NODES}\n");
    for (r, lat) in lats.iter().enumerate() {
        for c in 0..3 {
            let n = r * 3 + c;
            nod2d.push_str(&format!("{} {}.0 {lat} 0\n", n + 1, c));
        }
    }
    fs::write(dir.join("nod2d.out"), nod2d).expect("Failed to write nod2d.out");

    let mut elems = Vec::new();
    for r in 0..2 {
        for c in 0..2 {
            let a = r * 3 + c + 1;
            elems.push(format!("{} {} {}", a, a + 1, a + 4));
            elems.push(format!("{} {} {}", a, a + 4, a + 3));
        }
    }
    fs::write(
        dir.join("elem2d.out"),
        format!("{}\n{}\n", elems.len(), elems.join("\n")),
    )
    .expect("Failed to write elem2d.out");

    let mut aux3d = format!("{}\n", LEVELS.len());
    for z in LEVELS {
        aux3d.push_str(&format!("-{z}\n"));
    }
    for n in 0..NODES {
        let bottom = if n == SHALLOW { 10.0 } else { 60.0 };
        aux3d.push_str(&format!("{bottom}\n"));
    }
    fs::write(dir.join("aux3d.out"), aux3d).expect("Failed to write aux3d.out");
}

pub fn load(dir: &Path) -> Mesh {
    load_mesh(dir, &MeshConfig::geographic()).expect("Failed to load mesh")
}

pub fn ice_value(year: i32, t: usize, n: usize) -> f64 {
    let base = [0.0, 0.1, 0.9, 0.5, 0.95, 0.2, 1.0, 0.16, 0.6][n];
    (base * (1.0 - 0.1 * t as f64) + 0.01 * f64::from(year - 1948)).min(1.0)
}

pub fn temp_value(year: i32, t: usize, n: usize, k: usize) -> f64 {
    if n == SHALLOW && k > 0 {
        return MISSING;
    }
    10.0 - 2.0 * k as f64 + 0.1 * n as f64 + 0.5 * t as f64 + f64::from(year - 1948)
}

/// Write a `(time, nod2)` record in FESOM2 layout
pub fn write_surface(dir: &Path, variable: &str, year: i32, values: &Array2<f64>) {
    let path = dir.join(format!("{variable}.fesom.{year}.nc"));
    let mut file = create(&path).expect("Failed to create NetCDF file");
    file.add_dimension("time", values.nrows())
        .expect("Failed to add dimension time");
    file.add_dimension("nod2", values.ncols())
        .expect("Failed to add dimension nod2");

    let mut time = file
        .add_variable::<f64>("time", &["time"])
        .expect("Failed to add time");
    time.put(ndarray::ArrayView1::from(&TIME[..values.nrows()]), ..)
        .expect("Failed to write time");

    let mut var = file
        .add_variable::<f64>(variable, &["time", "nod2"])
        .expect("Failed to add variable");
    var.put_attribute("units", "m").expect("Failed to add units");
    var.put(values.view(), ..).expect("Failed to write data");
}

/// Write a `(time, nod2, nz1)` record in FESOM2 layout, with a
/// `missing_value` below the bottom
pub fn write_volume(dir: &Path, variable: &str, year: i32, values: &Array3<f64>) {
    let path = dir.join(format!("{variable}.fesom.{year}.nc"));
    let (ntime, nodes, layers) = values.dim();
    let mut file = create(&path).expect("Failed to create NetCDF file");
    file.add_dimension("time", ntime)
        .expect("Failed to add dimension time");
    file.add_dimension("nod2", nodes)
        .expect("Failed to add dimension nod2");
    file.add_dimension("nz1", layers)
        .expect("Failed to add dimension nz1");

    let mut time = file
        .add_variable::<f64>("time", &["time"])
        .expect("Failed to add time");
    time.put(ndarray::ArrayView1::from(&TIME[..ntime]), ..)
        .expect("Failed to write time");

    let mut var = file
        .add_variable::<f64>(variable, &["time", "nod2", "nz1"])
        .expect("Failed to add variable");
    var.put_attribute("units", "degC")
        .expect("Failed to add units");
    var.put_attribute("missing_value", MISSING)
        .expect("Failed to add missing_value");
    var.put(values.view(), ..).expect("Failed to write data");
}

/// Mesh directory plus `a_ice`, `m_ice` and `temp` for 1948 and 1949
pub fn write_run(mesh_dir: &Path, results_dir: &Path) {
    write_mesh(mesh_dir);
    for year in [1948, 1949] {
        let a_ice = Array2::from_shape_fn((2, NODES), |(t, n)| ice_value(year, t, n));
        write_surface(results_dir, "a_ice", year, &a_ice);
        write_surface(results_dir, "m_ice", year, &a_ice.mapv(|a| 2.5 * a));

        let temp = Array3::from_shape_fn((2, NODES, 3), |(t, n, k)| temp_value(year, t, n, k));
        write_volume(results_dir, "temp", year, &temp);
    }
}
