//! Inspection of results directories and meshes
//!
//! Used by the `info` command to show what a run produced before any data
//! is read.

use crate::errors::Result;
use crate::mesh::Mesh;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Variables found in a results directory, each with its sorted years
pub type RecordIndex = BTreeMap<String, Vec<i32>>;

/// Split a results file name `{variable}.{runid}.{year}.nc`
fn parse_record_name<'a>(name: &'a str, runid: &str) -> Option<(&'a str, i32)> {
    let stem = name.strip_suffix(".nc")?;
    let (rest, year) = stem.rsplit_once('.')?;
    let variable = rest.strip_suffix(runid)?.strip_suffix('.')?;
    if variable.is_empty() {
        return None;
    }
    Some((variable, year.parse().ok()?))
}

/// List the records of run `runid` in `results_path`
///
/// Files that do not follow the `{variable}.{runid}.{year}.nc` layout are
/// ignored.
///
/// # Errors
///
/// Returns `IoError` if the directory cannot be read.
pub fn list_records(results_path: impl AsRef<Path>, runid: &str) -> Result<RecordIndex> {
    let mut index = RecordIndex::new();
    for entry in fs::read_dir(results_path.as_ref())? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        match parse_record_name(name, runid) {
            Some((variable, year)) => index.entry(variable.to_string()).or_default().push(year),
            None => debug!(file = name, "skipping file outside the results layout"),
        }
    }
    for years in index.values_mut() {
        years.sort_unstable();
        years.dedup();
    }
    Ok(index)
}

/// Prints the variables of a results directory with their year ranges.
pub fn print_records(index: &RecordIndex) {
    println!("\n Records");
    println!("===========");
    if index.is_empty() {
        println!("   (No records found)");
        return;
    }
    for (variable, years) in index {
        let span = match (years.first(), years.last()) {
            (Some(first), Some(last)) if first != last => format!("{first}-{last}"),
            (Some(first), _) => first.to_string(),
            _ => String::new(),
        };
        println!("    {variable}: {span} ({} years)", years.len());
    }
}

/// Short description of a loaded mesh
#[derive(Debug, Clone, PartialEq)]
pub struct MeshSummary {
    pub nodes: usize,
    pub elements: usize,
    pub levels: usize,
    pub max_depth: f64,
    /// Ocean surface area, m²
    pub surface_area: f64,
    pub lon_range: (f64, f64),
    pub lat_range: (f64, f64),
}

fn range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Summarise a mesh
pub fn describe_mesh(mesh: &Mesh) -> MeshSummary {
    MeshSummary {
        nodes: mesh.n2d,
        elements: mesh.e2d,
        levels: mesh.nlev(),
        max_depth: mesh.zlev.last().copied().unwrap_or(0.0),
        surface_area: mesh.total_area(),
        lon_range: range(mesh.lon.iter().copied()),
        lat_range: range(mesh.lat.iter().copied()),
    }
}

/// Prints a mesh summary.
pub fn print_mesh_summary(mesh: &Mesh) {
    let summary = describe_mesh(mesh);
    println!("\n Mesh: {}", mesh.path.display());
    println!("===========");
    println!("    nodes = {}", summary.nodes);
    println!("    elements = {}", summary.elements);
    println!("    levels = {} (down to {} m)", summary.levels, summary.max_depth);
    println!("    surface area = {:.6e} m2", summary.surface_area);
    println!(
        "    lon = [{:.2}, {:.2}], lat = [{:.2}, {:.2}]",
        summary.lon_range.0, summary.lon_range.1, summary.lat_range.0, summary.lat_range.1
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn record_names() {
        assert_eq!(parse_record_name("temp.fesom.1948.nc", "fesom"), Some(("temp", 1948)));
        assert_eq!(parse_record_name("a.ice.fesom.1950.nc", "fesom"), Some(("a.ice", 1950)));
        assert_eq!(parse_record_name("temp.other.1948.nc", "fesom"), None);
        assert_eq!(parse_record_name("fesom.mesh.diag.nc", "fesom"), None);
        assert_eq!(parse_record_name(".fesom.1948.nc", "fesom"), None);
    }

    #[test]
    fn lists_sorted_years() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "temp.fesom.1949.nc",
            "temp.fesom.1948.nc",
            "a_ice.fesom.1948.nc",
            "notes.txt",
        ] {
            File::create(dir.path().join(name)).unwrap();
        }
        let index = list_records(dir.path(), "fesom").unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index["temp"], vec![1948, 1949]);
        assert_eq!(index["a_ice"], vec![1948]);
    }

    #[test]
    fn summary_of_small_mesh() {
        let mesh = Mesh::from_parts(
            "mem",
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![[0, 1, 2]],
            vec![0.0, 10.0, 25.0],
            None,
        )
        .unwrap();
        let summary = describe_mesh(&mesh);
        assert_eq!((summary.nodes, summary.elements, summary.levels), (3, 1, 3));
        assert_eq!(summary.max_depth, 25.0);
        assert_eq!(summary.lon_range, (0.0, 1.0));
        assert!(summary.surface_area > 0.0);
    }
}
