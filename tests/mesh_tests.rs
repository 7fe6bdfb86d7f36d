mod common;

use common::{write_mesh, LEVELS, NODES, SHALLOW};
use fesom_diag::errors::FesomError;
use fesom_diag::mesh::{load_mesh, MeshCache, MeshConfig};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_load_mesh() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_mesh(dir.path());
    let mesh = common::load(dir.path());

    assert_eq!(mesh.n2d, NODES);
    assert_eq!(mesh.e2d, 8);
    assert_eq!(mesh.zlev.to_vec(), LEVELS.to_vec());
    assert_eq!(mesh.layer_depths().to_vec(), vec![5.0, 20.0, 45.0]);
    assert_eq!(mesh.node_levels()[SHALLOW], 2);
    assert_eq!(mesh.node_levels()[0], 4);
    assert_eq!(mesh.lat[3], 1.0);
    assert!(mesh.node_area.iter().all(|&a| a > 0.0));

    // The centre node touches six triangles, a corner one or two.
    assert!(mesh.node_area[4] > mesh.node_area[0]);
}

#[test]
fn test_rotation_changes_coordinates_not_areas() {
    let dir = tempdir().unwrap();
    write_mesh(dir.path());
    let geographic = common::load(dir.path());
    let rotated = load_mesh(dir.path(), &MeshConfig::default()).unwrap();

    assert!((rotated.lat[4] - geographic.lat[4]).abs() > 1.0);
    let relative = (rotated.total_area() - geographic.total_area()).abs() / geographic.total_area();
    assert!(relative < 1e-9);
}

#[test]
fn test_malformed_mesh() {
    let dir = tempdir().unwrap();
    write_mesh(dir.path());
    fs::write(dir.path().join("elem2d.out"), "2\n1 2 3\n1 2 x\n").unwrap();
    match load_mesh(dir.path(), &MeshConfig::geographic()) {
        Err(FesomError::MeshParse { file, line, .. }) => {
            assert!(file.ends_with("elem2d.out"));
            assert_eq!(line, 3);
        }
        other => panic!("Expected MeshParse, got {other:?}"),
    }

    fs::remove_file(dir.path().join("aux3d.out")).unwrap();
    assert!(matches!(
        load_mesh(dir.path(), &MeshConfig::geographic()),
        Err(FesomError::IoError(_)) | Err(FesomError::MeshParse { .. })
    ));
}

#[test]
fn test_mesh_cache() {
    let dir = tempdir().unwrap();
    write_mesh(dir.path());
    let config = MeshConfig::geographic();
    let mut cache = MeshCache::new();
    assert!(cache.is_empty());

    let first = cache.get_or_load(dir.path(), &config).unwrap();
    let again = cache.get_or_load(dir.path(), &config).unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(cache.len(), 1);

    // A different rotation is a different mesh.
    let rotated = cache.get_or_load(dir.path(), &MeshConfig::default()).unwrap();
    assert!(!Arc::ptr_eq(&first, &rotated));
    let geographic = cache.get_or_load(dir.path(), &config).unwrap();
    assert!(!Arc::ptr_eq(&rotated, &geographic));

    // Same values, longer file.
    let nod2d = fs::read_to_string(dir.path().join("nod2d.out")).unwrap();
    fs::write(dir.path().join("nod2d.out"), nod2d.replace(".0 ", ".00 ")).unwrap();
    let reloaded = cache.get_or_load(dir.path(), &config).unwrap();
    assert!(!Arc::ptr_eq(&geographic, &reloaded));
    assert_eq!(reloaded.lon, geographic.lon);

    assert!(cache.invalidate(dir.path()));
    assert!(!cache.invalidate(dir.path()));
    let fresh = cache.get_or_load(dir.path(), &config).unwrap();
    assert!(!Arc::ptr_eq(&reloaded, &fresh));

    cache.clear();
    assert!(cache.is_empty());
}
