//! Explicit, caller-owned cache of parsed meshes.
//!
//! Entries are keyed by the canonical mesh directory and remember a
//! fingerprint of the mesh files. A changed file or a different
//! [`MeshConfig`] forces a reload.

use super::{load_mesh, reader, Mesh, MeshConfig};
use crate::errors::Result;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

/// Size and modification time of the files a mesh is built from, plus the
/// configuration it was built with.
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    files: Vec<(u64, Option<SystemTime>)>,
    config: MeshConfig,
}

impl Fingerprint {
    /// Fingerprint the mesh files of `dir`
    ///
    /// # Errors
    ///
    /// Returns an I/O error if one of the mesh files cannot be inspected.
    pub fn of(dir: &Path, config: &MeshConfig) -> Result<Self> {
        let files = [reader::NOD2D_FILE, reader::ELEM2D_FILE, reader::AUX3D_FILE]
            .iter()
            .map(|name| {
                let meta = fs::metadata(dir.join(name))?;
                Ok((meta.len(), meta.modified().ok()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            files,
            config: *config,
        })
    }
}

#[derive(Debug)]
struct Entry {
    fingerprint: Fingerprint,
    mesh: Arc<Mesh>,
}

/// Cache of loaded meshes
#[derive(Debug, Default)]
pub struct MeshCache {
    entries: HashMap<PathBuf, Entry>,
}

impl MeshCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached mesh for `path`, loading it if it is absent or stale
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh files cannot be read or parsed.
    pub fn get_or_load(&mut self, path: impl AsRef<Path>, config: &MeshConfig) -> Result<Arc<Mesh>> {
        let key = fs::canonicalize(path.as_ref())?;
        let fingerprint = Fingerprint::of(&key, config)?;

        if let Some(entry) = self.entries.get(&key) {
            if entry.fingerprint == fingerprint {
                debug!(path = %key.display(), "mesh cache hit");
                return Ok(Arc::clone(&entry.mesh));
            }
            debug!(path = %key.display(), "mesh files changed, reloading");
        }

        let mesh = Arc::new(load_mesh(&key, config)?);
        self.entries.insert(
            key,
            Entry {
                fingerprint,
                mesh: Arc::clone(&mesh),
            },
        );
        Ok(mesh)
    }

    /// Drop the entry for `path`. Returns whether an entry was present.
    pub fn invalidate(&mut self, path: impl AsRef<Path>) -> bool {
        let key = fs::canonicalize(path.as_ref()).unwrap_or_else(|_| path.as_ref().to_path_buf());
        self.entries.remove(&key).is_some()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
