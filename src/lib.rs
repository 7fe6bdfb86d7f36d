//! fesom_diag: post-processing of FESOM2 ocean model output
//!
//! A Rust library for reading FESOM2 meshes and results and computing the
//! standard diagnostics on them: sea-ice extent, area and volume, Hovmöller
//! (depth–time) matrices, and mesh areas and volumes per level.
//!
//! ## Key Features
//!
//! - **Mesh loading**: `nod2d.out`, `elem2d.out` and `aux3d.out`, with
//!   rotation to geographic coordinates and an explicit, fingerprinted cache
//! - **Data access**: one variable for one or more years, time-averaged or
//!   per timestep, lazily loaded or materialized
//! - **Diagnostics**: area-weighted integrals over the unstructured mesh,
//!   evaluated in parallel with Rayon
//! - **NetCDF output**: time series, Hovmöller matrices and mesh diagnostics
//!
//! ## Module Organization
//!
//! - [`mesh`]: mesh model, reader, rotation and cache
//! - [`meshdiag`]: per-level node areas and volumes
//! - [`field`]: the canonical field representation and the labeled adapter
//! - [`data`]: the data accessor, [`data::get_data`]
//! - [`data_source`]: the results store abstraction
//! - [`diagnostics`]: sea-ice integrals and Hovmöller aggregation
//! - [`statistics`]: time reductions and area-weighted sums
//! - [`netcdf_io`]: NetCDF reading and writing
//! - [`metadata`]: results directory and mesh inspection
//! - [`parallel`]: thread pool configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fesom_diag::prelude::*;
//!
//! # fn main() -> fesom_diag::Result<()> {
//! let mesh = load_mesh("pi-grid", &MeshConfig::default())?;
//!
//! let a_ice = get_data("pi-results", "a_ice", 1948, &mesh, &DataOptions::default())?;
//! let extent = ice_ext(&a_ice, &mesh)?;
//! println!("{}: {:?}", extent.name, extent.values);
//!
//! let options = DataOptions {
//!     how: How::Ori,
//!     ..DataOptions::default()
//! };
//! let temp = get_data("pi-results", "temp", vec![1948, 1949], &mesh, &options)?;
//! let hovm = hovm_data(&temp, &mesh, None)?;
//! println!("mean temperature: {}", hovm_mean(&hovm));
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod data_source;
pub mod diagnostics;
pub mod errors;
pub mod field;
pub mod mesh;
pub mod meshdiag;
pub mod metadata;
pub mod netcdf_io;
pub mod parallel;
pub mod statistics;

pub use data::{get_data, get_data_from, DataOptions, How, Years};
pub use diagnostics::{
    hovm_data, hovm_mean, ice_area, ice_area_with, ice_ext, ice_ext_with, ice_vol, ice_vol_with,
    Hemisphere, IceOptions, TimeSeries,
};
pub use errors::{FesomError, Result};
pub use field::{AsField, DataArray, Dim, Field, FieldData};
pub use mesh::{load_mesh, Mesh, MeshCache, MeshConfig};
pub use meshdiag::{get_meshdiag, MeshDiag};

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::data::{get_data, DataOptions, How};
    pub use crate::data_source::{MemoryResults, ResultsSource};
    pub use crate::diagnostics::{
        hovm_data, hovm_mean, ice_area, ice_ext, ice_vol, Hemisphere, IceOptions, TimeSeries,
    };
    pub use crate::errors::{FesomError, Result};
    pub use crate::field::{AsField, DataArray, Dim, Field, FieldData};
    pub use crate::mesh::{load_mesh, Mesh, MeshCache, MeshConfig};
    pub use crate::meshdiag::{get_meshdiag, MeshDiag};
    pub use crate::netcdf_io::{NetCDFResults, NetCDFWriter};
    pub use crate::parallel::ParallelConfig;
}
