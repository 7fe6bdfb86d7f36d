//! Diagnostics derived from fields on the mesh
//!
//! - [`ice`]: sea-ice extent, area and volume integrals
//! - [`hovm`]: depth–time (Hovmöller) aggregation of 3-D fields

pub mod hovm;
pub mod ice;

pub use hovm::{hovm_data, hovm_mean};
pub use ice::{
    ice_area, ice_area_with, ice_ext, ice_ext_with, ice_vol, ice_vol_with, Hemisphere, IceOptions,
    TimeSeries,
};
