//! Statistical reductions used by the data accessor and the diagnostics
//!
//! # Organization
//!
//! - [`operations`]: reduction kinds and the [`StatisticalReduction`] trait
//! - [`parallel`]: Rayon-backed reductions along one axis
//! - [`weighted`]: area-weighted sums and means over the node axis

pub mod operations;
pub mod parallel;
pub mod weighted;

pub use operations::{StatOperation, StatisticalReduction};
pub use parallel::{parallel_max_axis, parallel_mean_axis, parallel_min_axis};
pub use weighted::{nanmean, weighted_mean_rows, weighted_sum_rows};
