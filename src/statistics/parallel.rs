//! Parallel computation implementations for statistical operations
//!
//! Non-finite values are skipped; a lane without finite values yields `NaN`.

use crate::errors::Result;
use ndarray::{ArrayD, Axis, Zip};
use tracing::trace;

/// Computes the mean along an axis, one Rayon task per output element
///
/// # Errors
///
/// Returns an error if the axis is invalid.
pub fn parallel_mean_axis(data: &ArrayD<f64>, axis: usize) -> Result<ArrayD<f64>> {
    trace!(
        axis,
        lanes = data.len() / data.len_of(Axis(axis)).max(1),
        threads = rayon::current_num_threads(),
        "parallel mean"
    );

    let result = Zip::from(data.lanes(Axis(axis))).par_map_collect(|lane| {
        let (sum, count) = lane
            .iter()
            .filter(|v| v.is_finite())
            .fold((0.0_f64, 0_usize), |(s, c), &v| (s + v, c + 1));
        if count > 0 {
            sum / count as f64
        } else {
            f64::NAN
        }
    });

    Ok(result)
}

/// Computes the minimum along an axis using `fold_axis`
///
/// # Errors
///
/// Returns an error if the axis is invalid.
pub fn parallel_min_axis(data: &ArrayD<f64>, axis: usize) -> Result<ArrayD<f64>> {
    let result = data.fold_axis(Axis(axis), f64::INFINITY, |&acc, &x| {
        if x.is_finite() {
            acc.min(x)
        } else {
            acc
        }
    });

    // INFINITY marks lanes without any finite value
    Ok(result.mapv(|x| if x == f64::INFINITY { f64::NAN } else { x }))
}

/// Computes the maximum along an axis using `fold_axis`
///
/// # Errors
///
/// Returns an error if the axis is invalid.
pub fn parallel_max_axis(data: &ArrayD<f64>, axis: usize) -> Result<ArrayD<f64>> {
    let result = data.fold_axis(Axis(axis), f64::NEG_INFINITY, |&acc, &x| {
        if x.is_finite() {
            acc.max(x)
        } else {
            acc
        }
    });

    Ok(result.mapv(|x| if x == f64::NEG_INFINITY { f64::NAN } else { x }))
}
