//! Area-weighted reductions over the node axis
//!
//! These are the building blocks of the sea-ice integrals and of the
//! Hovmöller aggregation. Each row of the input is one horizontal slice
//! (one time step, or one depth level of one time step).

use ndarray::{Array1, ArrayView1, ArrayView2, Zip};

/// Σ transform(value) × weight for every row
///
/// `transform` decides what a node contributes; it must map missing values
/// to zero.
pub fn weighted_sum_rows<F>(values: ArrayView2<f64>, weights: ArrayView1<f64>, transform: F) -> Array1<f64>
where
    F: Fn(f64) -> f64 + Sync,
{
    Zip::from(values.rows()).par_map_collect(|row| {
        row.iter()
            .zip(weights.iter())
            .map(|(&v, &w)| transform(v) * w)
            .sum::<f64>()
    })
}

/// Σ value × w / Σ w for every row, pairing `values` rows with `weights` rows
///
/// A node takes part only where its value is finite and its weight is
/// positive. Rows with no such node give `NaN`.
pub fn weighted_mean_rows(values: ArrayView2<f64>, weights: ArrayView2<f64>) -> Array1<f64> {
    Zip::from(values.rows())
        .and(weights.rows())
        .par_map_collect(|row, area| {
            let (num, den) = row
                .iter()
                .zip(area.iter())
                .filter(|(v, w)| v.is_finite() && **w > 0.0)
                .fold((0.0_f64, 0.0_f64), |(num, den), (&v, &w)| (num + v * w, den + w));
            if den > 0.0 {
                num / den
            } else {
                f64::NAN
            }
        })
}

/// Mean of the finite values, `NaN` when there are none
pub fn nanmean<'a>(values: impl IntoIterator<Item = &'a f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0_f64, 0_usize), |(s, c), &v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn weighted_sum_applies_transform() {
        let values = array![[0.1, 0.5, f64::NAN], [1.0, 1.0, 1.0]];
        let weights = array![1.0, 2.0, 4.0];
        let extent = weighted_sum_rows(values.view(), weights.view(), |v| {
            if v > 0.15 {
                1.0
            } else {
                0.0
            }
        });
        assert_eq!(extent.to_vec(), vec![2.0, 7.0]);
    }

    #[test]
    fn weighted_mean_excludes_missing_nodes() {
        let values = array![[10.0, 20.0, f64::NAN], [5.0, 5.0, 5.0]];
        let weights = array![[1.0, 3.0, 100.0], [0.0, 0.0, 0.0]];
        let mean = weighted_mean_rows(values.view(), weights.view());
        assert_eq!(mean[0], 17.5);
        assert!(mean[1].is_nan());
    }

    #[test]
    fn nanmean_ignores_nan() {
        assert_eq!(nanmean(&[1.0, f64::NAN, 3.0]), 2.0);
        assert!(nanmean(&[f64::NAN]).is_nan());
    }
}
