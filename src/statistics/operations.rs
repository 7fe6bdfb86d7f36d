//! Core statistical operations and traits

use crate::errors::{FesomError, Result};
use ndarray::{ArrayD, Axis};

/// Supported reductions over an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatOperation {
    /// Arithmetic mean of the finite values
    Mean,
    /// Minimum of the finite values
    Min,
    /// Maximum of the finite values
    Max,
}

impl StatOperation {
    /// Get the string representation of the operation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Min => "minimum",
            Self::Max => "maximum",
        }
    }
}

/// Trait for types that can perform statistical reductions along an axis
pub trait StatisticalReduction<T> {
    /// Reduce along `axis`, removing it from the result
    ///
    /// # Errors
    ///
    /// Returns an error if the axis is out of bounds for the array.
    fn reduce_along_axis(&self, axis: usize, operation: StatOperation) -> Result<ArrayD<T>>;

    /// Reduce along `axis`, keeping it with length one
    ///
    /// # Errors
    ///
    /// Returns an error if the axis is out of bounds for the array.
    fn reduce_keep_axis(&self, axis: usize, operation: StatOperation) -> Result<ArrayD<T>> {
        Ok(self
            .reduce_along_axis(axis, operation)?
            .insert_axis(Axis(axis)))
    }
}

impl StatisticalReduction<f64> for ArrayD<f64> {
    fn reduce_along_axis(&self, axis: usize, operation: StatOperation) -> Result<ArrayD<f64>> {
        if axis >= self.ndim() {
            return Err(FesomError::InvalidArgument(format!(
                "Axis {axis} is out of bounds for array with {} dimensions",
                self.ndim()
            )));
        }

        match operation {
            StatOperation::Mean => super::parallel::parallel_mean_axis(self, axis),
            StatOperation::Min => super::parallel::parallel_min_axis(self, axis),
            StatOperation::Max => super::parallel::parallel_max_axis(self, axis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn keep_axis_preserves_rank() {
        let data = array![[1.0, 2.0], [3.0, 6.0]].into_dyn();
        let mean = data.reduce_keep_axis(0, StatOperation::Mean).unwrap();
        assert_eq!(mean.shape(), &[1, 2]);
        assert_eq!(mean[[0, 0]], 2.0);
        assert_eq!(mean[[0, 1]], 4.0);
    }

    #[test]
    fn axis_out_of_bounds() {
        let data = array![1.0, 2.0].into_dyn();
        assert!(data.reduce_along_axis(1, StatOperation::Max).is_err());
    }

    #[test]
    fn names() {
        assert_eq!(StatOperation::Mean.as_str(), "mean");
        assert_eq!(format!("{:?}", StatOperation::Min), "Min");
    }
}
