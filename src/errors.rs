//! Centralized error handling for fesom_diag
//!
//! Every fallible operation in the crate returns [`Result`], carrying a
//! [`FesomError`] that says which input was wrong and how.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for fesom_diag operations
#[derive(Debug, Error)]
pub enum FesomError {
    /// NetCDF file operation errors
    #[error("NetCDF error: {0}")]
    NetCDFError(#[from] netcdf::Error),

    /// I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Array shape or dimension error
    #[error("Array error: {0}")]
    ArrayError(#[from] ndarray::ShapeError),

    /// Malformed mesh file
    #[error("Failed to parse {}:{line}: {message}", file.display())]
    MeshParse {
        file: PathBuf,
        line: usize,
        message: String,
    },

    /// Requested year has no record in the results store
    #[error("No record for variable '{variable}' in year {year} (looked for {})", path.display())]
    NotFound {
        variable: String,
        year: i32,
        path: PathBuf,
    },

    /// Variable missing from an opened file
    #[error("Variable '{var}' not found in file")]
    VariableNotFound { var: String },

    /// Dimension name that cannot be mapped to time, depth or node
    #[error("Dimension '{dim}' of variable '{var}' is not supported")]
    UnknownDimension { var: String, dim: String },

    /// Field shape does not fit the mesh
    #[error("Shape mismatch for {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    /// Precomputed diagnostics disagree with the mesh
    #[error("Mesh diagnostics mismatch for {what}: mesh has {mesh}, file has {file}")]
    Mismatch {
        what: String,
        mesh: usize,
        file: usize,
    },

    /// Wrong number or kind of dimensions for an operation
    #[error("Invalid input for {operation}: {message}")]
    InvalidDimensionality { operation: String, message: String },

    /// Parameter value outside of its domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Thread pool configuration error
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),
}

impl FesomError {
    pub(crate) fn shape(what: impl Into<String>, expected: usize, found: usize) -> Self {
        FesomError::ShapeMismatch {
            what: what.into(),
            expected,
            found,
        }
    }

    pub(crate) fn dimensionality(operation: &str, message: impl Into<String>) -> Self {
        FesomError::InvalidDimensionality {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for fesom_diag operations
pub type Result<T> = std::result::Result<T, FesomError>;
