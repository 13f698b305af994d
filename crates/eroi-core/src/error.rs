//! Unified error types for the EROI workspace
//!
//! Every library operation returns [`EroiResult`]. The variants separate the
//! failure classes the pipeline treats differently: label and shape problems
//! are fatal for a year, numerical degeneracy of a pseudo-inverse is reported
//! as [`EroiError::SingularMatrix`], and configuration errors are raised before
//! any matrix algebra starts.
//!
//! # Example
//!
//! ```ignore
//! use eroi_core::{EroiError, EroiResult};
//!
//! fn run_year(year: i32) -> EroiResult<()> {
//!     let system = load_system(year)?;
//!     upstream_impact(&system, &partition, &options)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Which side of a labeled matrix an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Rows,
    Columns,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Rows => write!(f, "rows"),
            Axis::Columns => write!(f, "columns"),
        }
    }
}

/// Unified error type for all EROI operations.
#[derive(Error, Debug)]
pub enum EroiError {
    /// A requested label or sector does not exist on the given axis
    #[error("Label not found on {axis}: {label}")]
    LabelNotFound { axis: Axis, label: String },

    /// Operand labels or dimensions disagree
    #[error("Shape mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    /// Pseudo-inversion produced a non-finite result
    #[error("Singular matrix: {0}")]
    SingularMatrix(String),

    /// Invalid sector lists, scenarios or pipeline settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

impl EroiError {
    pub fn label_not_found(axis: Axis, label: impl std::fmt::Display) -> Self {
        EroiError::LabelNotFound {
            axis,
            label: label.to_string(),
        }
    }

    pub fn shape_mismatch(
        context: impl Into<String>,
        expected: impl std::fmt::Display,
        found: impl std::fmt::Display,
    ) -> Self {
        EroiError::ShapeMismatch {
            context: context.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

/// Convenience type alias for Results using EroiError.
pub type EroiResult<T> = Result<T, EroiError>;
