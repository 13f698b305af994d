//! # eroi-core: Labeled Input-Output Tables
//!
//! Fundamental data structures shared by the EROI pipeline crates.
//!
//! ## Design
//!
//! Multi-regional input-output tables are dense matrices whose axes are
//! tagged by compound labels. Later stages join results by label, never by
//! position, so every matrix carries a [`LabelIndex`] per axis:
//!
//! - [`Label`] - a multi-level key such as `("DE", "Wheat")`
//! - [`LabelIndex`] - ordered label registry (label → position)
//! - [`LabeledMatrix`] - `faer::Mat<f64>` plus row and column registries
//! - [`RegionTable`] - immutable ISO3 → continent/subcontinent lookup
//! - [`Diagnostics`] - auditable record of recovered data-quality issues
//! - [`EroiError`] - unified error type
//!
//! ## Quick Start
//!
//! ```rust
//! use eroi_core::{Label, LabelIndex, LabeledMatrix};
//!
//! let sectors = LabelIndex::region_sector(vec![
//!     Label::pair("AT", "Wheat"),
//!     Label::pair("AT", "Sugar"),
//! ])
//! .unwrap();
//! let a = LabeledMatrix::from_rows(
//!     sectors.clone(),
//!     sectors,
//!     &[vec![0.0, 0.2], vec![0.3, 0.0]],
//! )
//! .unwrap();
//! assert!(a.is_square());
//! assert_eq!(a.get(&Label::pair("AT", "Wheat"), &Label::pair("AT", "Sugar")).unwrap(), 0.2);
//! ```

pub mod diagnostics;
pub mod error;
pub mod labels;
pub mod matrix;
pub mod regions;

pub use diagnostics::{DiagnosticIssue, Diagnostics};
pub use error::{Axis, EroiError, EroiResult};
pub use labels::{Label, LabelIndex, REGION_LEVEL, SECTOR_LEVEL};
pub use matrix::LabeledMatrix;
pub use regions::{RegionInfo, RegionTable};
