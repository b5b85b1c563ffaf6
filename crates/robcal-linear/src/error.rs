use robcal_core::Real;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which of the two unknown transforms a value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    /// `X`: flange to marker.
    FlangeToMarker,
    /// `Y`: robot base to tracker.
    BaseToTracker,
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformKind::FlangeToMarker => write!(f, "X (flange to marker)"),
            TransformKind::BaseToTracker => write!(f, "Y (base to tracker)"),
        }
    }
}

/// Fatal calibration failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalibrationError {
    /// Fewer than two measurements: less than 24 equations for 24 unknowns.
    #[error("need at least 2 measurements (12 equations each, 24 unknowns), got {measurements}")]
    Underdetermined { measurements: usize },
    /// A rotation column of a reconstructed transform has zero (or non-finite) norm.
    #[error("rotation column {column} of {transform} has degenerate norm")]
    DegenerateColumn {
        transform: TransformKind,
        column: usize,
    },
    /// Matrix and right-hand side do not describe a valid least-squares problem.
    #[error("invalid system shape: {rows}x{cols} matrix, rhs of length {rhs}")]
    Shape { rows: usize, cols: usize, rhs: usize },
    /// The numerical backend failed.
    #[error("least-squares solve failed: {0}")]
    SolveFailed(String),
}

/// Non-fatal diagnostics attached to a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalibrationWarning {
    /// The stacked system is (numerically) rank deficient: the poses do not
    /// constrain all 24 unknowns and the minimum-norm solution was returned.
    SingularSystem {
        /// Smallest `|R_ii| / max_j |R_jj|` of the QR factor.
        min_pivot_ratio: Real,
        tolerance: Real,
    },
}

impl fmt::Display for CalibrationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationWarning::SingularSystem {
                min_pivot_ratio,
                tolerance,
            } => write!(
                f,
                "rank-deficient system (pivot ratio {:.3e} <= {:.1e}); vary the measurement poses",
                min_pivot_ratio, tolerance
            ),
        }
    }
}
