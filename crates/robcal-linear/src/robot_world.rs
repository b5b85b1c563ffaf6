//! Simultaneous tool/flange and robot/world calibration (QR24).

use crate::{
    assemble, decode, normalize_rotation_columns, orthogonality_error, project_to_so3,
    split_solution, CalibrationError, CalibrationWarning, HouseholderQr, LeastSquaresBackend,
    TransformKind,
};
use log::{debug, info, warn};
use robcal_core::{HomogeneousTransform, MeasurementSet, Real};
use serde::{Deserialize, Serialize};

/// How the rotation blocks of the solution are post-processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orthonormalization {
    /// Scale each rotation column to unit length; columns stay as solved otherwise.
    #[default]
    ColumnScale,
    /// Column scaling followed by projection onto the closest proper rotation.
    ProjectSo3,
}

/// Options for [`calibrate_with`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationOptions {
    /// Relative pivot threshold below which the system counts as rank deficient.
    pub rank_tolerance: Real,
    pub orthonormalization: Orthonormalization,
}

impl Default for CalibrationOptions {
    fn default() -> Self {
        Self {
            rank_tolerance: 1e-10,
            orthonormalization: Orthonormalization::ColumnScale,
        }
    }
}

/// Quality indicators of a solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveDiagnostics {
    pub measurements: usize,
    pub equations: usize,
    /// RMS of `A w - b` over all equations (before normalisation).
    pub residual_rms: Real,
    /// Residual RMS of each measurement's equations, in input order.
    pub per_measurement_residual: Vec<Real>,
    pub min_pivot_ratio: Real,
    /// Largest `|c_i . c_j|` between rotation columns of the returned `X`.
    pub orthogonality_error_x: Real,
    /// Largest `|c_i . c_j|` between rotation columns of the returned `Y`.
    pub orthogonality_error_y: Real,
    pub warnings: Vec<CalibrationWarning>,
}

/// Calibration answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// Flange to marker.
    pub x: HomogeneousTransform,
    /// Robot base to tracker.
    pub y: HomogeneousTransform,
    pub diagnostics: SolveDiagnostics,
}

impl CalibrationResult {
    pub fn has_warnings(&self) -> bool {
        !self.diagnostics.warnings.is_empty()
    }
}

/// Estimate `X` and `Y` from `M_i X = Y N_i` with default options.
///
/// Needs at least two measurements; poses should rotate about different
/// axes, otherwise the result carries [`CalibrationWarning::SingularSystem`].
pub fn calibrate(measurements: &MeasurementSet) -> Result<CalibrationResult, CalibrationError> {
    calibrate_with(measurements, &CalibrationOptions::default(), &HouseholderQr)
}

/// [`calibrate`] with explicit options and least-squares backend.
pub fn calibrate_with<B>(
    measurements: &MeasurementSet,
    opts: &CalibrationOptions,
    backend: &B,
) -> Result<CalibrationResult, CalibrationError>
where
    B: LeastSquaresBackend + ?Sized,
{
    let system = assemble(measurements)?;
    let solution = backend.solve(&system.a, &system.b, opts.rank_tolerance)?;

    let mut warnings = Vec::new();
    if solution.rank_deficient {
        let warning = CalibrationWarning::SingularSystem {
            min_pivot_ratio: solution.min_pivot_ratio,
            tolerance: opts.rank_tolerance,
        };
        warn!("{}", warning);
        warnings.push(warning);
    }

    let (seg_x, seg_y) = split_solution(&solution.w)?;
    let mut x = normalize_rotation_columns(&decode(&seg_x), TransformKind::FlangeToMarker)?;
    let mut y = normalize_rotation_columns(&decode(&seg_y), TransformKind::BaseToTracker)?;

    if opts.orthonormalization == Orthonormalization::ProjectSo3 {
        x = x.with_rotation(&project_to_so3(&x.rotation())?);
        y = y.with_rotation(&project_to_so3(&y.rotation())?);
        debug!("projected rotation blocks onto SO(3)");
    }

    let diagnostics = SolveDiagnostics {
        measurements: system.measurements(),
        equations: system.a.nrows(),
        residual_rms: system.residual_rms(&solution.w),
        per_measurement_residual: system.block_rms(&solution.w),
        min_pivot_ratio: solution.min_pivot_ratio,
        orthogonality_error_x: orthogonality_error(&x.rotation()),
        orthogonality_error_y: orthogonality_error(&y.rotation()),
        warnings,
    };

    info!(
        "calibrated from {} measurements: residual rms {:.3e}, orthogonality X {:.2e} Y {:.2e}",
        diagnostics.measurements,
        diagnostics.residual_rms,
        diagnostics.orthogonality_error_x,
        diagnostics.orthogonality_error_y
    );

    Ok(CalibrationResult { x, y, diagnostics })
}
