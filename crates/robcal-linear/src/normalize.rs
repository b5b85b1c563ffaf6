use crate::{CalibrationError, TransformKind};
use robcal_core::{HomogeneousTransform, Mat3, Real};

/// Rescale each rotation column of `transform` to unit length.
///
/// Columns are scaled independently and not re-orthogonalised, so under
/// noise the block is close to, but not exactly, a rotation. A column with
/// zero or non-finite norm is an error.
pub fn normalize_rotation_columns(
    transform: &HomogeneousTransform,
    kind: TransformKind,
) -> Result<HomogeneousTransform, CalibrationError> {
    let mut rot = transform.rotation();
    for (column, mut col) in rot.column_iter_mut().enumerate() {
        let norm = col.norm();
        if norm == 0.0 || !norm.is_finite() {
            return Err(CalibrationError::DegenerateColumn {
                transform: kind,
                column,
            });
        }
        col /= norm;
    }
    Ok(transform.with_rotation(&rot))
}

/// Project a general 3x3 matrix to the closest rotation matrix (SO(3))
/// using SVD.
pub fn project_to_so3(m: &Mat3) -> Result<Mat3, CalibrationError> {
    let svd = m.svd(true, true);
    let u = svd
        .u
        .ok_or_else(|| CalibrationError::SolveFailed("svd failed during projection".into()))?;
    let v_t = svd
        .v_t
        .ok_or_else(|| CalibrationError::SolveFailed("svd failed during projection".into()))?;
    let mut r = u * v_t;

    // Ensure det(R) > 0
    if r.determinant() < 0.0 {
        let mut u_flipped = u;
        u_flipped.column_mut(2).neg_mut();
        r = u_flipped * v_t;
    }
    Ok(r)
}

/// Largest `|c_i . c_j|` over pairs of distinct columns; 0 for an orthonormal block.
pub fn orthogonality_error(rot: &Mat3) -> Real {
    let c = |k: usize| rot.column(k);
    [(0, 1), (0, 2), (1, 2)]
        .iter()
        .map(|&(i, j)| c(i).dot(&c(j)).abs())
        .fold(0.0, Real::max)
}
