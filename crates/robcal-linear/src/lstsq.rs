//! Least-squares backends for the stacked calibration system.

use crate::CalibrationError;
use log::{debug, warn};
use nalgebra::{DMatrix, DVector};
use robcal_core::Real;

const SVD_MAX_ITERS: usize = 1000;

/// Solution of `min ||A w - b||` with a conditioning indicator.
#[derive(Debug, Clone)]
pub struct LstsqSolution {
    pub w: DVector<Real>,
    /// Smallest `|R_ii| / max_j |R_jj|` of the triangular factor of the
    /// column-equilibrated system (0 if `A = 0`).
    pub min_pivot_ratio: Real,
    /// `min_pivot_ratio` did not exceed the tolerance; `w` is then the
    /// minimum-norm solution.
    pub rank_deficient: bool,
}

/// Capability needed by the calibration from a linear-algebra library.
///
/// Implementations must use an orthogonal factorisation (not the normal
/// equations) and report rank deficiency instead of hiding it.
pub trait LeastSquaresBackend {
    fn solve(
        &self,
        a: &DMatrix<Real>,
        b: &DVector<Real>,
        rank_tolerance: Real,
    ) -> Result<LstsqSolution, CalibrationError>;
}

/// Householder QR with an SVD fallback for rank-deficient systems.
///
/// Columns are scaled to unit norm before factorising, so the rank check
/// does not depend on the units of the unknowns (rotation entries vs.
/// millimetres).
#[derive(Debug, Clone, Copy, Default)]
pub struct HouseholderQr;

impl LeastSquaresBackend for HouseholderQr {
    fn solve(
        &self,
        a: &DMatrix<Real>,
        b: &DVector<Real>,
        rank_tolerance: Real,
    ) -> Result<LstsqSolution, CalibrationError> {
        let (rows, cols) = a.shape();
        if rows < cols || cols == 0 || b.len() != rows {
            return Err(CalibrationError::Shape {
                rows,
                cols,
                rhs: b.len(),
            });
        }

        let scales = column_scales(a);
        let mut scaled = a.clone();
        for (j, s) in scales.iter().enumerate() {
            scaled.column_mut(j).scale_mut(*s);
        }

        let qr = scaled.clone().qr();
        let r = qr.r();
        let pivots = r.diagonal().abs();
        let max_pivot = pivots.max();
        let min_pivot_ratio = if max_pivot > 0.0 {
            pivots.min() / max_pivot
        } else {
            0.0
        };
        // negated so that NaN pivots count as deficient
        let rank_deficient = !(min_pivot_ratio > rank_tolerance);

        let z = if rank_deficient {
            warn!(
                "rank-deficient {}x{} system (pivot ratio {:.3e}); using minimum-norm solution",
                rows, cols, min_pivot_ratio
            );
            min_norm_solve(&scaled, b, rank_tolerance)?
        } else {
            let qtb = qr.q().transpose() * b;
            r.solve_upper_triangular(&qtb).ok_or_else(|| {
                CalibrationError::SolveFailed("singular triangular factor".to_string())
            })?
        };
        let w = z.component_mul(&scales);

        debug!(
            "solved {}x{} least squares, min pivot ratio {:.3e}",
            rows, cols, min_pivot_ratio
        );

        Ok(LstsqSolution {
            w,
            min_pivot_ratio,
            rank_deficient,
        })
    }
}

/// `1 / ||a_j||` per column; zero or non-finite columns keep scale 1.
fn column_scales(a: &DMatrix<Real>) -> DVector<Real> {
    DVector::from_iterator(
        a.ncols(),
        a.column_iter().map(|c| {
            let n = c.norm();
            if n > 0.0 && n.is_finite() {
                1.0 / n
            } else {
                1.0
            }
        }),
    )
}

/// Minimum-norm solution via SVD, truncating singular values below
/// `rank_tolerance * sigma_max`.
fn min_norm_solve(
    a: &DMatrix<Real>,
    b: &DVector<Real>,
    rank_tolerance: Real,
) -> Result<DVector<Real>, CalibrationError> {
    let svd = a
        .clone()
        .try_svd(true, true, Real::EPSILON, SVD_MAX_ITERS)
        .ok_or_else(|| CalibrationError::SolveFailed("svd did not converge".to_string()))?;
    let eps = rank_tolerance.max(Real::EPSILON) * svd.singular_values.max();
    svd.solve(b, eps)
        .map_err(|e| CalibrationError::SolveFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overdetermined_fit() {
        // y = 2 + 3 t sampled without noise
        let t = [0.0, 1.0, 2.0, 3.0, 4.0];
        let a = DMatrix::from_fn(5, 2, |i, j| if j == 0 { 1.0 } else { t[i] });
        let b = DVector::from_iterator(5, t.iter().map(|v| 2.0 + 3.0 * v));

        let sol = HouseholderQr.solve(&a, &b, 1e-10).unwrap();
        assert!(!sol.rank_deficient);
        assert!((sol.w[0] - 2.0).abs() < 1e-12);
        assert!((sol.w[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn least_squares_not_interpolation() {
        // mean of inconsistent observations
        let a = DMatrix::from_element(4, 1, 1.0);
        let b = DVector::from_vec(vec![1.0, 2.0, 3.0, 6.0]);
        let sol = HouseholderQr.solve(&a, &b, 1e-10).unwrap();
        assert!((sol.w[0] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn duplicate_column_is_flagged() {
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
        let b = DVector::from_vec(vec![2.0, 4.0, 6.0]);
        let sol = HouseholderQr.solve(&a, &b, 1e-10).unwrap();

        assert!(sol.rank_deficient);
        assert!(sol.min_pivot_ratio < 1e-10);
        // minimum-norm split of the coefficient 2 over both columns
        assert!((sol.w[0] - 1.0).abs() < 1e-9);
        assert!((sol.w[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn column_units_do_not_affect_rank() {
        // same line fit with the slope column in units 1e6 times larger
        let t = [0.0, 1.0, 2.0, 3.0, 4.0];
        let a = DMatrix::from_fn(5, 2, |i, j| if j == 0 { 1e-4 } else { 1e6 * t[i] });
        let b = DVector::from_iterator(5, t.iter().map(|v| 2.0 + 3.0 * v));

        let sol = HouseholderQr.solve(&a, &b, 1e-10).unwrap();
        assert!(!sol.rank_deficient, "pivot ratio {}", sol.min_pivot_ratio);
        assert!(sol.min_pivot_ratio > 1e-2);
        assert!((sol.w[0] * 1e-4 - 2.0).abs() < 1e-9);
        assert!((sol.w[1] * 1e6 - 3.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_bad_shapes() {
        let wide = DMatrix::<Real>::zeros(2, 3);
        assert!(matches!(
            HouseholderQr.solve(&wide, &DVector::zeros(2), 1e-10),
            Err(CalibrationError::Shape { .. })
        ));
        let tall = DMatrix::<Real>::identity(3, 2);
        assert!(matches!(
            HouseholderQr.solve(&tall, &DVector::zeros(4), 1e-10),
            Err(CalibrationError::Shape { .. })
        ));
    }
}
