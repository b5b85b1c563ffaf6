use nalgebra::{SMatrix, SVector};
use robcal_core::{HomogeneousTransform, Real};

/// Equations contributed by one measurement.
pub const EQUATIONS_PER_MEASUREMENT: usize = 12;
/// Entries of `w`: 12 for `X`, then 12 for `Y`.
pub const UNKNOWNS: usize = 24;

/// 12x24 coefficient block of one measurement.
pub type CoefficientBlock = SMatrix<Real, EQUATIONS_PER_MEASUREMENT, UNKNOWNS>;
/// 12-entry right-hand side of one measurement.
pub type RhsBlock = SVector<Real, EQUATIONS_PER_MEASUREMENT>;

/// Linearise `M X N^-1 = Y` for one measurement.
///
/// With `R = rot(M)`, unknown columns `x_0..x_2, t_x` of `X` and `y_0..y_2, t_y`
/// of `Y`, the rotation rows read `sum_k R x_k N[j,k] - y_j = 0` (block row
/// `j`) and the translation rows `sum_k R x_k s_k + R t_x - t_y = -t_M` with
/// `s_k = -(n_k . t_N)`.
///
/// Inputs are assumed to be valid transforms; nothing is checked here.
pub fn build_row(
    robot: &HomogeneousTransform,
    marker: &HomogeneousTransform,
) -> (CoefficientBlock, RhsBlock) {
    let rot_m = robot.rotation();
    let n = marker.matrix();
    let t_n = marker.translation();

    let mut a = CoefficientBlock::zeros();
    for k in 0..3 {
        let col = 3 * k;
        for j in 0..3 {
            a.fixed_view_mut::<3, 3>(3 * j, col)
                .copy_from(&(rot_m * n[(j, k)]));
        }
        let s_k = -marker.rotation_column(k).dot(&t_n);
        a.fixed_view_mut::<3, 3>(9, col).copy_from(&(rot_m * s_k));
    }

    // translation of X only enters the translation rows
    a.fixed_view_mut::<3, 3>(9, 9).copy_from(&rot_m);

    a.fixed_view_mut::<12, 12>(0, 12)
        .copy_from(&(-SMatrix::<Real, 12, 12>::identity()));

    let mut b = RhsBlock::zeros();
    b.fixed_rows_mut::<3>(9).copy_from(&(-robot.translation()));

    (a, b)
}
