use crate::{Iso3, Mat3, Mat34, Mat4, Real, Vec3};
use serde::{Deserialize, Serialize};
use std::ops::Mul;
use thiserror::Error;

/// Errors raised when a 4x4 matrix is not a valid homogeneous transform.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    /// The bottom row differs from `[0, 0, 0, 1]`.
    #[error("bottom row must be [0, 0, 0, 1], got {0:?}")]
    BottomRow([Real; 4]),
    /// An entry is NaN or infinite.
    #[error("non-finite entry at ({row}, {col})")]
    NonFinite { row: usize, col: usize },
}

/// 4x4 homogeneous transform `[R | t; 0 0 0 1]`.
///
/// The rotation block `R` is not required to be orthonormal: calibration
/// results are only column-normalised. The bottom row, however, is always
/// exactly `[0, 0, 0, 1]`; every constructor writes it explicitly instead of
/// trusting the input.
///
/// Serialises as a row-major `[[f64; 4]; 4]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[[Real; 4]; 4]", try_from = "[[Real; 4]; 4]")]
pub struct HomogeneousTransform(Mat4);

impl Default for HomogeneousTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl HomogeneousTransform {
    pub fn identity() -> Self {
        Self(Mat4::identity())
    }

    /// Build from a 3x3 block and a translation column.
    pub fn from_parts(rotation: &Mat3, translation: &Vec3) -> Self {
        let mut m = Mat4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
        Self(m)
    }

    /// Build from the upper 3x4 block.
    pub fn from_upper(upper: &Mat34) -> Self {
        let mut m = Mat4::identity();
        m.fixed_view_mut::<3, 4>(0, 0).copy_from(upper);
        Self(m)
    }

    /// Build from the 12 values of the upper 3x4 block in row-major order:
    /// `[r00, r01, r02, t0, r10, r11, r12, t1, r20, r21, r22, t2]`.
    pub fn from_row_major(values: &[Real; 12]) -> Self {
        Self::from_upper(&Mat34::from_row_slice(values))
    }

    pub fn from_isometry(iso: &Iso3) -> Self {
        Self::from_upper(&iso.to_homogeneous().fixed_view::<3, 4>(0, 0).into_owned())
    }

    /// Validate an arbitrary 4x4 matrix.
    ///
    /// The bottom row must be exactly `[0, 0, 0, 1]` and every entry finite.
    pub fn try_from_matrix(m: Mat4) -> Result<Self, TransformError> {
        for row in 0..4 {
            for col in 0..4 {
                if !m[(row, col)].is_finite() {
                    return Err(TransformError::NonFinite { row, col });
                }
            }
        }
        let bottom = [m[(3, 0)], m[(3, 1)], m[(3, 2)], m[(3, 3)]];
        if bottom != [0.0, 0.0, 0.0, 1.0] {
            return Err(TransformError::BottomRow(bottom));
        }
        Ok(Self(m))
    }

    pub fn matrix(&self) -> &Mat4 {
        &self.0
    }

    /// The upper-left 3x3 block.
    pub fn rotation(&self) -> Mat3 {
        self.0.fixed_view::<3, 3>(0, 0).into_owned()
    }

    pub fn translation(&self) -> Vec3 {
        self.0.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Column `k` (0..3) of the rotation block.
    pub fn rotation_column(&self, k: usize) -> Vec3 {
        self.0.fixed_view::<3, 1>(0, k).into_owned()
    }

    /// Same translation, new 3x3 block.
    pub fn with_rotation(&self, rotation: &Mat3) -> Self {
        Self::from_parts(rotation, &self.translation())
    }

    /// General inverse; `None` if the rotation block is singular.
    pub fn try_inverse(&self) -> Option<Self> {
        let r_inv = self.rotation().try_inverse()?;
        let t = -(r_inv * self.translation());
        Some(Self::from_parts(&r_inv, &t))
    }

    /// Row-major copy of all 16 entries.
    pub fn to_rows(&self) -> [[Real; 4]; 4] {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = self.0[(r, c)];
            }
        }
        rows
    }
}

impl Mul for HomogeneousTransform {
    type Output = HomogeneousTransform;

    fn mul(self, rhs: HomogeneousTransform) -> Self::Output {
        let upper = self.0.fixed_view::<3, 4>(0, 0) * rhs.0;
        Self::from_upper(&upper)
    }
}

impl From<HomogeneousTransform> for [[Real; 4]; 4] {
    fn from(t: HomogeneousTransform) -> Self {
        t.to_rows()
    }
}

impl TryFrom<[[Real; 4]; 4]> for HomogeneousTransform {
    type Error = TransformError;

    fn try_from(rows: [[Real; 4]; 4]) -> Result<Self, Self::Error> {
        let mut m = Mat4::zeros();
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                m[(r, c)] = *v;
            }
        }
        Self::try_from_matrix(m)
    }
}
