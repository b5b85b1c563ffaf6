use crate::{CalibrationError, UNKNOWNS};
use nalgebra::{DVector, SVector};
use robcal_core::{HomogeneousTransform, Mat3, Real, Vec3};

/// 12 parameters of one unknown transform: rotation columns 0..2, then translation.
pub type Segment = SVector<Real, 12>;

/// Turn a 12-entry segment of the solution into a transform.
///
/// Entries `0..3`, `3..6`, `6..9` are the rotation columns, `9..12` the
/// translation; the bottom row is set to `[0, 0, 0, 1]`.
pub fn decode(segment: &Segment) -> HomogeneousTransform {
    let rotation = Mat3::from_column_slice(&segment.as_slice()[..9]);
    let translation = Vec3::new(segment[9], segment[10], segment[11]);
    HomogeneousTransform::from_parts(&rotation, &translation)
}

/// Inverse of [`decode`].
pub fn encode(transform: &HomogeneousTransform) -> Segment {
    let rotation = transform.rotation();
    let translation = transform.translation();
    Segment::from_iterator(rotation.iter().chain(translation.iter()).copied())
}

/// Split `w` into the `X` and `Y` segments.
pub fn split_solution(w: &DVector<Real>) -> Result<(Segment, Segment), CalibrationError> {
    if w.len() != UNKNOWNS {
        return Err(CalibrationError::Shape {
            rows: w.len(),
            cols: 1,
            rhs: UNKNOWNS,
        });
    }
    let x = Segment::from_iterator(w.rows(0, 12).iter().copied());
    let y = Segment::from_iterator(w.rows(12, 12).iter().copied());
    Ok((x, y))
}
