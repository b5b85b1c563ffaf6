//! Deterministic synthetic robot/tracker data.
//!
//! Robot poses follow smooth trigonometric sequences so that consecutive
//! poses rotate about different axes. Marker poses are generated from a
//! ground-truth pair `(X, Y)` through `N = Y^-1 M X`, optionally perturbed by
//! deterministic noise. Nothing here depends on an RNG crate, so datasets are
//! stable across versions and platforms.
//!
//! # Example
//!
//! ```
//! use robcal_core::synthetic::{measurements_from_ground_truth, robot_poses};
//! use robcal_core::Iso3;
//!
//! let x = Iso3::translation(0.0, 0.0, 120.0);
//! let y = Iso3::translation(1500.0, -200.0, 300.0);
//! let set = measurements_from_ground_truth(&robot_poses(6), &x, &y, None);
//! assert_eq!(set.len(), 6);
//! ```

use crate::{HomogeneousTransform, Iso3, Measurement, MeasurementSet, Real};
use nalgebra::{Rotation3, Translation3, UnitQuaternion, Vector3};

/// `n` flange poses spread over a ~400 mm workspace with varied orientations.
pub fn robot_poses(n: usize) -> Vec<Iso3> {
    (0..n)
        .map(|k| {
            let kf = k as Real;
            let roll = 0.5 * (1.7 * kf + 0.3).sin();
            let pitch = 0.4 * (0.9 * kf + 0.5).cos();
            let yaw = 0.8 * (0.6 * kf + 1.0).sin();
            let rot = Rotation3::from_euler_angles(roll, pitch, yaw);
            let tr = Translation3::new(
                400.0 + 150.0 * (0.7 * kf).cos(),
                -100.0 + 200.0 * (1.1 * kf + 0.2).sin(),
                600.0 + 120.0 * (0.5 * kf + 0.4).cos(),
            );
            Iso3::from_parts(tr, rot.into())
        })
        .collect()
}

/// Deterministic bounded perturbation applied to marker poses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseNoise {
    /// Base seed controlling the pseudo-random sequence.
    pub seed: u64,
    /// Maximum rotation angle of the perturbation (radians).
    pub max_angle: Real,
    /// Maximum absolute per-axis translation offset.
    pub max_offset: Real,
}

impl PoseNoise {
    /// Perturbation for the pose with index `idx`.
    pub fn sample(&self, idx: usize) -> Iso3 {
        let key = splitmix64(self.seed ^ (idx as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let mut state = key;
        let mut next = || {
            state = splitmix64(state);
            2.0 * u64_to_unit(state) - 1.0
        };

        let axis = Vector3::new(next(), next(), next());
        let angle = self.max_angle.abs() * next();
        let rot = if axis.norm() > 1e-12 {
            UnitQuaternion::from_scaled_axis(axis.normalize() * angle)
        } else {
            UnitQuaternion::identity()
        };
        let m = self.max_offset.abs();
        let tr = Translation3::new(m * next(), m * next(), m * next());
        Iso3::from_parts(tr, rot)
    }
}

/// Build measurements satisfying `M X = Y N` for each robot pose `M`.
///
/// `x` is the flange-to-marker transform and `y` the base-to-tracker transform.
pub fn measurements_from_ground_truth(
    robot: &[Iso3],
    x: &Iso3,
    y: &Iso3,
    noise: Option<&PoseNoise>,
) -> MeasurementSet {
    let y_inv = y.inverse();
    robot
        .iter()
        .enumerate()
        .map(|(idx, m)| {
            let mut n = y_inv * m * x;
            if let Some(noise) = noise {
                n *= noise.sample(idx);
            }
            Measurement::new(
                HomogeneousTransform::from_isometry(m),
                HomogeneousTransform::from_isometry(&n),
            )
        })
        .collect()
}

#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[inline]
fn u64_to_unit(x: u64) -> Real {
    // 53 high bits -> [0, 1)
    (x >> 11) as Real * (1.0 / (1u64 << 53) as Real)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_pairs_satisfy_relation() {
        let x = Iso3::from_parts(
            Translation3::new(5.0, -3.0, 80.0),
            Rotation3::from_euler_angles(0.1, 0.2, -0.3).into(),
        );
        let y = Iso3::from_parts(
            Translation3::new(1200.0, 50.0, -40.0),
            Rotation3::from_euler_angles(-0.2, 0.05, 1.2).into(),
        );
        let hx = HomogeneousTransform::from_isometry(&x);
        let hy = HomogeneousTransform::from_isometry(&y);

        let set = measurements_from_ground_truth(&robot_poses(5), &x, &y, None);
        for meas in &set {
            let lhs = meas.robot_pose * hx;
            let rhs = hy * meas.marker_pose;
            assert!((lhs.matrix() - rhs.matrix()).norm() < 1e-9);
        }
    }

    #[test]
    fn noise_is_deterministic_and_bounded() {
        let noise = PoseNoise {
            seed: 42,
            max_angle: 1e-3,
            max_offset: 0.05,
        };
        let a = noise.sample(3);
        let b = noise.sample(3);
        assert_eq!(a, b);
        assert_ne!(a, noise.sample(4));
        assert!(a.rotation.angle() <= 1e-3 + 1e-15);
        let t = a.translation.vector;
        assert!(t.iter().all(|v| v.abs() <= 0.05));
    }
}
