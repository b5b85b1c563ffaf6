use crate::HomogeneousTransform;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeasurementError {
    #[error("inconsistent measurement input sizes: robot {robot} vs marker {marker}")]
    LengthMismatch { robot: usize, marker: usize },
}

/// One observation: the commanded robot pose and the tracked marker pose
/// recorded at the same physical configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Flange pose in the robot base frame (`M`).
    pub robot_pose: HomogeneousTransform,
    /// Marker pose in the tracker frame (`N`).
    pub marker_pose: HomogeneousTransform,
}

impl Measurement {
    pub fn new(robot_pose: HomogeneousTransform, marker_pose: HomogeneousTransform) -> Self {
        Self {
            robot_pose,
            marker_pose,
        }
    }
}

/// Ordered, immutable collection of measurements for one calibration run.
///
/// Built once (from parsed records, paired pose lists or an iterator) and
/// only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeasurementSet {
    measurements: Vec<Measurement>,
}

impl MeasurementSet {
    pub fn new(measurements: Vec<Measurement>) -> Self {
        Self { measurements }
    }

    /// Pair two equally long pose lists index by index.
    pub fn from_poses(
        robot_poses: &[HomogeneousTransform],
        marker_poses: &[HomogeneousTransform],
    ) -> Result<Self, MeasurementError> {
        if robot_poses.len() != marker_poses.len() {
            return Err(MeasurementError::LengthMismatch {
                robot: robot_poses.len(),
                marker: marker_poses.len(),
            });
        }
        Ok(robot_poses
            .iter()
            .zip(marker_poses)
            .map(|(m, n)| Measurement::new(*m, *n))
            .collect())
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Measurement> {
        self.measurements.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Measurement> {
        self.measurements.iter()
    }

    pub fn as_slice(&self) -> &[Measurement] {
        &self.measurements
    }
}

impl FromIterator<Measurement> for MeasurementSet {
    fn from_iter<I: IntoIterator<Item = Measurement>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a MeasurementSet {
    type Item = &'a Measurement;
    type IntoIter = std::slice::Iter<'a, Measurement>;

    fn into_iter(self) -> Self::IntoIter {
        self.measurements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Mat3, Vec3};

    fn pose(tx: f64) -> HomogeneousTransform {
        HomogeneousTransform::from_parts(&Mat3::identity(), &Vec3::new(tx, 0.0, 0.0))
    }

    #[test]
    fn from_poses_keeps_order() {
        let robot = vec![pose(1.0), pose(2.0), pose(3.0)];
        let marker = vec![pose(-1.0), pose(-2.0), pose(-3.0)];
        let set = MeasurementSet::from_poses(&robot, &marker).unwrap();

        assert_eq!(set.len(), 3);
        let m = set.get(1).unwrap();
        assert_eq!(m.robot_pose.translation().x, 2.0);
        assert_eq!(m.marker_pose.translation().x, -2.0);
        assert!(set.get(3).is_none());
    }

    #[test]
    fn from_poses_rejects_mismatch() {
        let err = MeasurementSet::from_poses(&[pose(1.0)], &[]).unwrap_err();
        assert_eq!(
            err,
            MeasurementError::LengthMismatch {
                robot: 1,
                marker: 0
            }
        );
    }
}
