use nalgebra::{Rotation3, Translation3};
use robcal_core::synthetic::{measurements_from_ground_truth, robot_poses, PoseNoise};
use robcal_core::{HomogeneousTransform, Iso3, Mat3, Real};
use robcal_linear::{
    calibrate, calibrate_with, CalibrationOptions, HouseholderQr, Orthonormalization,
};

fn make_iso(angles: (Real, Real, Real), t: (Real, Real, Real)) -> Iso3 {
    let rot = Rotation3::from_euler_angles(angles.0, angles.1, angles.2);
    let tr = Translation3::new(t.0, t.1, t.2);
    Iso3::from_parts(tr, rot.into())
}

/// Rotation block difference (Frobenius) and translation distance.
fn pose_error(est: &HomogeneousTransform, gt: &Iso3) -> (Real, Real) {
    let gt = HomogeneousTransform::from_isometry(gt);
    let dr = (est.rotation() - gt.rotation()).norm();
    let dt = (est.translation() - gt.translation()).norm();
    (dr, dt)
}

fn noisy_set() -> (Iso3, Iso3, robcal_core::MeasurementSet) {
    let x_gt = make_iso((0.15, -0.2, 0.4), (12.0, -4.0, 110.0));
    let y_gt = make_iso((0.05, -0.1, 2.0), (1100.0, 250.0, -80.0));
    let noise = PoseNoise {
        seed: 7,
        max_angle: 1e-4,
        max_offset: 0.05,
    };
    let set = measurements_from_ground_truth(&robot_poses(12), &x_gt, &y_gt, Some(&noise));
    (x_gt, y_gt, set)
}

#[test]
fn noisy_data_recovers_close_estimate() {
    let (x_gt, y_gt, set) = noisy_set();
    let res = calibrate(&set).unwrap();

    let (drx, dtx) = pose_error(&res.x, &x_gt);
    let (dry, dty) = pose_error(&res.y, &y_gt);
    println!(
        "X: dR {:.3e}, dt {:.3e} mm | Y: dR {:.3e}, dt {:.3e} mm",
        drx, dtx, dry, dty
    );

    assert!(drx < 1e-2, "X rotation error too large: {}", drx);
    assert!(dry < 1e-2, "Y rotation error too large: {}", dry);
    assert!(dtx < 2.0, "X translation error too large: {}", dtx);
    assert!(dty < 2.0, "Y translation error too large: {}", dty);

    assert!(!res.has_warnings());
    assert!(res.diagnostics.residual_rms > 0.0);
    assert!(res.diagnostics.residual_rms < 1.0);
    for k in 0..3 {
        assert!((res.x.rotation_column(k).norm() - 1.0).abs() < 1e-12);
        assert!((res.y.rotation_column(k).norm() - 1.0).abs() < 1e-12);
    }
}

#[test]
fn so3_projection_gives_proper_rotations() {
    let (x_gt, _y_gt, set) = noisy_set();
    let opts = CalibrationOptions {
        orthonormalization: Orthonormalization::ProjectSo3,
        ..CalibrationOptions::default()
    };
    let res = calibrate_with(&set, &opts, &HouseholderQr).unwrap();

    for t in [&res.x, &res.y] {
        let r = t.rotation();
        assert!((r.determinant() - 1.0).abs() < 1e-9);
        assert!((r.transpose() * r - Mat3::identity()).norm() < 1e-9);
    }
    assert!(res.diagnostics.orthogonality_error_x < 1e-9);
    assert!(res.diagnostics.orthogonality_error_y < 1e-9);

    let (drx, _) = pose_error(&res.x, &x_gt);
    assert!(drx < 1e-2, "X rotation error too large: {}", drx);
}

#[test]
fn measurement_order_does_not_matter() {
    let (_x, _y, set) = noisy_set();
    let reversed: robcal_core::MeasurementSet = set.iter().rev().copied().collect();

    let a = calibrate(&set).unwrap();
    let b = calibrate(&reversed).unwrap();
    assert!((a.x.matrix() - b.x.matrix()).norm() < 1e-6);
    assert!((a.y.matrix() - b.y.matrix()).norm() < 1e-6);
}

#[test]
fn report_serializes() {
    let (_x, _y, set) = noisy_set();
    let res = calibrate(&set).unwrap();
    let json = serde_json::to_value(&res).unwrap();

    assert_eq!(json["x"][3], serde_json::json!([0.0, 0.0, 0.0, 1.0]));
    assert_eq!(json["diagnostics"]["measurements"], 12);
    assert!(json["diagnostics"]["warnings"].as_array().unwrap().is_empty());
}
