//! High-level entry crate for `robcal`.
//!
//! Estimates the flange-to-marker transform `X` and the robot-base-to-tracker
//! transform `Y` from poses recorded while a tracking system follows a marker
//! mounted on the robot flange. Each measurement pairs the robot pose `M_i`
//! with the tracked marker pose `N_i`, and all pairs satisfy `M_i X = Y N_i`.
//!
//! ```no_run
//! use robcal::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let robot = std::fs::read_to_string("robot.txt")?;
//! let tracker = std::fs::read_to_string("tracker.txt")?;
//! let robot: Vec<&str> = robot.lines().collect();
//! let tracker: Vec<&str> = tracker.lines().collect();
//!
//! let ingestion = ingest(&robot, &tracker, IngestPolicy::SkipInvalid)?;
//! for err in &ingestion.errors {
//!     eprintln!("skipped {err}");
//! }
//!
//! let result = calibrate(&ingestion.measurements)?;
//! if result.has_warnings() {
//!     eprintln!("{:?}", result.diagnostics.warnings);
//! }
//! println!("X = {:?}\nY = {:?}", result.x.to_rows(), result.y.to_rows());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - **[`core`]**: transforms, measurement sets, record ingestion, synthetic data
//! - **[`linear`]**: equation construction, least squares, reconstruction, normalisation
//! - **[`prelude`]**: convenient re-exports

/// Transforms, measurements, ingestion and synthetic data.
pub mod core {
    pub use robcal_core::*;
}

/// The QR24 linear calibration and its building blocks.
pub mod linear {
    pub use robcal_linear::*;
}

/// Convenient re-exports for common use cases.
///
/// Import with `use robcal::prelude::*;`.
pub mod prelude {
    pub use crate::core::{
        ingest, HomogeneousTransform, IngestPolicy, Ingestion, Measurement, MeasurementSet,
        ParseError,
    };
    pub use crate::linear::{
        calibrate, calibrate_with, CalibrationError, CalibrationOptions, CalibrationResult,
        CalibrationWarning, HouseholderQr, Orthonormalization,
    };
}
