//! Core math and data types for `robcal`.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec3`, `Mat4`, ...),
//! - [`HomogeneousTransform`], a 4x4 matrix whose bottom row is always `[0, 0, 0, 1]`,
//! - [`Measurement`] / [`MeasurementSet`], the immutable input of a calibration run,
//! - text record ingestion for robot and tracker pose files ([`ingest`]),
//! - deterministic synthetic pose data for tests and demos ([`synthetic`]).
//!
//! Frame conventions: a robot pose `M` maps flange to base, a marker pose `N`
//! maps marker to tracker. The unknowns satisfy `M X = Y N`, with `X` the
//! flange-to-marker transform and `Y` the base-to-tracker transform.

/// Text record parsing for robot and tracker pose streams.
pub mod ingest;
/// Linear algebra type aliases.
pub mod math;
/// Paired pose measurements.
pub mod measurement;
/// Deterministic synthetic calibration data.
pub mod synthetic;
/// Homogeneous 4x4 transforms.
pub mod transform;

pub use ingest::{
    ingest, parse_marker_record, parse_robot_record, IngestPolicy, Ingestion, MarkerRecord,
    ParseError, ParseErrorKind, RecordStream, SKIP_FLAG,
};
pub use math::*;
pub use measurement::{Measurement, MeasurementError, MeasurementSet};
pub use transform::{HomogeneousTransform, TransformError};
