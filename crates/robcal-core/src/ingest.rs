//! Robot and tracker record ingestion.
//!
//! Both streams are line based. A robot record holds the 12 values of the
//! upper 3x4 block of the flange pose in row-major order:
//!
//! ```text
//! r00 r01 r02 t0 r10 r11 r12 t1 r20 r21 r22 t2
//! ```
//!
//! A marker record prefixes the same 12 values with an identifier and a
//! capture flag. The flag [`SKIP_FLAG`] (`n`) marks a pose the tracker did not
//! see; the pair is dropped without taking a measurement slot:
//!
//! ```text
//! <id> <flag> r00 r01 r02 t0 r10 r11 r12 t1 r20 r21 r22 t2
//! ```
//!
//! Record `i` of one stream is paired with record `i` of the other. Malformed
//! records are reported individually as [`ParseError`]; whether they abort the
//! batch is the caller's [`IngestPolicy`].

use crate::{HomogeneousTransform, Measurement, MeasurementSet, Real};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Capture flag value meaning "tracker did not capture this pose".
pub const SKIP_FLAG: &str = "n";

const POSE_VALUES: usize = 12;
const MARKER_PREFIX: usize = 2;

/// Which input stream a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStream {
    Robot,
    Marker,
}

impl fmt::Display for RecordStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStream::Robot => write!(f, "robot"),
            RecordStream::Marker => write!(f, "marker"),
        }
    }
}

/// Why a single record could not be turned into a transform.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseErrorKind {
    #[error("empty record")]
    Empty,
    #[error("expected {expected} tokens, got {got}")]
    TokenCount { expected: usize, got: usize },
    #[error("token {position} ({token:?}) is not a number")]
    InvalidNumber { position: usize, token: String },
    #[error("token {position} ({token:?}) is not finite")]
    NonFinite { position: usize, token: String },
}

/// A malformed record, located by stream and 0-based record index.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
#[error("{stream} record {record}: {kind}")]
pub struct ParseError {
    pub stream: RecordStream,
    pub record: usize,
    pub kind: ParseErrorKind,
}

/// A parsed tracker record.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerRecord {
    /// The tracker lost the marker for this pose.
    Skipped { id: String },
    Captured {
        id: String,
        pose: HomogeneousTransform,
    },
}

/// What to do with records that fail to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestPolicy {
    /// Drop the pair, keep it in [`Ingestion::errors`], continue.
    #[default]
    SkipInvalid,
    /// Return the first error.
    Abort,
}

/// Outcome of pairing two record streams.
#[derive(Debug, Clone)]
pub struct Ingestion {
    pub measurements: MeasurementSet,
    /// Record indices dropped because the tracker flagged them as not captured.
    pub skipped: Vec<usize>,
    /// Records dropped because they failed to parse (only with `SkipInvalid`).
    pub errors: Vec<ParseError>,
    /// Trailing records of the longer stream that had no partner.
    pub unpaired: usize,
}

impl Ingestion {
    pub fn into_measurements(self) -> MeasurementSet {
        self.measurements
    }
}

fn parse_values(tokens: &[&str], offset: usize) -> Result<[Real; POSE_VALUES], ParseErrorKind> {
    let mut values = [0.0; POSE_VALUES];
    for (idx, (slot, token)) in values.iter_mut().zip(tokens).enumerate() {
        let position = offset + idx;
        let v: Real = token.parse().map_err(|_| ParseErrorKind::InvalidNumber {
            position,
            token: token.to_string(),
        })?;
        if !v.is_finite() {
            return Err(ParseErrorKind::NonFinite {
                position,
                token: token.to_string(),
            });
        }
        *slot = v;
    }
    Ok(values)
}

/// Parse one robot record into a flange pose.
pub fn parse_robot_record(line: &str) -> Result<HomogeneousTransform, ParseErrorKind> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(ParseErrorKind::Empty);
    }
    if tokens.len() != POSE_VALUES {
        return Err(ParseErrorKind::TokenCount {
            expected: POSE_VALUES,
            got: tokens.len(),
        });
    }
    let values = parse_values(&tokens, 0)?;
    Ok(HomogeneousTransform::from_row_major(&values))
}

/// Parse one tracker record.
///
/// A skipped record only needs its identifier and flag; its values are not
/// inspected.
pub fn parse_marker_record(line: &str) -> Result<MarkerRecord, ParseErrorKind> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let expected = MARKER_PREFIX + POSE_VALUES;
    match tokens.as_slice() {
        [] => Err(ParseErrorKind::Empty),
        [id, flag, ..] if *flag == SKIP_FLAG => Ok(MarkerRecord::Skipped { id: id.to_string() }),
        [id, _flag, values @ ..] if values.len() == POSE_VALUES => {
            let values = parse_values(values, MARKER_PREFIX)?;
            Ok(MarkerRecord::Captured {
                id: id.to_string(),
                pose: HomogeneousTransform::from_row_major(&values),
            })
        }
        _ => Err(ParseErrorKind::TokenCount {
            expected,
            got: tokens.len(),
        }),
    }
}

/// Pair robot and tracker records into a [`MeasurementSet`].
///
/// Only the first `min(robot.len(), marker.len())` records are considered.
/// The skip flag is checked before the robot record is parsed, so a skipped
/// pair never produces an error.
pub fn ingest<R, M>(
    robot: &[R],
    marker: &[M],
    policy: IngestPolicy,
) -> Result<Ingestion, ParseError>
where
    R: AsRef<str>,
    M: AsRef<str>,
{
    let paired = robot.len().min(marker.len());
    let unpaired = robot.len().max(marker.len()) - paired;
    if unpaired > 0 {
        debug!(
            "ignoring {} unpaired records (robot {}, marker {})",
            unpaired,
            robot.len(),
            marker.len()
        );
    }

    let mut measurements = Vec::with_capacity(paired);
    let mut skipped = Vec::new();
    let mut errors = Vec::new();

    for (record, (robot_line, marker_line)) in robot.iter().zip(marker).enumerate() {
        let parsed = parse_marker_record(marker_line.as_ref())
            .map_err(|kind| ParseError {
                stream: RecordStream::Marker,
                record,
                kind,
            })
            .and_then(|marker| match marker {
                MarkerRecord::Skipped { id } => Ok((id, None)),
                MarkerRecord::Captured { id, pose } => parse_robot_record(robot_line.as_ref())
                    .map(|robot_pose| (id, Some(Measurement::new(robot_pose, pose))))
                    .map_err(|kind| ParseError {
                        stream: RecordStream::Robot,
                        record,
                        kind,
                    }),
            });

        match parsed {
            Ok((id, Some(measurement))) => {
                debug!("record {} ({}) accepted", record, id);
                measurements.push(measurement);
            }
            Ok((id, None)) => {
                debug!("record {} ({}) skipped: marker not captured", record, id);
                skipped.push(record);
            }
            Err(err) => match policy {
                IngestPolicy::Abort => return Err(err),
                IngestPolicy::SkipInvalid => {
                    warn!("dropping {}", err);
                    errors.push(err);
                }
            },
        }
    }

    Ok(Ingestion {
        measurements: MeasurementSet::new(measurements),
        skipped,
        errors,
        unpaired,
    })
}

fn write_values(t: &HomogeneousTransform, out: &mut String) {
    let rows = t.to_rows();
    let values = rows[..3].iter().flat_map(|row| row.iter());
    for (idx, v) in values.enumerate() {
        if idx > 0 || !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&v.to_string());
    }
}

/// Format a flange pose as a robot record.
pub fn robot_record(pose: &HomogeneousTransform) -> String {
    let mut out = String::new();
    write_values(pose, &mut out);
    out
}

/// Format a marker pose as a tracker record; `captured == false` writes the skip flag.
pub fn marker_record(id: &str, captured: bool, pose: &HomogeneousTransform) -> String {
    let flag = if captured { "y" } else { SKIP_FLAG };
    let mut out = format!("{id} {flag}");
    write_values(pose, &mut out);
    out
}
