use anyhow::{ensure, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use log::info;
use robcal_core::{ingest, HomogeneousTransform, IngestPolicy, ParseError};
use robcal_linear::{calibrate_with, CalibrationOptions, CalibrationResult, HouseholderQr};
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Tool/flange (X) and robot/world (Y) calibration from paired pose files.
#[derive(Debug, Parser)]
#[command(author, version, about = "QR24 tool/flange and robot/world calibration")]
struct Args {
    /// Robot pose file, one `r00 r01 r02 t0 r10 r11 r12 t1 r20 r21 r22 t2` record per line.
    #[arg(long)]
    robot: PathBuf,

    /// Tracker pose file, one `<id> <flag> r00 ... t2` record per line (flag `n` = not captured).
    #[arg(long)]
    tracker: PathBuf,

    /// Optional path to JSON CalibrationOptions. Defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Abort on the first malformed record instead of skipping it.
    #[arg(long)]
    strict: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Log more (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Pretty JSON report with diagnostics.
    Json,
    /// Both matrices as plain text, four decimals.
    Text,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    #[serde(flatten)]
    calibration: &'a CalibrationResult,
    /// Record indices the tracker flagged as not captured.
    skipped: &'a [usize],
    /// Records dropped because they failed to parse.
    invalid: &'a [ParseError],
    unpaired: usize,
}

fn load_records(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read records from {}", path.display()))?;
    let records: Vec<String> = text.lines().map(str::to_owned).collect();
    ensure!(!records.is_empty(), "{} contains no records", path.display());
    Ok(records)
}

fn load_options(path: Option<&Path>) -> Result<CalibrationOptions> {
    let Some(path) = path else {
        return Ok(CalibrationOptions::default());
    };
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("invalid config {}", path.display()))
}

/// `0.####`: at most four decimals, no trailing zeros, `.` separator.
fn format_value(v: f64) -> String {
    let s = format!("{:.4}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn format_matrix(t: &HomogeneousTransform) -> String {
    t.to_rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|v| format_value(*v))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_text(result: &CalibrationResult) -> String {
    let mut out = format!(
        "Effector to Marker:\n{}\nRobot to Tracking:\n{}",
        format_matrix(&result.x),
        format_matrix(&result.y)
    );
    for warning in &result.diagnostics.warnings {
        out.push_str(&format!("\nwarning: {}", warning));
    }
    out
}

fn run_from_files(
    robot_path: &Path,
    tracker_path: &Path,
    config_path: Option<&Path>,
    policy: IngestPolicy,
    format: OutputFormat,
) -> Result<String> {
    let robot = load_records(robot_path)?;
    let tracker = load_records(tracker_path)?;
    let opts = load_options(config_path)?;

    let ingestion = ingest(&robot, &tracker, policy)?;
    info!(
        "{} measurements ({} skipped, {} invalid, {} unpaired)",
        ingestion.measurements.len(),
        ingestion.skipped.len(),
        ingestion.errors.len(),
        ingestion.unpaired
    );

    let result = calibrate_with(&ingestion.measurements, &opts, &HouseholderQr)?;

    match format {
        OutputFormat::Json => {
            let report = Report {
                calibration: &result,
                skipped: &ingestion.skipped,
                invalid: &ingestion.errors,
                unpaired: ingestion.unpaired,
            };
            Ok(serde_json::to_string_pretty(&report)?)
        }
        OutputFormat::Text => Ok(write_text(&result)),
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let policy = if args.strict {
        IngestPolicy::Abort
    } else {
        IngestPolicy::SkipInvalid
    };
    let out = run_from_files(
        &args.robot,
        &args.tracker,
        args.config.as_deref(),
        policy,
        args.format,
    )?;
    println!("{}", out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use robcal_core::ingest::{marker_record, robot_record};
    use robcal_core::synthetic::{measurements_from_ground_truth, robot_poses};
    use robcal_core::Iso3;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_lines(lines: &[String]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    /// Robot and tracker files for 6 poses; pose 2 is flagged as not captured.
    fn synthetic_files() -> (NamedTempFile, NamedTempFile) {
        let x = Iso3::translation(0.0, 0.0, 100.0);
        let y = Iso3::translation(900.0, -150.0, 50.0);
        let set = measurements_from_ground_truth(&robot_poses(6), &x, &y, None);

        let robot: Vec<String> = set.iter().map(|m| robot_record(&m.robot_pose)).collect();
        let tracker: Vec<String> = set
            .iter()
            .enumerate()
            .map(|(i, m)| marker_record(&format!("p{i}"), i != 2, &m.marker_pose))
            .collect();
        (write_lines(&robot), write_lines(&tracker))
    }

    #[test]
    fn json_report_from_files() {
        let (robot, tracker) = synthetic_files();
        let json = run_from_files(
            robot.path(),
            tracker.path(),
            None,
            IngestPolicy::SkipInvalid,
            OutputFormat::Json,
        )
        .expect("cli helper should succeed");

        let report: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(report["skipped"], serde_json::json!([2]));
        assert_eq!(report["diagnostics"]["measurements"], 5);
        let tz = report["x"][2][3].as_f64().unwrap();
        assert!((tz - 100.0).abs() < 1e-6, "x translation z = {}", tz);
    }

    #[test]
    fn text_output_uses_four_decimals() {
        let (robot, tracker) = synthetic_files();
        let text = run_from_files(
            robot.path(),
            tracker.path(),
            None,
            IngestPolicy::SkipInvalid,
            OutputFormat::Text,
        )
        .unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Effector to Marker:");
        assert_eq!(lines[1], "1 0 0 0");
        assert_eq!(lines[3], "0 0 1 100");
        assert_eq!(lines[4], "0 0 0 1");
        assert_eq!(lines[5], "Robot to Tracking:");
        assert_eq!(lines[6], "1 0 0 900");
    }

    #[test]
    fn strict_mode_aborts_on_bad_record() {
        let (_robot, tracker) = synthetic_files();
        let bad_robot = write_lines(&["1 0 0 x 0 1 0 0 0 0 1 0".to_string()]);

        let err = run_from_files(
            bad_robot.path(),
            tracker.path(),
            None,
            IngestPolicy::Abort,
            OutputFormat::Json,
        )
        .unwrap_err();
        assert!(err.to_string().contains("robot record 0"), "{err}");
        let chain = format!("{err:#}");
        assert_eq!(chain.matches("is not a number").count(), 1, "{chain}");
    }

    #[test]
    fn config_is_loaded() {
        let mut cfg = NamedTempFile::new().unwrap();
        write!(cfg, r#"{{ "rank_tolerance": 1e-8, "orthonormalization": "project_so3" }}"#)
            .unwrap();
        let opts = load_options(Some(cfg.path())).unwrap();
        assert_eq!(opts.rank_tolerance, 1e-8);

        assert_eq!(load_options(None).unwrap(), CalibrationOptions::default());
    }

    #[test]
    fn value_formatting() {
        assert_eq!(format_value(1.0), "1");
        assert_eq!(format_value(0.123456), "0.1235");
        assert_eq!(format_value(-2.5), "-2.5");
        assert_eq!(format_value(-0.00001), "0");
        assert_eq!(format_value(120.0), "120");
    }
}
