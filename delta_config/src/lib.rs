#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and calibration parsing for the delta robot.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Calibration CSV loader enforces headers and strictly increasing heights;
//!   the table itself is derived in `delta_core` since it needs the solver.
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::Deserializer;

/// Calibration CSV schema.
///
/// Expected headers:
/// z,angle_deg
///
/// Example:
/// z,angle_deg
/// 20.0,47.1
/// 43.0,0.9
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct CalibrationRow {
    pub z: f64,
    pub angle_deg: f64,
}

/// Linkage dimensions. Edges are the side lengths of the base and effector triangles.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Geometry {
    pub effector_edge: f64,
    pub base_edge: f64,
    /// Motor-driven arm (base joint to elbow)
    pub upper_arm: f64,
    /// Parallelogram link (elbow to effector)
    pub lower_arm: f64,
    /// Added to every requested z before solving
    #[serde(default)]
    pub z_offset: f64,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Limits {
    pub min_angle_deg: f64,
    pub max_angle_deg: f64,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    /// motor index, pulse count, direction
    #[default]
    Basic,
    /// basic record plus frequency and accel/decel ramp pulses
    Extended,
}

#[derive(Debug, Deserialize)]
pub struct MotorCfg {
    pub steps_per_rev: u32,
    pub gear_ratio: f64,
    #[serde(default)]
    pub frame: FrameKind,
    /// Step frequency announced in extended frames
    #[serde(default = "default_frequency_hz")]
    pub frequency_hz: u32,
    #[serde(default)]
    pub accel_pulses: u32,
    #[serde(default)]
    pub decel_pulses: u32,
}

fn default_frequency_hz() -> u32 {
    2000
}

/// What to do when a move's height lies outside the measured calibration heights.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutOfRangeMode {
    /// Refuse the move
    #[default]
    Reject,
    /// Use the uncorrected solver angle
    Zero,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Optional CSV with `z,angle_deg` headers; takes precedence over `samples`.
    pub csv: Option<PathBuf>,
    pub out_of_range: OutOfRangeMode,
    /// Inline samples. Accepts either:
    /// - array of tables: [{ z = 30.0, angle_deg = 22.0 }, ...]
    /// - array of tuples: [[30.0, 22.0], ...]
    #[serde(deserialize_with = "de_samples")]
    pub samples: Vec<CalibrationRow>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct StateCfg {
    /// Joint angles assumed at startup; defaults to `limits.max_angle_deg` on every arm.
    pub home_angles: Option<[f64; 3]>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PathCfg {
    /// Fixed pause after each move is handed to the transport (ms)
    pub move_delay_ms: u64,
    /// Accepts [[x, y, z], ...] or [{ x = .., y = .., z = .. }, ...]
    #[serde(deserialize_with = "de_waypoints")]
    pub waypoints: Vec<Waypoint>,
}

impl Default for PathCfg {
    fn default() -> Self {
        Self {
            move_delay_ms: 1000,
            waypoints: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Sim,
    Remote,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TransportCfg {
    pub mode: TransportMode,
    /// Local file the encoded frame is written to before delivery
    pub frame_path: PathBuf,
    /// `user@host` for scp/ssh; when absent the frame is only written locally
    pub remote_host: Option<String>,
    /// Destination path on the remote host
    pub remote_path: Option<String>,
    /// Command run on the remote host after the copy
    pub remote_command: Option<String>,
}

impl Default for TransportCfg {
    fn default() -> Self {
        Self {
            mode: TransportMode::Sim,
            frame_path: PathBuf::from("/tmp/delta_cmd.bin"),
            remote_host: None,
            remote_path: None,
            remote_command: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub geometry: Geometry,
    pub limits: Limits,
    pub motor: MotorCfg,
    #[serde(default)]
    pub calibration: CalibrationCfg,
    #[serde(default)]
    pub state: StateCfg,
    #[serde(default)]
    pub path: PathCfg,
    #[serde(default)]
    pub transport: TransportCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SampleToml {
    Tuple((f64, f64)),
    Table { z: f64, angle_deg: f64 },
}

fn de_samples<'de, D>(deserializer: D) -> Result<Vec<CalibrationRow>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<Vec<SampleToml>> = Option::deserialize(deserializer)?;
    Ok(opt
        .unwrap_or_default()
        .into_iter()
        .map(|s| match s {
            SampleToml::Tuple((z, angle_deg)) | SampleToml::Table { z, angle_deg } => {
                CalibrationRow { z, angle_deg }
            }
        })
        .collect())
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WaypointToml {
    Tuple((f64, f64, f64)),
    Table { x: f64, y: f64, z: f64 },
}

fn de_waypoints<'de, D>(deserializer: D) -> Result<Vec<Waypoint>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<Vec<WaypointToml>> = Option::deserialize(deserializer)?;
    Ok(opt
        .unwrap_or_default()
        .into_iter()
        .map(|w| match w {
            WaypointToml::Tuple((x, y, z)) | WaypointToml::Table { x, y, z } => {
                Waypoint { x, y, z }
            }
        })
        .collect())
}

/// Check the ordering rules every calibration source must satisfy:
/// at least two rows, finite values, strictly increasing `z`.
pub fn check_calibration_rows(rows: &[CalibrationRow]) -> eyre::Result<()> {
    if rows.len() < 2 {
        eyre::bail!("calibration requires at least two rows, got {}", rows.len());
    }
    for (i, r) in rows.iter().enumerate() {
        if !(r.z.is_finite() && r.angle_deg.is_finite()) {
            eyre::bail!("calibration row {} has a non-finite value", i);
        }
    }
    for i in 1..rows.len() {
        let d = rows[i].z - rows[i - 1].z;
        if d == 0.0 {
            eyre::bail!(
                "calibration rows have duplicate z values at index {} and {}",
                i - 1,
                i
            );
        }
        if d < 0.0 {
            eyre::bail!("calibration z values must be strictly increasing (index {i})");
        }
    }
    Ok(())
}

pub fn load_calibration_csv(path: &Path) -> eyre::Result<Vec<CalibrationRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open calibration CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["z", "angle_deg"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "calibration CSV must have headers 'z,angle_deg', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<CalibrationRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    check_calibration_rows(&rows)?;
    Ok(rows)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Geometry
        let g = &self.geometry;
        for (name, v) in [
            ("geometry.effector_edge", g.effector_edge),
            ("geometry.base_edge", g.base_edge),
            ("geometry.upper_arm", g.upper_arm),
            ("geometry.lower_arm", g.lower_arm),
        ] {
            if !(v.is_finite() && v > 0.0) {
                eyre::bail!("{name} must be > 0");
            }
        }
        if !g.z_offset.is_finite() {
            eyre::bail!("geometry.z_offset must be finite");
        }

        // Limits
        let l = &self.limits;
        if !(l.min_angle_deg.is_finite() && l.max_angle_deg.is_finite()) {
            eyre::bail!("limits must be finite");
        }
        if l.min_angle_deg >= l.max_angle_deg {
            eyre::bail!("limits.min_angle_deg must be < limits.max_angle_deg");
        }

        // Motor
        if self.motor.steps_per_rev == 0 {
            eyre::bail!("motor.steps_per_rev must be > 0");
        }
        if !(self.motor.gear_ratio.is_finite() && self.motor.gear_ratio > 0.0) {
            eyre::bail!("motor.gear_ratio must be > 0");
        }
        if self.motor.frame == FrameKind::Extended && self.motor.frequency_hz == 0 {
            eyre::bail!("motor.frequency_hz must be > 0 for extended frames");
        }

        // Calibration: inline samples obey the same ordering rules as the CSV
        if self.calibration.csv.is_none() && !self.calibration.samples.is_empty() {
            check_calibration_rows(&self.calibration.samples)?;
        }

        // State
        if let Some(home) = self.state.home_angles
            && home.iter().any(|a| !a.is_finite())
        {
            eyre::bail!("state.home_angles must be finite");
        }

        // Path
        if self.path.move_delay_ms > 10 * 60 * 1000 {
            eyre::bail!("path.move_delay_ms is unreasonably large (>10min)");
        }
        if self
            .path
            .waypoints
            .iter()
            .any(|w| !(w.x.is_finite() && w.y.is_finite() && w.z.is_finite()))
        {
            eyre::bail!("path.waypoints must be finite");
        }

        // Transport
        if self.transport.mode == TransportMode::Remote {
            if self.transport.frame_path.as_os_str().is_empty() {
                eyre::bail!("transport.frame_path must be set for remote mode");
            }
            if self.transport.remote_host.is_some() && self.transport.remote_path.is_none() {
                eyre::bail!("transport.remote_path is required when remote_host is set");
            }
        }

        Ok(())
    }

    /// Resolve calibration samples: an explicit CSV (CLI override first, then
    /// `calibration.csv`) wins over inline samples. Empty means "no calibration".
    pub fn calibration_rows(&self, csv_override: Option<&Path>) -> eyre::Result<Vec<CalibrationRow>> {
        match csv_override.or(self.calibration.csv.as_deref()) {
            Some(path) => load_calibration_csv(path),
            None => Ok(self.calibration.samples.clone()),
        }
    }

    /// Startup joint angles: configured home, else fully retracted (max angle) on every arm.
    pub fn home_angles(&self) -> [f64; 3] {
        self.state
            .home_angles
            .unwrap_or([self.limits.max_angle_deg; 3])
    }
}
