//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "delta", version, about = "Delta robot kinematics and motion CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/delta_config.toml")]
    pub config: PathBuf,

    /// Calibration CSV with `z,angle_deg` headers (overrides calibration.csv)
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Print results and logs as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); falls back to RUST_LOG, then logging.level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Joint angles for an effector position
    Ik {
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
        #[arg(long, allow_hyphen_values = true)]
        z: f64,
    },
    /// Effector position for joint angles (degrees)
    Fk {
        #[arg(long, allow_hyphen_values = true)]
        theta1: f64,
        #[arg(long, allow_hyphen_values = true)]
        theta2: f64,
        #[arg(long, allow_hyphen_values = true)]
        theta3: f64,
    },
    /// Plan one move and send it through the configured transport
    Move {
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
        #[arg(long, allow_hyphen_values = true)]
        z: f64,
        /// Starting joint angles `a,b,c` (default: state.home_angles)
        #[arg(long, value_name = "A,B,C", value_parser = parse_angles, allow_hyphen_values = true)]
        from: Option<[f64; 3]>,
    },
    /// Walk path.waypoints from the home state
    Run {
        /// Pause after each move in ms (overrides path.move_delay_ms)
        #[arg(long, value_name = "MS")]
        delay_ms: Option<u64>,
        /// Plan and simulate only; nothing reaches the transport
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,
    },
    /// Print the calibration table
    Calibration,
    /// Validate config and calibration, cross-check the solvers
    SelfCheck,
}

fn parse_angles(s: &str) -> Result<[f64; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [a, b, c] = parts.as_slice() else {
        return Err(format!("expected three comma-separated angles, got '{s}'"));
    };
    let p = |v: &str| v.parse::<f64>().map_err(|e| format!("'{v}': {e}"));
    Ok([p(*a)?, p(*b)?, p(*c)?])
}
