//! Subcommand implementations: planner assembly, transport selection, output.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use delta_config::{Config, FrameKind, TransportMode};
use delta_core::hw_error::map_sink_error;
use delta_core::util::unwrap_deg;
use delta_core::{
    JointAngles, MotionPlanner, PathOptions, Pose, RobotState, build_planner, run_path,
};
use delta_hardware::{FrameSpec, Ramp, RemoteTarget, RemoteTransport, SimulatedController};
use delta_traits::{CommandSink, MonotonicClock, MotorCommand};
use eyre::{Result, WrapErr};
use serde_json::{Value, json};

use crate::cli::{Cli, Commands};

/// Largest closed-form vs Newton disagreement `self-check` accepts (degrees).
const SOLVER_TOLERANCE_DEG: f64 = 1e-4;
/// Largest forward(inverse(p)) distance from p `self-check` accepts.
const ROUND_TRIP_TOLERANCE: f64 = 1e-6;

pub fn dispatch(cli: &Cli, cfg: &Config) -> Result<()> {
    let planner = load_planner(cli, cfg)?;
    let out = Output { json: cli.json };
    match &cli.cmd {
        Commands::Ik { x, y, z } => ik(&planner, Pose::new(*x, *y, *z), out),
        Commands::Fk {
            theta1,
            theta2,
            theta3,
        } => fk(&planner, JointAngles::new(*theta1, *theta2, *theta3), out),
        Commands::Move { x, y, z, from } => {
            let start = JointAngles::from(from.unwrap_or_else(|| cfg.home_angles()));
            let mut sink = make_sink(cfg);
            move_once(&planner, Pose::new(*x, *y, *z), start, sink.as_mut(), out)
        }
        Commands::Run { delay_ms, dry_run } => run(cfg, &planner, *delay_ms, *dry_run, out),
        Commands::Calibration => calibration(&planner, out),
        Commands::SelfCheck => self_check(cfg, &planner, out),
    }
}

/// Result printing: one JSON object per line, or plain text.
#[derive(Clone, Copy)]
struct Output {
    json: bool,
}

impl Output {
    fn emit(self, value: &Value, text: impl FnOnce() -> String) {
        if self.json {
            let mut value = value.clone();
            value["timestamp"] = json!(unix_ms());
            println!("{value}");
        } else {
            println!("{}", text());
        }
    }
}

fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

fn load_planner(cli: &Cli, cfg: &Config) -> Result<MotionPlanner> {
    let rows = cfg
        .calibration_rows(cli.calibration.as_deref())
        .wrap_err("load calibration")?;
    tracing::debug!(samples = rows.len(), "calibration rows loaded");
    build_planner(cfg, &rows)
}

pub fn frame_spec(cfg: &Config) -> FrameSpec {
    match cfg.motor.frame {
        FrameKind::Basic => FrameSpec::basic(),
        FrameKind::Extended => FrameSpec::extended(Ramp {
            frequency_hz: cfg.motor.frequency_hz,
            accel_pulses: cfg.motor.accel_pulses,
            decel_pulses: cfg.motor.decel_pulses,
        }),
    }
}

/// Transport selected by `transport.mode`.
pub fn make_sink(cfg: &Config) -> Box<dyn CommandSink> {
    let spec = frame_spec(cfg);
    let t = &cfg.transport;
    match t.mode {
        TransportMode::Sim => Box::new(SimulatedController::new(spec)),
        TransportMode::Remote => {
            let mut remote = RemoteTransport::new(&t.frame_path, spec);
            if let (Some(host), Some(path)) = (&t.remote_host, &t.remote_path) {
                remote = remote.with_target(RemoteTarget {
                    host: host.clone(),
                    path: path.clone(),
                    command: t.remote_command.clone(),
                });
            }
            tracing::info!(frame_path = %t.frame_path.display(), host = ?t.remote_host, "remote transport");
            Box::new(remote)
        }
    }
}

fn commands_json(commands: &[MotorCommand]) -> Value {
    commands
        .iter()
        .map(|c| {
            json!({
                "motor": c.motor_index,
                "pulses": c.pulse_count,
                "direction": c.direction.wire_value(),
            })
        })
        .collect()
}

fn commands_text(commands: &[MotorCommand]) -> String {
    commands
        .iter()
        .map(|c| {
            format!(
                "  motor {}: {} pulses {:?}",
                c.motor_index, c.pulse_count, c.direction
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn ik(planner: &MotionPlanner, pose: Pose, out: Output) -> Result<()> {
    let (raw, corrected) = planner
        .solve(pose)
        .map_err(eyre::Report::new)
        .wrap_err_with(|| format!("inverse kinematics for {pose}"))?;
    let commanded = corrected.map(|a| planner.clamp_angle(a));
    out.emit(
        &json!({
            "command": "ik",
            "pose": [pose.x, pose.y, pose.z],
            "raw_deg": raw.as_array(),
            "corrected_deg": corrected.as_array(),
            "commanded_deg": commanded.as_array(),
        }),
        || format!("raw:       {raw}\ncorrected: {corrected}\ncommanded: {commanded}"),
    );
    Ok(())
}

fn fk(planner: &MotionPlanner, angles: JointAngles, out: Output) -> Result<()> {
    let pose = planner
        .forward()
        .forward(angles)
        .map_err(eyre::Report::new)
        .wrap_err_with(|| format!("forward kinematics for {angles}"))?;
    out.emit(
        &json!({
            "command": "fk",
            "angles_deg": angles.as_array(),
            "pose": [pose.x, pose.y, pose.z],
        }),
        || format!("pose: {pose}"),
    );
    Ok(())
}

fn move_once(
    planner: &MotionPlanner,
    target: Pose,
    start: JointAngles,
    sink: &mut dyn CommandSink,
    out: Output,
) -> Result<()> {
    let mut state = RobotState::new(start);
    let planned = planner
        .plan(target, &state)
        .map_err(eyre::Report::new)
        .wrap_err_with(|| format!("plan move to {target}"))?;
    sink.send(&planned.commands)
        .map_err(|e| eyre::Report::new(map_sink_error(e.as_ref())))
        .wrap_err_with(|| format!("send move to {target}"))?;
    planned.commit(&mut state);
    tracing::info!(target = %target, pulses = planned.total_pulses(), "move sent");

    out.emit(
        &json!({
            "command": "move",
            "pose": [target.x, target.y, target.z],
            "from_deg": start.as_array(),
            "commanded_deg": planned.commanded.as_array(),
            "clamped": planned.was_clamped(),
            "commands": commands_json(&planned.commands),
        }),
        || {
            let clamp_note = if planned.was_clamped() {
                " (clamped to limits)"
            } else {
                ""
            };
            format!(
                "from:   {start}\nto:     {}{clamp_note}\n{}",
                planned.commanded,
                commands_text(&planned.commands)
            )
        },
    );
    Ok(())
}

fn run(
    cfg: &Config,
    planner: &MotionPlanner,
    delay_ms: Option<u64>,
    dry_run: bool,
    out: Output,
) -> Result<()> {
    let waypoints: Vec<Pose> = cfg.path.waypoints.iter().map(Pose::from).collect();
    if waypoints.is_empty() {
        eyre::bail!("path.waypoints is empty; nothing to run");
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::Relaxed);
        })
        .wrap_err("install Ctrl-C handler")?;
    }

    let opts = PathOptions {
        move_delay: Duration::from_millis(delay_ms.unwrap_or(cfg.path.move_delay_ms)),
        shutdown: Some(shutdown),
    };
    let mut state = RobotState::new(JointAngles::from(cfg.home_angles()));
    let clock = MonotonicClock::new();
    tracing::info!(
        waypoints = waypoints.len(),
        delay = ?opts.move_delay,
        dry_run,
        "path start"
    );

    let (report, sim_position) = if dry_run {
        let mut sim = SimulatedController::new(frame_spec(cfg));
        let report = run_path(planner, &mut state, &waypoints, &mut sim, &clock, &opts)?;
        (report, Some(sim.position()))
    } else {
        let mut sink = make_sink(cfg);
        let report = run_path(planner, &mut state, &waypoints, sink.as_mut(), &clock, &opts)?;
        (report, None)
    };

    out.emit(
        &json!({
            "command": "run",
            "dry_run": dry_run,
            "moves": report.moves_sent,
            "pulses": report.pulses,
            "final_deg": report.final_angles.as_array(),
            "sim_steps": sim_position,
        }),
        || {
            let mut s = format!(
                "moves:  {}\npulses: {:?}\nfinal:  {}",
                report.moves_sent, report.pulses, report.final_angles
            );
            if let Some(p) = sim_position {
                s.push_str(&format!("\nsteps:  {p:?} (dry run)"));
            }
            s
        },
    );
    Ok(())
}

fn calibration(planner: &MotionPlanner, out: Output) -> Result<()> {
    let corrector = planner.corrector();
    let Some(table) = corrector.table() else {
        out.emit(&json!({ "command": "calibration", "points": [] }), || {
            "no calibration samples configured".to_string()
        });
        return Ok(());
    };
    let (min, max) = table.z_range();
    let points: Vec<Value> = table
        .points()
        .iter()
        .map(|p| {
            json!({
                "z": p.z,
                "measured_deg": p.measured_deg,
                "computed_deg": p.computed_deg,
                "error_deg": p.error_deg,
            })
        })
        .collect();
    out.emit(
        &json!({
            "command": "calibration",
            "range": [min, max],
            "out_of_range": format!("{:?}", corrector.policy()),
            "points": points,
        }),
        || {
            let mut s = format!(
                "range: [{min:.3}, {max:.3}]  out of range: {:?}\n{:>10} {:>12} {:>12} {:>10}",
                corrector.policy(),
                "z",
                "measured",
                "computed",
                "error"
            );
            for p in table.points() {
                s.push_str(&format!(
                    "\n{:>10.3} {:>12.4} {:>12.4} {:>10.4}",
                    p.z, p.measured_deg, p.computed_deg, p.error_deg
                ));
            }
            s
        },
    );
    Ok(())
}

/// Poses worth checking: configured waypoints, calibration heights on the axis,
/// and the home pose.
fn check_poses(cfg: &Config, planner: &MotionPlanner) -> Result<Vec<Pose>> {
    let mut poses: Vec<Pose> = cfg.path.waypoints.iter().map(Pose::from).collect();
    if let Some(table) = planner.corrector().table() {
        poses.extend(table.points().iter().map(|p| Pose::new(0.0, 0.0, p.z)));
    }
    let home = JointAngles::from(cfg.home_angles());
    let home_pose = planner
        .forward()
        .forward(home)
        .map_err(eyre::Report::new)
        .wrap_err_with(|| format!("home angles {home} have no pose"))?;
    poses.push(home_pose);
    Ok(poses)
}

fn self_check(cfg: &Config, planner: &MotionPlanner, out: Output) -> Result<()> {
    let poses = check_poses(cfg, planner)?;
    let ik = planner.inverse();
    let fk = planner.forward();
    let mut max_solver_diff = 0.0_f64;
    let mut max_round_trip = 0.0_f64;
    let mut newton_skipped = 0_usize;

    for pose in &poses {
        let closed = ik
            .inverse(*pose)
            .map_err(eyre::Report::new)
            .wrap_err_with(|| format!("self-check pose {pose}"))?
            .map(unwrap_deg);

        match ik.newton(*pose) {
            Ok(newton) => {
                for i in 0..3 {
                    max_solver_diff = max_solver_diff.max((closed[i] - newton[i]).abs());
                }
            }
            Err(e) => {
                tracing::warn!(pose = %pose, error = %e, "newton solver skipped");
                newton_skipped += 1;
            }
        }

        let back = fk
            .forward(closed)
            .map_err(eyre::Report::new)
            .wrap_err_with(|| format!("self-check forward of {closed}"))?;
        let dist = ((back.x - pose.x).powi(2) + (back.y - pose.y).powi(2) + (back.z - pose.z).powi(2))
            .sqrt();
        max_round_trip = max_round_trip.max(dist);
    }

    tracing::info!(
        poses = poses.len(),
        max_solver_diff,
        max_round_trip,
        newton_skipped,
        "self-check"
    );
    if max_solver_diff > SOLVER_TOLERANCE_DEG {
        eyre::bail!(
            "closed-form and newton solvers disagree by {max_solver_diff:.6}° (limit {SOLVER_TOLERANCE_DEG})"
        );
    }
    if max_round_trip > ROUND_TRIP_TOLERANCE {
        eyre::bail!(
            "forward(inverse(p)) drifts {max_round_trip:.3e} from p (limit {ROUND_TRIP_TOLERANCE})"
        );
    }

    out.emit(
        &json!({
            "command": "self-check",
            "ok": true,
            "poses": poses.len(),
            "max_solver_diff_deg": max_solver_diff,
            "max_round_trip": max_round_trip,
            "newton_skipped": newton_skipped,
        }),
        || {
            format!(
                "OK: {} poses, solver agreement {max_solver_diff:.2e}°, round trip {max_round_trip:.2e}",
                poses.len()
            )
        },
    );
    Ok(())
}
