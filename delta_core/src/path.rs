//! Waypoint runs: plan, send, commit, wait.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use delta_traits::{ARM_COUNT, Clock, CommandSink};
use eyre::WrapErr;

use crate::error::{DeltaError, Result};
use crate::geometry::{JointAngles, Pose};
use crate::hw_error::map_sink_error;
use crate::planner::{MotionPlanner, RobotState};

#[derive(Debug, Clone, Default)]
pub struct PathOptions {
    /// Pause after each accepted batch.
    pub move_delay: Duration,
    /// Checked before every waypoint; set it to stop the run.
    pub shutdown: Option<Arc<AtomicBool>>,
}

impl PathOptions {
    pub fn with_delay(move_delay: Duration) -> Self {
        Self {
            move_delay,
            shutdown: None,
        }
    }

    fn should_stop(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|f| f.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathReport {
    pub moves_sent: usize,
    /// Pulses sent per motor, both directions counted.
    pub pulses: [u64; ARM_COUNT],
    pub final_angles: JointAngles,
}

/// Walk `waypoints` in order.
///
/// A waypoint that cannot be planned stops the run before anything is sent
/// for it; moves already sent stay committed in `state`. The state is only
/// advanced after the sink accepted the batch.
pub fn run_path<S, C>(
    planner: &MotionPlanner,
    state: &mut RobotState,
    waypoints: &[Pose],
    sink: &mut S,
    clock: &C,
    opts: &PathOptions,
) -> Result<PathReport>
where
    S: CommandSink + ?Sized,
    C: Clock + ?Sized,
{
    let mut report = PathReport {
        moves_sent: 0,
        pulses: [0; ARM_COUNT],
        final_angles: state.current_angles(),
    };
    let started = clock.now();

    for (i, &target) in waypoints.iter().enumerate() {
        if opts.should_stop() {
            tracing::warn!(waypoint = i, "path aborted by shutdown request");
            return Err(eyre::Report::new(DeltaError::Aborted))
                .wrap_err_with(|| format!("stopped before waypoint {i}"));
        }

        let planned = planner
            .plan(target, state)
            .map_err(eyre::Report::new)
            .wrap_err_with(|| format!("waypoint {i} {target}"))?;

        sink.send(&planned.commands)
            .map_err(|e| eyre::Report::new(map_sink_error(e.as_ref())))
            .wrap_err_with(|| format!("sending waypoint {i} {target}"))?;

        planned.commit(state);
        report.moves_sent += 1;
        for c in &planned.commands {
            report.pulses[c.motor_index as usize] += c.pulse_count;
        }
        tracing::info!(
            waypoint = i,
            target = %target,
            angles = %planned.commanded,
            pulses = planned.total_pulses(),
            "move sent"
        );

        if !opts.move_delay.is_zero() {
            clock.sleep(opts.move_delay);
        }
    }

    report.final_angles = state.current_angles();
    tracing::info!(
        moves = report.moves_sent,
        elapsed_ms = clock.ms_since(started),
        "path complete"
    );
    Ok(report)
}
