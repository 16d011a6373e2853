//! Pose to pulse-count planning.
//!
//! `plan` is pure; the returned [`PlannedMove`] is committed to the
//! [`RobotState`] only once the caller decides the batch went out.

use delta_traits::{ARM_COUNT, Direction, MotorCommand};

use crate::builder::PlannerBuilder;
use crate::calibration::Corrector;
use crate::error::KinResult;
use crate::geometry::{GeometryConfig, JointAngles, Pose};
use crate::kinematics::{ForwardKinematics, InverseKinematics};

/// Last commanded joint angles. Not a measurement: nothing reads the motors
/// back, so a lost batch leaves this out of sync until [`home`](Self::home).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotState {
    current: JointAngles,
}

impl RobotState {
    pub fn new(current: JointAngles) -> Self {
        Self { current }
    }

    pub fn current_angles(&self) -> JointAngles {
        self.current
    }

    /// Resynchronise after the arms were driven to known angles by other means.
    pub fn home(&mut self, angles: JointAngles) {
        tracing::info!(angles = %angles, "state homed");
        self.current = angles;
    }
}

/// Commands for one move plus the angles they lead to.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedMove {
    pub target: Pose,
    /// Solver output before unwrapping and correction.
    pub raw: JointAngles,
    pub corrected: JointAngles,
    /// Corrected and clamped; what the state becomes after `commit`.
    pub commanded: JointAngles,
    pub commands: [MotorCommand; ARM_COUNT],
}

impl PlannedMove {
    pub fn commit(&self, state: &mut RobotState) {
        state.current = self.commanded;
    }

    pub fn total_pulses(&self) -> u64 {
        self.commands.iter().map(|c| c.pulse_count).sum()
    }

    /// True when any angle was pulled back into the limits.
    pub fn was_clamped(&self) -> bool {
        self.corrected != self.commanded
    }
}

#[derive(Debug, Clone)]
pub struct MotionPlanner {
    geometry: GeometryConfig,
    ik: InverseKinematics,
    fk: ForwardKinematics,
    corrector: Corrector,
}

impl MotionPlanner {
    /// Planner over an already validated geometry.
    pub(crate) fn from_parts(geometry: GeometryConfig, corrector: Corrector) -> Self {
        Self {
            geometry,
            ik: InverseKinematics::new(geometry),
            fk: ForwardKinematics::new(geometry),
            corrector,
        }
    }

    pub fn new(geometry: GeometryConfig, corrector: Corrector) -> KinResult<Self> {
        Ok(Self::from_parts(geometry.validated()?, corrector))
    }

    pub fn builder() -> PlannerBuilder {
        PlannerBuilder::default()
    }

    pub fn geometry(&self) -> &GeometryConfig {
        &self.geometry
    }

    pub fn inverse(&self) -> &InverseKinematics {
        &self.ik
    }

    pub fn forward(&self) -> &ForwardKinematics {
        &self.fk
    }

    pub fn corrector(&self) -> &Corrector {
        &self.corrector
    }

    /// Limit an angle to `[min_angle_deg, max_angle_deg]`.
    #[inline]
    pub fn clamp_angle(&self, angle_deg: f64) -> f64 {
        angle_deg.clamp(self.geometry.min_angle_deg, self.geometry.max_angle_deg)
    }

    /// Pulses for an angle change of `delta_deg`, rounded to nearest.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn pulses_for(&self, delta_deg: f64) -> u64 {
        (delta_deg.abs() * self.geometry.pulses_per_degree()).round() as u64
    }

    /// Raw and corrected angles for a pose, no limits applied.
    pub fn solve(&self, target: Pose) -> KinResult<(JointAngles, JointAngles)> {
        let raw = self.ik.inverse(target)?;
        let corrected = self.corrector.correct_angles(raw, target.z)?;
        Ok((raw, corrected))
    }

    /// Plan a move from `state` to `target` without touching the state.
    #[allow(clippy::cast_possible_truncation)]
    pub fn plan(&self, target: Pose, state: &RobotState) -> KinResult<PlannedMove> {
        let (raw, corrected) = self.solve(target)?;
        let commanded = corrected.map(|a| self.clamp_angle(a));
        let current = state.current_angles();

        let commands = std::array::from_fn(|i| {
            let delta = commanded[i] - current[i];
            MotorCommand {
                motor_index: i as u8,
                pulse_count: self.pulses_for(delta),
                direction: Direction::from_delta(delta),
            }
        });

        let planned = PlannedMove {
            target,
            raw,
            corrected,
            commanded,
            commands,
        };
        if planned.was_clamped() {
            tracing::warn!(
                target = %target,
                corrected = %corrected,
                commanded = %commanded,
                "joint angle clamped to limits"
            );
        }
        tracing::debug!(
            target = %target,
            raw = %raw,
            corrected = %corrected,
            commanded = %commanded,
            pulses = planned.total_pulses(),
            "move planned"
        );
        Ok(planned)
    }

    /// `plan` and commit in one step.
    pub fn plan_move(
        &self,
        target: Pose,
        state: &mut RobotState,
    ) -> KinResult<[MotorCommand; ARM_COUNT]> {
        let planned = self.plan(target, state)?;
        planned.commit(state);
        Ok(planned.commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DeltaError, Unreachable};

    fn planner(max: f64) -> MotionPlanner {
        let g = GeometryConfig {
            max_angle_deg: max,
            ..GeometryConfig::default()
        };
        MotionPlanner::new(g, Corrector::uncalibrated()).unwrap()
    }

    #[test]
    fn retracted_to_neutral_height() {
        // inverse(0,0,43) is ~0.2256°, so this limit makes the move exactly -113°
        let theta = planner(90.0)
            .inverse()
            .inverse(Pose::new(0.0, 0.0, 43.0))
            .unwrap()
            .theta1();
        let p = planner(theta + 113.0);
        let mut state = RobotState::new(JointAngles::uniform(p.geometry().max_angle_deg));

        let cmds = p.plan_move(Pose::new(0.0, 0.0, 43.0), &mut state).unwrap();
        for (i, c) in cmds.iter().enumerate() {
            assert_eq!(c.motor_index as usize, i);
            assert_eq!(c.pulse_count, 4520);
            assert_eq!(c.direction, Direction::Negative);
            assert_eq!(c.direction.wire_value(), 1);
        }
        assert!((state.current_angles()[0] - theta).abs() < 1e-12);
    }

    #[test]
    fn repeating_a_move_sends_nothing() {
        let p = planner(90.0);
        let mut state = RobotState::new(JointAngles::uniform(90.0));
        p.plan_move(Pose::new(3.0, 4.0, 50.0), &mut state).unwrap();
        let again = p.plan_move(Pose::new(3.0, 4.0, 50.0), &mut state).unwrap();
        assert!(again.iter().all(|c| c.pulse_count == 0));
    }

    #[test]
    fn upward_move_is_positive() {
        let p = planner(90.0);
        let mut state = RobotState::new(JointAngles::uniform(-20.0));
        let cmds = p.plan_move(Pose::new(0.0, 0.0, 43.0), &mut state).unwrap();
        assert!(cmds.iter().all(|c| c.direction == Direction::Positive));
    }

    #[test]
    fn clamps_to_limits() {
        // z=20 solves to ~46.2°, above a 30° ceiling
        let p = planner(30.0);
        let state = RobotState::new(JointAngles::uniform(0.0));
        let m = p.plan(Pose::new(0.0, 0.0, 20.0), &state).unwrap();
        assert!(m.was_clamped());
        assert_eq!(m.commanded, JointAngles::uniform(30.0));
        assert_eq!(m.commands[0].pulse_count, 1200);
    }

    #[test]
    fn plan_does_not_touch_state() {
        let p = planner(90.0);
        let state = RobotState::new(JointAngles::uniform(90.0));
        let before = state;
        let m = p.plan(Pose::new(0.0, 0.0, 60.0), &state).unwrap();
        assert_eq!(state, before);
        let mut state = state;
        m.commit(&mut state);
        assert_eq!(state.current_angles(), m.commanded);
    }

    #[test]
    fn unreachable_leaves_state_alone() {
        let p = planner(90.0);
        let mut state = RobotState::new(JointAngles::uniform(90.0));
        let err = p
            .plan_move(Pose::new(0.0, 0.0, 127.0), &mut state)
            .unwrap_err();
        assert!(matches!(err, DeltaError::Unreachable(Unreachable::Discriminant { .. })));
        assert_eq!(state.current_angles(), JointAngles::uniform(90.0));
    }

    #[test]
    fn home_overrides_state() {
        let mut state = RobotState::new(JointAngles::uniform(90.0));
        state.home(JointAngles::new(1.0, 2.0, 3.0));
        assert_eq!(state.current_angles(), JointAngles::new(1.0, 2.0, 3.0));
    }
}
