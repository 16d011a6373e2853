//! `From` implementations bridging `delta_config` types to `delta_core` types.

use crate::calibration::{CalibrationSample, OutOfRangePolicy};
use crate::geometry::{GeometryConfig, JointAngles, Pose};

// ── GeometryConfig ───────────────────────────────────────────────────────────

impl From<&delta_config::Config> for GeometryConfig {
    fn from(c: &delta_config::Config) -> Self {
        Self {
            effector_edge: c.geometry.effector_edge,
            base_edge: c.geometry.base_edge,
            upper_arm: c.geometry.upper_arm,
            lower_arm: c.geometry.lower_arm,
            min_angle_deg: c.limits.min_angle_deg,
            max_angle_deg: c.limits.max_angle_deg,
            steps_per_rev: c.motor.steps_per_rev,
            gear_ratio: c.motor.gear_ratio,
            z_offset: c.geometry.z_offset,
        }
    }
}

// ── Calibration ──────────────────────────────────────────────────────────────

impl From<&delta_config::CalibrationRow> for CalibrationSample {
    fn from(r: &delta_config::CalibrationRow) -> Self {
        Self::new(r.z, r.angle_deg)
    }
}

impl From<delta_config::OutOfRangeMode> for OutOfRangePolicy {
    fn from(m: delta_config::OutOfRangeMode) -> Self {
        match m {
            delta_config::OutOfRangeMode::Reject => OutOfRangePolicy::Reject,
            delta_config::OutOfRangeMode::Zero => OutOfRangePolicy::ZeroCorrection,
        }
    }
}

// ── Path ─────────────────────────────────────────────────────────────────────

impl From<&delta_config::Waypoint> for Pose {
    fn from(w: &delta_config::Waypoint) -> Self {
        Pose::new(w.x, w.y, w.z)
    }
}

impl From<[f64; 3]> for JointAngles {
    fn from(a: [f64; 3]) -> Self {
        JointAngles(a)
    }
}
