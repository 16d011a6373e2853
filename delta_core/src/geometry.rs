//! Robot geometry, motion limits and the value types that flow between stages.

use std::ops::Index;

use crate::error::{DeltaError, KinResult};
use crate::util::{SQRT_3, TAN_30};

/// Immutable linkage dimensions and motion limits.
///
/// Lengths share one unit (the unit of every `Pose`); angles are degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryConfig {
    /// Side length of the effector triangle.
    pub effector_edge: f64,
    /// Side length of the base triangle.
    pub base_edge: f64,
    /// Motor-driven arm, base joint to elbow.
    pub upper_arm: f64,
    /// Parallelogram link, elbow to effector joint.
    pub lower_arm: f64,
    pub min_angle_deg: f64,
    pub max_angle_deg: f64,
    /// Full steps (or microsteps) per motor revolution.
    pub steps_per_rev: u32,
    /// Motor revolutions per arm revolution.
    pub gear_ratio: f64,
    /// Added to every requested z before solving, so a convenient physical
    /// height maps to a zero joint angle.
    pub z_offset: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            effector_edge: 30.0,
            base_edge: 60.0,
            upper_arm: 50.0,
            lower_arm: 80.0,
            min_angle_deg: -90.0,
            max_angle_deg: 90.0,
            steps_per_rev: 1600,
            gear_ratio: 9.0,
            z_offset: 11.2,
        }
    }
}

impl GeometryConfig {
    /// Check the invariants every solver relies on.
    pub fn validate(&self) -> KinResult<()> {
        let lengths = [
            ("effector_edge", self.effector_edge),
            ("base_edge", self.base_edge),
            ("upper_arm", self.upper_arm),
            ("lower_arm", self.lower_arm),
        ];
        for (name, v) in lengths {
            if !(v.is_finite() && v > 0.0) {
                return Err(DeltaError::Config(format!("{name} must be > 0, got {v}")));
            }
        }
        if !(self.min_angle_deg.is_finite() && self.max_angle_deg.is_finite()) {
            return Err(DeltaError::Config("angle limits must be finite".into()));
        }
        if self.min_angle_deg >= self.max_angle_deg {
            return Err(DeltaError::Config(format!(
                "min_angle_deg ({}) must be < max_angle_deg ({})",
                self.min_angle_deg, self.max_angle_deg
            )));
        }
        if self.steps_per_rev == 0 {
            return Err(DeltaError::Config("steps_per_rev must be > 0".into()));
        }
        if !(self.gear_ratio.is_finite() && self.gear_ratio > 0.0) {
            return Err(DeltaError::Config("gear_ratio must be > 0".into()));
        }
        if !self.z_offset.is_finite() {
            return Err(DeltaError::Config("z_offset must be finite".into()));
        }
        Ok(())
    }

    /// Validate and return self; the usual way to accept a geometry from outside.
    pub fn validated(self) -> KinResult<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Circumradius of the base triangle.
    pub fn base_radius(&self) -> f64 {
        self.base_edge / SQRT_3
    }

    /// Circumradius of the effector triangle.
    pub fn effector_radius(&self) -> f64 {
        self.effector_edge / SQRT_3
    }

    /// Distance from the base center to a motor joint (base inradius).
    #[inline]
    pub fn base_joint_offset(&self) -> f64 {
        0.5 * TAN_30 * self.base_edge
    }

    /// Distance from the effector center to a lower-arm joint (effector inradius).
    #[inline]
    pub fn effector_joint_offset(&self) -> f64 {
        0.5 * TAN_30 * self.effector_edge
    }

    /// Motor pulses per degree of joint travel.
    #[inline]
    pub fn pulses_per_degree(&self) -> f64 {
        f64::from(self.steps_per_rev) * self.gear_ratio / 360.0
    }
}

/// Effector position in the base frame; `z` grows away from the base.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Pose {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl std::fmt::Display for Pose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// One angle per arm in degrees, ordered by attachment angle 0°, 120°, 240°.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointAngles(pub [f64; 3]);

impl JointAngles {
    pub const fn new(theta1: f64, theta2: f64, theta3: f64) -> Self {
        Self([theta1, theta2, theta3])
    }

    /// Same angle on every arm.
    pub const fn uniform(theta: f64) -> Self {
        Self([theta; 3])
    }

    pub fn theta1(&self) -> f64 {
        self.0[0]
    }

    pub fn theta2(&self) -> f64 {
        self.0[1]
    }

    pub fn theta3(&self) -> f64 {
        self.0[2]
    }

    pub fn map(self, f: impl FnMut(f64) -> f64) -> Self {
        Self(self.0.map(f))
    }

    pub fn as_array(&self) -> [f64; 3] {
        self.0
    }
}

impl Index<usize> for JointAngles {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

impl std::fmt::Display for JointAngles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:.4}°, {:.4}°, {:.4}°]",
            self.0[0], self.0[1], self.0[2]
        )
    }
}
