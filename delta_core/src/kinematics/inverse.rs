use super::{ARM_ROTATION_DEG, to_arm_frame};
use crate::error::{KinResult, Unreachable};
use crate::geometry::{GeometryConfig, JointAngles, Pose};
use crate::util::unwrap_deg;

/// Starting guess for the Newton iteration, radians.
pub const NEWTON_INITIAL_RAD: f64 = 0.5;
pub const NEWTON_MAX_ITER: usize = 1000;
/// Stop once the squared-length residual falls below this.
pub const NEWTON_TOLERANCE: f64 = 1e-6;

/// Effector position to joint angles.
#[derive(Debug, Clone, Copy)]
pub struct InverseKinematics {
    geometry: GeometryConfig,
}

impl InverseKinematics {
    pub fn new(geometry: GeometryConfig) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &GeometryConfig {
        &self.geometry
    }

    /// Closed-form joint angles for `pose`, in degrees.
    ///
    /// Angles come back raw: the `+180` branch can push them past 180, so
    /// callers that need the signed range go through [`unwrap_deg`].
    /// Any arm failing fails the whole pose.
    pub fn inverse(&self, pose: Pose) -> KinResult<JointAngles> {
        let z0 = pose.z + self.geometry.z_offset;
        let mut out = [0.0; 3];
        for (arm, rot) in ARM_ROTATION_DEG.iter().enumerate() {
            let (x, y) = to_arm_frame(pose.x, pose.y, *rot);
            out[arm] = self.arm_angle(arm, x, y, z0)?;
        }
        Ok(JointAngles(out))
    }

    /// Circle/line intersection in the arm's Y-Z plane.
    fn arm_angle(&self, arm: usize, x0: f64, y0: f64, z0: f64) -> Result<f64, Unreachable> {
        let g = &self.geometry;
        let rf = g.upper_arm;
        let re = g.lower_arm;

        if z0 == 0.0 {
            return Err(Unreachable::DegenerateHeight { arm });
        }

        let y1 = -g.base_joint_offset();
        let y0 = y0 - g.effector_joint_offset();

        // z = a + b*y
        let a = (x0 * x0 + y0 * y0 + z0 * z0 + rf * rf - re * re - y1 * y1) / (2.0 * z0);
        let b = (y1 - y0) / z0;

        let d = -(a + b * y1).powi(2) + rf * (b * b * rf + rf);
        if d.is_nan() || d < 0.0 {
            return Err(Unreachable::Discriminant { arm });
        }

        let yj = (y1 - a * b - d.sqrt()) / (b * b + 1.0);
        let zj = a + b * yj;

        let mut theta = (-zj / (y1 - yj)).atan().to_degrees();
        if yj > y1 {
            theta += 180.0;
        }
        Ok(theta)
    }

    /// Newton-Raphson solution of the same problem, one arm at a time.
    ///
    /// Used to cross-check [`inverse`](Self::inverse); results are already
    /// normalised into `(-180, 180]`.
    pub fn newton(&self, pose: Pose) -> KinResult<JointAngles> {
        let z0 = pose.z + self.geometry.z_offset;
        let mut out = [0.0; 3];
        for (arm, rot) in ARM_ROTATION_DEG.iter().enumerate() {
            let (x, y) = to_arm_frame(pose.x, pose.y, *rot);
            out[arm] = self.arm_newton(arm, x, y, z0)?;
        }
        Ok(JointAngles(out))
    }

    fn arm_newton(&self, arm: usize, x: f64, y: f64, z0: f64) -> Result<f64, Unreachable> {
        let g = &self.geometry;
        let rf = g.upper_arm;
        let re2 = g.lower_arm * g.lower_arm;
        let base_y = -g.base_joint_offset();
        let ey = y - g.effector_joint_offset();

        let mut alpha = NEWTON_INITIAL_RAD;
        for _ in 0..NEWTON_MAX_ITER {
            let (s, c) = alpha.sin_cos();
            let dy = base_y - rf * c - ey;
            let dz = -rf * s - z0;
            let f = x * x + dy * dy + dz * dz - re2;
            if !f.is_finite() {
                break;
            }
            if f.abs() < NEWTON_TOLERANCE {
                return Ok(unwrap_deg(alpha.to_degrees()));
            }
            let df = 2.0 * dy * (rf * s) - 2.0 * dz * (rf * c);
            if df == 0.0 || !df.is_finite() {
                break;
            }
            alpha -= f / df;
        }
        Err(Unreachable::NoConvergence { arm })
    }
}
