use crate::error::{KinResult, Unreachable};
use crate::geometry::{GeometryConfig, JointAngles, Pose};
use crate::util::SQRT_3;

/// Joint angles to effector position.
#[derive(Debug, Clone, Copy)]
pub struct ForwardKinematics {
    geometry: GeometryConfig,
}

impl ForwardKinematics {
    pub fn new(geometry: GeometryConfig) -> Self {
        Self { geometry }
    }

    /// Effector position for the given joint angles (degrees).
    ///
    /// The effector sits where three spheres of radius `lower_arm` meet, one
    /// around each elbow shifted inward by the effector joint offset. Solving
    /// them reduces to a quadratic in `z0`; of its two roots the one with the
    /// larger `z0` (effector hanging below the elbows) is always taken.
    pub fn forward(&self, angles: JointAngles) -> KinResult<Pose> {
        let g = &self.geometry;
        let rf = g.upper_arm;
        let re = g.lower_arm;
        let t = g.base_joint_offset() - g.effector_joint_offset();
        let [t1, t2, t3] = angles.0.map(f64::to_radians);

        // Elbow of each arm, already pulled in by the effector offset
        let y1 = -(t + rf * t1.cos());
        let z1 = -rf * t1.sin();

        let y2 = (t + rf * t2.cos()) * 0.5;
        let x2 = y2 * SQRT_3;
        let z2 = -rf * t2.sin();

        let y3 = (t + rf * t3.cos()) * 0.5;
        let x3 = -y3 * SQRT_3;
        let z3 = -rf * t3.sin();

        let dnm = (y2 - y1) * x3 - (y3 - y1) * x2;
        if dnm == 0.0 || !dnm.is_finite() {
            return Err(Unreachable::DegenerateElbows.into());
        }

        let w1 = y1 * y1 + z1 * z1;
        let w2 = x2 * x2 + y2 * y2 + z2 * z2;
        let w3 = x3 * x3 + y3 * y3 + z3 * z3;

        // x = (a1*z + b1)/dnm
        let a1 = (z2 - z1) * (y3 - y1) - (z3 - z1) * (y2 - y1);
        let b1 = -((w2 - w1) * (y3 - y1) - (w3 - w1) * (y2 - y1)) / 2.0;

        // y = (a2*z + b2)/dnm
        let a2 = -(z2 - z1) * x3 + (z3 - z1) * x2;
        let b2 = ((w2 - w1) * x3 - (w3 - w1) * x2) / 2.0;

        // a*z^2 + b*z + c = 0
        let a = a1 * a1 + a2 * a2 + dnm * dnm;
        let b = 2.0 * (a1 * b1 + a2 * (b2 - y1 * dnm) - z1 * dnm * dnm);
        let c = (b2 - y1 * dnm).powi(2) + b1 * b1 + dnm * dnm * (z1 * z1 - re * re);

        let d = b * b - 4.0 * a * c;
        if d.is_nan() || d < 0.0 {
            return Err(Unreachable::SpheresDisjoint.into());
        }

        let z0 = 0.5 * (-b + d.sqrt()) / a;
        let x0 = (a1 * z0 + b1) / dnm;
        let y0 = (a2 * z0 + b2) / dnm;

        Ok(Pose::new(x0, y0, z0 - g.z_offset))
    }

    pub fn geometry(&self) -> &GeometryConfig {
        &self.geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeltaError;

    fn fk() -> ForwardKinematics {
        ForwardKinematics::new(GeometryConfig::default())
    }

    #[test]
    fn symmetric_angles_stay_on_axis() {
        let p = fk().forward(JointAngles::uniform(23.95)).unwrap();
        assert!(p.x.abs() < 1e-9 && p.y.abs() < 1e-9, "{p}");
        assert!((p.z - 27.2015).abs() < 1e-3, "{p}");
    }

    #[test]
    fn neutral_pose_height() {
        // inverse(0, 0, 43) gives 0.2256° on every arm
        let p = fk().forward(JointAngles::uniform(0.225_603_345_5)).unwrap();
        assert!((p.z - 43.0).abs() < 1e-6, "{p}");
    }

    #[test]
    fn asymmetric_angles_leave_axis() {
        let p = fk().forward(JointAngles::new(10.0, 20.0, 30.0)).unwrap();
        assert!((p.x - -3.1591).abs() < 1e-3, "{p}");
        assert!((p.y - 5.4793).abs() < 1e-3, "{p}");
        assert!((p.z - 28.8310).abs() < 1e-3, "{p}");
    }

    #[test]
    fn short_lower_arm_cannot_close_the_linkage() {
        let g = GeometryConfig {
            lower_arm: 5.0,
            ..GeometryConfig::default()
        };
        let err = ForwardKinematics::new(g)
            .forward(JointAngles::uniform(0.0))
            .expect_err("spheres should not meet");
        assert_eq!(err, DeltaError::Unreachable(Unreachable::SpheresDisjoint));
    }
}
