//! Measured-vs-computed angle table and the corrector built on it.

use crate::error::{DeltaError, KinResult};
use crate::geometry::{JointAngles, Pose};
use crate::kinematics::InverseKinematics;
use crate::util::unwrap_deg;

/// One measurement: the arm angle observed with the effector at height `z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationSample {
    pub z: f64,
    pub measured_angle_deg: f64,
}

impl CalibrationSample {
    pub const fn new(z: f64, measured_angle_deg: f64) -> Self {
        Self {
            z,
            measured_angle_deg,
        }
    }
}

/// A sample with the solver's own answer at that height and the difference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    pub z: f64,
    pub measured_deg: f64,
    pub computed_deg: f64,
    pub error_deg: f64,
}

/// Calibration points ordered by strictly increasing `z`.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    points: Vec<CalibrationPoint>,
}

impl CalibrationTable {
    /// Solve every sample height on the z axis and record the residual.
    pub fn build(samples: &[CalibrationSample], ik: &InverseKinematics) -> KinResult<Self> {
        if samples.len() < 2 {
            return Err(DeltaError::Config(format!(
                "calibration needs at least two samples, got {}",
                samples.len()
            )));
        }
        let mut points = Vec::with_capacity(samples.len());
        for (i, s) in samples.iter().enumerate() {
            if !(s.z.is_finite() && s.measured_angle_deg.is_finite()) {
                return Err(DeltaError::Config(format!(
                    "calibration sample {i} has a non-finite value"
                )));
            }
            if let Some(prev) = points.last().map(|p: &CalibrationPoint| p.z)
                && s.z <= prev
            {
                return Err(DeltaError::Config(format!(
                    "calibration z values must be strictly increasing (sample {i}: {} after {prev})",
                    s.z
                )));
            }
            let raw = ik.inverse(Pose::new(0.0, 0.0, s.z)).map_err(|e| {
                DeltaError::Config(format!("calibration height z={} is unreachable: {e}", s.z))
            })?;
            let computed_deg = unwrap_deg(raw.theta1());
            let measured_deg = unwrap_deg(s.measured_angle_deg);
            points.push(CalibrationPoint {
                z: s.z,
                measured_deg,
                computed_deg,
                error_deg: measured_deg - computed_deg,
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    /// Lowest and highest calibrated heights.
    pub fn z_range(&self) -> (f64, f64) {
        // build() guarantees at least two points
        let first = self.points.first().map_or(f64::NAN, |p| p.z);
        let last = self.points.last().map_or(f64::NAN, |p| p.z);
        (first, last)
    }

    /// Angle error at `z`, linear between neighbouring samples.
    ///
    /// Exactly the stored error at a sample height.
    pub fn interpolate_error(&self, z: f64) -> KinResult<f64> {
        let (min, max) = self.z_range();
        if z.is_nan() || z < min || z > max {
            return Err(DeltaError::OutOfRange { z, min, max });
        }
        // First index with p.z >= z
        let idx = self.points.partition_point(|p| p.z < z);
        let q = &self.points[idx];
        if q.z == z || idx == 0 {
            return Ok(q.error_deg);
        }
        let p = &self.points[idx - 1];
        let t = (z - p.z) / (q.z - p.z);
        Ok(p.error_deg + t * (q.error_deg - p.error_deg))
    }
}

/// What to do with a height outside the calibrated range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutOfRangePolicy {
    #[default]
    Reject,
    ZeroCorrection,
}

/// Turns raw solver output into commanded angles.
#[derive(Debug, Clone, Default)]
pub struct Corrector {
    table: Option<CalibrationTable>,
    policy: OutOfRangePolicy,
}

impl Corrector {
    /// No table: every correction is zero.
    pub fn uncalibrated() -> Self {
        Self::default()
    }

    pub fn new(table: CalibrationTable, policy: OutOfRangePolicy) -> Self {
        Self {
            table: Some(table),
            policy,
        }
    }

    pub fn table(&self) -> Option<&CalibrationTable> {
        self.table.as_ref()
    }

    pub fn policy(&self) -> OutOfRangePolicy {
        self.policy
    }

    pub fn correction_at(&self, z: f64) -> KinResult<f64> {
        let Some(table) = &self.table else {
            return Ok(0.0);
        };
        match table.interpolate_error(z) {
            Ok(e) => Ok(e),
            Err(DeltaError::OutOfRange { min, max, .. })
                if self.policy == OutOfRangePolicy::ZeroCorrection =>
            {
                tracing::debug!(z, min, max, "outside calibrated range, no correction");
                Ok(0.0)
            }
            Err(e) => Err(e),
        }
    }

    /// `unwrap(raw) + correction(z)`
    pub fn correct(&self, raw_deg: f64, z: f64) -> KinResult<f64> {
        Ok(unwrap_deg(raw_deg) + self.correction_at(z)?)
    }

    /// Same correction applied to all three arms.
    pub fn correct_angles(&self, raw: JointAngles, z: f64) -> KinResult<JointAngles> {
        let c = self.correction_at(z)?;
        Ok(raw.map(|a| unwrap_deg(a) + c))
    }
}
