//! Builder for [`MotionPlanner`] and the config-driven `build_planner`.
//!
//! All checks run in `try_build`; failures come back as [`BuildError`]
//! inside an `eyre::Report` so callers can downcast.

use crate::calibration::{CalibrationSample, CalibrationTable, Corrector, OutOfRangePolicy};
use crate::error::{BuildError, DeltaError, Result};
use crate::geometry::GeometryConfig;
use crate::kinematics::InverseKinematics;
use crate::planner::MotionPlanner;

#[derive(Debug, Default, Clone)]
pub struct PlannerBuilder {
    geometry: Option<GeometryConfig>,
    samples: Vec<CalibrationSample>,
    policy: OutOfRangePolicy,
}

impl PlannerBuilder {
    pub fn with_geometry(mut self, geometry: GeometryConfig) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Calibration samples; an empty list means no correction.
    pub fn with_calibration(mut self, samples: impl Into<Vec<CalibrationSample>>) -> Self {
        self.samples = samples.into();
        self
    }

    pub fn with_out_of_range(mut self, policy: OutOfRangePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn try_build(self) -> Result<MotionPlanner> {
        let PlannerBuilder {
            geometry,
            samples,
            policy,
        } = self;

        let geometry = geometry.ok_or_else(|| eyre::Report::new(BuildError::MissingGeometry))?;
        let geometry = geometry.validated().map_err(|e| match e {
            DeltaError::Config(msg) => eyre::Report::new(BuildError::InvalidConfig(msg)),
            other => eyre::Report::new(other),
        })?;

        let corrector = if samples.is_empty() {
            Corrector::uncalibrated()
        } else {
            let ik = InverseKinematics::new(geometry);
            let table = CalibrationTable::build(&samples, &ik).map_err(|e| match e {
                DeltaError::Config(msg) => eyre::Report::new(BuildError::InvalidConfig(msg)),
                other => eyre::Report::new(other),
            })?;
            tracing::debug!(
                points = table.points().len(),
                z_min = table.z_range().0,
                z_max = table.z_range().1,
                policy = ?policy,
                "calibration table built"
            );
            Corrector::new(table, policy)
        };

        Ok(MotionPlanner::from_parts(geometry, corrector))
    }

    pub fn build(self) -> Result<MotionPlanner> {
        self.try_build()
    }
}

/// Build a planner from validated configuration plus already loaded calibration rows.
///
/// `rows` usually comes from `Config::calibration_rows`; an empty slice
/// builds an uncalibrated planner.
pub fn build_planner(
    cfg: &delta_config::Config,
    rows: &[delta_config::CalibrationRow],
) -> Result<MotionPlanner> {
    let samples: Vec<CalibrationSample> = rows.iter().map(CalibrationSample::from).collect();
    MotionPlanner::builder()
        .with_geometry(GeometryConfig::from(cfg))
        .with_calibration(samples)
        .with_out_of_range(OutOfRangePolicy::from(cfg.calibration.out_of_range))
        .try_build()
}
