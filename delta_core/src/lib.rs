#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Delta robot kinematics and motion planning (I/O free).
//!
//! Everything here is pure computation over a fixed [`GeometryConfig`]; the
//! only way out is a [`delta_traits::CommandSink`] handed to [`path::run_path`].
//!
//! ## Architecture
//!
//! - **Kinematics**: closed-form forward/inverse solvers, plus a Newton-Raphson
//!   inverse used as a cross-check (`kinematics` module)
//! - **Calibration**: measured-vs-computed table and the `Corrector` that applies it
//! - **Planning**: corrected, clamped angles to pulse counts (`planner` module)
//! - **Paths**: waypoint runs with inter-move delay and shutdown (`path` module)
//!
//! ## Angles
//!
//! All angles are degrees. The inverse solver can report angles past 180;
//! the corrector maps them into `(-180, 180]` with [`util::unwrap_deg`].

pub mod builder;
pub mod calibration;
pub mod conversions;
pub mod error;
pub mod geometry;
pub mod hw_error;
pub mod kinematics;
pub mod mocks;
pub mod path;
pub mod planner;
pub mod util;

pub use builder::{PlannerBuilder, build_planner};
pub use calibration::{
    CalibrationPoint, CalibrationSample, CalibrationTable, Corrector, OutOfRangePolicy,
};
pub use error::{BuildError, DeltaError, KinResult, Result, Unreachable};
pub use geometry::{GeometryConfig, JointAngles, Pose};
pub use kinematics::{ForwardKinematics, InverseKinematics};
pub use path::{PathOptions, PathReport, run_path};
pub use planner::{MotionPlanner, PlannedMove, RobotState};
