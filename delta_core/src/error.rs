use thiserror::Error;

/// Why a pose (or one arm's sub-problem) has no geometric solution.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Unreachable {
    #[error("arm {arm}: circle intersection has negative discriminant")]
    Discriminant { arm: usize },
    #[error("arm {arm}: newton-raphson did not converge")]
    NoConvergence { arm: usize },
    #[error("arm {arm}: solver height is zero")]
    DegenerateHeight { arm: usize },
    #[error("elbow spheres do not intersect")]
    SpheresDisjoint,
    #[error("elbow positions are degenerate")]
    DegenerateElbows,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeltaError {
    #[error("pose unreachable: {0}")]
    Unreachable(Unreachable),
    #[error("calibration query z={z:.3} outside measured range [{min:.3}, {max:.3}]")]
    OutOfRange { z: f64, min: f64, max: f64 },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("run aborted")]
    Aborted,
}

impl From<Unreachable> for DeltaError {
    fn from(u: Unreachable) -> Self {
        DeltaError::Unreachable(u)
    }
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing geometry")]
    MissingGeometry,
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Result of the pure kinematics/planning operations.
pub type KinResult<T> = std::result::Result<T, DeltaError>;

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
