//! Shared vocabulary between the planning core and whatever moves the motors.
//!
//! The core produces [`MotorCommand`] batches and hands them to a
//! [`CommandSink`]; it never knows how a batch reaches the controller.

pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Number of actuated arms on a delta robot.
pub const ARM_COUNT: usize = 3;

/// Rotation sense of a stepper move.
///
/// `Positive` (wire value 0) drives the joint angle up, `Negative` (wire
/// value 1) drives it down. A zero-length move is reported as `Negative`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    /// Direction for a signed angle delta in degrees.
    #[inline]
    pub fn from_delta(delta_deg: f64) -> Self {
        if delta_deg > 0.0 {
            Direction::Positive
        } else {
            Direction::Negative
        }
    }

    /// Value written to the controller frame.
    #[inline]
    pub fn wire_value(self) -> u8 {
        match self {
            Direction::Positive => 0,
            Direction::Negative => 1,
        }
    }

    /// Parse a wire value; anything other than 0/1 is rejected.
    pub fn from_wire(v: i64) -> Option<Self> {
        match v {
            0 => Some(Direction::Positive),
            1 => Some(Direction::Negative),
            _ => None,
        }
    }

    /// +1 for `Positive`, -1 for `Negative`.
    #[inline]
    pub fn signum(self) -> i64 {
        match self {
            Direction::Positive => 1,
            Direction::Negative => -1,
        }
    }
}

/// One stepper move for one arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorCommand {
    /// Arm index, 0..ARM_COUNT, in attachment order 0°, 120°, 240°.
    pub motor_index: u8,
    pub pulse_count: u64,
    pub direction: Direction,
}

/// Destination for planned command batches (file drop, serial link, simulator...).
pub trait CommandSink {
    fn send(
        &mut self,
        batch: &[MotorCommand],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: CommandSink + ?Sized> CommandSink for Box<T> {
    fn send(
        &mut self,
        batch: &[MotorCommand],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).send(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_follows_delta_sign() {
        assert_eq!(Direction::from_delta(0.5), Direction::Positive);
        assert_eq!(Direction::from_delta(-0.5), Direction::Negative);
        assert_eq!(Direction::from_delta(0.0), Direction::Negative);
    }

    #[test]
    fn wire_values_are_stable() {
        assert_eq!(Direction::Positive.wire_value(), 0);
        assert_eq!(Direction::Negative.wire_value(), 1);
        assert_eq!(Direction::from_wire(1), Some(Direction::Negative));
        assert_eq!(Direction::from_wire(2), None);
    }
}
