//! Binary command frame read by the stepper controller.
//!
//! One record per motor, in batch order. Every field is a little-endian `i32`:
//!
//! | format   | fields                                                        | bytes |
//! |----------|---------------------------------------------------------------|-------|
//! | basic    | motor_index, pulse_count, direction                           | 12    |
//! | extended | basic fields, frequency_hz, accel_pulses, decel_pulses        | 24    |

use delta_traits::{ARM_COUNT, Direction, MotorCommand};

use crate::error::{HwError, Result};

const FIELD: usize = std::mem::size_of::<i32>();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameFormat {
    #[default]
    Basic,
    Extended,
}

impl FrameFormat {
    pub const fn record_len(self) -> usize {
        match self {
            FrameFormat::Basic => 3 * FIELD,
            FrameFormat::Extended => 6 * FIELD,
        }
    }
}

/// Speed profile fields carried by extended frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ramp {
    pub frequency_hz: u32,
    pub accel_pulses: u32,
    pub decel_pulses: u32,
}

impl Default for Ramp {
    fn default() -> Self {
        Self {
            frequency_hz: 2000,
            accel_pulses: 0,
            decel_pulses: 0,
        }
    }
}

impl Ramp {
    /// Ramp lengths limited to half the move each.
    pub fn capped_for(&self, pulse_count: u64) -> Ramp {
        let half = u32::try_from(pulse_count / 2).unwrap_or(u32::MAX);
        Ramp {
            frequency_hz: self.frequency_hz,
            accel_pulses: self.accel_pulses.min(half),
            decel_pulses: self.decel_pulses.min(half),
        }
    }
}

/// How batches are laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameSpec {
    pub format: FrameFormat,
    /// Only written for `FrameFormat::Extended`.
    pub ramp: Ramp,
}

impl FrameSpec {
    pub fn basic() -> Self {
        Self::default()
    }

    pub fn extended(ramp: Ramp) -> Self {
        Self {
            format: FrameFormat::Extended,
            ramp,
        }
    }
}

/// A decoded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRecord {
    pub command: MotorCommand,
    /// Present for extended frames.
    pub ramp: Option<Ramp>,
}

fn to_i32(name: &str, v: u64) -> Result<i32> {
    i32::try_from(v).map_err(|_| HwError::Encoding(format!("{name} {v} does not fit in i32")))
}

pub fn encode(batch: &[MotorCommand], spec: &FrameSpec) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(batch.len() * spec.format.record_len());
    for cmd in batch {
        let mut fields = vec![
            i32::from(cmd.motor_index),
            to_i32("pulse_count", cmd.pulse_count)?,
            i32::from(cmd.direction.wire_value()),
        ];
        if spec.format == FrameFormat::Extended {
            let ramp = spec.ramp.capped_for(cmd.pulse_count);
            fields.push(to_i32("frequency_hz", u64::from(ramp.frequency_hz))?);
            fields.push(to_i32("accel_pulses", u64::from(ramp.accel_pulses))?);
            fields.push(to_i32("decel_pulses", u64::from(ramp.decel_pulses))?);
        }
        for f in fields {
            out.extend_from_slice(&f.to_le_bytes());
        }
    }
    Ok(out)
}

fn non_negative(name: &str, v: i32, record: usize) -> Result<u32> {
    u32::try_from(v).map_err(|_| HwError::Decoding(format!("record {record}: negative {name} {v}")))
}

pub fn decode(bytes: &[u8], format: FrameFormat) -> Result<Vec<FrameRecord>> {
    let len = format.record_len();
    if bytes.len() % len != 0 {
        return Err(HwError::Decoding(format!(
            "frame length {} is not a multiple of {len}",
            bytes.len()
        )));
    }
    let mut records = Vec::with_capacity(bytes.len() / len);
    for (r, chunk) in bytes.chunks_exact(len).enumerate() {
        let fields: Vec<i32> = chunk
            .chunks_exact(FIELD)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        let motor_index = u8::try_from(fields[0])
            .ok()
            .filter(|i| usize::from(*i) < ARM_COUNT)
            .ok_or_else(|| HwError::Decoding(format!("record {r}: bad motor index {}", fields[0])))?;
        let pulse_count = u64::from(non_negative("pulse_count", fields[1], r)?);
        let direction = Direction::from_wire(i64::from(fields[2]))
            .ok_or_else(|| HwError::Decoding(format!("record {r}: bad direction {}", fields[2])))?;
        let ramp = match format {
            FrameFormat::Basic => None,
            FrameFormat::Extended => Some(Ramp {
                frequency_hz: non_negative("frequency_hz", fields[3], r)?,
                accel_pulses: non_negative("accel_pulses", fields[4], r)?,
                decel_pulses: non_negative("decel_pulses", fields[5], r)?,
            }),
        };
        records.push(FrameRecord {
            command: MotorCommand {
                motor_index,
                pulse_count,
                direction,
            },
            ramp,
        });
    }
    Ok(records)
}
