pub mod error;
pub mod frame;
pub mod remote;
pub mod util;

use delta_traits::{ARM_COUNT, CommandSink, MotorCommand};

pub use frame::{FrameFormat, FrameRecord, FrameSpec, Ramp};
pub use remote::{RemoteTarget, RemoteTransport};

/// In-memory controller: encodes each batch like the real transport would,
/// decodes it back and integrates the step positions.
#[derive(Debug, Default)]
pub struct SimulatedController {
    spec: FrameSpec,
    frames: Vec<Vec<u8>>,
    /// Signed step position per motor.
    position: [i64; ARM_COUNT],
}

impl SimulatedController {
    pub fn new(spec: FrameSpec) -> Self {
        Self {
            spec,
            ..Self::default()
        }
    }

    pub fn frames(&self) -> &[Vec<u8>] {
        &self.frames
    }

    pub fn position(&self) -> [i64; ARM_COUNT] {
        self.position
    }

    pub fn apply(&mut self, batch: &[MotorCommand]) -> error::Result<()> {
        let bytes = frame::encode(batch, &self.spec)?;
        for rec in frame::decode(&bytes, self.spec.format)? {
            let c = rec.command;
            let steps = i64::try_from(c.pulse_count).map_err(|_| {
                error::HwError::Encoding(format!("pulse_count {} overflows", c.pulse_count))
            })?;
            self.position[usize::from(c.motor_index)] += c.direction.signum() * steps;
        }
        tracing::debug!(bytes = bytes.len(), position = ?self.position, "simulated frame");
        self.frames.push(bytes);
        Ok(())
    }
}

impl CommandSink for SimulatedController {
    fn send(
        &mut self,
        batch: &[MotorCommand],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.apply(batch).map_err(Into::into)
    }
}
