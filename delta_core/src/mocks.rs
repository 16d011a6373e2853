//! Test and helper sinks for delta_core.

use delta_traits::{CommandSink, MotorCommand};
use std::sync::{Arc, Mutex};

/// Keeps every batch it receives. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    batches: Arc<Mutex<Vec<Vec<MotorCommand>>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<Vec<MotorCommand>> {
        self.batches
            .lock()
            .map(|b| b.clone())
            .unwrap_or_default()
    }
}

impl CommandSink for RecordingSink {
    fn send(
        &mut self,
        batch: &[MotorCommand],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.batches
            .lock()
            .map_err(|_| std::io::Error::other("recording sink poisoned"))?
            .push(batch.to_vec());
        Ok(())
    }
}

/// Accepts `accept` batches, then fails every send.
#[derive(Debug, Clone, Default)]
pub struct RejectingSink {
    pub accept: usize,
    sent: usize,
}

impl RejectingSink {
    pub fn after(accept: usize) -> Self {
        Self { accept, sent: 0 }
    }
}

impl CommandSink for RejectingSink {
    fn send(
        &mut self,
        _batch: &[MotorCommand],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.sent >= self.accept {
            return Err(Box::new(std::io::Error::other("controller unreachable")));
        }
        self.sent += 1;
        Ok(())
    }
}
