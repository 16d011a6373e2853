//! Frame delivery by file drop plus optional `scp` / `ssh`.

use std::path::{Path, PathBuf};
use std::process::Command;

use delta_traits::{CommandSink, MotorCommand};

use crate::error::{HwError, Result};
use crate::frame::{FrameSpec, encode};
use crate::util::write_atomic;

/// Where the frame goes after it is written locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    /// `user@host`
    pub host: String,
    pub path: String,
    /// Run on the host after each copy.
    pub command: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RemoteTransport {
    frame_path: PathBuf,
    spec: FrameSpec,
    target: Option<RemoteTarget>,
    scp: String,
    ssh: String,
}

impl RemoteTransport {
    pub fn new(frame_path: impl Into<PathBuf>, spec: FrameSpec) -> Self {
        Self {
            frame_path: frame_path.into(),
            spec,
            target: None,
            scp: "scp".into(),
            ssh: "ssh".into(),
        }
    }

    pub fn with_target(mut self, target: RemoteTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// Override the copy and remote-shell programs (wrappers, test doubles).
    pub fn with_programs(mut self, scp: impl Into<String>, ssh: impl Into<String>) -> Self {
        self.scp = scp.into();
        self.ssh = ssh.into();
        self
    }

    pub fn frame_path(&self) -> &Path {
        &self.frame_path
    }

    /// Encode, write, copy, run. Stops at the first failing step.
    pub fn deliver(&mut self, batch: &[MotorCommand]) -> Result<()> {
        let bytes = encode(batch, &self.spec)?;
        write_atomic(&self.frame_path, &bytes)?;
        tracing::debug!(path = %self.frame_path.display(), bytes = bytes.len(), "frame written");

        let Some(target) = &self.target else {
            return Ok(());
        };

        let dest = format!("{}:{}", target.host, target.path);
        run(Command::new(&self.scp).arg(&self.frame_path).arg(&dest), &self.scp)?;
        tracing::debug!(dest = %dest, "frame copied");

        if let Some(cmd) = &target.command {
            run(Command::new(&self.ssh).arg(&target.host).arg(cmd), &self.ssh)?;
            tracing::debug!(host = %target.host, command = %cmd, "controller command ran");
        }
        Ok(())
    }
}

fn run(cmd: &mut Command, program: &str) -> Result<()> {
    let out = cmd.output()?;
    if out.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&out.stderr);
    tracing::warn!(program, status = %out.status, stderr = %stderr.trim(), "remote step failed");
    Err(HwError::CommandFailed {
        program: program.to_string(),
        status: out.status.to_string(),
    })
}

impl CommandSink for RemoteTransport {
    fn send(
        &mut self,
        batch: &[MotorCommand],
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.deliver(batch).map_err(Into::into)
    }
}
