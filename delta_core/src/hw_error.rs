//! Maps `Box<dyn Error>` from the `CommandSink` boundary to typed `DeltaError`.
//!
//! With the `hardware-errors` feature, `delta_hardware::error::HwError` is
//! downcast so the message keeps its variant-specific wording.

use crate::error::DeltaError;

/// Map a transport error to `DeltaError::Transport`.
pub fn map_sink_error(e: &(dyn std::error::Error + 'static)) -> DeltaError {
    #[cfg(feature = "hardware-errors")]
    {
        use delta_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::CommandFailed { .. } => {
                    DeltaError::Transport(format!("controller command failed: {hw}"))
                }
                other => DeltaError::Transport(other.to_string()),
            };
        }
    }

    DeltaError::Transport(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_errors_keep_their_message() {
        let e = std::io::Error::other("link down");
        assert_eq!(
            map_sink_error(&e),
            DeltaError::Transport("link down".into())
        );
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn hardware_command_failure_is_labelled() {
        let e = delta_hardware::error::HwError::CommandFailed {
            program: "ssh".into(),
            status: "exit status: 255".into(),
        };
        match map_sink_error(&e) {
            DeltaError::Transport(m) => assert!(m.starts_with("controller command failed"), "{m}"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
