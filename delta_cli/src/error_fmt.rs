//! Human-readable error descriptions and structured JSON error formatting.

use delta_core::error::{BuildError, DeltaError, Unreachable};

/// Stable name for the JSON `reason` field.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<DeltaError>() {
        Some(DeltaError::Unreachable(_)) => "Unreachable",
        Some(DeltaError::OutOfRange { .. }) => "OutOfRange",
        Some(DeltaError::Transport(_)) => "Transport",
        Some(DeltaError::Aborted) => "Aborted",
        Some(DeltaError::Config(_)) => "Config",
        None if err.downcast_ref::<BuildError>().is_some() => "Config",
        None => "Error",
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingGeometry => {
                "What happened: The planner was built without a geometry.\nLikely causes: The [geometry] section was not mapped into the builder.\nHow to fix: Pass the config geometry via with_geometry(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML or calibration data.\nHow to fix: Edit the config or calibration file, then rerun `delta self-check`."
            ),
        };
    }

    if let Some(de) = err.downcast_ref::<DeltaError>() {
        return match de {
            DeltaError::Unreachable(u) => {
                let which = match u {
                    Unreachable::Discriminant { arm }
                    | Unreachable::NoConvergence { arm }
                    | Unreachable::DegenerateHeight { arm } => format!("arm {arm} cannot reach it"),
                    Unreachable::SpheresDisjoint | Unreachable::DegenerateElbows => {
                        "the lower arms cannot meet".to_string()
                    }
                };
                format!(
                    "What happened: Target is outside the workspace ({which}).\nLikely causes: Coordinates beyond arm reach, or wrong [geometry] lengths / z_offset.\nHow to fix: Pick a closer target or check the geometry. Context: {err}"
                )
            }
            DeltaError::OutOfRange { z, min, max } => format!(
                "What happened: Height z={z:.3} is outside the calibrated range [{min:.3}, {max:.3}].\nLikely causes: Calibration samples do not cover this height.\nHow to fix: Add samples around this height, or set calibration.out_of_range = \"zero\" to move uncorrected."
            ),
            DeltaError::Transport(msg) => format!(
                "What happened: The command batch could not be delivered ({msg}).\nLikely causes: Controller host unreachable, scp/ssh authentication, or an unwritable transport.frame_path.\nHow to fix: Check [transport] settings and try `ssh <remote_host>` by hand. The robot state was not advanced for this move."
            ),
            DeltaError::Aborted => {
                "What happened: Run stopped by user request.\nLikely causes: Ctrl-C during `delta run`.\nHow to fix: Moves already sent were committed; re-home before resuming.".to_string()
            }
            DeltaError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    // String-based heuristics for errors coming from config loading
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    // Calibration CSV header special-case
    if err.chain().any(|c| {
        c.to_string()
            .to_ascii_lowercase()
            .contains("calibration csv must have headers")
    }) {
        return "Invalid headers in calibration CSV. Expected 'z,angle_deg'.".to_string();
    }

    if lower.contains("read config") {
        return format!(
            "What happened: {msg}.\nLikely causes: Wrong --config path or missing file.\nHow to fix: Pass --config <FILE> pointing at a readable TOML file."
        );
    }

    if lower.contains("parse config") || lower.contains("invalid config") {
        let mut cause = String::new();
        if let Some(src) = err.source() {
            cause = format!(" ({src})");
        }
        return format!(
            "What happened: Configuration is invalid{cause}.\nLikely causes: Missing [geometry], [limits] or [motor] keys, or out-of-range values.\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable process exit codes; clap handles usage errors (2) itself.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<DeltaError>() {
        Some(DeltaError::Unreachable(_)) => 3,
        Some(DeltaError::OutOfRange { .. }) => 4,
        Some(DeltaError::Transport(_)) => 5,
        Some(DeltaError::Aborted) => 6,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let mut obj = json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    });
    if let Some(DeltaError::OutOfRange { z, min, max }) = err.downcast_ref::<DeltaError>() {
        obj["details"] = json!({ "z": z, "min": min, "max": max });
    }
    obj.to_string()
}
