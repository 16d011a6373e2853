use assert_cmd::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[geometry]
effector_edge = 30.0
base_edge = 60.0
upper_arm = 50.0
lower_arm = 80.0
z_offset = 11.2

[limits]
min_angle_deg = -90.0
max_angle_deg = 90.0

[motor]
steps_per_rev = 200
gear_ratio = 72.0

[calibration]
samples = [[30.0, 19.484108], [60.0, -15.926484]]

[path]
move_delay_ms = 0
waypoints = [[0.0, 0.0, 43.0], [10.0, -5.0, 50.0]]
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn json_cmd(cfg: &PathBuf, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("delta").unwrap();
    cmd.arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(cfg)
        .args(args);
    cmd
}

fn last_json_line(bytes: &[u8]) -> serde_json::Value {
    let text = String::from_utf8_lossy(bytes);
    let line = text
        .lines()
        .rev()
        .find(|l| l.trim_start().starts_with('{'))
        .unwrap_or("");
    serde_json::from_str(line).unwrap_or_else(|e| panic!("bad JSON line {line:?}: {e}; output: {text}"))
}

fn f64_triple(v: &serde_json::Value, key: &str) -> [f64; 3] {
    let arr = v
        .get(key)
        .and_then(|x| x.as_array())
        .unwrap_or_else(|| panic!("{key} missing in {v}"));
    assert_eq!(arr.len(), 3, "{key} should have three entries");
    [0, 1, 2].map(|i| arr[i].as_f64().unwrap())
}

/// Validate the JSONL schema for an inverse-kinematics query.
#[rstest]
fn ik_success_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = json_cmd(&cfg, &["ik", "--x", "0", "--y", "0", "--z", "43"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = last_json_line(&out);

    assert_eq!(v["command"], "ik");
    assert!(v.get("timestamp").and_then(|x| x.as_u64()).is_some());
    let raw = f64_triple(&v, "raw_deg");
    let corrected = f64_triple(&v, "corrected_deg");
    let commanded = f64_triple(&v, "commanded_deg");
    for i in 0..3 {
        assert!((raw[i] - 0.2256).abs() < 1e-3);
        assert!((corrected[i] - raw[i] - 1.0).abs() < 1e-3);
        assert_eq!(corrected[i], commanded[i]);
    }
}

/// Validate the JSONL schema for a path run.
#[rstest]
fn run_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = json_cmd(&cfg, &["run", "--dry-run"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = last_json_line(&out);

    assert_eq!(v["command"], "run");
    assert_eq!(v["moves"], 2);
    assert_eq!(v["dry_run"], true);
    let pulses = v["pulses"].as_array().unwrap();
    assert_eq!(pulses.len(), 3);
    assert!(pulses.iter().all(|p| p.as_u64().is_some()));
    f64_triple(&v, "final_deg");
    let steps = v["sim_steps"].as_array().unwrap();
    assert!(steps.iter().all(|s| s.as_i64().is_some()));
}

/// Error objects go to stderr with a stable reason and exit code.
#[rstest]
#[case(&["ik", "--x", "0", "--y", "0", "--z", "127"], "Unreachable", 3)]
#[case(&["ik", "--x", "0", "--y", "0", "--z", "80"], "OutOfRange", 4)]
fn error_schema(#[case] args: &[&str], #[case] reason: &str, #[case] code: i32) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = json_cmd(&cfg, args)
        .assert()
        .code(code)
        .get_output()
        .stderr
        .clone();
    let v = last_json_line(&out);

    assert_eq!(v["reason"], reason);
    assert_eq!(v["exit_code"], code);
    assert!(v.get("message").and_then(|x| x.as_str()).is_some());
    if reason == "OutOfRange" {
        assert_eq!(v["details"]["min"], 30.0);
        assert_eq!(v["details"]["max"], 60.0);
    }
}
