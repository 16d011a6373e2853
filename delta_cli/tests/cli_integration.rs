use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

const BASE_CONFIG: &str = r#"
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
# 40 pulses per degree
steps_per_rev = 200
gear_ratio = 72.0

[path]
move_delay_ms = 0
waypoints = [[0.0, 0.0, 43.0], [10.0, -5.0, 70.0], [-20.0, 15.0, 90.0]]
"#;

// Minimal valid config; sim transport is the default
fn write_config(dir: &tempfile::TempDir, extra: &str) -> PathBuf {
    let path = dir.path().join("cfg.toml");
    fs::write(&path, format!("{BASE_CONFIG}{extra}")).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["ik", "--x", "0", "--y", "0", "--z", "43"], 0, "0.2256", "stdout")]
#[case(&["ik", "--x", "0", "--y", "0", "--z", "127"], 3, "outside the workspace", "stderr")]
#[case(&["ik", "--x", "0", "--y", "0"], 2, "required", "stderr")]
#[case(&["fk", "--theta1", "23.95", "--theta2", "23.95", "--theta3", "23.95"], 0, "27.201", "stdout")]
#[case(&["move", "--x", "0", "--y", "0", "--z", "43", "--from", "90,90,90"], 0, "motor 0: 3591 pulses Negative", "stdout")]
#[case(&["move", "--x", "-20", "--y", "15", "--z", "90"], 0, "motor 2", "stdout")]
#[case(&["run", "--delay-ms", "0"], 0, "moves:  3", "stdout")]
#[case(&["run", "--dry-run"], 0, "(dry run)", "stdout")]
#[case(&["calibration"], 0, "no calibration samples", "stdout")]
#[case(&["self-check"], 0, "OK: 4 poses", "stdout")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let mut cmd = Command::cargo_bin("delta").unwrap();

    // Always include a valid config to avoid relying on default path
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn cli_reports_bad_calibration_header() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let bad_csv = dir.path().join("calib.csv");
    let mut f = fs::File::create(&bad_csv).unwrap();
    writeln!(f, "height,angle").unwrap();
    writeln!(f, "30.0,18.0").unwrap();
    writeln!(f, "60.0,-17.0").unwrap();

    let mut cmd = Command::cargo_bin("delta").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--calibration")
        .arg(&bad_csv)
        .arg("self-check");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid headers"));
}

#[rstest]
fn cli_calibration_csv_shifts_angles() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    // Measured angles sit 1° above the solver at both heights
    let csv = dir.path().join("calib.csv");
    fs::write(&csv, "z,angle_deg\n30.0,19.484108\n60.0,-15.926484\n").unwrap();

    let mut cmd = Command::cargo_bin("delta").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--calibration")
        .arg(&csv)
        .args(["ik", "--x", "0", "--y", "0", "--z", "43"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("corrected: [1.2256°"));

    let mut table = Command::cargo_bin("delta").unwrap();
    table
        .arg("--config")
        .arg(&cfg)
        .arg("--calibration")
        .arg(&csv)
        .arg("calibration");
    table
        .assert()
        .success()
        .stdout(predicate::str::contains("range: [30.000, 60.000]"));
}

#[rstest]
#[case("reject", 4)]
#[case("zero", 0)]
fn cli_out_of_range_policy(#[case] mode: &str, #[case] exit_code: i32) {
    let dir = tempdir().unwrap();
    let extra = format!(
        "\n[calibration]\nout_of_range = \"{mode}\"\nsamples = [[30.0, 19.484108], [60.0, -15.926484]]\n"
    );
    let cfg = write_config(&dir, &extra);

    let mut cmd = Command::cargo_bin("delta").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .args(["ik", "--x", "0", "--y", "0", "--z", "80"]);
    cmd.assert().code(exit_code);
}

#[rstest]
fn cli_unreachable_waypoint_stops_run() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cfg.toml");
    let toml = BASE_CONFIG.replace("[-20.0, 15.0, 90.0]", "[0.0, 0.0, 127.0]");
    fs::write(&path, toml).unwrap();

    let mut cmd = Command::cargo_bin("delta").unwrap();
    cmd.arg("--config").arg(&path).args(["run", "--dry-run"]);
    cmd.assert()
        .code(3)
        .stderr(predicate::str::contains("waypoint 2"));
}

#[rstest]
fn cli_missing_config_is_reported() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("delta").unwrap();
    cmd.arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("self-check");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("read config"));
}

#[rstest]
fn cli_invalid_geometry_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cfg.toml");
    fs::write(&path, BASE_CONFIG.replace("upper_arm = 50.0", "upper_arm = 0.0")).unwrap();

    let mut cmd = Command::cargo_bin("delta").unwrap();
    cmd.arg("--config").arg(&path).arg("self-check");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration is invalid"));
}

#[cfg(unix)]
#[rstest]
fn cli_remote_transport_writes_frame() {
    let dir = tempdir().unwrap();
    let frame = dir.path().join("cmd.bin");
    let extra = format!(
        "\n[transport]\nmode = \"remote\"\nframe_path = \"{}\"\n",
        frame.display()
    );
    let cfg = write_config(&dir, &extra);

    let mut cmd = Command::cargo_bin("delta").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .args(["move", "--x", "0", "--y", "0", "--z", "43"]);
    cmd.assert().success();

    // Three basic records of 12 bytes
    assert_eq!(fs::read(&frame).unwrap().len(), 36);
}
