//! Config file to planned and sent moves, without the CLI.

use std::fs;
use std::time::Duration;

use delta_core::mocks::RecordingSink;
use delta_core::{
    DeltaError, JointAngles, PathOptions, Pose, RobotState, build_planner, run_path,
};
use delta_traits::{Direction, ManualClock};
use rstest::rstest;

const BASE_TOML: &str = r#"
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
steps_per_rev = 1600
gear_ratio = 9.0

[path]
move_delay_ms = 250
waypoints = [[0.0, 0.0, 43.0], { x = 5.0, y = -3.0, z = 50.0 }, [0.0, 0.0, 60.0]]
"#;

fn load(extra: &str) -> delta_config::Config {
    let cfg = delta_config::load_toml(&format!("{BASE_TOML}\n{extra}")).unwrap();
    cfg.validate().unwrap();
    cfg
}

#[rstest]
fn config_waypoints_run_end_to_end() {
    let cfg = load("");
    let rows = cfg.calibration_rows(None).unwrap();
    let planner = build_planner(&cfg, &rows).unwrap();
    let mut state = RobotState::new(JointAngles(cfg.home_angles()));
    let wps: Vec<Pose> = cfg.path.waypoints.iter().map(Pose::from).collect();
    let mut sink = RecordingSink::new();
    let clock = ManualClock::new();
    let opts = PathOptions::with_delay(Duration::from_millis(cfg.path.move_delay_ms));

    let report = run_path(&planner, &mut state, &wps, &mut sink, &clock, &opts).unwrap();

    assert_eq!(report.moves_sent, 3);
    assert_eq!(clock.elapsed(), Duration::from_millis(750));
    let batches = sink.batches();
    // Leaving the retracted home always lowers every arm
    assert!(batches[0].iter().all(|c| c.direction == Direction::Negative));
    let total: u64 = batches.iter().flatten().map(|c| c.pulse_count).sum();
    assert_eq!(total, report.pulses.iter().sum::<u64>());
}

#[rstest]
fn csv_calibration_shifts_commanded_angles() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("cal.csv");
    // Measured angles 1° above what the solver reports at these heights
    fs::write(&csv, "z,angle_deg\n20.0,47.2095\n60.0,-15.9265\n").unwrap();
    let cfg = load(&format!(
        "[calibration]\ncsv = {:?}\n",
        csv.to_string_lossy()
    ));
    let rows = cfg.calibration_rows(None).unwrap();
    let planner = build_planner(&cfg, &rows).unwrap();

    let (raw, corrected) = planner.solve(Pose::new(0.0, 0.0, 43.0)).unwrap();
    for i in 0..3 {
        assert!((corrected[i] - raw[i] - 1.0).abs() < 1e-3, "{raw} -> {corrected}");
    }
}

#[rstest]
#[case("reject", true)]
#[case("zero", false)]
fn out_of_range_policy_comes_from_config(#[case] mode: &str, #[case] rejects: bool) {
    let cfg = load(&format!(
        "[calibration]\nout_of_range = \"{mode}\"\nsamples = [[40.0, 3.0], [60.0, -16.0]]\n"
    ));
    let rows = cfg.calibration_rows(None).unwrap();
    let planner = build_planner(&cfg, &rows).unwrap();
    let mut state = RobotState::new(JointAngles::uniform(90.0));

    let res = planner.plan_move(Pose::new(0.0, 0.0, 80.0), &mut state);
    assert_eq!(matches!(res, Err(DeltaError::OutOfRange { .. })), rejects);
}
