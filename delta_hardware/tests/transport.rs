use std::fs;

use delta_hardware::error::HwError;
use delta_hardware::frame::{FrameFormat, decode};
use delta_hardware::{FrameSpec, Ramp, RemoteTarget, RemoteTransport, SimulatedController};
use delta_traits::{CommandSink, Direction, MotorCommand};
use rstest::rstest;

fn batch(n: u64, d: Direction) -> Vec<MotorCommand> {
    (0..3u8)
        .map(|i| MotorCommand {
            motor_index: i,
            pulse_count: n + u64::from(i),
            direction: d,
        })
        .collect()
}

#[rstest]
#[case(FrameSpec::basic(), 36)]
#[case(FrameSpec::extended(Ramp::default()), 72)]
fn simulator_integrates_positions(#[case] spec: FrameSpec, #[case] frame_len: usize) {
    let mut sim = SimulatedController::new(spec);
    sim.send(&batch(100, Direction::Negative)).unwrap();
    sim.send(&batch(40, Direction::Positive)).unwrap();

    assert_eq!(sim.position(), [-60, -60, -60]);
    assert_eq!(sim.frames().len(), 2);
    assert!(sim.frames().iter().all(|f| f.len() == frame_len));
}

#[rstest]
fn simulator_surfaces_encoding_errors() {
    let mut sim = SimulatedController::new(FrameSpec::basic());
    let err = sim
        .send(&[MotorCommand {
            motor_index: 0,
            pulse_count: u64::MAX,
            direction: Direction::Positive,
        }])
        .unwrap_err();
    assert!(matches!(err.downcast_ref::<HwError>(), Some(HwError::Encoding(_))));
    assert!(sim.frames().is_empty());
}

#[rstest]
fn local_only_transport_writes_decodable_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cmd.bin");
    let mut t = RemoteTransport::new(&path, FrameSpec::basic());

    t.send(&batch(4520, Direction::Negative)).unwrap();

    let recs = decode(&fs::read(&path).unwrap(), FrameFormat::Basic).unwrap();
    let got: Vec<_> = recs.iter().map(|r| r.command).collect();
    assert_eq!(got, batch(4520, Direction::Negative));
}

#[cfg(unix)]
#[rstest]
fn failing_remote_command_is_a_transport_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut t = RemoteTransport::new(dir.path().join("cmd.bin"), FrameSpec::basic())
        .with_target(RemoteTarget {
            host: "pi@robot.local".into(),
            path: "/home/pi/cmd.bin".into(),
            command: Some("sudo stepper /home/pi/cmd.bin".into()),
        })
        // `true` stands in for a successful copy, `false` for a failing remote run
        .with_programs("true", "false");

    let err = t.deliver(&batch(1, Direction::Positive)).unwrap_err();
    match err {
        HwError::CommandFailed { program, .. } => assert_eq!(program, "false"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[cfg(unix)]
#[rstest]
fn successful_remote_steps() {
    let dir = tempfile::tempdir().unwrap();
    let mut t = RemoteTransport::new(dir.path().join("cmd.bin"), FrameSpec::basic())
        .with_target(RemoteTarget {
            host: "pi@robot.local".into(),
            path: "/home/pi/cmd.bin".into(),
            command: None,
        })
        .with_programs("true", "false");
    t.deliver(&batch(1, Direction::Positive)).unwrap();
    assert!(t.frame_path().exists());
}
