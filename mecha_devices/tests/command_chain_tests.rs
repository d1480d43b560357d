//! Command chain and sensor integration tests.
//!
//! Drives motor → amplifier → I/O bank end to end, checks the fault
//! fail-safe, zeroing of both sensor kinds and ATI calibration files
//! loaded from a temp dir.

use std::fs;
use std::time::Duration;

use mecha_common::config::ConfigLoader;
use mecha_common::diagnostics::DeviceWarning;
use mecha_common::io::{AiChannel, AoChannel, DiChannel, DoChannel, IoBank, TtlLevel};
use mecha_common::rig::RigConfig;
use mecha_common::types::Axis;
use mecha_control::Limiter;
use mecha_devices::{
    AiForceSensor, AtiCalibration, AtiSensor, CalibrationError, CurrentAmplifier, DcMotor, Device,
    ForceSensor, TorqueSensor, Zeroable,
};
use tempfile::TempDir;

const TICK: Duration = Duration::from_millis(1);

const ATI_CHANNELS: [AiChannel; 6] = [
    AiChannel(0),
    AiChannel(1),
    AiChannel(2),
    AiChannel(3),
    AiChannel(4),
    AiChannel(5),
];

fn cal_file(fz_row: &str) -> String {
    format!(
        r#"<FTSensor Serial="FT00001" CalFileVersion="1.1">
  <Calibration>
    <UserAxis Name="Fx" values="1 0 0 0 0 0"/>
    <UserAxis Name="Fy" values="0 1 0 0 0 0"/>
    <UserAxis Name="Fz" values="{fz_row}"/>
    <UserAxis Name="Tx" values="0 0 0 1 0 0"/>
    <UserAxis Name="Ty" values="0 0 0 0 1 0"/>
    <UserAxis Name="Tz" values="0 0 0 0 0 1"/>
  </Calibration>
</FTSensor>
"#
    )
}

fn wired_amplifier() -> CurrentAmplifier {
    let mut amp = CurrentAmplifier::new("amp", 1.0).unwrap();
    amp.bind_command_channel(Some(AoChannel(0)));
    amp.bind_enable_channel(Some(DoChannel(0)));
    amp.bind_fault_channel(Some(DiChannel(0)));
    amp.bind_sense_channel(Some(AiChannel(6)));
    amp
}

#[test]
fn motor_limiter_then_amplifier_then_channel() {
    let mut io = IoBank::new(8, 2, 2, 2);
    let mut motor = DcMotor::new(
        "motor",
        0.5,
        Some(wired_amplifier()),
        Limiter::saturate(-2.0, 2.0),
    )
    .unwrap();
    motor.enable(&mut io).unwrap();

    motor.set_torque(&mut io, 3.0, TICK);

    assert_eq!(motor.torque_command(), 3.0);
    assert!(motor.limiter().limit_exceeded());
    let amp = motor.amplifier().unwrap();
    assert_eq!(amp.current_command(), 2.0);
    assert!(!amp.limiter().limit_exceeded());
    assert_eq!(io.ao(AoChannel(0)), Some(2.0));
    assert!((motor.torque_limited() - 1.0).abs() < 1e-12);
}

#[test]
fn sensed_torque_scales_by_kt() {
    let mut io = IoBank::new(8, 2, 2, 2);
    let mut motor = DcMotor::new("motor", 0.5, Some(wired_amplifier()), Limiter::unlimited())
        .unwrap();
    io.set_ai(AiChannel(6), 1.5);
    assert!((motor.torque_sense(&io) - 0.75).abs() < 1e-12);
}

#[test]
fn accumulate_limiter_throttles_motor_current() {
    let mut io = IoBank::new(8, 2, 2, 2);
    let mut motor = DcMotor::new(
        "motor",
        1.0,
        Some(wired_amplifier()),
        Limiter::accumulate(1.0, 3.0, Duration::from_millis(100)),
    )
    .unwrap();

    let mut t = Duration::ZERO;
    for _ in 0..50 {
        motor.set_torque(&mut io, 3.0, t);
        t += TICK;
    }
    assert_eq!(io.ao(AoChannel(0)), Some(3.0));

    for _ in 0..200 {
        motor.set_torque(&mut io, 3.0, t);
        t += TICK;
    }
    assert!(motor.limiter().is_throttled());
    assert_eq!(io.ao(AoChannel(0)), Some(1.0));
}

#[test]
fn disable_zeroes_command_and_releases_enable() {
    let mut io = IoBank::new(8, 2, 2, 2);
    let mut motor = DcMotor::new("motor", 0.5, Some(wired_amplifier()), Limiter::unlimited())
        .unwrap();
    motor.enable(&mut io).unwrap();
    motor.set_torque(&mut io, 0.5, TICK);
    assert_eq!(io.ao(AoChannel(0)), Some(1.0));

    motor.disable(&mut io).unwrap();
    assert_eq!(io.ao(AoChannel(0)), Some(0.0));
    assert_eq!(io.dout(DoChannel(0)), Some(TtlLevel::Low));

    motor.enable(&mut io).unwrap();
    assert_eq!(io.dout(DoChannel(0)), Some(TtlLevel::High));
}

#[test]
fn fault_fail_safe() {
    let mut io = IoBank::new(8, 2, 2, 2);
    let mut amp = wired_amplifier();
    io.set_di(DiChannel(0), TtlLevel::Low);
    assert!(!amp.is_faulted(&io));

    amp.bind_fault_channel(None);
    assert!(amp.is_faulted(&io));
    assert!(amp.warnings().contains(DeviceWarning::FAULT_CHANNEL_UNBOUND));
}

#[test]
fn zeroing_is_idempotent_for_every_sensor() {
    let mut io = IoBank::new(8, 0, 0, 0);
    io.ai_mut()
        .copy_from_slice(&[0.12, -0.4, 2.2, 0.05, -0.07, 0.3, 1.1, 0.0]);

    let mut ati = AtiSensor::new("ati", Some(ATI_CHANNELS), AtiCalibration::identity());
    ati.zero(&io);
    ati.zero(&io);
    for axis in Axis::ALL {
        assert!(ati.force(&io, axis).abs() < 1e-12);
        assert!(ati.torque(&io, axis).abs() < 1e-12);
    }

    let mut cell = AiForceSensor::new("cell", Some(AiChannel(6)), 0.0, 2.0, 1.0);
    cell.zero(&io);
    assert!(cell.force(&io, Axis::X).abs() < 1e-12);
}

#[test]
fn ati_calibration_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("FT00001.cal");
    fs::write(&path, cal_file("0 0 10 0 0 0")).unwrap();

    let mut io = IoBank::new(6, 0, 0, 0);
    io.set_ai(AiChannel(2), 0.25);

    let mut ati = AtiSensor::new("ati", Some(ATI_CHANNELS), AtiCalibration::default());
    ati.load_calibration(&path).unwrap();
    assert!((ati.force(&io, Axis::Z) - 2.5).abs() < 1e-12);
    assert_eq!(ati.forces(&io), [0.0, 0.0, 2.5]);
}

#[test]
fn bad_calibration_file_keeps_previous() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.cal");
    let bad = dir.path().join("bad.cal");
    fs::write(&good, cal_file("0 0 10 0 0 0")).unwrap();
    fs::write(&bad, cal_file("0 0 10 0 0")).unwrap();

    let mut ati = AtiSensor::new("ati", Some(ATI_CHANNELS), AtiCalibration::default());
    ati.load_calibration(&good).unwrap();
    let loaded = *ati.calibration();

    assert!(matches!(
        ati.load_calibration(&bad),
        Err(CalibrationError::MalformedValues { axis: "Fz", .. })
    ));
    assert!(matches!(
        ati.load_calibration(dir.path().join("missing.cal")),
        Err(CalibrationError::FileNotFound(_))
    ));
    assert_eq!(ati.calibration(), &loaded);
}

#[test]
fn devices_from_rig_config() {
    let rig = RigConfig::from_toml_str(
        r#"
[shared]
service_name = "bench"

[motor]
name = "m0"
kt = 0.5
limiter = { mode = "symmetric", abs_limit = 2.0 }

[motor.amplifier]
name = "a0"
command_gain = 2.0
command_channel = 1
enable_channel = 1
enable_level = "low"

[force_sensor]
name = "cell"
channel = 3
b = 2.0
"#,
    )
    .unwrap();

    let mut io = IoBank::new(4, 2, 2, 2);
    let mut motor = DcMotor::from_config(rig.motor.as_ref().unwrap()).unwrap();
    motor.enable(&mut io).unwrap();
    assert_eq!(io.dout(DoChannel(1)), Some(TtlLevel::Low));
    motor.set_torque(&mut io, 5.0, TICK);
    assert_eq!(io.ao(AoChannel(1)), Some(1.0));

    let mut cell = AiForceSensor::from_config(rig.force_sensor.as_ref().unwrap());
    io.set_ai(AiChannel(3), 1.5);
    assert!((cell.force(&io, Axis::X) - 3.0).abs() < 1e-12);
}

#[test]
fn unreadable_calibration_file_keeps_previous() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.cal");
    let binary = dir.path().join("binary.cal");
    fs::write(&good, cal_file("0 0 10 0 0 0")).unwrap();
    fs::write(&binary, [0xff, 0xfe, 0x00, 0x80]).unwrap();

    let mut ati = AtiSensor::new("ati", Some(ATI_CHANNELS), AtiCalibration::default());
    ati.load_calibration(&good).unwrap();
    let loaded = *ati.calibration();

    assert!(matches!(
        ati.load_calibration(&binary),
        Err(CalibrationError::Io { .. })
    ));
    assert!(matches!(
        ati.load_calibration(dir.path()),
        Err(CalibrationError::Io { .. })
    ));
    assert_eq!(ati.calibration(), &loaded);
}
