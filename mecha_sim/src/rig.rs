//! Rig assembly and the simulated control loop.
//!
//! Per tick, in this order:
//!
//! 1. acquisition read (plant → AI/DI)
//! 2. fault check, force feedback, PID, `DcMotor::set_torque`
//! 3. acquisition write (AO/DO → plant) and plant step

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use mecha_common::prelude::*;
use mecha_control::PidController;
use mecha_devices::{
    AiForceSensor, AtiCalibration, AtiSensor, DcMotor, Device, DeviceError, ForceSensor,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::plant::{PlantConfig, SpringContactPlant};

/// Simulation failures.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("Rig has no [motor] section")]
    MissingMotor,

    #[error("Rig has neither [ati] nor [force_sensor] for force feedback")]
    MissingForceSensor,

    #[error("Amplifier {name} faulted at tick {tick}")]
    Faulted { name: String, tick: u32 },
}

/// Sim-only tables of the rig file.
#[derive(Debug, Default, Deserialize)]
struct SimSections {
    #[serde(default)]
    plant: PlantConfig,
}

/// Resolve a possibly relative path against a base directory.
fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Force feedback and the axis it is read on.
struct Feedback {
    sensor: Box<dyn ForceSensor>,
    axis: Axis,
}

/// Devices, controller and plant of one simulated rig.
pub struct SimRig {
    io: IoBank,
    motor: DcMotor,
    feedback: Feedback,
    pid: PidController,
    plant: SpringContactPlant,
    cycle_time: Duration,
}

/// End-of-run figures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub ticks: u32,
    pub final_force: f64,
    /// Mean |target − measured| over the last tenth of the run.
    pub settled_error: f64,
    pub peak_current: f64,
    pub throttled_ticks: u32,
    /// Cycles that overran `cycle_time` (paced runs only).
    pub timing_violations: u64,
}

impl SimRig {
    /// Load, validate and assemble a rig from a TOML file.
    pub fn load(path: &Path) -> Result<Self, SimError> {
        let rig = RigConfig::load_validated(path)?;
        let sections = SimSections::load(path)?;
        sections.plant.validate()?;
        let base = path.parent().unwrap_or(Path::new("."));
        Self::build(&rig, sections.plant, base)
    }

    /// Assemble a rig. Relative calibration paths resolve against `base`.
    pub fn build(rig: &RigConfig, plant: PlantConfig, base: &Path) -> Result<Self, SimError> {
        let motor_config = rig.motor.as_ref().ok_or(SimError::MissingMotor)?;
        let motor = DcMotor::from_config(motor_config)?;

        let (feedback, calibration) = if let Some(ati_config) = &rig.ati {
            let mut ati = AtiSensor::from_config(ati_config);
            if let Some(file) = &ati_config.calibration_file {
                if ati.load_calibration(resolve_path(base, file)).is_err() {
                    warn!("ATI sensor {}: using identity calibration", ati.name());
                }
            }
            let calibration = *ati.calibration();
            let feedback = Feedback {
                sensor: Box::new(ati) as Box<dyn ForceSensor>,
                axis: Axis::Z,
            };
            (feedback, calibration)
        } else if let Some(cell_config) = &rig.force_sensor {
            let feedback = Feedback {
                sensor: Box::new(AiForceSensor::from_config(cell_config)),
                axis: Axis::X,
            };
            (feedback, AtiCalibration::identity())
        } else {
            return Err(SimError::MissingForceSensor);
        };

        let pid = rig
            .pid
            .as_ref()
            .map(PidController::from_config)
            .unwrap_or_else(|| PidController::new(0.02, 0.5, 0.0));

        let io = IoBank::new(rig.io.ai, rig.io.ao, rig.io.di, rig.io.dout);
        let plant = SpringContactPlant::new(plant, rig, &calibration);
        info!(
            "Rig {} assembled: motor {} (kt={}), PID kp={} ki={} kd={}",
            rig.shared.service_name,
            motor.name(),
            motor.kt(),
            pid.kp(),
            pid.ki(),
            pid.kd()
        );

        Ok(Self {
            io,
            motor,
            feedback,
            pid,
            plant,
            cycle_time: Duration::from_micros(u64::from(rig.cycle_time_us)),
        })
    }

    /// Plant state, for inspection after a run.
    pub fn plant(&self) -> &SpringContactPlant {
        &self.plant
    }

    /// Run `ticks` control cycles regulating the contact force to
    /// `target_force` [N]. With `paced`, each cycle sleeps out the rest of
    /// `cycle_time`; otherwise simulated time runs as fast as possible.
    pub fn run(
        &mut self,
        ticks: u32,
        target_force: f64,
        paced: bool,
    ) -> Result<RunSummary, SimError> {
        let dt = self.cycle_time.as_secs_f64();
        let settle_from = ticks - ticks / 10;
        let mut summary = RunSummary {
            ticks: 0,
            final_force: 0.0,
            settled_error: 0.0,
            peak_current: 0.0,
            throttled_ticks: 0,
            timing_violations: 0,
        };
        let mut settled_sum = 0.0;

        // Tare against the unloaded plant, then enable.
        self.plant.acquire(&mut self.io);
        self.feedback.sensor.zero(&self.io);
        self.motor.enable(&mut self.io)?;
        self.pid.reset();

        info!(
            "Running {} ticks at {} us, target {} N",
            ticks,
            self.cycle_time.as_micros(),
            target_force
        );

        for tick in 0..ticks {
            let cycle_start = Instant::now();
            let now = self.cycle_time * tick;

            self.plant.acquire(&mut self.io);

            if let Some(amp) = self.motor.amplifier_mut() {
                if amp.is_faulted(&self.io) {
                    let name = amp.name().to_string();
                    error!("Amplifier {} faulted at tick {}, disabling", name, tick);
                    self.motor.disable(&mut self.io)?;
                    return Err(SimError::Faulted { name, tick });
                }
            }

            let measured = self.feedback.sensor.force(&self.io, self.feedback.axis);
            let torque = self.pid.calculate(target_force, measured, now);
            self.motor.set_torque(&mut self.io, torque, now);

            self.plant.step(&self.io, dt);

            summary.ticks += 1;
            summary.final_force = measured;
            summary.peak_current = summary.peak_current.max(self.plant.current().abs());
            if self.motor.limiter().is_throttled() {
                summary.throttled_ticks += 1;
            }
            if tick >= settle_from {
                settled_sum += (target_force - measured).abs();
            }

            if tick % 1000 == 0 {
                debug!(
                    "tick {}: force={:.3} N, torque={:.4} Nm, current={:.3} A",
                    tick,
                    measured,
                    torque,
                    self.plant.current()
                );
            }

            if paced {
                let elapsed = cycle_start.elapsed();
                if elapsed < self.cycle_time {
                    std::thread::sleep(self.cycle_time - elapsed);
                } else {
                    summary.timing_violations += 1;
                }
            }
        }

        self.motor.disable(&mut self.io)?;
        let settled_ticks = ticks - settle_from;
        if settled_ticks > 0 {
            summary.settled_error = settled_sum / f64::from(settled_ticks);
        }
        if !self.motor.warnings().is_empty() {
            warn!("Motor warnings: {:?}", self.motor.warnings());
        }
        Ok(summary)
    }
}
