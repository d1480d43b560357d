//! Rig configuration: the devices wired to one acquisition bank.
//!
//! All types deserialize from TOML. Optional fields use `#[serde(default)]`
//! so minimal files stay short. Bounds and channel-range checks are done in
//! [`Validate`] implementations, never during deserialization.
//!
//! # TOML Example
//!
//! ```toml
//! cycle_time_us = 1000
//!
//! [shared]
//! service_name = "paddle-01"
//!
//! [io]
//! ai = 8
//! ao = 2
//! di = 2
//! dout = 2
//!
//! [motor]
//! name = "paddle-motor"
//! kt = 0.0385
//! limiter = { mode = "accumulate", continuous_limit = 3.0, abs_limit = 6.0, time_limit_s = 2.0 }
//!
//! [motor.amplifier]
//! name = "paddle-amp"
//! command_gain = 1.0
//! command_channel = 0
//! enable_channel = 0
//! fault_channel = 0
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{ConfigError, SharedConfig, Validate};
use crate::consts::{
    ATI_CHANNELS, CYCLE_TIME_US, CYCLE_TIME_US_MAX, CYCLE_TIME_US_MIN,
    DERIVATIVE_CUTOFF_HZ_DEFAULT, MAX_AI, MAX_AO, MAX_DI, MAX_DO,
};
use crate::io::{AiChannel, AoChannel, DiChannel, DoChannel, TtlLevel};

fn default_cycle_time_us() -> u32 {
    CYCLE_TIME_US
}
fn default_one() -> f64 {
    1.0
}
fn default_high() -> TtlLevel {
    TtlLevel::High
}
fn default_derivative_cutoff() -> f64 {
    DERIVATIVE_CUTOFF_HZ_DEFAULT
}
fn default_bank_size() -> usize {
    8
}

fn invalid(msg: String) -> ConfigError {
    ConfigError::ValidationError(msg)
}

fn check_finite(what: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("{what} must be finite, got {value}")))
    }
}

fn check_gain(what: &str, value: f64) -> Result<(), ConfigError> {
    check_finite(what, value)?;
    if value == 0.0 {
        return Err(invalid(format!("{what} must be non-zero")));
    }
    Ok(())
}

fn check_name(what: &str, name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(invalid(format!("{what} name cannot be empty")));
    }
    Ok(())
}

// ─── Limiter ────────────────────────────────────────────────────────

/// Limiter policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum LimiterConfig {
    /// Passthrough.
    #[default]
    Unlimited,
    /// Clamp to `[-|abs_limit|, |abs_limit|]`.
    Symmetric { abs_limit: f64 },
    /// Clamp to `[min, max]`.
    Saturate { min: f64, max: f64 },
    /// I²t limiting: peak `abs_limit` for about `time_limit_s`, then `continuous_limit`.
    Accumulate {
        continuous_limit: f64,
        abs_limit: f64,
        time_limit_s: f64,
    },
}

impl Validate for LimiterConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Unlimited => Ok(()),
            Self::Symmetric { abs_limit } => check_finite("abs_limit", abs_limit),
            Self::Saturate { min, max } => {
                check_finite("min", min)?;
                check_finite("max", max)?;
                if min > max {
                    return Err(invalid(format!("saturate range [{min}, {max}] is inverted")));
                }
                Ok(())
            }
            Self::Accumulate {
                continuous_limit,
                abs_limit,
                time_limit_s,
            } => {
                check_finite("continuous_limit", continuous_limit)?;
                check_finite("abs_limit", abs_limit)?;
                check_finite("time_limit_s", time_limit_s)?;
                if continuous_limit < 0.0 {
                    return Err(invalid(format!(
                        "continuous_limit {continuous_limit} must be >= 0"
                    )));
                }
                if time_limit_s < 0.0 {
                    return Err(invalid(format!("time_limit_s {time_limit_s} must be >= 0")));
                }
                if Duration::try_from_secs_f64(time_limit_s).is_err() {
                    return Err(invalid(format!(
                        "time_limit_s {time_limit_s} is not a representable duration"
                    )));
                }
                Ok(())
            }
        }
    }
}

// ─── I/O bank ───────────────────────────────────────────────────────

/// Pin counts of the acquisition bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoBankConfig {
    #[serde(default = "default_bank_size")]
    pub ai: usize,
    #[serde(default = "default_bank_size")]
    pub ao: usize,
    #[serde(default = "default_bank_size")]
    pub di: usize,
    #[serde(default = "default_bank_size")]
    pub dout: usize,
}

impl Default for IoBankConfig {
    fn default() -> Self {
        Self {
            ai: default_bank_size(),
            ao: default_bank_size(),
            di: default_bank_size(),
            dout: default_bank_size(),
        }
    }
}

impl Validate for IoBankConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (what, count, max) in [
            ("ai", self.ai, MAX_AI),
            ("ao", self.ao, MAX_AO),
            ("di", self.di, MAX_DI),
            ("dout", self.dout, MAX_DO),
        ] {
            if count > max {
                return Err(invalid(format!("io.{what} = {count} exceeds maximum {max}")));
            }
        }
        Ok(())
    }
}

impl IoBankConfig {
    fn check_ai(&self, owner: &str, ch: AiChannel) -> Result<(), ConfigError> {
        if ch.pin() >= self.ai {
            return Err(invalid(format!("{owner}: {ch} outside bank of {} AI", self.ai)));
        }
        Ok(())
    }
    fn check_ao(&self, owner: &str, ch: AoChannel) -> Result<(), ConfigError> {
        if ch.pin() >= self.ao {
            return Err(invalid(format!("{owner}: {ch} outside bank of {} AO", self.ao)));
        }
        Ok(())
    }
    fn check_di(&self, owner: &str, ch: DiChannel) -> Result<(), ConfigError> {
        if ch.pin() >= self.di {
            return Err(invalid(format!("{owner}: {ch} outside bank of {} DI", self.di)));
        }
        Ok(())
    }
    fn check_do(&self, owner: &str, ch: DoChannel) -> Result<(), ConfigError> {
        if ch.pin() >= self.dout {
            return Err(invalid(format!("{owner}: {ch} outside bank of {} DO", self.dout)));
        }
        Ok(())
    }
}

// ─── Devices ────────────────────────────────────────────────────────

/// Current amplifier wiring and gains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmplifierConfig {
    pub name: String,
    /// Level asserted on the enable line to enable the amplifier.
    #[serde(default = "default_high")]
    pub enable_level: TtlLevel,
    #[serde(default)]
    pub enable_channel: Option<DoChannel>,
    /// Command gain [A/V].
    pub command_gain: f64,
    #[serde(default)]
    pub command_channel: Option<AoChannel>,
    #[serde(default)]
    pub limiter: LimiterConfig,
    /// Level read on the fault line while the amplifier is faulted.
    #[serde(default = "default_high")]
    pub fault_level: TtlLevel,
    #[serde(default)]
    pub fault_channel: Option<DiChannel>,
    /// Sense gain [A/V].
    #[serde(default = "default_one")]
    pub sense_gain: f64,
    #[serde(default)]
    pub sense_channel: Option<AiChannel>,
}

impl AmplifierConfig {
    /// Check gains, limiter and that every bound pin exists in `io`.
    pub fn validate_against(&self, io: &IoBankConfig) -> Result<(), ConfigError> {
        check_name("amplifier", &self.name)?;
        check_gain("command_gain", self.command_gain)?;
        check_gain("sense_gain", self.sense_gain)?;
        self.limiter.validate()?;
        if let Some(ch) = self.enable_channel {
            io.check_do(&self.name, ch)?;
        }
        if let Some(ch) = self.command_channel {
            io.check_ao(&self.name, ch)?;
        }
        if let Some(ch) = self.fault_channel {
            io.check_di(&self.name, ch)?;
        }
        if let Some(ch) = self.sense_channel {
            io.check_ai(&self.name, ch)?;
        }
        Ok(())
    }
}

/// DC motor driven through one amplifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorConfig {
    pub name: String,
    /// Torque constant [Nm/A].
    pub kt: f64,
    #[serde(default)]
    pub limiter: LimiterConfig,
    pub amplifier: AmplifierConfig,
}

impl MotorConfig {
    /// Check `kt`, limiter and the nested amplifier.
    pub fn validate_against(&self, io: &IoBankConfig) -> Result<(), ConfigError> {
        check_name("motor", &self.name)?;
        check_gain("kt", self.kt)?;
        self.limiter.validate()?;
        self.amplifier.validate_against(io)
    }
}

/// Six-axis ATI force/torque transducer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtiSensorConfig {
    pub name: String,
    /// Strain gauge channels SG0..SG5.
    pub channels: [AiChannel; ATI_CHANNELS],
    /// ATI `.cal` file. Identity calibration when absent.
    #[serde(default)]
    pub calibration_file: Option<PathBuf>,
}

impl AtiSensorConfig {
    /// Check that all six channels exist in `io`.
    pub fn validate_against(&self, io: &IoBankConfig) -> Result<(), ConfigError> {
        check_name("ati sensor", &self.name)?;
        for ch in self.channels {
            io.check_ai(&self.name, ch)?;
        }
        Ok(())
    }
}

/// Single-axis analog force sensor with `a + b·v + c·v²` fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiForceSensorConfig {
    pub name: String,
    pub channel: AiChannel,
    #[serde(default)]
    pub a: f64,
    pub b: f64,
    #[serde(default)]
    pub c: f64,
}

impl AiForceSensorConfig {
    /// Check the channel and that the fit coefficients are finite.
    pub fn validate_against(&self, io: &IoBankConfig) -> Result<(), ConfigError> {
        check_name("force sensor", &self.name)?;
        io.check_ai(&self.name, self.channel)?;
        check_finite("a", self.a)?;
        check_finite("b", self.b)?;
        check_finite("c", self.c)
    }
}

/// PID gains and derivative filter cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidConfig {
    pub kp: f64,
    #[serde(default)]
    pub ki: f64,
    #[serde(default)]
    pub kd: f64,
    /// Derivative low-pass cutoff [Hz]; 0 disables the filter.
    #[serde(default = "default_derivative_cutoff")]
    pub derivative_cutoff_hz: f64,
}

impl Validate for PidConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_finite("kp", self.kp)?;
        check_finite("ki", self.ki)?;
        check_finite("kd", self.kd)?;
        check_finite("derivative_cutoff_hz", self.derivative_cutoff_hz)?;
        if self.derivative_cutoff_hz < 0.0 {
            return Err(invalid(format!(
                "derivative_cutoff_hz {} must be >= 0",
                self.derivative_cutoff_hz
            )));
        }
        Ok(())
    }
}

// ─── Top level ──────────────────────────────────────────────────────

/// Complete rig description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigConfig {
    pub shared: SharedConfig,
    /// Control cycle in microseconds.
    #[serde(default = "default_cycle_time_us")]
    pub cycle_time_us: u32,
    #[serde(default)]
    pub io: IoBankConfig,
    #[serde(default)]
    pub motor: Option<MotorConfig>,
    #[serde(default)]
    pub ati: Option<AtiSensorConfig>,
    #[serde(default)]
    pub force_sensor: Option<AiForceSensorConfig>,
    #[serde(default)]
    pub pid: Option<PidConfig>,
}

impl Validate for RigConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        if self.cycle_time_us < CYCLE_TIME_US_MIN || self.cycle_time_us > CYCLE_TIME_US_MAX {
            return Err(invalid(format!(
                "cycle_time_us {} out of range [{}, {}]",
                self.cycle_time_us, CYCLE_TIME_US_MIN, CYCLE_TIME_US_MAX
            )));
        }
        self.io.validate()?;
        if let Some(motor) = &self.motor {
            motor.validate_against(&self.io)?;
        }
        if let Some(ati) = &self.ati {
            ati.validate_against(&self.io)?;
        }
        if let Some(sensor) = &self.force_sensor {
            sensor.validate_against(&self.io)?;
        }
        if let Some(pid) = &self.pid {
            pid.validate()?;
        }
        Ok(())
    }
}
