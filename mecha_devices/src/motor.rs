//! DC motor: torque command → current through an owned amplifier.
//!
//! ```text
//! torque ─► ÷ kt ─► motor Limiter ─► CurrentAmplifier::set_current
//! ```
//!
//! The motor performs no hardware action of its own. Lifecycle calls are
//! delegated to the amplifier and fail when it is missing or fails.

use std::time::Duration;

use mecha_common::diagnostics::DeviceWarning;
use mecha_common::io::IoBank;
use mecha_common::rig::MotorConfig;
use mecha_control::Limiter;

use crate::amplifier::CurrentAmplifier;
use crate::device::{Device, DeviceError, DeviceState};

fn check_kt(kt: f64) -> Result<f64, DeviceError> {
    if kt.is_finite() && kt != 0.0 {
        Ok(kt)
    } else {
        Err(DeviceError::InvalidTorqueConstant(kt))
    }
}

/// Brushed DC motor driven by a [`CurrentAmplifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct DcMotor {
    state: DeviceState,
    /// Torque constant [Nm/A], never zero.
    kt: f64,
    amplifier: Option<CurrentAmplifier>,
    limiter: Limiter,
    torque_command: f64,
}

impl DcMotor {
    /// New motor. Fails on a zero or non-finite `kt`.
    pub fn new(
        name: impl Into<String>,
        kt: f64,
        amplifier: Option<CurrentAmplifier>,
        limiter: Limiter,
    ) -> Result<Self, DeviceError> {
        Ok(Self {
            state: DeviceState::new(name),
            kt: check_kt(kt)?,
            amplifier,
            limiter,
            torque_command: 0.0,
        })
    }

    /// Build the motor and its amplifier from a rig configuration entry.
    pub fn from_config(config: &MotorConfig) -> Result<Self, DeviceError> {
        let amplifier = CurrentAmplifier::from_config(&config.amplifier)?;
        Self::new(
            config.name.as_str(),
            config.kt,
            Some(amplifier),
            Limiter::from_config(&config.limiter),
        )
    }

    /// Command `torque` [Nm] at time `now`.
    ///
    /// Without an amplifier the command is stored, nothing is written and
    /// `AMPLIFIER_MISSING` is raised.
    pub fn set_torque(&mut self, io: &mut IoBank, torque: f64, now: Duration) {
        self.torque_command = torque;
        match self.amplifier.as_mut() {
            Some(amp) => {
                let current = self.limiter.limit(torque / self.kt, now);
                amp.set_current(io, current, now);
            }
            None => self.state.warn(DeviceWarning::AMPLIFIER_MISSING),
        }
    }

    /// Last requested torque.
    pub fn torque_command(&self) -> f64 {
        self.torque_command
    }

    /// Torque after both limiters: `kt · amplifier.current_limited()`.
    pub fn torque_limited(&self) -> f64 {
        self.amplifier
            .as_ref()
            .map_or(0.0, |amp| self.kt * amp.current_limited())
    }

    /// Sensed torque: `kt · amplifier.current_sense()`, `0.0` without amplifier.
    pub fn torque_sense(&mut self, io: &IoBank) -> f64 {
        match self.amplifier.as_mut() {
            Some(amp) => self.kt * amp.current_sense(io),
            None => {
                self.state.warn(DeviceWarning::AMPLIFIER_MISSING);
                0.0
            }
        }
    }

    /// Torque constant [Nm/A].
    pub fn kt(&self) -> f64 {
        self.kt
    }

    /// Rejects zero and non-finite values, keeping the previous one.
    pub fn set_kt(&mut self, kt: f64) -> Result<(), DeviceError> {
        self.kt = check_kt(kt)?;
        Ok(())
    }

    /// Replace the motor-side current limiter.
    pub fn set_limiter(&mut self, limiter: Limiter) {
        self.limiter = limiter;
    }

    /// Motor-side current limiter.
    pub fn limiter(&self) -> &Limiter {
        &self.limiter
    }

    /// Attached amplifier.
    pub fn amplifier(&self) -> Option<&CurrentAmplifier> {
        self.amplifier.as_ref()
    }

    /// Attached amplifier, mutable (for binding or fault checks).
    pub fn amplifier_mut(&mut self) -> Option<&mut CurrentAmplifier> {
        self.amplifier.as_mut()
    }

    /// Attach `amplifier`, returning the one it replaces.
    pub fn attach_amplifier(&mut self, amplifier: CurrentAmplifier) -> Option<CurrentAmplifier> {
        self.amplifier.replace(amplifier)
    }

    /// Detach and return the amplifier.
    pub fn detach_amplifier(&mut self) -> Option<CurrentAmplifier> {
        self.amplifier.take()
    }
}

impl Device for DcMotor {
    fn state(&self) -> &DeviceState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut DeviceState {
        &mut self.state
    }

    fn on_enable(&mut self, io: &mut IoBank) -> Result<(), DeviceError> {
        let Some(amp) = self.amplifier.as_mut() else {
            self.state.warn(DeviceWarning::AMPLIFIER_MISSING);
            return Err(DeviceError::AmplifierMissing(self.state.name().to_string()));
        };
        amp.enable(io)
            .map_err(|_| DeviceError::EnableFailed(self.state.name().to_string()))
    }

    fn on_disable(&mut self, io: &mut IoBank) -> Result<(), DeviceError> {
        let Some(amp) = self.amplifier.as_mut() else {
            self.state.warn(DeviceWarning::AMPLIFIER_MISSING);
            return Err(DeviceError::AmplifierMissing(self.state.name().to_string()));
        };
        amp.disable(io)
            .map_err(|_| DeviceError::DisableFailed(self.state.name().to_string()))
    }
}
