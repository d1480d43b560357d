//! Current amplifier: the leaf actuator of the command chain.
//!
//! ```text
//! current ─► Limiter ─► ÷ command_gain ─► AO command pin
//! AI sense pin ─► × sense_gain ─► sensed current
//! DI fault pin == fault_level ─► faulted
//! DO enable pin ◄─ enable_level (enable) / inverted (disable)
//! ```
//!
//! Any channel may be unbound. A pin outside the bank counts as unbound.

use std::time::Duration;

use mecha_common::diagnostics::DeviceWarning;
use mecha_common::io::{AiChannel, AoChannel, DiChannel, DoChannel, IoBank, TtlLevel};
use mecha_common::rig::AmplifierConfig;
use mecha_control::Limiter;
use tracing::debug;

use crate::device::{Device, DeviceError, DeviceState, check_gain};

/// Voltage-commanded current amplifier.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentAmplifier {
    state: DeviceState,
    enable_level: TtlLevel,
    enable_channel: Option<DoChannel>,
    /// Amps per volt.
    command_gain: f64,
    command_channel: Option<AoChannel>,
    limiter: Limiter,
    fault_level: TtlLevel,
    fault_channel: Option<DiChannel>,
    /// Amps per volt.
    sense_gain: f64,
    sense_channel: Option<AiChannel>,
    current_command: f64,
}

impl CurrentAmplifier {
    /// Unbound amplifier with active-high enable and fault lines, unit sense
    /// gain and no current limit.
    pub fn new(name: impl Into<String>, command_gain: f64) -> Result<Self, DeviceError> {
        Ok(Self {
            state: DeviceState::new(name),
            enable_level: TtlLevel::High,
            enable_channel: None,
            command_gain: check_gain("command_gain", command_gain)?,
            command_channel: None,
            limiter: Limiter::unlimited(),
            fault_level: TtlLevel::High,
            fault_channel: None,
            sense_gain: 1.0,
            sense_channel: None,
            current_command: 0.0,
        })
    }

    /// Build from a rig configuration entry.
    pub fn from_config(config: &AmplifierConfig) -> Result<Self, DeviceError> {
        let mut amp = Self::new(config.name.as_str(), config.command_gain)?;
        amp.set_sense_gain(config.sense_gain)?;
        amp.enable_level = config.enable_level;
        amp.fault_level = config.fault_level;
        amp.enable_channel = config.enable_channel;
        amp.command_channel = config.command_channel;
        amp.fault_channel = config.fault_channel;
        amp.sense_channel = config.sense_channel;
        amp.limiter = Limiter::from_config(&config.limiter);
        debug!(
            "Amplifier {} built: command {:?}, enable {:?}, fault {:?}, sense {:?}",
            amp.name(),
            amp.command_channel,
            amp.enable_channel,
            amp.fault_channel,
            amp.sense_channel
        );
        Ok(amp)
    }

    // ─── Binding ────────────────────────────────────────────────────

    /// Bind (or unbind with `None`) the enable output.
    pub fn bind_enable_channel(&mut self, channel: Option<DoChannel>) {
        self.enable_channel = channel;
    }

    /// Bind (or unbind with `None`) the command output.
    pub fn bind_command_channel(&mut self, channel: Option<AoChannel>) {
        self.command_channel = channel;
    }

    /// Bind (or unbind with `None`) the fault input.
    pub fn bind_fault_channel(&mut self, channel: Option<DiChannel>) {
        self.fault_channel = channel;
    }

    /// Bind (or unbind with `None`) the current sense input.
    pub fn bind_sense_channel(&mut self, channel: Option<AiChannel>) {
        self.sense_channel = channel;
    }

    /// Level that enables the amplifier.
    pub fn set_enable_level(&mut self, level: TtlLevel) {
        self.enable_level = level;
    }

    /// Level the amplifier reports while faulted.
    pub fn set_fault_level(&mut self, level: TtlLevel) {
        self.fault_level = level;
    }

    /// Rejects zero and non-finite gains, keeping the previous one.
    pub fn set_command_gain(&mut self, gain: f64) -> Result<(), DeviceError> {
        self.command_gain = check_gain("command_gain", gain)?;
        Ok(())
    }

    /// Rejects zero and non-finite gains, keeping the previous one.
    pub fn set_sense_gain(&mut self, gain: f64) -> Result<(), DeviceError> {
        self.sense_gain = check_gain("sense_gain", gain)?;
        Ok(())
    }

    /// Replace the current limiter.
    pub fn set_limiter(&mut self, limiter: Limiter) {
        self.limiter = limiter;
    }

    /// Current limiter.
    pub fn limiter(&self) -> &Limiter {
        &self.limiter
    }

    /// Command gain [A/V].
    pub fn command_gain(&self) -> f64 {
        self.command_gain
    }

    /// Sense gain [A/V].
    pub fn sense_gain(&self) -> f64 {
        self.sense_gain
    }

    // ─── Per-tick operations ────────────────────────────────────────

    /// Command `current` [A] at time `now`.
    ///
    /// The current is limited, converted to volts and written to the command
    /// pin. Without a command pin the command is stored but nothing is
    /// written and `COMMAND_CHANNEL_UNBOUND` is raised.
    pub fn set_current(&mut self, io: &mut IoBank, current: f64, now: Duration) {
        self.current_command = current;
        let Some(ch) = self.command_channel else {
            self.state.warn(DeviceWarning::COMMAND_CHANNEL_UNBOUND);
            return;
        };
        let volts = self.limiter.limit(current, now) / self.command_gain;
        if !io.set_ao(ch, volts) {
            self.state.warn(DeviceWarning::COMMAND_CHANNEL_UNBOUND);
        }
    }

    /// Last requested current, before limiting.
    #[inline]
    pub fn current_command(&self) -> f64 {
        self.current_command
    }

    /// Last current after limiting.
    #[inline]
    pub fn current_limited(&self) -> f64 {
        self.limiter.limited_value()
    }

    /// Sensed current [A]; `0.0` with `SENSE_CHANNEL_UNBOUND` if unbound.
    pub fn current_sense(&mut self, io: &IoBank) -> f64 {
        match self.sense_channel.and_then(|ch| io.ai(ch)) {
            Some(volts) => self.sense_gain * volts,
            None => {
                self.state.warn(DeviceWarning::SENSE_CHANNEL_UNBOUND);
                0.0
            }
        }
    }

    /// `true` when the fault pin reads the fault level.
    ///
    /// An unbound fault pin reports `true` with `FAULT_CHANNEL_UNBOUND`.
    pub fn is_faulted(&mut self, io: &IoBank) -> bool {
        match self.fault_channel.and_then(|ch| io.di(ch)) {
            Some(level) => level == self.fault_level,
            None => {
                self.state.warn(DeviceWarning::FAULT_CHANNEL_UNBOUND);
                true
            }
        }
    }

    fn write_command_zero(&self, io: &mut IoBank) {
        if let Some(ch) = self.command_channel {
            io.set_ao(ch, 0.0);
        }
    }

    fn write_enable(&mut self, io: &mut IoBank, level: TtlLevel) {
        let written = self
            .enable_channel
            .is_some_and(|ch| io.set_dout(ch, level));
        if !written {
            self.state.warn(DeviceWarning::ENABLE_CHANNEL_UNBOUND);
        }
    }
}

impl Device for CurrentAmplifier {
    fn state(&self) -> &DeviceState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut DeviceState {
        &mut self.state
    }

    /// Reset the limiter, zero the command pin, then assert the enable level.
    fn on_enable(&mut self, io: &mut IoBank) -> Result<(), DeviceError> {
        self.limiter.reset();
        self.write_command_zero(io);
        self.write_enable(io, self.enable_level);
        Ok(())
    }

    /// Zero the command pin, then de-assert the enable level.
    fn on_disable(&mut self, io: &mut IoBank) -> Result<(), DeviceError> {
        self.write_command_zero(io);
        self.write_enable(io, self.enable_level.inverted());
        Ok(())
    }
}
