//! Device lifecycle trait and error types.
//!
//! This module defines:
//! - `Device` trait - enable/disable lifecycle shared by every actuator
//! - `DeviceState` struct - name, enabled flag and warning latch
//! - `DeviceError` enum - lifecycle and construction failures

use mecha_common::diagnostics::{DeviceWarning, WarningLatch};
use mecha_common::io::IoBank;
use thiserror::Error;
use tracing::info;

/// Error types for device operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceError {
    /// Enabling the device (or a device it wraps) failed
    #[error("Device {0}: enable failed")]
    EnableFailed(String),

    /// Disabling the device (or a device it wraps) failed
    #[error("Device {0}: disable failed")]
    DisableFailed(String),

    /// Composite device has nothing to delegate to
    #[error("Device {0}: no amplifier attached")]
    AmplifierMissing(String),

    /// Torque constant zero or not finite
    #[error("Invalid torque constant {0}: must be finite and non-zero")]
    InvalidTorqueConstant(f64),

    /// Gain zero or not finite
    #[error("Invalid {what} {value}: must be finite and non-zero")]
    InvalidGain {
        /// Which gain
        what: &'static str,
        /// Rejected value
        value: f64,
    },
}

/// Reject zero and non-finite gains.
pub(crate) fn check_gain(what: &'static str, value: f64) -> Result<f64, DeviceError> {
    if value.is_finite() && value != 0.0 {
        Ok(value)
    } else {
        Err(DeviceError::InvalidGain { what, value })
    }
}

/// State common to every device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    name: String,
    enabled: bool,
    warnings: WarningLatch,
}

impl DeviceState {
    /// New, disabled device with no warnings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: false,
            warnings: WarningLatch::default(),
        }
    }

    /// Device name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Latch `flag` and log it on its rising edge.
    #[inline]
    pub fn warn(&mut self, flag: DeviceWarning) {
        self.warnings.raise(&self.name, flag);
    }

    /// Latched warnings.
    #[inline]
    pub fn warnings(&self) -> DeviceWarning {
        self.warnings.flags()
    }

    /// Clear every latched warning.
    #[inline]
    pub fn clear_warnings(&mut self) {
        self.warnings.clear();
    }
}

/// Enable/disable lifecycle of an actuator-facing device.
///
/// Implementors provide the hardware side effects in [`on_enable`] and
/// [`on_disable`]. Callers use [`enable`] and [`disable`], which skip the
/// hooks (and raise a warning) when the device is already in the requested
/// state.
///
/// # Lifecycle
///
/// 1. `enable()` - `on_enable()` runs; on success the device is enabled
/// 2. per-tick commands
/// 3. `disable()` - `on_disable()` runs; on success the device is disabled
///
/// A composite device delegates its hooks to the devices it wraps and fails
/// if any of them fails. A failed hook leaves the enabled flag unchanged.
///
/// [`on_enable`]: Device::on_enable
/// [`on_disable`]: Device::on_disable
/// [`enable`]: Device::enable
/// [`disable`]: Device::disable
pub trait Device {
    /// Shared device state.
    fn state(&self) -> &DeviceState;

    /// Shared device state, mutable.
    fn state_mut(&mut self) -> &mut DeviceState;

    /// Hardware side effect of enabling.
    fn on_enable(&mut self, io: &mut IoBank) -> Result<(), DeviceError>;

    /// Hardware side effect of disabling.
    fn on_disable(&mut self, io: &mut IoBank) -> Result<(), DeviceError>;

    /// Device name.
    fn name(&self) -> &str {
        self.state().name()
    }

    /// `true` after a successful `enable()` and until `disable()`.
    fn is_enabled(&self) -> bool {
        self.state().enabled
    }

    /// Latched non-fatal warnings.
    fn warnings(&self) -> DeviceWarning {
        self.state().warnings()
    }

    /// Clear latched warnings.
    fn clear_warnings(&mut self) {
        self.state_mut().clear_warnings();
    }

    /// Enable the device.
    fn enable(&mut self, io: &mut IoBank) -> Result<(), DeviceError> {
        if self.is_enabled() {
            self.state_mut().warn(DeviceWarning::ALREADY_ENABLED);
            return Ok(());
        }
        self.on_enable(io)?;
        self.state_mut().enabled = true;
        info!("Device {} enabled", self.name());
        Ok(())
    }

    /// Disable the device.
    fn disable(&mut self, io: &mut IoBank) -> Result<(), DeviceError> {
        if !self.is_enabled() {
            self.state_mut().warn(DeviceWarning::ALREADY_DISABLED);
            return Ok(());
        }
        self.on_disable(io)?;
        self.state_mut().enabled = false;
        info!("Device {} disabled", self.name());
        Ok(())
    }
}
