//! Device warning flags.
//!
//! Non-fatal configuration problems (unbound channel, unsupported axis,
//! missing amplifier) never interrupt the control loop. The affected call
//! returns its documented sentinel and raises a sticky flag in the device's
//! [`WarningLatch`]. The latch logs through `tracing` on the rising edge of
//! each flag only, so a 1 kHz loop with a permanently unbound channel emits
//! a single log line until the flags are cleared.

use bitflags::bitflags;
use tracing::warn;

bitflags! {
    /// Sticky, non-fatal device warnings.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DeviceWarning: u16 {
        /// Enable output not bound; lifecycle change not driven to hardware.
        const ENABLE_CHANNEL_UNBOUND  = 0x0001;
        /// Command output not bound; current command dropped.
        const COMMAND_CHANNEL_UNBOUND = 0x0002;
        /// Fault input not bound; fault state reported as `true`.
        const FAULT_CHANNEL_UNBOUND   = 0x0004;
        /// Sense input not bound; sensed current reported as `0.0`.
        const SENSE_CHANNEL_UNBOUND   = 0x0008;
        /// Sensor input not bound; reading reported as `0.0`.
        const INPUT_CHANNEL_UNBOUND   = 0x0010;
        /// Axis not instrumented by this sensor; reading reported as `0.0`.
        const UNSUPPORTED_AXIS        = 0x0020;
        /// No amplifier attached to a motor.
        const AMPLIFIER_MISSING       = 0x0040;
        /// `enable()` on an already enabled device.
        const ALREADY_ENABLED         = 0x0080;
        /// `disable()` on an already disabled device.
        const ALREADY_DISABLED        = 0x0100;
    }
}

impl Default for DeviceWarning {
    fn default() -> Self {
        Self::empty()
    }
}

impl DeviceWarning {
    /// Short human-readable description of a single flag.
    pub fn describe(self) -> &'static str {
        match self {
            Self::ENABLE_CHANNEL_UNBOUND => "enable channel is not bound",
            Self::COMMAND_CHANNEL_UNBOUND => "command channel is not bound",
            Self::FAULT_CHANNEL_UNBOUND => "fault channel is not bound, reporting faulted",
            Self::SENSE_CHANNEL_UNBOUND => "sense channel is not bound, reporting 0",
            Self::INPUT_CHANNEL_UNBOUND => "input channel is not bound, reporting 0",
            Self::UNSUPPORTED_AXIS => "axis is not instrumented, reporting 0",
            Self::AMPLIFIER_MISSING => "no amplifier attached",
            Self::ALREADY_ENABLED => "already enabled",
            Self::ALREADY_DISABLED => "already disabled",
            _ => "multiple warnings",
        }
    }
}

/// Sticky warning set owned by a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarningLatch {
    flags: DeviceWarning,
}

impl WarningLatch {
    /// Raise `flag` for the device called `device`.
    ///
    /// Logs only when the flag was not already set.
    #[inline]
    pub fn raise(&mut self, device: &str, flag: DeviceWarning) {
        if !self.flags.contains(flag) {
            warn!("Device {}: {}", device, flag.describe());
            self.flags.insert(flag);
        }
    }

    /// Currently latched warnings.
    #[inline]
    pub fn flags(&self) -> DeviceWarning {
        self.flags
    }

    /// `true` if `flag` is latched.
    #[inline]
    pub fn contains(&self, flag: DeviceWarning) -> bool {
        self.flags.contains(flag)
    }

    /// Drop all latched warnings.
    #[inline]
    pub fn clear(&mut self) {
        self.flags = DeviceWarning::empty();
    }
}
