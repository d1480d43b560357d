//! Prelude module for common re-exports.
//!
//! ```rust
//! use mecha_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig, Validate};
pub use crate::rig::{
    AiForceSensorConfig, AmplifierConfig, AtiSensorConfig, IoBankConfig, LimiterConfig,
    MotorConfig, PidConfig, RigConfig,
};

// ─── Channels ───────────────────────────────────────────────────────
pub use crate::io::{AiChannel, AoChannel, DiChannel, DoChannel, IoBank, TtlLevel};

// ─── Diagnostics ────────────────────────────────────────────────────
pub use crate::diagnostics::{DeviceWarning, WarningLatch};

// ─── Types & constants ──────────────────────────────────────────────
pub use crate::consts::{ATI_CHANNELS, CYCLE_TIME_US};
pub use crate::types::Axis;

/// Default control cycle as Duration.
pub const DEFAULT_CYCLE_TIME: Duration = Duration::from_micros(CYCLE_TIME_US as u64);
