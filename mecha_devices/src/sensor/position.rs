//! Analog position sensor (potentiometer, LVDT, analog encoder output).
//!
//! `position = gain · (raw − bias) + offset`

use mecha_common::diagnostics::{DeviceWarning, WarningLatch};
use mecha_common::io::{AiChannel, IoBank};

use super::{PositionSensor, Zeroable};

/// Linear position sensor on one analog input.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalogPositionSensor {
    name: String,
    channel: Option<AiChannel>,
    gain: f64,
    offset: f64,
    bias: f64,
    warnings: WarningLatch,
}

impl AnalogPositionSensor {
    /// Sensor with `gain` in units per volt and zero offset.
    pub fn new(name: impl Into<String>, channel: Option<AiChannel>, gain: f64) -> Self {
        Self {
            name: name.into(),
            channel,
            gain,
            offset: 0.0,
            bias: 0.0,
            warnings: WarningLatch::default(),
        }
    }

    /// Builder: position reported right after `zero()`.
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Rebind the input. Existing bias is kept.
    pub fn set_channel(&mut self, channel: Option<AiChannel>) {
        self.channel = channel;
    }

    /// Latched warnings.
    pub fn warnings(&self) -> DeviceWarning {
        self.warnings.flags()
    }

    fn raw(&mut self, io: &IoBank) -> Option<f64> {
        let raw = self.channel.and_then(|ch| io.ai(ch));
        if raw.is_none() {
            self.warnings
                .raise(&self.name, DeviceWarning::INPUT_CHANNEL_UNBOUND);
        }
        raw
    }
}

impl Zeroable for AnalogPositionSensor {
    fn zero(&mut self, io: &IoBank) {
        if let Some(raw) = self.raw(io) {
            self.bias = raw;
        }
    }
}

impl PositionSensor for AnalogPositionSensor {
    /// `0.0` with `INPUT_CHANNEL_UNBOUND` when the input is unbound.
    fn position(&mut self, io: &IoBank) -> f64 {
        self.raw(io)
            .map_or(0.0, |raw| self.gain * (raw - self.bias) + self.offset)
    }
}
