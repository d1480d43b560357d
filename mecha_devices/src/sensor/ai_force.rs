//! Single-axis analog force sensor with a quadratic voltage fit.
//!
//! `F_x = a + b·v + c·v²` with `v = raw − bias`. Only X is instrumented.

use mecha_common::diagnostics::{DeviceWarning, WarningLatch};
use mecha_common::io::{AiChannel, IoBank};
use mecha_common::rig::AiForceSensorConfig;
use mecha_common::types::Axis;

use super::{ForceSensor, Zeroable};

/// Load cell or similar on one analog input.
#[derive(Debug, Clone, PartialEq)]
pub struct AiForceSensor {
    name: String,
    channel: Option<AiChannel>,
    /// `[a, b, c]`
    calibration: [f64; 3],
    bias: f64,
    warnings: WarningLatch,
}

impl AiForceSensor {
    /// Sensor on `channel` with fit `a + b·v + c·v²`.
    pub fn new(name: impl Into<String>, channel: Option<AiChannel>, a: f64, b: f64, c: f64) -> Self {
        Self {
            name: name.into(),
            channel,
            calibration: [a, b, c],
            bias: 0.0,
            warnings: WarningLatch::default(),
        }
    }

    /// Build from a rig configuration entry.
    pub fn from_config(config: &AiForceSensorConfig) -> Self {
        Self::new(
            config.name.as_str(),
            Some(config.channel),
            config.a,
            config.b,
            config.c,
        )
    }

    /// Sensor name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rebind the input. Existing bias is kept.
    pub fn set_channel(&mut self, channel: Option<AiChannel>) {
        self.channel = channel;
    }

    /// Replace the fit coefficients.
    pub fn set_force_calibration(&mut self, a: f64, b: f64, c: f64) {
        self.calibration = [a, b, c];
    }

    /// `[a, b, c]`
    pub fn force_calibration(&self) -> [f64; 3] {
        self.calibration
    }

    /// Voltage captured by the last `zero()`.
    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Latched warnings.
    pub fn warnings(&self) -> DeviceWarning {
        self.warnings.flags()
    }

    /// Clear latched warnings.
    pub fn clear_warnings(&mut self) {
        self.warnings.clear();
    }

    fn raw(&mut self, io: &IoBank) -> Option<f64> {
        let raw = self.channel.and_then(|ch| io.ai(ch));
        if raw.is_none() {
            self.warnings
                .raise(&self.name, DeviceWarning::INPUT_CHANNEL_UNBOUND);
        }
        raw
    }

    fn force_x(&mut self, io: &IoBank) -> f64 {
        let Some(raw) = self.raw(io) else {
            return 0.0;
        };
        let v = raw - self.bias;
        let [a, b, c] = self.calibration;
        a + b * v + c * v * v
    }
}

impl Zeroable for AiForceSensor {
    fn zero(&mut self, io: &IoBank) {
        if let Some(raw) = self.raw(io) {
            self.bias = raw;
        }
    }
}

impl ForceSensor for AiForceSensor {
    /// X only; Y and Z read `0.0` with `UNSUPPORTED_AXIS`.
    fn force(&mut self, io: &IoBank, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.force_x(io),
            Axis::Y | Axis::Z => {
                self.warnings
                    .raise(&self.name, DeviceWarning::UNSUPPORTED_AXIS);
                0.0
            }
        }
    }

    /// `[F_x, 0, 0]`, always with `UNSUPPORTED_AXIS`.
    fn forces(&mut self, io: &IoBank) -> [f64; 3] {
        let fx = self.force_x(io);
        self.warnings
            .raise(&self.name, DeviceWarning::UNSUPPORTED_AXIS);
        [fx, 0.0, 0.0]
    }
}
