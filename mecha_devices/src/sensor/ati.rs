//! Six-axis ATI force/torque transducer.
//!
//! ```text
//! biased[i] = raw[i] − bias[i]          (i = SG0..SG5)
//! F_axis    = force_row(axis) · biased
//! T_axis    = torque_row(axis) · biased
//! ```
//!
//! Single-axis reads recompute the biased vector every call. Prefer
//! [`forces`](ForceSensor::forces) / [`torques`](TorqueSensor::torques) when
//! all three axes are needed.

use std::path::Path;

use mecha_common::consts::ATI_CHANNELS;
use mecha_common::diagnostics::{DeviceWarning, WarningLatch};
use mecha_common::io::{AiChannel, IoBank};
use mecha_common::rig::AtiSensorConfig;
use mecha_common::types::Axis;
use tracing::{error, info};

use super::ati_calibration::{AtiCalibration, CalibrationError};
use super::{ForceSensor, TorqueSensor, Zeroable};

#[inline]
fn dot(row: &[f64; ATI_CHANNELS], v: &[f64; ATI_CHANNELS]) -> f64 {
    row.iter().zip(v).map(|(a, b)| a * b).sum()
}

/// ATI transducer read through six analog inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct AtiSensor {
    name: String,
    channels: Option<[AiChannel; ATI_CHANNELS]>,
    calibration: AtiCalibration,
    bias: [f64; ATI_CHANNELS],
    warnings: WarningLatch,
}

impl AtiSensor {
    /// Sensor on `channels` (SG0..SG5) with an explicit calibration.
    pub fn new(
        name: impl Into<String>,
        channels: Option<[AiChannel; ATI_CHANNELS]>,
        calibration: AtiCalibration,
    ) -> Self {
        Self {
            name: name.into(),
            channels,
            calibration,
            bias: [0.0; ATI_CHANNELS],
            warnings: WarningLatch::default(),
        }
    }

    /// Sensor on the configured channels with identity calibration.
    ///
    /// The configured calibration file is not read here; call
    /// [`load_calibration`](Self::load_calibration).
    pub fn from_config(config: &AtiSensorConfig) -> Self {
        Self::new(
            config.name.as_str(),
            Some(config.channels),
            AtiCalibration::identity(),
        )
    }

    /// Sensor name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rebind the six gauge inputs. Existing bias is kept.
    pub fn set_channels(&mut self, channels: Option<[AiChannel; ATI_CHANNELS]>) {
        self.channels = channels;
    }

    /// Replace the calibration matrix.
    pub fn set_calibration(&mut self, calibration: AtiCalibration) {
        self.calibration = calibration;
    }

    /// Active calibration matrix.
    pub fn calibration(&self) -> &AtiCalibration {
        &self.calibration
    }

    /// Bias captured by the last `zero()`.
    pub fn bias(&self) -> &[f64; ATI_CHANNELS] {
        &self.bias
    }

    /// Load an ATI `.cal` file.
    ///
    /// On any error the previous calibration stays in place.
    pub fn load_calibration(&mut self, path: impl AsRef<Path>) -> Result<(), CalibrationError> {
        let path = path.as_ref();
        match AtiCalibration::load(path) {
            Ok(calibration) => {
                self.calibration = calibration;
                info!(
                    "ATI sensor {}: loaded calibration file {}",
                    self.name,
                    path.display()
                );
                Ok(())
            }
            Err(e) => {
                error!("ATI sensor {}: {}", self.name, e);
                Err(e)
            }
        }
    }

    /// Latched warnings.
    pub fn warnings(&self) -> DeviceWarning {
        self.warnings.flags()
    }

    /// Clear latched warnings.
    pub fn clear_warnings(&mut self) {
        self.warnings.clear();
    }

    /// Raw gauge voltages, `None` if any input is unbound.
    fn raw(&mut self, io: &IoBank) -> Option<[f64; ATI_CHANNELS]> {
        let read = self.channels.and_then(|channels| {
            let mut raw = [0.0; ATI_CHANNELS];
            for (slot, ch) in raw.iter_mut().zip(channels) {
                *slot = io.ai(ch)?;
            }
            Some(raw)
        });
        if read.is_none() {
            self.warnings
                .raise(&self.name, DeviceWarning::INPUT_CHANNEL_UNBOUND);
        }
        read
    }

    fn biased(&mut self, io: &IoBank) -> Option<[f64; ATI_CHANNELS]> {
        let mut v = self.raw(io)?;
        for (x, b) in v.iter_mut().zip(&self.bias) {
            *x -= b;
        }
        Some(v)
    }
}

impl Zeroable for AtiSensor {
    /// Capture all six raw gauge voltages as bias. Unbound inputs leave the
    /// bias unchanged.
    fn zero(&mut self, io: &IoBank) {
        if let Some(raw) = self.raw(io) {
            self.bias = raw;
        }
    }
}

impl ForceSensor for AtiSensor {
    fn force(&mut self, io: &IoBank, axis: Axis) -> f64 {
        self.biased(io)
            .map_or(0.0, |v| dot(self.calibration.force_row(axis), &v))
    }

    fn forces(&mut self, io: &IoBank) -> [f64; 3] {
        match self.biased(io) {
            Some(v) => Axis::ALL.map(|axis| dot(self.calibration.force_row(axis), &v)),
            None => [0.0; 3],
        }
    }
}

impl TorqueSensor for AtiSensor {
    fn torque(&mut self, io: &IoBank, axis: Axis) -> f64 {
        self.biased(io)
            .map_or(0.0, |v| dot(self.calibration.torque_row(axis), &v))
    }

    fn torques(&mut self, io: &IoBank) -> [f64; 3] {
        match self.biased(io) {
            Some(v) => Axis::ALL.map(|axis| dot(self.calibration.torque_row(axis), &v)),
            None => [0.0; 3],
        }
    }
}
