//! Sensor capabilities.
//!
//! A sensor implements one capability per physical quantity it measures.
//! [`AtiSensor`](ati::AtiSensor) implements both [`ForceSensor`] and
//! [`TorqueSensor`]; zeroing is shared through [`Zeroable`].
//!
//! Readings never fail. An unbound input or an axis the sensor does not
//! instrument yields `0.0` and latches a warning on the sensor.

use mecha_common::io::IoBank;
use mecha_common::types::Axis;

pub mod ai_force;
pub mod ati;
pub mod ati_calibration;
pub mod position;

/// Capture the current raw input as bias.
pub trait Zeroable {
    /// After this call, an unchanged raw input reads as zero offset.
    fn zero(&mut self, io: &IoBank);
}

/// Force measurement along X, Y and Z.
pub trait ForceSensor: Zeroable {
    /// Force along `axis`.
    fn force(&mut self, io: &IoBank, axis: Axis) -> f64;

    /// Forces along X, Y and Z, reading the inputs once.
    fn forces(&mut self, io: &IoBank) -> [f64; 3];
}

/// Torque measurement about X, Y and Z.
pub trait TorqueSensor: Zeroable {
    /// Torque about `axis`.
    fn torque(&mut self, io: &IoBank, axis: Axis) -> f64;

    /// Torques about X, Y and Z, reading the inputs once.
    fn torques(&mut self, io: &IoBank) -> [f64; 3];
}

/// Scalar position measurement.
pub trait PositionSensor: Zeroable {
    /// Position in sensor units.
    fn position(&mut self, io: &IoBank) -> f64;
}
