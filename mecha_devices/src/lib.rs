//! # Mecha Devices Library
//!
//! Actuators and sensors that read and write pins of an acquisition
//! [`IoBank`](mecha_common::io::IoBank).
//!
//! # Module Structure
//!
//! - [`device`] - `Device` lifecycle trait, `DeviceState`, `DeviceError`
//! - [`amplifier`] - `CurrentAmplifier` (leaf actuator)
//! - [`motor`] - `DcMotor` (torque → current through an owned amplifier)
//! - [`sensor`] - force/torque/position capabilities and implementations
//!
//! # Tick Sequencing
//!
//! ```text
//! ┌──────────────┐   ┌───────────────────────────────┐   ┌──────────────┐
//! │ acquisition  │──►│ sensors read &IoBank          │──►│ acquisition  │
//! │ refresh AI/DI│   │ control computes command      │   │ flush AO/DO  │
//! └──────────────┘   │ actuators write &mut IoBank   │   └──────────────┘
//!                    └───────────────────────────────┘
//! ```
//!
//! Channel handles are plain pin indices into the bank. Devices never own
//! the bank; every read or write borrows it for the duration of the call.
//! Rebind channels between ticks only. A bias captured by `zero()` belongs
//! to the binding that was active at the time.

#![warn(missing_docs)]

pub mod amplifier;
pub mod device;
pub mod motor;
pub mod sensor;

pub use crate::amplifier::CurrentAmplifier;
pub use crate::device::{Device, DeviceError, DeviceState};
pub use crate::motor::DcMotor;
pub use crate::sensor::ati::AtiSensor;
pub use crate::sensor::ati_calibration::{AtiCalibration, CalibrationError};
pub use crate::sensor::ai_force::AiForceSensor;
pub use crate::sensor::position::AnalogPositionSensor;
pub use crate::sensor::{ForceSensor, PositionSensor, TorqueSensor, Zeroable};
