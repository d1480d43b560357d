//! # Mecha Simulated Rig
//!
//! Closes a force loop through the real device stack against a simulated
//! spring-contact plant. The plant stands in for the acquisition card: it
//! fills AI/DI pins before each control cycle and consumes AO/DO pins after.
//!
//! - [`plant`] - Spring contact plant and simulated acquisition
//! - [`rig`] - Rig assembly from TOML and the control loop

pub mod plant;
pub mod rig;

pub use plant::{PlantConfig, SpringContactPlant};
pub use rig::{RunSummary, SimError, SimRig};
