//! Simulated acquisition hardware and spring-contact plant.
//!
//! A lever of length `lever_arm_m` on the motor shaft pushes a mass against
//! a spring that engages after `gap_m` of travel:
//!
//! ```text
//! F_drive   = kt · i / lever_arm
//! F_contact = stiffness · max(x − gap, 0)
//! m·ẍ       = F_drive − F_contact − damping·ẋ
//! ```
//!
//! The amplifier is modelled as ideal: `i = V_cmd · command_gain` while the
//! enable line sits at its enable level, zero otherwise. The contact force
//! appears on the Fz gauges of an ATI transducer and on a single-axis load
//! cell, whichever the rig has.

use mecha_common::config::{ConfigError, Validate};
use mecha_common::consts::ATI_CHANNELS;
use mecha_common::io::{AiChannel, AoChannel, DiChannel, DoChannel, IoBank, TtlLevel};
use mecha_common::rig::RigConfig;
use mecha_devices::AtiCalibration;
use serde::{Deserialize, Serialize};
use tracing::debug;

fn default_lever_arm() -> f64 {
    0.05
}
fn default_mass() -> f64 {
    0.2
}
fn default_damping() -> f64 {
    5.0
}
fn default_stiffness() -> f64 {
    2000.0
}
fn default_gap() -> f64 {
    0.002
}

/// Physical plant parameters (`[plant]` table of the rig file).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlantConfig {
    #[serde(default = "default_lever_arm")]
    pub lever_arm_m: f64,
    #[serde(default = "default_mass")]
    pub mass_kg: f64,
    /// [N·s/m]
    #[serde(default = "default_damping")]
    pub damping: f64,
    /// [N/m]
    #[serde(default = "default_stiffness")]
    pub stiffness: f64,
    #[serde(default = "default_gap")]
    pub gap_m: f64,
    /// Gauge voltages present before any contact.
    #[serde(default)]
    pub ati_preload: [f64; ATI_CHANNELS],
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            lever_arm_m: default_lever_arm(),
            mass_kg: default_mass(),
            damping: default_damping(),
            stiffness: default_stiffness(),
            gap_m: default_gap(),
            ati_preload: [0.0; ATI_CHANNELS],
        }
    }
}

impl Validate for PlantConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (what, value) in [
            ("lever_arm_m", self.lever_arm_m),
            ("mass_kg", self.mass_kg),
            ("stiffness", self.stiffness),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::ValidationError(format!(
                    "plant.{what} must be > 0, got {value}"
                )));
            }
        }
        if !(self.damping.is_finite() && self.damping >= 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "plant.damping must be >= 0, got {}",
                self.damping
            )));
        }
        if !(self.gap_m.is_finite() && self.gap_m >= 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "plant.gap_m must be >= 0, got {}",
                self.gap_m
            )));
        }
        Ok(())
    }
}

/// Where the plant reads and writes the bank.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Wiring {
    kt: f64,
    command: Option<AoChannel>,
    command_gain: f64,
    enable: Option<DoChannel>,
    enable_level: TtlLevel,
    fault: Option<DiChannel>,
    fault_level: TtlLevel,
    sense: Option<AiChannel>,
    sense_gain: f64,
    ati: Option<[AiChannel; ATI_CHANNELS]>,
    /// Volts per newton on the Fz gauge.
    ati_fz_sensitivity: f64,
    cell: Option<AiChannel>,
    /// Volts per newton on the load cell.
    cell_sensitivity: f64,
}

/// Simulated rig hardware.
#[derive(Debug, Clone, PartialEq)]
pub struct SpringContactPlant {
    params: PlantConfig,
    wiring: Wiring,
    position: f64,
    velocity: f64,
    current: f64,
}

impl SpringContactPlant {
    /// Plant wired like `rig`.
    ///
    /// Gauge sensitivity is taken from the diagonal of `ati_calibration`.
    /// The load cell is treated as linear (`v = F / b`).
    pub fn new(params: PlantConfig, rig: &RigConfig, ati_calibration: &AtiCalibration) -> Self {
        let mut wiring = Wiring::default();
        if let Some(motor) = &rig.motor {
            let amp = &motor.amplifier;
            wiring.kt = motor.kt;
            wiring.command = amp.command_channel;
            wiring.command_gain = amp.command_gain;
            wiring.enable = amp.enable_channel;
            wiring.enable_level = amp.enable_level;
            wiring.fault = amp.fault_channel;
            wiring.fault_level = amp.fault_level;
            wiring.sense = amp.sense_channel;
            wiring.sense_gain = amp.sense_gain;
        }
        if let Some(ati) = &rig.ati {
            let fz = ati_calibration.rows()[2][2];
            wiring.ati = Some(ati.channels);
            wiring.ati_fz_sensitivity = if fz != 0.0 { 1.0 / fz } else { 0.0 };
        }
        if let Some(cell) = &rig.force_sensor {
            wiring.cell = Some(cell.channel);
            wiring.cell_sensitivity = if cell.b != 0.0 { 1.0 / cell.b } else { 0.0 };
        }
        debug!("Plant wiring: {:?}", wiring);
        Self {
            params,
            wiring,
            position: 0.0,
            velocity: 0.0,
            current: 0.0,
        }
    }

    /// Paddle travel [m].
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Motor current [A] applied during the last step.
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Spring reaction [N].
    pub fn contact_force(&self) -> f64 {
        self.params.stiffness * (self.position - self.params.gap_m).max(0.0)
    }

    /// Acquisition read cycle: refresh AI and DI pins from the plant state.
    pub fn acquire(&self, io: &mut IoBank) {
        let w = &self.wiring;
        if let Some(ch) = w.fault {
            io.set_di(ch, w.fault_level.inverted());
        }
        if let Some(ch) = w.sense {
            io.set_ai(ch, self.current / w.sense_gain);
        }
        let force = self.contact_force();
        if let Some(channels) = w.ati {
            for (i, ch) in channels.into_iter().enumerate() {
                let load = if i == 2 { force * w.ati_fz_sensitivity } else { 0.0 };
                io.set_ai(ch, self.params.ati_preload[i] + load);
            }
        }
        if let Some(ch) = w.cell {
            io.set_ai(ch, force * w.cell_sensitivity);
        }
    }

    /// Acquisition write cycle: apply AO/DO pins to the plant and advance
    /// it by `dt` seconds.
    pub fn step(&mut self, io: &IoBank, dt: f64) {
        let w = &self.wiring;
        let enabled = match w.enable {
            Some(ch) => io.dout(ch) == Some(w.enable_level),
            None => true,
        };
        let volts = w.command.and_then(|ch| io.ao(ch)).unwrap_or(0.0);
        self.current = if enabled { volts * w.command_gain } else { 0.0 };

        let drive = w.kt * self.current / self.params.lever_arm_m;
        let accel = (drive - self.contact_force() - self.params.damping * self.velocity)
            / self.params.mass_kg;
        // Semi-implicit Euler.
        self.velocity += accel * dt;
        self.position += self.velocity * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mecha_common::config::ConfigLoader;

    const DT: f64 = 0.001;

    const RIG: &str = r#"
[shared]
service_name = "plant-test"

[motor]
name = "m"
kt = 0.1

[motor.amplifier]
name = "a"
command_gain = 2.0
command_channel = 0
enable_channel = 0
fault_channel = 0
sense_channel = 6
sense_gain = 4.0

[ati]
name = "ati"
channels = [0, 1, 2, 3, 4, 5]
"#;

    fn plant() -> (SpringContactPlant, IoBank) {
        let rig = RigConfig::from_toml_str(RIG).unwrap();
        let plant =
            SpringContactPlant::new(PlantConfig::default(), &rig, &AtiCalibration::identity());
        (plant, IoBank::new(8, 1, 1, 1))
    }

    #[test]
    fn rests_without_current() {
        let (mut plant, mut io) = plant();
        for _ in 0..1000 {
            plant.acquire(&mut io);
            plant.step(&io, DT);
        }
        assert_eq!(plant.position(), 0.0);
        assert_eq!(plant.contact_force(), 0.0);
    }

    #[test]
    fn disabled_amplifier_drives_nothing() {
        let (mut plant, mut io) = plant();
        io.set_ao(AoChannel(0), 1.0);
        io.set_dout(DoChannel(0), TtlLevel::Low);
        plant.step(&io, DT);
        assert_eq!(plant.current(), 0.0);
    }

    #[test]
    fn constant_current_settles_on_spring() {
        let (mut plant, mut io) = plant();
        // 1 V · 2 A/V = 2 A → 0.2 Nm → 4 N at the lever tip.
        io.set_ao(AoChannel(0), 1.0);
        io.set_dout(DoChannel(0), TtlLevel::High);
        for _ in 0..5000 {
            plant.step(&io, DT);
        }
        assert!((plant.current() - 2.0).abs() < 1e-12);
        assert!((plant.contact_force() - 4.0).abs() < 1e-3);

        plant.acquire(&mut io);
        assert!((io.ai(AiChannel(2)).unwrap() - plant.contact_force()).abs() < 1e-12);
        assert_eq!(io.ai(AiChannel(0)), Some(0.0));
        assert_eq!(io.ai(AiChannel(6)), Some(0.5));
        assert_eq!(io.di(DiChannel(0)), Some(TtlLevel::Low));
    }

    #[test]
    fn plant_validation() {
        assert!(PlantConfig::default().validate().is_ok());
        let bad = PlantConfig {
            mass_kg: 0.0,
            ..PlantConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
