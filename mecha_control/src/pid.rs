//! PID controller with filtered derivative, and a PD controller.
//!
//! ```text
//! e   = reference − measured
//! out = kp·e + ki·∫e dt + kd·LP(de/dt)
//! ```
//!
//! Zero Ki disables integral; zero Kd disables derivative. Timestamps are
//! caller-supplied. The first call after construction or [`reset`]
//! contributes no integral and no derivative.
//!
//! [`reset`]: PidController::reset

use std::time::Duration;

use mecha_common::consts::DERIVATIVE_CUTOFF_HZ_DEFAULT;
use mecha_common::rig::PidConfig;

use crate::calculus::{Differentiator, IntegrationMethod, Integrator};
use crate::filters::LowPassFilter;

/// Stateful PID controller.
///
/// Gains are never touched by [`reset`](Self::reset).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidController {
    kp: f64,
    ki: f64,
    kd: f64,
    integrator: Integrator,
    differentiator: Differentiator,
    filter: LowPassFilter,
    /// Time of the previous call, for the derivative filter step.
    last_time: Option<Duration>,
}

impl PidController {
    /// New controller with the default derivative cutoff and trapezoidal
    /// integration.
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            integrator: Integrator::new(IntegrationMethod::Trapezoidal),
            differentiator: Differentiator::new(),
            filter: LowPassFilter::new(DERIVATIVE_CUTOFF_HZ_DEFAULT),
            last_time: None,
        }
    }

    /// Builder: derivative low-pass cutoff [Hz]. `0` disables the filter.
    pub fn with_derivative_cutoff(mut self, cutoff_hz: f64) -> Self {
        self.filter.set_cutoff_hz(cutoff_hz);
        self
    }

    /// Builder: integration rule.
    pub fn with_integration_method(mut self, method: IntegrationMethod) -> Self {
        self.integrator.set_method(method);
        self
    }

    pub fn from_config(config: &PidConfig) -> Self {
        Self::new(config.kp, config.ki, config.kd).with_derivative_cutoff(config.derivative_cutoff_hz)
    }

    /// One control step at time `t`, differentiating the error numerically.
    #[inline]
    pub fn calculate(&mut self, reference: f64, measured: f64, t: Duration) -> f64 {
        let e = reference - measured;
        let ei = self.integrator.update(e, t);
        let ed = self.differentiator.update(e, t);
        let ed = self.filter_step(ed, t);
        self.kp * e + self.ki * ei + self.kd * ed
    }

    /// One control step at time `t` using a measured rate `rate` for the
    /// derivative term (`0 − rate`, filtered). The numerical differentiator
    /// is left untouched.
    #[inline]
    pub fn calculate_with_rate(
        &mut self,
        reference: f64,
        measured: f64,
        rate: f64,
        t: Duration,
    ) -> f64 {
        let e = reference - measured;
        let ei = self.integrator.update(e, t);
        let ed = self.filter_step(-rate, t);
        self.kp * e + self.ki * ei + self.kd * ed
    }

    fn filter_step(&mut self, input: f64, t: Duration) -> f64 {
        let dt = self
            .last_time
            .map_or(0.0, |last| t.saturating_sub(last).as_secs_f64());
        self.last_time = Some(t);
        self.filter.apply(input, dt)
    }

    /// Clear integrator, differentiator and derivative filter state.
    pub fn reset(&mut self) {
        self.integrator.reset();
        self.differentiator.reset();
        self.filter.reset();
        self.last_time = None;
    }

    #[inline]
    pub fn kp(&self) -> f64 {
        self.kp
    }
    #[inline]
    pub fn ki(&self) -> f64 {
        self.ki
    }
    #[inline]
    pub fn kd(&self) -> f64 {
        self.kd
    }

    /// Replace all three gains. State is kept.
    pub fn set_gains(&mut self, kp: f64, ki: f64, kd: f64) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    #[inline]
    pub fn derivative_cutoff_hz(&self) -> f64 {
        self.filter.cutoff_hz()
    }

    pub fn set_derivative_cutoff_hz(&mut self, cutoff_hz: f64) {
        self.filter.set_cutoff_hz(cutoff_hz);
    }

    #[inline]
    pub fn integration_method(&self) -> IntegrationMethod {
        self.integrator.method()
    }

    /// Current integral of the error.
    #[inline]
    pub fn integral(&self) -> f64 {
        self.integrator.value()
    }
}

/// Stateless PD controller on position and velocity errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdController {
    pub kp: f64,
    pub kd: f64,
}

impl PdController {
    pub const fn new(kp: f64, kd: f64) -> Self {
        Self { kp, kd }
    }

    /// `kp·(x_ref − x) + kd·(xd_ref − xd)`
    #[inline]
    pub fn calculate(&self, x_ref: f64, x: f64, xd_ref: f64, xd: f64) -> f64 {
        self.kp * (x_ref - x) + self.kd * (xd_ref - xd)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
