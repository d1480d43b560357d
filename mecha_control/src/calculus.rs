//! Time-aware integrator and differentiator.
//!
//! Both take caller-supplied timestamps and work out `dt` from the previous
//! call. The first call after construction or [`reset`](Integrator::reset)
//! only seeds the history.

use std::time::Duration;

/// Numerical integration rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrationMethod {
    /// `y += ½·(x[n] + x[n-1])·dt`
    #[default]
    Trapezoidal,
    /// `y += x[n]·dt`
    BackwardEuler,
}

/// Running integral of a sampled signal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Integrator {
    method: IntegrationMethod,
    value: f64,
    prev_input: f64,
    last_time: Option<Duration>,
}

impl Integrator {
    pub const fn new(method: IntegrationMethod) -> Self {
        Self {
            method,
            value: 0.0,
            prev_input: 0.0,
            last_time: None,
        }
    }

    #[inline]
    pub fn method(&self) -> IntegrationMethod {
        self.method
    }

    /// Change the rule. Accumulated value is kept.
    #[inline]
    pub fn set_method(&mut self, method: IntegrationMethod) {
        self.method = method;
    }

    /// Add the sample `x` taken at `t` and return the integral so far.
    ///
    /// Time going backwards contributes nothing.
    #[inline]
    pub fn update(&mut self, x: f64, t: Duration) -> f64 {
        if let Some(last) = self.last_time {
            let dt = t.saturating_sub(last).as_secs_f64();
            self.value += match self.method {
                IntegrationMethod::Trapezoidal => 0.5 * (x + self.prev_input) * dt,
                IntegrationMethod::BackwardEuler => x * dt,
            };
        }
        self.prev_input = x;
        self.last_time = Some(t);
        self.value
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Zero the integral and forget history.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::new(self.method);
    }
}

/// Backward-difference derivative of a sampled signal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Differentiator {
    prev_input: f64,
    last_time: Option<Duration>,
    value: f64,
}

impl Differentiator {
    pub const fn new() -> Self {
        Self {
            prev_input: 0.0,
            last_time: None,
            value: 0.0,
        }
    }

    /// Feed the sample `x` taken at `t` and return `dx/dt`.
    ///
    /// Returns 0 on the first call. A repeated or earlier timestamp returns
    /// the previous derivative without updating history.
    #[inline]
    pub fn update(&mut self, x: f64, t: Duration) -> f64 {
        match self.last_time {
            None => {
                self.value = 0.0;
            }
            Some(last) if t <= last => return self.value,
            Some(last) => {
                let dt = (t - last).as_secs_f64();
                self.value = (x - self.prev_input) / dt;
            }
        }
        self.prev_input = x;
        self.last_time = Some(t);
        self.value
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Forget history.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: Duration = Duration::from_millis(1);

    #[test]
    fn first_update_only_seeds() {
        let mut i = Integrator::new(IntegrationMethod::Trapezoidal);
        assert_eq!(i.update(5.0, Duration::from_secs(3)), 0.0);
        let mut d = Differentiator::new();
        assert_eq!(d.update(5.0, Duration::from_secs(3)), 0.0);
    }

    #[test]
    fn trapezoidal_integrates_ramp_exactly() {
        // ∫₀¹ t dt = 0.5
        let mut i = Integrator::new(IntegrationMethod::Trapezoidal);
        let mut out = 0.0;
        for n in 0..=1000u32 {
            let t = DT * n;
            out = i.update(t.as_secs_f64(), t);
        }
        assert!((out - 0.5).abs() < 1e-9, "got {out}");
    }

    #[test]
    fn backward_euler_integrates_constant() {
        let mut i = Integrator::new(IntegrationMethod::BackwardEuler);
        let mut out = 0.0;
        for n in 0..=1000u32 {
            out = i.update(2.0, DT * n);
        }
        assert!((out - 2.0).abs() < 1e-9, "got {out}");
    }

    #[test]
    fn integrator_ignores_backward_time() {
        let mut i = Integrator::default();
        i.update(1.0, Duration::from_secs(2));
        assert_eq!(i.update(1.0, Duration::from_secs(1)), 0.0);
    }

    #[test]
    fn integrator_reset_keeps_method() {
        let mut i = Integrator::new(IntegrationMethod::BackwardEuler);
        i.update(1.0, DT);
        i.update(1.0, DT * 2);
        i.reset();
        assert_eq!(i.value(), 0.0);
        assert_eq!(i.method(), IntegrationMethod::BackwardEuler);
        assert_eq!(i.update(1.0, DT * 100), 0.0);
    }

    #[test]
    fn differentiator_slope() {
        let mut d = Differentiator::new();
        d.update(0.0, Duration::ZERO);
        let out = d.update(0.003, DT);
        assert!((out - 3.0).abs() < 1e-9);
    }

    #[test]
    fn differentiator_holds_on_repeated_timestamp() {
        let mut d = Differentiator::new();
        d.update(0.0, Duration::ZERO);
        let slope = d.update(1.0, DT);
        assert_eq!(d.update(50.0, DT), slope);
        // History was not overwritten by the rejected sample.
        let next = d.update(2.0, DT * 2);
        assert!((next - 1000.0).abs() < 1e-6);
    }
}
