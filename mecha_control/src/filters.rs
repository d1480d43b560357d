//! Signal conditioning filters.
//!
//! 1st-order low-pass filter used on the PID derivative path.
//! A cutoff of zero (or below) disables the filter.

use core::f64::consts::PI;

// ─── Low-Pass Filter (1st-order) ────────────────────────────────────

/// 1st-order low-pass filter with a fixed cutoff.
///
/// ```text
/// alpha = 2π·fc·dt / (1 + 2π·fc·dt)
/// y[n] = y[n-1] + alpha × (x[n] - y[n-1])
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowPassFilter {
    cutoff_hz: f64,
    prev_output: f64,
}

impl LowPassFilter {
    /// New filter. `cutoff_hz <= 0.0` means passthrough.
    pub const fn new(cutoff_hz: f64) -> Self {
        Self {
            cutoff_hz,
            prev_output: 0.0,
        }
    }

    #[inline]
    pub fn cutoff_hz(&self) -> f64 {
        self.cutoff_hz
    }

    /// Change the cutoff. Filter state is kept.
    #[inline]
    pub fn set_cutoff_hz(&mut self, cutoff_hz: f64) {
        self.cutoff_hz = cutoff_hz;
    }

    /// `true` when the filter actually smooths.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.cutoff_hz > 0.0
    }

    /// Last output.
    #[inline]
    pub fn output(&self) -> f64 {
        self.prev_output
    }

    /// Apply one sample taken `dt` seconds after the previous one.
    ///
    /// Disabled filters return `input` unchanged. A non-positive `dt` holds
    /// the previous output.
    #[inline]
    pub fn apply(&mut self, input: f64, dt: f64) -> f64 {
        if !self.is_enabled() {
            self.prev_output = input;
            return input;
        }
        if dt <= 0.0 {
            return self.prev_output;
        }

        let omega = 2.0 * PI * self.cutoff_hz * dt;
        let alpha = omega / (1.0 + omega);
        let output = self.prev_output + alpha * (input - self.prev_output);
        self.prev_output = output;
        output
    }

    /// Reset filter state to zero (cutoff is kept).
    #[inline]
    pub fn reset(&mut self) {
        self.prev_output = 0.0;
    }
}

impl Default for LowPassFilter {
    fn default() -> Self {
        Self::new(0.0)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f64 = 1000.0; // 1 kHz
    const DT: f64 = 1.0 / SAMPLE_RATE;

    #[test]
    fn lowpass_disabled_passthrough() {
        let mut f = LowPassFilter::new(0.0);
        assert_eq!(f.apply(5.0, DT), 5.0);
        assert_eq!(f.apply(-3.0, DT), -3.0);
        assert!(!f.is_enabled());
    }

    #[test]
    fn lowpass_converges_to_dc() {
        let mut f = LowPassFilter::new(50.0);
        let mut out = 0.0;
        for _ in 0..5000 {
            out = f.apply(1.0, DT);
        }
        assert!((out - 1.0).abs() < 1e-6, "LP should converge to 1.0: {out}");
    }

    #[test]
    fn lowpass_first_step_matches_alpha() {
        let mut f = LowPassFilter::new(25.0);
        let omega = 2.0 * PI * 25.0 * DT;
        let alpha = omega / (1.0 + omega);
        let out = f.apply(1.0, DT);
        assert!((out - alpha).abs() < 1e-12);
        assert_eq!(f.output(), out);
    }

    #[test]
    fn lowpass_attenuates_high_freq() {
        let mut f = LowPassFilter::new(10.0);
        // Alternating ±1 at Nyquist.
        let mut max_out: f64 = 0.0;
        for i in 0..2000 {
            let x = if i % 2 == 0 { 1.0 } else { -1.0 };
            let out = f.apply(x, DT);
            if i > 1000 {
                max_out = max_out.max(out.abs());
            }
        }
        assert!(max_out < 0.1, "LP should attenuate Nyquist: {max_out}");
    }

    #[test]
    fn zero_dt_holds_output() {
        let mut f = LowPassFilter::new(25.0);
        let first = f.apply(1.0, DT);
        assert_eq!(f.apply(100.0, 0.0), first);
        assert_eq!(f.apply(100.0, -DT), first);
    }

    #[test]
    fn reset_keeps_cutoff() {
        let mut f = LowPassFilter::new(25.0);
        f.apply(1.0, DT);
        f.reset();
        assert_eq!(f.output(), 0.0);
        assert_eq!(f.cutoff_hz(), 25.0);
    }
}
