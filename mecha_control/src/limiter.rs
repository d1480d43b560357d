//! Command limiter with saturation and I²t (thermal) accumulation.
//!
//! Three modes:
//! - **Unlimited**: passthrough.
//! - **Saturate**: clamp to `[min, max]`.
//! - **Accumulate**: models a component rated for `continuous_limit` that
//!   tolerates peaks up to `abs_limit` for roughly `time_limit`. Every
//!   evaluation integrates `(previous_limited² − continuous_limit²) · dt`
//!   into an accumulator clamped to `[0, ∞)`. While the accumulator is above
//!   `setpoint = (abs_limit² − continuous_limit²) · time_limit` the output is
//!   clamped to `±continuous_limit`; otherwise to `±abs_limit`.
//!
//! The accumulator is driven by the *previous* limited output, not the
//! value being limited now: heat is only known for commands already applied.

use std::time::Duration;

use mecha_common::rig::LimiterConfig;
use tracing::trace;

/// Limiting policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimiterMode {
    Unlimited,
    Saturate,
    Accumulate,
}

/// Clamp without the `min <= max` panic of `f64::clamp`.
#[inline]
fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Scalar command limiter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limiter {
    mode: LimiterMode,
    min: f64,
    max: f64,
    continuous_limit: f64,
    setpoint: f64,
    accumulator: f64,
    limited_value: f64,
    /// Timestamp of the previous Accumulate evaluation (`None` after reset).
    last_eval: Option<Duration>,
    exceeded: bool,
}

impl Default for Limiter {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl Limiter {
    /// Passthrough limiter.
    pub const fn unlimited() -> Self {
        Self {
            mode: LimiterMode::Unlimited,
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
            continuous_limit: 0.0,
            setpoint: 0.0,
            accumulator: 0.0,
            limited_value: 0.0,
            last_eval: None,
            exceeded: false,
        }
    }

    /// Saturate to `[-|abs_limit|, |abs_limit|]`.
    pub fn symmetric(abs_limit: f64) -> Self {
        Self::saturate(-abs_limit.abs(), abs_limit.abs())
    }

    /// Saturate to `[min, max]`.
    ///
    /// An inverted range (`min > max`) always yields `min`.
    pub const fn saturate(min: f64, max: f64) -> Self {
        Self {
            mode: LimiterMode::Saturate,
            min,
            max,
            ..Self::unlimited()
        }
    }

    /// I²t limiter.
    ///
    /// `setpoint = (abs_limit² − continuous_limit²) · time_limit`. A zero
    /// `time_limit` trips to the continuous band on the first evaluation that
    /// sees a previous output above `continuous_limit`.
    pub fn accumulate(continuous_limit: f64, abs_limit: f64, time_limit: Duration) -> Self {
        let abs_limit = abs_limit.abs();
        let continuous_limit = continuous_limit.abs();
        Self {
            mode: LimiterMode::Accumulate,
            min: -abs_limit,
            max: abs_limit,
            continuous_limit,
            setpoint: (abs_limit * abs_limit - continuous_limit * continuous_limit)
                * time_limit.as_secs_f64(),
            ..Self::unlimited()
        }
    }

    /// Build from a validated [`LimiterConfig`].
    pub fn from_config(config: &LimiterConfig) -> Self {
        match *config {
            LimiterConfig::Unlimited => Self::unlimited(),
            LimiterConfig::Symmetric { abs_limit } => Self::symmetric(abs_limit),
            LimiterConfig::Saturate { min, max } => Self::saturate(min, max),
            LimiterConfig::Accumulate {
                continuous_limit,
                abs_limit,
                time_limit_s,
            } => Self::accumulate(
                continuous_limit,
                abs_limit,
                Duration::try_from_secs_f64(time_limit_s.max(0.0)).unwrap_or(Duration::MAX),
            ),
        }
    }

    /// Limit `value`, evaluated at caller time `now`.
    ///
    /// `now` only matters in Accumulate mode. Time going backwards counts as
    /// zero elapsed time.
    pub fn limit(&mut self, value: f64, now: Duration) -> f64 {
        self.limited_value = match self.mode {
            LimiterMode::Unlimited => value,
            LimiterMode::Saturate => clamp(value, self.min, self.max),
            LimiterMode::Accumulate => {
                let elapsed = self
                    .last_eval
                    .map_or(0.0, |last| now.saturating_sub(last).as_secs_f64());
                self.last_eval = Some(now);

                let was_throttled = self.is_throttled();
                let prev = self.limited_value;
                self.accumulator += (prev * prev
                    - self.continuous_limit * self.continuous_limit)
                    * elapsed;
                self.accumulator = self.accumulator.max(0.0);

                let throttled = self.is_throttled();
                if throttled != was_throttled {
                    trace!(
                        "I2t limiter {} (accumulator={:.4}, setpoint={:.4})",
                        if throttled { "tripped" } else { "recovered" },
                        self.accumulator,
                        self.setpoint
                    );
                }

                if throttled {
                    clamp(value, -self.continuous_limit, self.continuous_limit)
                } else {
                    clamp(value, self.min, self.max)
                }
            }
        };
        self.exceeded = self.limited_value != value;
        self.limited_value
    }

    /// `true` iff the last [`limit`](Self::limit) call changed its input.
    #[inline]
    pub fn limit_exceeded(&self) -> bool {
        self.exceeded
    }

    /// Output of the last [`limit`](Self::limit) call.
    #[inline]
    pub fn limited_value(&self) -> f64 {
        self.limited_value
    }

    /// I²t budget (Accumulate mode only, 0 otherwise).
    #[inline]
    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Current I²t accumulator.
    #[inline]
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Active mode.
    #[inline]
    pub fn mode(&self) -> LimiterMode {
        self.mode
    }

    /// `(min, max)` band outside the I²t trip.
    #[inline]
    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// `true` while the accumulator exceeds the setpoint.
    #[inline]
    pub fn is_throttled(&self) -> bool {
        self.mode == LimiterMode::Accumulate && self.accumulator > self.setpoint
    }

    /// Zero the accumulator and restart the elapsed-time clock.
    ///
    /// The clock restarts at the next `limit()` call, not here: the interval
    /// between `reset()` and that call contributes nothing to the
    /// accumulator. No-op outside Accumulate mode.
    pub fn reset(&mut self) {
        if self.mode == LimiterMode::Accumulate {
            self.accumulator = 0.0;
            self.last_eval = None;
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DT: Duration = Duration::from_millis(1);

    fn at(tick: u32) -> Duration {
        DT * tick
    }

    #[test]
    fn unlimited_passes_through() {
        let mut l = Limiter::unlimited();
        assert_eq!(l.limit(1e9, at(0)), 1e9);
        assert_eq!(l.limit(-3.5, at(1)), -3.5);
        assert!(!l.limit_exceeded());
        assert_eq!(l.mode(), LimiterMode::Unlimited);
    }

    #[test]
    fn saturate_clamps_and_flags() {
        let mut l = Limiter::saturate(-2.0, 2.0);
        assert_eq!(l.limit(3.0, at(0)), 2.0);
        assert!(l.limit_exceeded());
        assert_eq!(l.limit(1.0, at(1)), 1.0);
        assert!(!l.limit_exceeded());
        assert_eq!(l.limit(-7.0, at(2)), -2.0);
        assert!(l.limit_exceeded());
        assert_eq!(l.limited_value(), -2.0);
    }

    #[test]
    fn boundary_value_is_not_exceeded() {
        let mut l = Limiter::saturate(-2.0, 2.0);
        assert_eq!(l.limit(2.0, at(0)), 2.0);
        assert!(!l.limit_exceeded());
    }

    #[test]
    fn symmetric_uses_absolute_limit() {
        let l = Limiter::symmetric(-4.0);
        assert_eq!(l.bounds(), (-4.0, 4.0));
    }

    #[test]
    fn zero_abs_limit_is_degenerate() {
        let mut l = Limiter::symmetric(0.0);
        assert_eq!(l.limit(5.0, at(0)), 0.0);
        assert_eq!(l.limit(-5.0, at(1)), 0.0);
        assert!(l.limit_exceeded());
    }

    #[test]
    fn inverted_range_never_panics() {
        let mut l = Limiter::saturate(1.0, -1.0);
        assert_eq!(l.limit(0.0, at(0)), 1.0);
    }

    #[test]
    fn accumulate_setpoint() {
        let l = Limiter::accumulate(1.0, 3.0, Duration::from_secs(2));
        assert!((l.setpoint() - 16.0).abs() < 1e-12);
        assert_eq!(l.bounds(), (-3.0, 3.0));
    }

    #[test]
    fn accumulate_allows_peak_below_time_limit() {
        // C=1, A=3, T=1s → setpoint 8.
        let mut l = Limiter::accumulate(1.0, 3.0, Duration::from_secs(1));
        // 0.9 s at peak.
        for tick in 0..900 {
            let out = l.limit(3.0, at(tick));
            assert!((-3.0..=3.0).contains(&out));
            assert_eq!(out, 3.0);
        }
        assert!(!l.is_throttled());
        assert!(l.accumulator() < l.setpoint());
    }

    #[test]
    fn accumulate_trips_to_continuous_after_time_limit() {
        let mut l = Limiter::accumulate(1.0, 3.0, Duration::from_secs(1));
        let mut tick = 0;
        // Sustain peak for 1.2 s.
        while tick < 1200 {
            l.limit(3.0, at(tick));
            tick += 1;
        }
        assert!(l.is_throttled());
        assert_eq!(l.limit(3.0, at(tick)), 1.0);
        assert!(l.limit_exceeded());
        assert_eq!(l.limit(-3.0, at(tick + 1)), -1.0);
    }

    #[test]
    fn accumulate_decays_when_below_continuous() {
        let mut l = Limiter::accumulate(1.0, 3.0, Duration::from_secs(1));
        let mut tick = 0;
        while !l.is_throttled() {
            l.limit(3.0, at(tick));
            tick += 1;
        }
        // Holding at the continuous limit neither charges nor discharges.
        let held = l.accumulator();
        for _ in 0..100 {
            l.limit(3.0, at(tick));
            tick += 1;
        }
        assert!((l.accumulator() - held).abs() < 1e-9);

        // Commanding zero bleeds C² per second.
        for _ in 0..500 {
            l.limit(0.0, at(tick));
            tick += 1;
        }
        assert!(!l.is_throttled());
        assert_eq!(l.limit(3.0, at(tick)), 3.0);
    }

    #[test]
    fn accumulate_uses_previous_output() {
        let mut l = Limiter::accumulate(1.0, 3.0, Duration::from_secs(1));
        l.limit(3.0, at(0));
        // First evaluation had no previous timestamp → nothing integrated.
        assert_eq!(l.accumulator(), 0.0);
        // Second evaluation integrates the *previous* output 3.0 over 1 ms,
        // regardless of the value requested now.
        l.limit(0.0, at(1));
        assert!((l.accumulator() - (9.0 - 1.0) * 0.001).abs() < 1e-12);
    }

    #[test]
    fn accumulator_never_negative() {
        let mut l = Limiter::accumulate(2.0, 3.0, Duration::from_secs(1));
        for tick in 0..100 {
            l.limit(0.0, at(tick));
            assert!(l.accumulator() >= 0.0);
        }
    }

    #[test]
    fn zero_time_limit_trips_immediately() {
        let mut l = Limiter::accumulate(1.0, 3.0, Duration::ZERO);
        assert_eq!(l.setpoint(), 0.0);
        assert_eq!(l.limit(3.0, at(0)), 3.0);
        // Previous output 3.0 > C over 1 ms → accumulator > 0 = setpoint.
        assert_eq!(l.limit(3.0, at(1)), 1.0);
    }

    #[test]
    fn time_going_backwards_counts_as_zero() {
        let mut l = Limiter::accumulate(1.0, 3.0, Duration::from_secs(1));
        l.limit(3.0, at(10));
        l.limit(3.0, at(5));
        assert_eq!(l.accumulator(), 0.0);
    }

    #[test]
    fn reset_clears_accumulate_state() {
        let mut l = Limiter::accumulate(1.0, 3.0, Duration::from_secs(1));
        for tick in 0..1500 {
            l.limit(3.0, at(tick));
        }
        assert!(l.is_throttled());
        l.reset();
        assert_eq!(l.accumulator(), 0.0);
        assert!(!l.is_throttled());
        // Clock restarted: a late timestamp does not integrate the gap.
        l.limit(3.0, at(100_000));
        assert_eq!(l.accumulator(), 0.0);
    }

    #[test]
    fn reset_is_noop_for_saturate() {
        let mut l = Limiter::saturate(-1.0, 1.0);
        l.limit(5.0, at(0));
        l.reset();
        assert_eq!(l.limited_value(), 1.0);
        assert!(l.limit_exceeded());
    }

    #[test]
    fn from_config_variants() {
        assert_eq!(
            Limiter::from_config(&LimiterConfig::Unlimited).mode(),
            LimiterMode::Unlimited
        );
        let l = Limiter::from_config(&LimiterConfig::Symmetric { abs_limit: 2.0 });
        assert_eq!(l.bounds(), (-2.0, 2.0));
        let l = Limiter::from_config(&LimiterConfig::Accumulate {
            continuous_limit: 1.0,
            abs_limit: 2.0,
            time_limit_s: 0.5,
        });
        assert_eq!(l.mode(), LimiterMode::Accumulate);
        assert!((l.setpoint() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn oversized_time_limit_saturates_to_max_duration() {
        let mut l = Limiter::from_config(&LimiterConfig::Accumulate {
            continuous_limit: 1.0,
            abs_limit: 2.0,
            time_limit_s: 1e20,
        });
        assert_eq!(l.mode(), LimiterMode::Accumulate);
        let expected = 3.0 * Duration::MAX.as_secs_f64();
        assert!((l.setpoint() - expected).abs() <= expected * 1e-12);
        assert_eq!(l.limit(2.0, at(0)), 2.0);
        assert!(!l.is_throttled());
    }

    proptest! {
        #[test]
        fn saturate_equals_clamp(
            v in -1e6f64..1e6,
            a in -1e3f64..1e3,
            b in -1e3f64..1e3,
        ) {
            let (min, max) = if a <= b { (a, b) } else { (b, a) };
            let mut l = Limiter::saturate(min, max);
            let out = l.limit(v, Duration::ZERO);
            prop_assert_eq!(out, v.clamp(min, max));
            prop_assert_eq!(l.limit_exceeded(), v < min || v > max);
        }

        #[test]
        fn accumulate_output_stays_in_peak_band(
            commands in proptest::collection::vec(-10.0f64..10.0, 1..200),
        ) {
            let mut l = Limiter::accumulate(1.0, 3.0, Duration::from_millis(50));
            for (tick, v) in commands.into_iter().enumerate() {
                let out = l.limit(v, DT * tick as u32);
                prop_assert!((-3.0..=3.0).contains(&out));
                prop_assert!(l.accumulator() >= 0.0);
            }
        }
    }
}
