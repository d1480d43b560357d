//! Acquisition buffer shared between the acquisition layer and devices.
//!
//! Sized once at construction and never resized afterwards. The
//! acquisition layer refreshes inputs before a tick (`ai_mut`, `di_mut`)
//! and flushes outputs after it (`ao`, `dout`). Devices address single
//! slots through typed handles.
//!
//! # Tick sequencing
//!
//! ```text
//! acquisition read  → IoBank::{ai_mut, di_mut}
//! control logic     → sensors read, amplifiers write (&IoBank / &mut IoBank)
//! acquisition write → IoBank::{ao_values, dout_values}
//! ```

use tracing::debug;

use super::channel::{AiChannel, AoChannel, DiChannel, DoChannel, TtlLevel};
use crate::consts::{MAX_AI, MAX_AO, MAX_DI, MAX_DO};

/// Fixed-size channel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct IoBank {
    ai: Box<[f64]>,
    ao: Box<[f64]>,
    di: Box<[bool]>,
    dout: Box<[bool]>,
}

impl Default for IoBank {
    fn default() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

impl IoBank {
    /// Allocate a bank with the given number of pins per type.
    ///
    /// Counts above `MAX_AI`/`MAX_AO`/`MAX_DI`/`MAX_DO` are truncated.
    pub fn new(ai: usize, ao: usize, di: usize, dout: usize) -> Self {
        let sizes = (ai.min(MAX_AI), ao.min(MAX_AO), di.min(MAX_DI), dout.min(MAX_DO));
        if sizes != (ai, ao, di, dout) {
            debug!(
                "IoBank request ({}, {}, {}, {}) truncated to ({}, {}, {}, {})",
                ai, ao, di, dout, sizes.0, sizes.1, sizes.2, sizes.3
            );
        }
        Self {
            ai: vec![0.0; sizes.0].into_boxed_slice(),
            ao: vec![0.0; sizes.1].into_boxed_slice(),
            di: vec![false; sizes.2].into_boxed_slice(),
            dout: vec![false; sizes.3].into_boxed_slice(),
        }
    }

    // ── Analog inputs ───────────────────────────────────────

    /// Read an analog input. `None` if the pin is outside the bank.
    #[inline]
    pub fn ai(&self, ch: AiChannel) -> Option<f64> {
        self.ai.get(ch.pin()).copied()
    }

    /// Store an analog input sample (acquisition side).
    #[inline]
    pub fn set_ai(&mut self, ch: AiChannel, value: f64) -> bool {
        match self.ai.get_mut(ch.pin()) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// All analog inputs.
    pub fn ai_values(&self) -> &[f64] {
        &self.ai
    }

    /// Mutable view for a bulk acquisition refresh.
    pub fn ai_mut(&mut self) -> &mut [f64] {
        &mut self.ai
    }

    // ── Analog outputs ──────────────────────────────────────

    /// Read back an analog output. `None` if the pin is outside the bank.
    #[inline]
    pub fn ao(&self, ch: AoChannel) -> Option<f64> {
        self.ao.get(ch.pin()).copied()
    }

    /// Write an analog output (device side).
    #[inline]
    pub fn set_ao(&mut self, ch: AoChannel, value: f64) -> bool {
        match self.ao.get_mut(ch.pin()) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// All analog outputs, for the acquisition write cycle.
    pub fn ao_values(&self) -> &[f64] {
        &self.ao
    }

    // ── Digital inputs ──────────────────────────────────────

    /// Read a digital input level.
    #[inline]
    pub fn di(&self, ch: DiChannel) -> Option<TtlLevel> {
        self.di.get(ch.pin()).map(|&b| TtlLevel::from(b))
    }

    /// Store a digital input level (acquisition side).
    #[inline]
    pub fn set_di(&mut self, ch: DiChannel, level: TtlLevel) -> bool {
        match self.di.get_mut(ch.pin()) {
            Some(slot) => {
                *slot = level.is_high();
                true
            }
            None => false,
        }
    }

    /// Mutable view for a bulk acquisition refresh.
    pub fn di_mut(&mut self) -> &mut [bool] {
        &mut self.di
    }

    // ── Digital outputs ─────────────────────────────────────

    /// Read back a digital output level.
    #[inline]
    pub fn dout(&self, ch: DoChannel) -> Option<TtlLevel> {
        self.dout.get(ch.pin()).map(|&b| TtlLevel::from(b))
    }

    /// Drive a digital output (device side).
    #[inline]
    pub fn set_dout(&mut self, ch: DoChannel, level: TtlLevel) -> bool {
        match self.dout.get_mut(ch.pin()) {
            Some(slot) => {
                *slot = level.is_high();
                true
            }
            None => false,
        }
    }

    /// All digital outputs, for the acquisition write cycle.
    pub fn dout_values(&self) -> &[bool] {
        &self.dout
    }

    // ── Sizes ───────────────────────────────────────────────

    /// `(ai, ao, di, do)` pin counts.
    pub fn sizes(&self) -> (usize, usize, usize, usize) {
        (self.ai.len(), self.ao.len(), self.di.len(), self.dout.len())
    }

    /// Zero every slot without changing the bank sizes.
    pub fn clear(&mut self) {
        self.ai.fill(0.0);
        self.ao.fill(0.0);
        self.di.fill(false);
        self.dout.fill(false);
    }
}
