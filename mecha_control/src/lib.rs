//! # Mecha Control Library
//!
//! Numerical primitives executed once per control tick:
//!
//! - [`limiter`] - Unlimited / Saturate / Accumulate (I²t) value bounding
//! - [`filters`] - first-order low-pass filter
//! - [`calculus`] - time-aware integrator and differentiator
//! - [`pid`] - PID controller with filtered derivative, and a PD controller
//!
//! ## Time
//!
//! Nothing in this crate reads a clock. Every time-dependent call receives
//! a caller-supplied timestamp (`Duration` since an arbitrary epoch, usually
//! loop start), which keeps the primitives deterministic and testable.
//!
//! ## Zero-Allocation
//!
//! All state is plain `Copy` data. No call allocates, blocks or performs I/O.

#![deny(clippy::disallowed_types)]

pub mod calculus;
pub mod filters;
pub mod limiter;
pub mod pid;

pub use limiter::{Limiter, LimiterMode};
pub use pid::{PdController, PidController};
