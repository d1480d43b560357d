//! Acquisition channel model.
//!
//! The acquisition layer owns an [`IoBank`]; devices hold only typed pin
//! handles ([`AiChannel`], [`AoChannel`], [`DiChannel`], [`DoChannel`]) and
//! receive the bank by reference for the duration of one call. A binding is
//! therefore never dereferenced outside the tick that supplies the bank.

pub mod bank;
pub mod channel;

pub use bank::IoBank;
pub use channel::{AiChannel, AoChannel, DiChannel, DoChannel, TtlLevel};
