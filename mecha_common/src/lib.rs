//! Mecha Common Library
//!
//! Shared building blocks for all mecha workspace crates: the acquisition
//! channel model, diagnostics flags, constants and configuration loading.
//!
//! # Module Structure
//!
//! - [`io`] - Channel handles, TTL levels and the [`io::IoBank`] buffer
//! - [`types`] - Cartesian axis selector
//! - [`diagnostics`] - Sticky device warning flags
//! - [`config`] - TOML configuration loading traits and types
//! - [`rig`] - Device configuration for a complete rig
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! Add to your `Cargo.toml` with alias for shorter imports:
//! ```toml
//! [dependencies]
//! mecha = { package = "mecha_common", path = "../mecha_common" }
//! ```
//!
//! Then import:
//! ```rust
//! use mecha_common::io::{AiChannel, IoBank};
//! use mecha_common::config::{ConfigLoader, SharedConfig};
//! ```

pub mod config;
pub mod consts;
pub mod diagnostics;
pub mod io;
pub mod prelude;
pub mod rig;
pub mod types;
