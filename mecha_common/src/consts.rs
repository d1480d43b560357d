//! System-wide constants for the mecha workspace.
//!
//! Single source of truth for bank sizes, timing bounds and calibration
//! defaults. Imported by all crates.

/// Maximum number of analog inputs in an [`IoBank`](crate::io::IoBank).
pub const MAX_AI: usize = 256;

/// Maximum number of analog outputs.
pub const MAX_AO: usize = 256;

/// Maximum number of digital inputs.
pub const MAX_DI: usize = 256;

/// Maximum number of digital outputs.
pub const MAX_DO: usize = 256;

/// Default control cycle time in microseconds (1 kHz).
pub const CYCLE_TIME_US: u32 = 1000;

/// Fastest supported cycle (10 kHz).
pub const CYCLE_TIME_US_MIN: u32 = 100;

/// Slowest supported cycle (10 Hz).
pub const CYCLE_TIME_US_MAX: u32 = 100_000;

/// Number of strain gauge channels on an ATI transducer.
pub const ATI_CHANNELS: usize = 6;

/// The only ATI `CalFileVersion` understood by the calibration parser.
pub const ATI_CAL_FILE_VERSION: &str = "1.1";

/// Default cutoff of the PID derivative low-pass filter [Hz].
pub const DERIVATIVE_CUTOFF_HZ_DEFAULT: f64 = 25.0;
