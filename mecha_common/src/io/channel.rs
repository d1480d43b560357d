//! Typed channel handles and TTL levels.
//!
//! A handle is a pin index into one bank of an [`IoBank`](super::IoBank).
//! Handles are `Copy`, carry no lifetime and never own the slot they name.

use core::fmt;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;

// ─── Pin handles ────────────────────────────────────────────────────

macro_rules! channel_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u16);

        impl $name {
            /// Pin index inside its bank.
            #[inline]
            pub const fn pin(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

channel_handle!(
    /// Analog input pin (voltage sampled by the acquisition read cycle).
    AiChannel,
    "AI"
);
channel_handle!(
    /// Analog output pin (voltage flushed by the acquisition write cycle).
    AoChannel,
    "AO"
);
channel_handle!(
    /// Digital input pin.
    DiChannel,
    "DI"
);
channel_handle!(
    /// Digital output pin.
    DoChannel,
    "DO"
);

const_assert_eq!(core::mem::size_of::<AiChannel>(), 2);

// ─── TtlLevel ───────────────────────────────────────────────────────

/// Logic level of a digital line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TtlLevel {
    /// 0 V.
    Low = 0,
    /// 5 V / 3.3 V.
    #[default]
    High = 1,
}

impl TtlLevel {
    /// The opposite level.
    #[inline]
    pub const fn inverted(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }

    /// `true` for [`TtlLevel::High`].
    #[inline]
    pub const fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

impl From<bool> for TtlLevel {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

impl From<TtlLevel> for bool {
    fn from(level: TtlLevel) -> Self {
        level.is_high()
    }
}

impl fmt::Display for TtlLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::High => write!(f, "high"),
        }
    }
}
