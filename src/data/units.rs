//! Physical units for rate and flow parameters
//!
//! Clinical literature quotes `Ktrans` in 1/min and flows in mL/min/100 mL,
//! while the time axis of every model in this crate is in seconds. Both
//! conversions live here and nowhere else; models ask for
//! [`Rate::per_second`] or [`Flow::per_second`] before touching the grid.

use std::fmt;

use serde::{Deserialize, Serialize};

const SECONDS_PER_MINUTE: f64 = 60.0;
/// 60 s/min times the 100 mL of tissue the flow is normalised to
const FLOW_TO_PER_SECOND: f64 = 60.0 * 100.0;

/// A first-order rate constant such as `Ktrans` or `kep`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Rate {
    /// 1/min
    PerMinute(f64),
    /// 1/s
    PerSecond(f64),
}

impl Rate {
    /// Value in 1/s
    pub fn per_second(&self) -> f64 {
        match *self {
            Rate::PerMinute(value) => value / SECONDS_PER_MINUTE,
            Rate::PerSecond(value) => value,
        }
    }

    /// Value in 1/min
    pub fn per_minute(&self) -> f64 {
        match *self {
            Rate::PerMinute(value) => value,
            Rate::PerSecond(value) => value * SECONDS_PER_MINUTE,
        }
    }

    /// The number as it was given, regardless of unit
    pub fn value(&self) -> f64 {
        match *self {
            Rate::PerMinute(value) | Rate::PerSecond(value) => value,
        }
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rate::PerMinute(value) => write!(f, "{} /min", value),
            Rate::PerSecond(value) => write!(f, "{} /s", value),
        }
    }
}

/// Plasma flow `Fp` or permeability-surface area product `PS`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Flow {
    /// mL/min per 100 mL of tissue
    Ml100PerMinute(f64),
    /// 1/s (mL/s per mL of tissue)
    PerSecond(f64),
}

impl Flow {
    /// Value in 1/s
    pub fn per_second(&self) -> f64 {
        match *self {
            Flow::Ml100PerMinute(value) => value / FLOW_TO_PER_SECOND,
            Flow::PerSecond(value) => value,
        }
    }

    /// Value in mL/min/100 mL
    pub fn ml100_per_minute(&self) -> f64 {
        match *self {
            Flow::Ml100PerMinute(value) => value,
            Flow::PerSecond(value) => value * FLOW_TO_PER_SECOND,
        }
    }

    /// The number as it was given, regardless of unit
    pub fn value(&self) -> f64 {
        match *self {
            Flow::Ml100PerMinute(value) | Flow::PerSecond(value) => value,
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flow::Ml100PerMinute(value) => write!(f, "{} mL/min/100mL", value),
            Flow::PerSecond(value) => write!(f, "{} /s", value),
        }
    }
}
