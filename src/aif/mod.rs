//! Arterial input functions
//!
//! Population-averaged plasma concentration curves that feed the tissue
//! models in [`crate::tissue`]. Tissue models only need a curve aligned with
//! the time grid, so any measured AIF can be used in place of these.

use serde::{Deserialize, Serialize};

/// Parker et al. (2005) population AIF
///
/// Two Gaussians for the first pass and recirculation plus an exponentially
/// modulated sigmoid for the washout, fitted in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParkerAif {
    /// Bolus arrival time in seconds
    pub bat: f64,
    /// Hematocrit, plasma concentrations are scaled by `1 / (1 - hct)`
    pub hct: f64,
}

impl Default for ParkerAif {
    fn default() -> Self {
        Self { bat: 0.0, hct: 0.0 }
    }
}

impl ParkerAif {
    /// Set the bolus arrival time (seconds)
    pub fn with_bat(mut self, bat: f64) -> Self {
        self.bat = bat;
        self
    }

    /// Set the hematocrit
    pub fn with_hct(mut self, hct: f64) -> Self {
        self.hct = hct;
        self
    }

    /// Plasma concentration in mM at `t` seconds
    pub fn concentration(&self, t: f64) -> f64 {
        let offset = (t - self.bat) / 60.0;

        let gaussian1 = 5.73258 * (-(offset - 0.17046).powi(2) / (2.0 * 0.0563 * 0.0563)).exp();
        let gaussian2 = 0.997356 * (-(offset - 0.365).powi(2) / (2.0 * 0.132 * 0.132)).exp();
        let sigmoid = 1.050 * (-0.1685 * offset).exp() / (1.0 + (-38.078 * (offset - 0.483)).exp());

        (gaussian1 + gaussian2 + sigmoid) / (1.0 - self.hct)
    }

    /// Plasma concentrations in mM for each time point in `t`
    pub fn concentrations(&self, t: &[f64]) -> Vec<f64> {
        t.iter().map(|&ti| self.concentration(ti)).collect()
    }
}

/// Parker AIF at times `t` (seconds) for bolus arrival `bat` and hematocrit `hct`
pub fn parker(t: &[f64], bat: f64, hct: f64) -> Vec<f64> {
    ParkerAif { bat, hct }.concentrations(t)
}
