//! Extended Tofts model
//!
//! The Tofts model plus the tracer carried in the tissue's own plasma
//! volume: `Ct(t) = vp·ca(t) + Ktrans·∫ ca(s)·exp(-kep·(t - s)) ds`.

use serde::{Deserialize, Serialize};

use super::error::{ParameterError, TissueError};
use super::tofts::extravascular;
use super::{validate, ModelOptions, TissueResponse};
use crate::data::grid;
use crate::data::units::Rate;

/// Parameters of the Extended Tofts model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtendedTofts {
    /// Volume transfer constant
    pub ktrans: Rate,
    /// Extravascular extracellular volume fraction
    pub ve: f64,
    /// Plasma volume fraction
    pub vp: f64,
}

impl ExtendedTofts {
    pub fn new(ktrans: Rate, ve: f64, vp: f64) -> Self {
        Self { ktrans, ve, vp }
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        let ktrans = validate::numeric("Ktrans", self.ktrans.value())?;
        let ve = validate::numeric("ve", self.ve)?;
        let vp = validate::numeric("vp", self.vp)?;
        validate::non_negative("Ktrans", ktrans)?;
        validate::fraction("ve", ve)?;
        validate::fraction("vp", vp)?;
        validate::volume_sum(ve, vp)?;
        Ok(())
    }
}

impl TissueResponse for ExtendedTofts {
    fn concentration(
        &self,
        t: &[f64],
        ca: &[f64],
        options: &ModelOptions,
    ) -> Result<Vec<f64>, TissueError> {
        self.validate()?;
        options.validate()?;
        grid::validate(t, ca)?;

        // no exchange: the plasma term is taken as measured, without delay
        if self.ktrans.per_second() <= 0.0 || self.ve <= 0.0 {
            tracing::debug!("extended Tofts without exchange, returning vp·ca");
            return Ok(ca.iter().map(|a| self.vp * a).collect());
        }

        let ca = grid::shift(t, ca, options.arterial_delay);
        let mut ct = extravascular(
            self.ktrans.per_second(),
            self.ve,
            t,
            &ca,
            options.discretization,
        )?;
        for (c, a) in ct.iter_mut().zip(ca.iter()) {
            *c += self.vp * a;
        }
        Ok(ct)
    }
}

/// Extended Tofts model tissue concentrations in mM at the time points `t`
///
/// With `Ktrans = 0` or `ve = 0` only the vascular term `vp·ca` remains; it
/// is computed from `ca` as given, without the arterial delay.
pub fn extended_tofts(
    t: &[f64],
    ca: &[f64],
    ktrans: Rate,
    ve: f64,
    vp: f64,
    options: &ModelOptions,
) -> Result<Vec<f64>, TissueError> {
    ExtendedTofts::new(ktrans, ve, vp).concentration(t, ca, options)
}
