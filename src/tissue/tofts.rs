//! Tofts model (Tofts & Kermode, 1991)
//!
//! A single extravascular extracellular compartment exchanging tracer with
//! plasma. The tissue curve is the arterial input convolved with the impulse
//! response `Ktrans·exp(-kep·t)`, `kep = Ktrans / ve`.

use serde::{Deserialize, Serialize};

use super::discretization::{ConvolutionGrid, Discretization};
use super::error::{ParameterError, TissueError};
use super::{validate, ModelOptions, TissueResponse};
use crate::convolution::exp_conv;
use crate::data::grid::{self, GridError};
use crate::data::units::Rate;

/// Parameters of the Tofts model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tofts {
    /// Volume transfer constant
    pub ktrans: Rate,
    /// Extravascular extracellular volume fraction
    pub ve: f64,
}

impl Tofts {
    pub fn new(ktrans: Rate, ve: f64) -> Self {
        Self { ktrans, ve }
    }

    /// Check parameter kinds, then domains
    pub fn validate(&self) -> Result<(), ParameterError> {
        let ktrans = validate::numeric("Ktrans", self.ktrans.value())?;
        let ve = validate::numeric("ve", self.ve)?;
        validate::non_negative("Ktrans", ktrans)?;
        validate::fraction("ve", ve)?;
        Ok(())
    }
}

impl TissueResponse for Tofts {
    fn concentration(
        &self,
        t: &[f64],
        ca: &[f64],
        options: &ModelOptions,
    ) -> Result<Vec<f64>, TissueError> {
        self.validate()?;
        options.validate()?;
        grid::validate(t, ca)?;

        let ca = grid::shift(t, ca, options.arterial_delay);
        Ok(extravascular(
            self.ktrans.per_second(),
            self.ve,
            t,
            &ca,
            options.discretization,
        )?)
    }
}

/// Tofts model tissue concentrations in mM at the time points `t`
///
/// # Arguments
/// * `t` - Strictly increasing time points in s
/// * `ca` - Arterial plasma concentrations in mM at `t`
/// * `ktrans` - Volume transfer constant
/// * `ve` - Extravascular extracellular volume fraction
/// * `options` - Arterial delay and discretization
///
/// # Example
/// ```rust
/// use perfusion::prelude::*;
///
/// let t = arange(0.0, 360.0, 1.0);
/// let ca = parker(&t, 0.0, 0.0);
/// let ct = tofts(&t, &ca, Rate::PerMinute(0.6), 0.2, &ModelOptions::default()).unwrap();
/// assert_eq!(ct.len(), t.len());
/// ```
pub fn tofts(
    t: &[f64],
    ca: &[f64],
    ktrans: Rate,
    ve: f64,
    options: &ModelOptions,
) -> Result<Vec<f64>, TissueError> {
    Tofts::new(ktrans, ve).concentration(t, ca, options)
}

/// Extravascular concentration for an already delayed input `ca`
///
/// `ktrans` is in 1/s. Without exchange (`ktrans <= 0` or `ve <= 0`) the
/// compartment stays empty.
pub(crate) fn extravascular(
    ktrans: f64,
    ve: f64,
    t: &[f64],
    ca: &[f64],
    discretization: Discretization,
) -> Result<Vec<f64>, GridError> {
    if ktrans <= 0.0 || ve <= 0.0 {
        tracing::debug!(ktrans, ve, "no extravascular exchange");
        return Ok(vec![0.0; t.len()]);
    }

    match discretization {
        Discretization::Exp => {
            let tc = ve / ktrans;
            Ok(exp_conv(tc, t, ca)?.into_iter().map(|c| ve * c).collect())
        }
        Discretization::Conv => {
            let kep = ktrans / ve;
            let grid = ConvolutionGrid::new(t, ca, 1)?;
            let imp: Vec<f64> = grid
                .elapsed()
                .iter()
                .map(|&tau| ktrans * (-kep * tau).exp())
                .collect();
            Ok(grid.convolve(&imp, t))
        }
    }
}
