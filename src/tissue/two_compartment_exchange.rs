//! Two-Compartment Exchange Model (2CXM)
//!
//! Plasma and extravascular extracellular space are separate, well-mixed
//! compartments that exchange tracer bidirectionally with permeability
//! surface-area product `PS`, while plasma flow `Fp` brings tracer in and
//! washes it out. The linear system has two decay rates `σ₊ > σ₋ > 0`, the
//! roots of `tc·te·σ² - (T + te)·σ + 1 = 0` with
//!
//! - `T = (ve + vp) / Fp`, the total mean transit time
//! - `tc = vp / Fp`, the plasma mean transit time
//! - `te = ve / PS`, the extravascular mean transit time
//!
//! Each compartment's impulse response is a weighted difference of
//! `exp(-σ₊τ)` and `exp(-σ₋τ)`.

use serde::{Deserialize, Serialize};

use super::discretization::ConvolutionGrid;
use super::error::{ParameterError, TissueError};
use super::tofts::Tofts;
use super::{validate, ModelOptions, TissueResponse};
use crate::data::grid;
use crate::data::units::{Flow, Rate};

/// Parameters of the Two-Compartment Exchange Model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TwoCompartmentExchange {
    /// Plasma flow
    pub fp: Flow,
    /// Permeability surface-area product
    pub ps: Flow,
    /// Extravascular extracellular volume fraction
    pub ve: f64,
    /// Plasma volume fraction
    pub vp: f64,
    /// Refinement of the convolution grid relative to the smallest time step
    #[serde(default = "default_upsample_factor")]
    pub upsample_factor: usize,
}

fn default_upsample_factor() -> usize {
    1
}

/// Tissue concentration split by compartment, in mM
#[derive(Debug, Clone, PartialEq)]
pub struct Compartments {
    /// Tracer in the tissue's plasma volume
    pub plasma: Vec<f64>,
    /// Tracer in the extravascular extracellular space
    pub extravascular: Vec<f64>,
}

impl Compartments {
    /// Total tissue concentration `Cp + Ce`
    pub fn total(&self) -> Vec<f64> {
        self.plasma
            .iter()
            .zip(self.extravascular.iter())
            .map(|(p, e)| p + e)
            .collect()
    }
}

/// Rate constants of the two exponentials, in 1/s
#[derive(Debug, Clone, Copy, PartialEq)]
struct Eigenvalues {
    fast: f64,
    slow: f64,
}

impl Eigenvalues {
    fn new(t: f64, tc: f64, te: f64) -> Self {
        let b = t + te;
        let discriminant = (b * b - 4.0 * tc * te).max(0.0);
        let fast = (b + discriminant.sqrt()) / (2.0 * tc * te);
        // Product of the roots is 1 / (tc·te); avoids cancellation in b - √d
        let slow = 1.0 / (tc * te * fast);
        Self { fast, slow }
    }

    /// `(exp(-slow·τ) - exp(-fast·τ)) / (fast - slow)`, continuous as the
    /// eigenvalues coincide
    fn difference_quotient(&self, tau: f64) -> f64 {
        let gap = self.fast - self.slow;
        if gap <= f64::EPSILON * self.fast {
            tau * (-self.slow * tau).exp()
        } else {
            -(-self.slow * tau).exp() * (-gap * tau).exp_m1() / gap
        }
    }
}

impl TwoCompartmentExchange {
    /// Flows `fp` and `ps`, fractions `ve` and `vp`
    pub fn new(fp: Flow, ps: Flow, ve: f64, vp: f64) -> Self {
        Self {
            fp,
            ps,
            ve,
            vp,
            upsample_factor: 1,
        }
    }

    /// Convolve on a grid `factor` times finer than the smallest time step
    pub fn with_upsample_factor(mut self, factor: usize) -> Self {
        self.upsample_factor = factor.max(1);
        self
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        let fp = validate::numeric("Fp", self.fp.value())?;
        let ps = validate::numeric("PS", self.ps.value())?;
        let ve = validate::numeric("ve", self.ve)?;
        let vp = validate::numeric("vp", self.vp)?;
        validate::positive("Fp", fp)?;
        validate::non_negative("PS", ps)?;
        validate::fraction("ve", ve)?;
        validate::fraction("vp", vp)?;
        validate::volume_sum(ve, vp)?;
        Ok(())
    }

    /// Tofts-equivalent volume transfer constant `Fp·(1 - exp(-PS/Fp))`
    ///
    /// The flow weighted by the extraction fraction of a single capillary
    /// pass. The flow's value in mL/min/100 mL is carried over as `Ktrans`
    /// in 1/min, the convention under which the model reduces to Tofts once
    /// `vp` vanishes.
    pub fn ktrans(&self) -> Rate {
        let fp = self.fp.ml100_per_minute();
        let ps = self.ps.ml100_per_minute();
        Rate::PerMinute(fp * -(-ps / fp).exp_m1())
    }

    /// Plasma and extravascular tissue concentrations at the time points `t`
    ///
    /// The discretization in `options` only applies when `vp == 0` and the
    /// model reduces to Tofts; the exchange model itself always uses
    /// discrete convolution.
    pub fn compartments(
        &self,
        t: &[f64],
        ca: &[f64],
        options: &ModelOptions,
    ) -> Result<Compartments, TissueError> {
        self.validate()?;
        options.validate()?;
        grid::validate(t, ca)?;

        if self.vp == 0.0 {
            tracing::debug!(
                ktrans = self.ktrans().per_minute(),
                "no plasma compartment, reducing to Tofts"
            );
            let extravascular = Tofts::new(self.ktrans(), self.ve).concentration(t, ca, options)?;
            return Ok(Compartments {
                plasma: vec![0.0; t.len()],
                extravascular,
            });
        }

        let ca = grid::shift(t, ca, options.arterial_delay);
        let grid = ConvolutionGrid::new(t, &ca, self.upsample_factor)?;
        let (irf_cp, irf_ce) = self.impulse_responses(grid.elapsed());

        let plasma = grid.convolve(&irf_cp, t);
        let extravascular = match irf_ce {
            Some(irf_ce) => grid.convolve(&irf_ce, t),
            None => vec![0.0; t.len()],
        };
        Ok(Compartments {
            plasma,
            extravascular,
        })
    }

    /// Impulse responses of the plasma and extravascular compartments at
    /// lags `tau`, first sample halved for the trapezoidal start
    ///
    /// Without exchange (`PS == 0` or `ve == 0`) only the plasma compartment
    /// responds, as a single exponential washout with mean transit time `tc`.
    fn impulse_responses(&self, tau: &[f64]) -> (Vec<f64>, Option<Vec<f64>>) {
        let fp = self.fp.per_second();
        let ps = self.ps.per_second();
        let (ve, vp) = (self.ve, self.vp);
        let tc = vp / fp;

        if ps <= 0.0 || ve <= 0.0 {
            tracing::debug!(ps, ve, "no exchange with the extravascular space");
            let mut irf_cp: Vec<f64> = tau.iter().map(|&s| fp * (-s / tc).exp()).collect();
            halve_first(&mut irf_cp);
            return (irf_cp, None);
        }

        let te = ve / ps;
        let sigma = Eigenvalues::new((ve + vp) / fp, tc, te);
        let gain = sigma.fast * sigma.slow;

        let mut irf_cp = Vec::with_capacity(tau.len());
        let mut irf_ce = Vec::with_capacity(tau.len());
        for &s in tau {
            let q = sigma.difference_quotient(s);
            irf_cp.push(vp * gain * (q * (1.0 - te * sigma.slow) + te * (-sigma.fast * s).exp()));
            irf_ce.push(ve * gain * q);
        }
        halve_first(&mut irf_cp);
        halve_first(&mut irf_ce);
        (irf_cp, Some(irf_ce))
    }
}

#[inline]
fn halve_first(irf: &mut [f64]) {
    if let Some(first) = irf.first_mut() {
        *first /= 2.0;
    }
}

impl TissueResponse for TwoCompartmentExchange {
    fn concentration(
        &self,
        t: &[f64],
        ca: &[f64],
        options: &ModelOptions,
    ) -> Result<Vec<f64>, TissueError> {
        Ok(self.compartments(t, ca, options)?.total())
    }
}

/// Two-Compartment Exchange Model tissue concentrations in mM at `t`
///
/// # Arguments
/// * `t` - Strictly increasing time points in s
/// * `ca` - Arterial plasma concentrations in mM at `t`
/// * `fp` - Plasma flow
/// * `ps` - Permeability surface-area product
/// * `ve` - Extravascular extracellular volume fraction
/// * `vp` - Plasma volume fraction
/// * `options` - Arterial delay (and discretization for the `vp == 0` case)
pub fn two_compartment_exchange_model(
    t: &[f64],
    ca: &[f64],
    fp: Flow,
    ps: Flow,
    ve: f64,
    vp: f64,
    options: &ModelOptions,
) -> Result<Vec<f64>, TissueError> {
    TwoCompartmentExchange::new(fp, ps, ve, vp).concentration(t, ca, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aif::parker;
    use crate::data::auc::trapezoid;
    use crate::data::grid::arange;
    use approx::assert_relative_eq;

    fn model(fp: f64, ps: f64, ve: f64, vp: f64) -> TwoCompartmentExchange {
        TwoCompartmentExchange::new(Flow::Ml100PerMinute(fp), Flow::Ml100PerMinute(ps), ve, vp)
    }

    #[test]
    fn test_eigenvalues_solve_characteristic_equation() {
        let (t, tc, te) = (300.0, 120.0, 80.0);
        let sigma = Eigenvalues::new(t, tc, te);
        for s in [sigma.fast, sigma.slow] {
            assert_relative_eq!(tc * te * s * s - (t + te) * s + 1.0, 0.0, epsilon = 1e-12);
        }
        assert!(sigma.fast > sigma.slow && sigma.slow > 0.0);
    }

    #[test]
    fn test_difference_quotient_limit() {
        let equal = Eigenvalues {
            fast: 0.1,
            slow: 0.1,
        };
        let close = Eigenvalues {
            fast: 0.1 + 1e-9,
            slow: 0.1,
        };
        // exact in floating point, the two values are within a factor of two
        let gap = close.fast - close.slow;
        for tau in [0.0_f64, 1.0, 10.0, 50.0] {
            let limit = tau * (-0.1 * tau).exp();
            assert_eq!(equal.difference_quotient(tau), limit);
            // second-order expansion of expm1 in gap·τ
            assert_relative_eq!(
                close.difference_quotient(tau),
                limit * (1.0 - 0.5 * gap * tau),
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn test_impulse_response_starts_at_flow() {
        let m = model(30.0, 10.0, 0.2, 0.1);
        let tau = [0.0, 1.0, 2.0];
        let (cp, ce) = m.impulse_responses(&tau);
        let ce = ce.unwrap();
        // Tracer enters the plasma at rate Fp, halved for the first sample
        assert_relative_eq!(cp[0], 0.5 * 30.0 / 6000.0, epsilon = 1e-15);
        assert_eq!(ce[0], 0.0);
        assert!(ce[1] > 0.0);
    }

    #[test]
    fn test_impulse_response_areas_are_volumes() {
        let m = model(30.0, 10.0, 0.2, 0.1);
        let tau = arange(0.0, 20000.0, 0.5);
        let (cp, ce) = m.impulse_responses(&tau);
        let ce = ce.unwrap();
        let sum = |x: &[f64]| x.iter().sum::<f64>() * 0.5;
        assert_relative_eq!(sum(&cp), 0.1, epsilon = 1e-3);
        assert_relative_eq!(sum(&ce), 0.2, epsilon = 1e-3);
    }

    #[test]
    fn test_zero_vp_reduces_to_tofts() {
        let t = arange(0.0, 360.0, 1.0);
        let ca = parker(&t, 0.0, 0.0);
        let opts = ModelOptions::default();
        let m = model(10.0, 5.0, 0.2, 0.0);
        let expected = 10.0 * (1.0 - (-0.5_f64).exp());
        assert_relative_eq!(m.ktrans().per_minute(), expected, epsilon = 1e-12);

        let ct = m.concentration(&t, &ca, &opts).unwrap();
        let reference = Tofts::new(Rate::PerMinute(expected), 0.2)
            .concentration(&t, &ca, &opts)
            .unwrap();
        assert_eq!(ct, reference);
    }

    #[test]
    fn test_no_exchange_keeps_extravascular_empty() {
        let t = arange(0.0, 200.0, 1.0);
        let ca = parker(&t, 0.0, 0.0);
        let opts = ModelOptions::default();
        let parts = model(20.0, 0.0, 0.2, 0.1)
            .compartments(&t, &ca, &opts)
            .unwrap();
        assert!(parts.extravascular.iter().all(|&c| c == 0.0));
        assert!(parts.plasma.iter().any(|&c| c > 0.0));
    }

    #[test]
    fn test_upsampling_is_consistent() {
        let t = arange(0.0, 300.0, 2.0);
        let ca = parker(&t, 0.0, 0.0);
        let opts = ModelOptions::default();
        let coarse = model(10.0, 5.0, 0.2, 0.3)
            .concentration(&t, &ca, &opts)
            .unwrap();
        let fine = model(10.0, 5.0, 0.2, 0.3)
            .with_upsample_factor(4)
            .concentration(&t, &ca, &opts)
            .unwrap();
        let scale = trapezoid(&t, &coarse).unwrap();
        assert_relative_eq!(trapezoid(&t, &fine).unwrap(), scale, max_relative = 0.05);
    }
}
