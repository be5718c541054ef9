//! MR signal models and signal-to-concentration conversion
//!
//! Closed-form, element-wise relations between the magnitude signal `S`, the
//! longitudinal relaxation rate `R1` and the indicator concentration `C`,
//! assuming fast water exchange between compartments.
//!
//! ```rust
//! use perfusion::signal::{r1_to_c_linear_relaxivity, s_to_r1_spgr, signal_spgr};
//!
//! let (tr, flip, s0, r10) = (0.005, 15.0, 100.0, 1.0);
//! let r1 = [1.0, 1.5, 2.0];
//! let s: Vec<f64> = r1.iter().map(|&r| signal_spgr(r, s0, tr, flip)).collect();
//! let recovered = s_to_r1_spgr(&s, s[0], r10, tr, flip);
//! let c = r1_to_c_linear_relaxivity(&recovered, r10, 5.0).unwrap();
//! assert!((c[2] - 0.2).abs() < 1e-9);
//! ```

use thiserror::Error;

/// Errors from signal conversions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    /// The relaxivity must not be negative
    #[error("r1 must be positive, got {0}")]
    NegativeRelaxivity(f64),
}

/// Signal proportional to `R1`
pub fn signal_linear(r1: f64, k: f64) -> f64 {
    k * r1
}

/// Steady-state spoiled gradient echo (SPGR) signal
///
/// # Arguments
/// * `r1` - Longitudinal relaxation rate in 1/s
/// * `s0` - Fully relaxed signal in arbitrary units
/// * `tr` - Repetition time in s
/// * `flip` - Prescribed flip angle in degrees
pub fn signal_spgr(r1: f64, s0: f64, tr: f64, flip: f64) -> f64 {
    let a = flip.to_radians();
    let e = (-tr * r1).exp();
    s0 * ((1.0 - e) * a.sin()) / (1.0 - e * a.cos())
}

/// SPGR signal with `T2*` decay over the echo time `te`
///
/// `signal_spgr(r1, s0, tr, flip) · exp(-te·R2*)`, all times in s.
pub fn signal_spgr_t2star(r1: f64, r2_star: f64, s0: f64, tr: f64, te: f64, flip: f64) -> f64 {
    signal_spgr(r1, s0, tr, flip) * (-te * r2_star).exp()
}

/// Native `R1` of a voxel from its pre-contrast SPGR signal `s0`, normalised
/// to a reference tissue with signal `s0_ref` and known relaxation time
/// `t1_ref` (s)
///
/// The reference fixes the fully relaxed signal, which is taken to be the
/// same for the voxel. `flip` is in degrees.
pub fn r10_from_reference(s0: f64, s0_ref: f64, tr: f64, flip: f64, t1_ref: f64) -> f64 {
    let cos_a = flip.to_radians().cos();
    let e_ref = (-tr / t1_ref).exp();
    // fully relaxed signal times sin(flip)
    let m = s0_ref * (1.0 - cos_a * e_ref) / (1.0 - e_ref);
    ((s0 - m) / (s0 * cos_a - m)).ln() * (-1.0 / tr)
}

/// Relaxation rates `R = R0 + r·C` for concentrations `c`
///
/// Applies to `R1` with the longitudinal relaxivity and to `R2*` with the
/// transverse one.
pub fn c_to_r_linear_relaxivity(c: &[f64], r0: f64, relaxivity: f64) -> Vec<f64> {
    c.iter().map(|&ci| r0 + relaxivity * ci).collect()
}

/// Invert the SPGR equation for `R1`
///
/// The fully relaxed signal is estimated from the pre-contrast signal
/// `s_baseline` and native relaxation rate `r10`.
pub fn s_to_r1_spgr(s: &[f64], s_baseline: f64, r10: f64, tr: f64, flip: f64) -> Vec<f64> {
    let a = flip.to_radians();
    let (sin_a, cos_a) = a.sin_cos();
    let e0 = (-tr * r10).exp();
    let s0 = s_baseline * (1.0 - cos_a * e0) / (sin_a * (1.0 - e0));

    s.iter()
        .map(|&si| (((s0 * sin_a) - si) / (s0 * sin_a - si * cos_a)).ln() * (-1.0 / tr))
        .collect()
}

/// Concentration from `R1` assuming `R1 = R10 + r1·C`
///
/// # Arguments
/// * `r1` - Longitudinal relaxation rates in 1/s
/// * `r10` - Native relaxation rate in 1/s
/// * `relaxivity` - Longitudinal relaxivity in 1/s/mM
pub fn r1_to_c_linear_relaxivity(
    r1: &[f64],
    r10: f64,
    relaxivity: f64,
) -> Result<Vec<f64>, SignalError> {
    if !(relaxivity >= 0.0) {
        return Err(SignalError::NegativeRelaxivity(relaxivity));
    }
    Ok(r1.iter().map(|&r| (r - r10) / relaxivity).collect())
}

/// Concentration from SPGR signal, through `R1`
pub fn s_to_c_via_r1_spgr(
    s: &[f64],
    s_baseline: f64,
    r10: f64,
    tr: f64,
    flip: f64,
    relaxivity: f64,
) -> Result<Vec<f64>, SignalError> {
    let r1 = s_to_r1_spgr(s, s_baseline, r10, tr, flip);
    r1_to_c_linear_relaxivity(&r1, r10, relaxivity)
}
