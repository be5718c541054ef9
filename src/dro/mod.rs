//! Digital reference object (DRO) helpers
//!
//! Voxel-wise forward simulation and parameter fitting over 3D parameter
//! maps, plus the conversion of simulated concentrations into MR signal. Voxels are independent, so every map operation is a parallel map
//! over voxel indices (rayon); concentration volumes are `Array4` with time
//! as the last axis.
//!
//! ```rust
//! use ndarray::Array3;
//! use perfusion::dro::forward_tofts_map;
//! use perfusion::prelude::*;
//!
//! let t = arange(0.0, 120.0, 1.0);
//! let ca = parker(&t, 0.0, 0.0);
//! let ktrans = Array3::from_elem((2, 2, 1), 0.6);
//! let ve = Array3::from_elem((2, 2, 1), 0.2);
//! let ct = forward_tofts_map(&ktrans, &ve, &ca, &t, &ModelOptions::default()).unwrap();
//! assert_eq!(ct.dim(), (2, 2, 1, 120));
//! ```

mod fit;
mod murase;
mod signal;

use ndarray::{s, Array3, Array4, ArrayView1};
use rayon::prelude::*;
use thiserror::Error;

pub use fit::{
    fit_extended_tofts, fit_extended_tofts_map, fit_tofts, fit_tofts_map, ExtendedToftsFit,
    ExtendedToftsMaps, FitOptions, ToftsFit, ToftsMaps,
};
pub use murase::{murase_fit, murase_fit_map, murase_forward, MuraseFit, MuraseMaps};
pub use signal::{
    concentration_to_signal, median_filter_3x3, r10_map_with_reference, relaxation_maps,
    signal_enhancement, Enhancement, RelaxationMaps, Relaxivity, SignalScale, SpgrSequence,
    SyntheticSignal,
};

use crate::data::units::Rate;
use crate::tissue::{
    ExtendedTofts, ModelOptions, TissueError, TissueModel, TissueResponse, Tofts,
};

/// Errors from voxel-wise operations
#[derive(Error, Debug)]
pub enum DroError {
    /// Parameter maps or volumes do not line up
    #[error("Shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// A voxel's tissue model failed to evaluate
    #[error(transparent)]
    Tissue(#[from] TissueError),

    /// The optimizer did not produce a result
    #[error("Optimization failed: {0}")]
    Optimizer(String),

    /// The linear least-squares system could not be solved
    #[error("Least-squares solve failed: {0}")]
    Solve(String),

    /// A signal scale factor that is zero, negative or not finite
    #[error("Signal scale must be finite and positive, got {0}")]
    InvalidScale(f64),

    /// The baseline window does not fit in the acquisition
    #[error("Baseline of {points} frames requested from {frames} frames")]
    BaselinePoints { points: usize, frames: usize },
}

pub(crate) type Voxel = (usize, usize, usize);

/// Fail unless the shape `found` equals `expected`
pub(crate) fn check_shape(expected: &[usize], found: &[usize]) -> Result<(), DroError> {
    if expected != found {
        return Err(DroError::ShapeMismatch {
            expected: expected.to_vec(),
            found: found.to_vec(),
        });
    }
    Ok(())
}

/// All voxel indices of a volume of shape `dim`, in logical order
pub(crate) fn voxels(dim: Voxel) -> Vec<Voxel> {
    ndarray::indices(dim).into_iter().collect()
}

/// Simulate one tissue curve per voxel, in parallel
fn forward_map<F>(
    dim: Voxel,
    ca: &[f64],
    t: &[f64],
    options: &ModelOptions,
    model_at: F,
) -> Result<Array4<f64>, DroError>
where
    F: Fn(Voxel) -> TissueModel + Sync,
{
    let indices = voxels(dim);
    let curves = indices
        .par_iter()
        .map(|&voxel| model_at(voxel).concentration(t, ca, options))
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = Array4::zeros((dim.0, dim.1, dim.2, t.len()));
    for ((i, j, k), curve) in indices.into_iter().zip(curves) {
        out.slice_mut(s![i, j, k, ..])
            .assign(&ArrayView1::from(curve.as_slice()));
    }
    Ok(out)
}

/// Tofts tissue curves for maps of `Ktrans` (1/min) and `ve`
pub fn forward_tofts_map(
    ktrans: &Array3<f64>,
    ve: &Array3<f64>,
    ca: &[f64],
    t: &[f64],
    options: &ModelOptions,
) -> Result<Array4<f64>, DroError> {
    check_shape(ktrans.shape(), ve.shape())?;
    forward_map(ktrans.dim(), ca, t, options, |v| {
        Tofts::new(Rate::PerMinute(ktrans[v]), ve[v]).into()
    })
}

/// Extended Tofts tissue curves for maps of `Ktrans` (1/min), `ve` and `vp`
pub fn forward_extended_tofts_map(
    ktrans: &Array3<f64>,
    ve: &Array3<f64>,
    vp: &Array3<f64>,
    ca: &[f64],
    t: &[f64],
    options: &ModelOptions,
) -> Result<Array4<f64>, DroError> {
    check_shape(ktrans.shape(), ve.shape())?;
    check_shape(ktrans.shape(), vp.shape())?;
    forward_map(ktrans.dim(), ca, t, options, |v| {
        ExtendedTofts::new(Rate::PerMinute(ktrans[v]), ve[v], vp[v]).into()
    })
}
