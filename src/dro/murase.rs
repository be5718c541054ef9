use nalgebra::{DMatrix, DVector};
use ndarray::{s, Array3, Array4};
use rayon::prelude::*;

use super::{check_shape, voxels, DroError};
use crate::data::auc::cumulative_trapezoid_uniform;

/// Linearised Extended Tofts parameters
///
/// `k1` is the volume transfer constant and `k2` the efflux rate constant,
/// both in the inverse of the time unit of `dt`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MuraseFit {
    pub k1: f64,
    pub k2: f64,
    pub vp: f64,
}

#[derive(Debug, Clone)]
pub struct MuraseMaps {
    pub k1: Array3<f64>,
    pub k2: Array3<f64>,
    pub vp: Array3<f64>,
}

/// Linear least-squares Extended Tofts fit of one tissue curve
///
/// Solves `Ct = B1·∫Cp - k2·∫Ct + vp·Cp` for `(B1, k2, vp)` with the
/// integrals taken as cumulative trapezoids on the uniform step `dt`, then
/// recovers `K1 = B1 - k2·vp`.
pub fn murase_fit(cp: &[f64], ctiss: &[f64], dt: f64) -> Result<MuraseFit, DroError> {
    check_shape(&[cp.len()], &[ctiss.len()])?;

    let int_cp = cumulative_trapezoid_uniform(cp, dt);
    let int_ct = cumulative_trapezoid_uniform(ctiss, dt);
    let a = DMatrix::from_fn(cp.len(), 3, |row, col| match col {
        0 => int_cp[row],
        1 => -int_ct[row],
        _ => cp[row],
    });
    let c = DVector::from_column_slice(ctiss);

    let b = a
        .svd(true, true)
        .solve(&c, f64::EPSILON)
        .map_err(|e| DroError::Solve(e.to_string()))?;
    let (b1, k2, vp) = (b[0], b[1], b[2]);
    Ok(MuraseFit {
        k1: b1 - k2 * vp,
        k2,
        vp,
    })
}

/// [`murase_fit`] on every voxel of `ct` (time on the last axis), in parallel
pub fn murase_fit_map(cp: &[f64], ct: &Array4<f64>, dt: f64) -> Result<MuraseMaps, DroError> {
    let (nx, ny, nz, nt) = ct.dim();
    check_shape(&[cp.len()], &[nt])?;

    let indices = voxels((nx, ny, nz));
    let fits = indices
        .par_iter()
        .map(|&(i, j, k)| {
            let curve = ct.slice(s![i, j, k, ..]).to_vec();
            murase_fit(cp, &curve, dt)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut maps = MuraseMaps {
        k1: Array3::zeros((nx, ny, nz)),
        k2: Array3::zeros((nx, ny, nz)),
        vp: Array3::zeros((nx, ny, nz)),
    };
    for (voxel, fit) in indices.into_iter().zip(fits) {
        maps.k1[voxel] = fit.k1;
        maps.k2[voxel] = fit.k2;
        maps.vp[voxel] = fit.vp;
    }
    Ok(maps)
}

/// Tissue curve generated from the linearised Extended Tofts relation
///
/// Steps forward in time; the tissue integral at step `k` uses the samples
/// before `k` with the current sample taken as zero. `Ct[0]` is zero.
pub fn murase_forward(k1: f64, k2: f64, vp: f64, cp: &[f64], dt: f64) -> Vec<f64> {
    let b1 = k1 + k2 * vp;
    let int_cp = cumulative_trapezoid_uniform(cp, dt);

    let mut ct = vec![0.0; cp.len()];
    // running trapezoid of ct over [0, t_{k-1}]
    let mut int_ct = 0.0;
    for k in 1..cp.len() {
        let partial = int_ct + 0.5 * dt * ct[k - 1];
        ct[k] = b1 * int_cp[k] - k2 * partial + vp * cp[k];
        int_ct += 0.5 * dt * (ct[k - 1] + ct[k]);
    }
    ct
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aif::parker;
    use crate::data::grid::arange;
    use crate::data::units::Rate;
    use crate::tissue::{extended_tofts, Discretization, ModelOptions};
    use approx::assert_relative_eq;

    #[test]
    fn test_recovers_extended_tofts_parameters() {
        let dt = 0.5;
        let t = arange(0.0, 360.0, dt);
        let cp = parker(&t, 10.0, 0.0);
        let options = ModelOptions::default()
            .with_arterial_delay(0.0)
            .with_discretization(Discretization::Exp);
        // Ktrans 0.6/min = 0.01/s, kep = 0.01 / 0.2 = 0.05/s
        let ct = extended_tofts(&t, &cp, Rate::PerMinute(0.6), 0.2, 0.1, &options).unwrap();

        let fit = murase_fit(&cp, &ct, dt).unwrap();
        assert_relative_eq!(fit.k1, 0.01, max_relative = 0.05);
        assert_relative_eq!(fit.k2, 0.05, max_relative = 0.05);
        assert_relative_eq!(fit.vp, 0.1, max_relative = 0.05);
    }

    #[test]
    fn test_forward_plasma_only() {
        let cp = parker(&arange(0.0, 60.0, 1.0), 5.0, 0.0);
        let ct = murase_forward(0.0, 0.0, 0.2, &cp, 1.0);
        assert_eq!(ct[0], 0.0);
        for k in 1..cp.len() {
            assert_relative_eq!(ct[k], 0.2 * cp[k], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_forward_then_fit() {
        let dt = 1.0;
        let cp = parker(&arange(0.0, 300.0, dt), 10.0, 0.0);
        let ct = murase_forward(0.01, 0.04, 0.05, &cp, dt);
        let fit = murase_fit(&cp, &ct, dt).unwrap();
        assert_relative_eq!(fit.vp, 0.05, max_relative = 0.1);
        assert_relative_eq!(fit.k2, 0.04, max_relative = 0.1);
    }

    #[test]
    fn test_length_mismatch() {
        let err = murase_fit(&[0.0; 10], &[0.0; 9], 1.0).unwrap_err();
        assert!(matches!(err, DroError::ShapeMismatch { .. }));
    }
}
