use argmin::{
    core::{CostFunction, Error, Executor},
    solver::neldermead::NelderMead,
};
use ndarray::{s, Array3, Array4};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{check_shape, voxels, DroError};
use crate::data::units::Rate;
use crate::tissue::{ExtendedTofts, ModelOptions, TissueModel, TissueResponse, Tofts};

/// Cost returned for parameters outside the model's domain
const PENALTY: f64 = 1e12;

/// Nelder–Mead settings for least-squares curve fitting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    /// Maximum number of simplex iterations (default: 2000)
    pub max_iters: u64,
    /// Stop once the standard deviation of the simplex costs drops below this
    pub sd_tolerance: f64,
    /// Relative size of the initial simplex around the starting point
    pub simplex_scale: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iters: 2000,
            sd_tolerance: 1e-14,
            simplex_scale: 0.25,
        }
    }
}

impl FitOptions {
    pub fn with_max_iters(mut self, max_iters: u64) -> Self {
        self.max_iters = max_iters;
        self
    }

    pub fn with_sd_tolerance(mut self, sd_tolerance: f64) -> Self {
        self.sd_tolerance = sd_tolerance;
        self
    }
}

/// Best-fit Tofts parameters for one curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToftsFit {
    /// 1/min
    pub ktrans: f64,
    pub ve: f64,
    /// Sum of squared residuals at the optimum
    pub sse: f64,
}

/// Best-fit Extended Tofts parameters for one curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtendedToftsFit {
    /// 1/min
    pub ktrans: f64,
    pub ve: f64,
    pub vp: f64,
    /// Sum of squared residuals at the optimum
    pub sse: f64,
}

/// Fitted Tofts parameter maps
#[derive(Debug, Clone)]
pub struct ToftsMaps {
    pub ktrans: Array3<f64>,
    pub ve: Array3<f64>,
}

/// Fitted Extended Tofts parameter maps
#[derive(Debug, Clone)]
pub struct ExtendedToftsMaps {
    pub ktrans: Array3<f64>,
    pub ve: Array3<f64>,
    pub vp: Array3<f64>,
}

/// Least-squares mismatch between a model curve and a measured one
struct CurveFit<'a, F: Fn(&[f64]) -> TissueModel> {
    t: &'a [f64],
    ca: &'a [f64],
    ct: &'a [f64],
    options: &'a ModelOptions,
    model: F,
}

impl<F: Fn(&[f64]) -> TissueModel> CostFunction for CurveFit<'_, F> {
    type Param = Vec<f64>;
    type Output = f64;
    fn cost(&self, p: &Self::Param) -> Result<Self::Output, Error> {
        let model = (self.model)(p.as_slice());
        if model.validate().is_err() {
            return Ok(PENALTY);
        }
        let sse = match model.concentration(self.t, self.ca, self.options) {
            Ok(curve) => curve
                .iter()
                .zip(self.ct.iter())
                .map(|(m, c)| (m - c) * (m - c))
                .sum(),
            Err(_) => PENALTY,
        };
        Ok(sse)
    }
}

impl<F: Fn(&[f64]) -> TissueModel> CurveFit<'_, F> {
    fn optimize(self, start: Vec<f64>, fit: &FitOptions) -> Result<(Vec<f64>, f64), DroError> {
        let n = self.t.len();
        check_shape(&[n, n], &[self.ca.len(), self.ct.len()])?;

        let simplex = create_initial_simplex(&start, fit.simplex_scale);
        let solver: NelderMead<Vec<f64>, f64> = NelderMead::new(simplex)
            .with_sd_tolerance(fit.sd_tolerance)
            .map_err(|e| DroError::Optimizer(e.to_string()))?;
        let res = Executor::new(self, solver)
            .configure(|state| state.max_iters(fit.max_iters))
            .run()
            .map_err(|e| DroError::Optimizer(e.to_string()))?;
        let cost = res.state.best_cost;
        let best = res
            .state
            .best_param
            .ok_or_else(|| DroError::Optimizer("no parameters evaluated".to_string()))?;
        tracing::debug!(cost, iters = res.state.iter, "curve fit finished");
        Ok((best, cost))
    }
}

fn create_initial_simplex(initial_point: &[f64], scale: f64) -> Vec<Vec<f64>> {
    let mut vertices = Vec::with_capacity(initial_point.len() + 1);
    vertices.push(initial_point.to_vec());

    for i in 0..initial_point.len() {
        let perturbation = if initial_point[i] == 0.0 {
            0.05
        } else {
            scale * initial_point[i]
        };

        let mut perturbed_point = initial_point.to_owned();
        perturbed_point[i] += perturbation;
        vertices.push(perturbed_point);
    }

    vertices
}

/// Fit the Tofts model to a tissue curve `ct`
///
/// The arterial delay and discretization in `options` are held fixed.
pub fn fit_tofts(
    t: &[f64],
    ca: &[f64],
    ct: &[f64],
    options: &ModelOptions,
    fit: &FitOptions,
) -> Result<ToftsFit, DroError> {
    let problem = CurveFit {
        t,
        ca,
        ct,
        options,
        model: |p: &[f64]| TissueModel::from(Tofts::new(Rate::PerMinute(p[0]), p[1])),
    };
    let (best, sse) = problem.optimize(vec![0.3, 0.3], fit)?;
    Ok(ToftsFit {
        ktrans: best[0],
        ve: best[1],
        sse,
    })
}

/// Fit the Extended Tofts model to a tissue curve `ct`
pub fn fit_extended_tofts(
    t: &[f64],
    ca: &[f64],
    ct: &[f64],
    options: &ModelOptions,
    fit: &FitOptions,
) -> Result<ExtendedToftsFit, DroError> {
    let problem = CurveFit {
        t,
        ca,
        ct,
        options,
        model: |p: &[f64]| {
            TissueModel::from(ExtendedTofts::new(Rate::PerMinute(p[0]), p[1], p[2]))
        },
    };
    let (best, sse) = problem.optimize(vec![0.3, 0.3, 0.05], fit)?;
    Ok(ExtendedToftsFit {
        ktrans: best[0],
        ve: best[1],
        vp: best[2],
        sse,
    })
}

/// Fit every voxel of `ct` to the Tofts model, in parallel
pub fn fit_tofts_map(
    ct: &Array4<f64>,
    ca: &[f64],
    t: &[f64],
    options: &ModelOptions,
    fit: &FitOptions,
) -> Result<ToftsMaps, DroError> {
    let (nx, ny, nz, nt) = ct.dim();
    check_shape(&[nt], &[t.len()])?;

    let indices = voxels((nx, ny, nz));
    let fits = indices
        .par_iter()
        .map(|&(i, j, k)| {
            let curve = ct.slice(s![i, j, k, ..]).to_vec();
            fit_tofts(t, ca, &curve, options, fit)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut maps = ToftsMaps {
        ktrans: Array3::zeros((nx, ny, nz)),
        ve: Array3::zeros((nx, ny, nz)),
    };
    for (voxel, result) in indices.into_iter().zip(fits) {
        maps.ktrans[voxel] = result.ktrans;
        maps.ve[voxel] = result.ve;
    }
    Ok(maps)
}

/// Fit every voxel of `ct` to the Extended Tofts model, in parallel
pub fn fit_extended_tofts_map(
    ct: &Array4<f64>,
    ca: &[f64],
    t: &[f64],
    options: &ModelOptions,
    fit: &FitOptions,
) -> Result<ExtendedToftsMaps, DroError> {
    let (nx, ny, nz, nt) = ct.dim();
    check_shape(&[nt], &[t.len()])?;

    let indices = voxels((nx, ny, nz));
    let fits = indices
        .par_iter()
        .map(|&(i, j, k)| {
            let curve = ct.slice(s![i, j, k, ..]).to_vec();
            fit_extended_tofts(t, ca, &curve, options, fit)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut maps = ExtendedToftsMaps {
        ktrans: Array3::zeros((nx, ny, nz)),
        ve: Array3::zeros((nx, ny, nz)),
        vp: Array3::zeros((nx, ny, nz)),
    };
    for (voxel, result) in indices.into_iter().zip(fits) {
        maps.ktrans[voxel] = result.ktrans;
        maps.ve[voxel] = result.ve;
        maps.vp[voxel] = result.vp;
    }
    Ok(maps)
}
