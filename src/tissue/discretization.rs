//! Discretization of the convolution integral on arbitrary time grids

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::ParameterError;
use crate::convolution::convolve_truncated;
use crate::data::grid::{self, GridError, UniformGrid};

/// How the convolution of input curve and impulse response is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Discretization {
    /// Discrete convolution on a uniform grid
    #[default]
    Conv,
    /// Exact exponential convolution of a piecewise linear input
    Exp,
}

impl FromStr for Discretization {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conv" => Ok(Discretization::Conv),
            "exp" => Ok(Discretization::Exp),
            other => Err(ParameterError::UnknownDiscretization(other.to_string())),
        }
    }
}

impl fmt::Display for Discretization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discretization::Conv => write!(f, "conv"),
            Discretization::Exp => write!(f, "exp"),
        }
    }
}

/// An input curve laid out on a uniform grid, ready for discrete convolution
///
/// Uniformly sampled inputs are used as they are. Otherwise the input is
/// resampled at the smallest observed step (refined by `factor`), and every
/// convolution result is interpolated back onto the original time points.
#[derive(Debug, Clone)]
pub(crate) struct ConvolutionGrid {
    resampled: Option<UniformGrid>,
    elapsed: Vec<f64>,
    step: f64,
    input: Vec<f64>,
}

impl ConvolutionGrid {
    pub(crate) fn new(t: &[f64], ca: &[f64], factor: usize) -> Result<Self, GridError> {
        let uniform = grid::is_uniform(t);
        if uniform && factor <= 1 {
            let start = t[0];
            return Ok(Self {
                resampled: None,
                elapsed: t.iter().map(|&ti| ti - start).collect(),
                step: t[1] - t[0],
                input: ca.to_vec(),
            });
        }

        let target = UniformGrid::new(t, factor)?;
        if uniform {
            tracing::debug!(
                factor,
                samples = target.len(),
                "upsampling time grid for convolution"
            );
        } else {
            tracing::warn!(
                step = target.step(),
                samples = target.len(),
                "non-uniform time grid detected, resampling to uniform spacing"
            );
        }
        Ok(Self {
            elapsed: target.elapsed(),
            step: target.step(),
            input: target.resample(t, ca),
            resampled: Some(target),
        })
    }

    /// Time since the first grid point, at which impulse responses are sampled
    pub(crate) fn elapsed(&self) -> &[f64] {
        &self.elapsed
    }

    /// Convolve the input with `irf` and return the result at the times `t`
    pub(crate) fn convolve(&self, irf: &[f64], t: &[f64]) -> Vec<f64> {
        let ct = convolve_truncated(&self.input, irf, self.step);
        match &self.resampled {
            None => ct,
            Some(target) => target.restore(&ct, t),
        }
    }
}
