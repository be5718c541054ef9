//! Tissue model error types

use thiserror::Error;

use crate::data::grid::GridError;

/// A model parameter is of the wrong kind or outside its physical domain
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// The parameter is not a finite number (array, string, null, NaN, ...)
    #[error("{param} must be a numeric scalar")]
    NotNumericScalar { param: String },

    /// A rate, flow or delay is negative
    #[error("{param} must be non-negative, got {value}")]
    Negative { param: String, value: f64 },

    /// A flow that must carry tracer is zero or negative
    #[error("{param} must be positive, got {value}")]
    NotPositive { param: String, value: f64 },

    /// A volume fraction lies outside [0, 1]
    #[error("{param} must be in range [0, 1], got {value}")]
    OutOfUnitRange { param: String, value: f64 },

    /// The compartments together occupy more than the whole tissue
    #[error("Sum of ve ({ve}) and vp ({vp}) exceeds 1 (ve + vp = {sum})")]
    VolumeSumExceedsOne { ve: f64, vp: f64, sum: f64 },

    /// A required parameter is absent from a model description
    #[error("Missing required parameter {param}")]
    Missing { param: String },

    /// Unknown discretization method name
    #[error("Unknown discretization method '{0}', expected 'conv' or 'exp'")]
    UnknownDiscretization(String),

    /// Unknown model name
    #[error("Unknown tissue model '{0}'")]
    UnknownModel(String),
}

/// Errors that can occur while evaluating a tissue model
#[derive(Error, Debug)]
pub enum TissueError {
    /// Invalid model parameter
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    /// Malformed time grid or input curve
    #[error(transparent)]
    Grid(#[from] GridError),

    /// Model description is not valid JSON
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}
