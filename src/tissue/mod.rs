//! Compartmental tissue models
//!
//! Each model turns an arterial input function (AIF) into a tissue
//! concentration curve sampled at the same time points, by convolving the
//! (delayed) AIF with the model's impulse response.
//!
//! | Model | Parameters | Impulse response |
//! |-------|------------|------------------|
//! | [`Tofts`] | Ktrans, ve | `Ktrans·exp(-Ktrans/ve·t)` |
//! | [`ExtendedTofts`] | Ktrans, ve, vp | Tofts + `vp·δ(t)` |
//! | [`TwoCompartmentExchange`] | Fp, PS, ve, vp | two exponentials per compartment |
//!
//! # Units
//!
//! Time is in seconds and concentrations in mM. Rate constants and flows
//! carry their unit in [`Rate`] and [`Flow`].
//!
//! # Usage
//!
//! ```rust
//! use perfusion::prelude::*;
//!
//! let t = arange(0.0, 360.0, 1.0);
//! let ca = parker(&t, 0.0, 0.0);
//!
//! let options = ModelOptions::default()
//!     .with_arterial_delay(10.0)
//!     .with_discretization(Discretization::Exp);
//! let ct = ExtendedTofts::new(Rate::PerMinute(0.6), 0.2, 0.05)
//!     .concentration(&t, &ca, &options)
//!     .unwrap();
//! assert_eq!(ct.len(), t.len());
//! ```
//!
//! Models can also be described in JSON, with rate constants in 1/min and
//! flows in mL/min/100 mL:
//!
//! ```rust
//! use perfusion::prelude::*;
//!
//! let (model, options) = TissueModel::from_json_str(
//!     r#"{"model": "2cxm", "Fp": 10, "PS": 5, "ve": 0.2, "vp": 0.1, "Ta": 0}"#,
//! )
//! .unwrap();
//! assert_eq!(options.arterial_delay, 0.0);
//! assert!(matches!(model, TissueModel::TwoCompartmentExchange(_)));
//! ```

mod discretization;
mod error;
mod extended_tofts;
mod tofts;
mod two_compartment_exchange;
mod validate;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use discretization::Discretization;
pub use error::{ParameterError, TissueError};
pub use extended_tofts::{extended_tofts, ExtendedTofts};
pub use tofts::{tofts, Tofts};
pub use two_compartment_exchange::{
    two_compartment_exchange_model, Compartments, TwoCompartmentExchange,
};

use crate::data::units::{Flow, Rate};

/// Default arterial delay `Ta` in seconds
pub const DEFAULT_ARTERIAL_DELAY: f64 = 30.0;

/// Evaluation options shared by all tissue models
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelOptions {
    /// Delay `Ta` in seconds between AIF and tissue onset (default: 30)
    ///
    /// The AIF is shifted later by this amount before convolution; the
    /// impulse response itself is never shifted.
    pub arterial_delay: f64,

    /// Convolution discretization (default: [`Discretization::Conv`])
    pub discretization: Discretization,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            arterial_delay: DEFAULT_ARTERIAL_DELAY,
            discretization: Discretization::Conv,
        }
    }
}

impl ModelOptions {
    /// Set the arterial delay `Ta` (seconds)
    pub fn with_arterial_delay(mut self, delay: f64) -> Self {
        self.arterial_delay = delay;
        self
    }

    /// Set the discretization method
    pub fn with_discretization(mut self, discretization: Discretization) -> Self {
        self.discretization = discretization;
        self
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        let ta = validate::numeric("Ta", self.arterial_delay)?;
        validate::non_negative("Ta", ta)
    }
}

/// A model that maps an arterial input function to a tissue curve
pub trait TissueResponse {
    /// Tissue concentrations in mM at the time points `t`
    ///
    /// `ca` holds the arterial plasma concentrations at `t`. Parameters and
    /// options are validated before any computation.
    fn concentration(
        &self,
        t: &[f64],
        ca: &[f64],
        options: &ModelOptions,
    ) -> Result<Vec<f64>, TissueError>;
}

/// Any of the supported tissue models
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum TissueModel {
    Tofts(Tofts),
    ExtendedTofts(ExtendedTofts),
    TwoCompartmentExchange(TwoCompartmentExchange),
}

impl TissueResponse for TissueModel {
    fn concentration(
        &self,
        t: &[f64],
        ca: &[f64],
        options: &ModelOptions,
    ) -> Result<Vec<f64>, TissueError> {
        match self {
            TissueModel::Tofts(m) => m.concentration(t, ca, options),
            TissueModel::ExtendedTofts(m) => m.concentration(t, ca, options),
            TissueModel::TwoCompartmentExchange(m) => m.concentration(t, ca, options),
        }
    }
}

impl TissueModel {
    /// Parse a flat model description
    ///
    /// Recognised keys: `model` (`"tofts"`, `"extended_tofts"`, `"2cxm"`),
    /// `Ktrans` (1/min), `ve`, `vp`, `Fp` and `PS` (mL/min/100 mL), the
    /// optional `Ta` (s, default 30) and `discretization_method`
    /// (`"conv"` or `"exp"`). Every parameter must be a numeric scalar.
    pub fn from_json(value: &Value) -> Result<(Self, ModelOptions), TissueError> {
        let object = value.as_object().ok_or_else(|| ParameterError::Missing {
            param: "model".to_string(),
        })?;

        let name = match object.get("model") {
            Some(Value::String(name)) => name.as_str(),
            Some(other) => return Err(ParameterError::UnknownModel(other.to_string()).into()),
            None => {
                return Err(ParameterError::Missing {
                    param: "model".to_string(),
                }
                .into())
            }
        };

        let mut options = ModelOptions::default();
        if let Some(ta) = validate::json_scalar(object, "Ta")? {
            options.arterial_delay = ta;
        }
        match object.get("discretization_method") {
            None | Some(Value::Null) => {}
            Some(Value::String(method)) => options.discretization = method.parse()?,
            Some(other) => {
                return Err(ParameterError::UnknownDiscretization(other.to_string()).into())
            }
        }

        let model = match name {
            "tofts" => TissueModel::Tofts(Tofts::new(
                Rate::PerMinute(validate::json_required(object, "Ktrans")?),
                validate::json_required(object, "ve")?,
            )),
            "extended_tofts" => TissueModel::ExtendedTofts(ExtendedTofts::new(
                Rate::PerMinute(validate::json_required(object, "Ktrans")?),
                validate::json_required(object, "ve")?,
                validate::json_required(object, "vp")?,
            )),
            "2cxm" | "two_compartment_exchange" | "two_compartment_exchange_model" => {
                TissueModel::TwoCompartmentExchange(TwoCompartmentExchange::new(
                    Flow::Ml100PerMinute(validate::json_required(object, "Fp")?),
                    Flow::Ml100PerMinute(validate::json_required(object, "PS")?),
                    validate::json_required(object, "ve")?,
                    validate::json_required(object, "vp")?,
                ))
            }
            other => return Err(ParameterError::UnknownModel(other.to_string()).into()),
        };

        model.validate()?;
        options.validate()?;
        Ok((model, options))
    }

    /// Parse a model description from a JSON string
    pub fn from_json_str(json: &str) -> Result<(Self, ModelOptions), TissueError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json(&value)
    }

    /// Validate the wrapped model's parameters
    pub fn validate(&self) -> Result<(), ParameterError> {
        match self {
            TissueModel::Tofts(m) => m.validate(),
            TissueModel::ExtendedTofts(m) => m.validate(),
            TissueModel::TwoCompartmentExchange(m) => m.validate(),
        }
    }
}

impl From<Tofts> for TissueModel {
    fn from(model: Tofts) -> Self {
        TissueModel::Tofts(model)
    }
}

impl From<ExtendedTofts> for TissueModel {
    fn from(model: ExtendedTofts) -> Self {
        TissueModel::ExtendedTofts(model)
    }
}

impl From<TwoCompartmentExchange> for TissueModel {
    fn from(model: TwoCompartmentExchange) -> Self {
        TissueModel::TwoCompartmentExchange(model)
    }
}
