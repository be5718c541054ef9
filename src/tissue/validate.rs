//! Parameter checks shared by the tissue models
//!
//! Checks run in two passes: every parameter is first confirmed to be a
//! numeric scalar, then each is checked against its physical domain.

use serde_json::{Map, Value};

use super::error::ParameterError;

/// Finite number check
pub(crate) fn numeric(param: &str, value: f64) -> Result<f64, ParameterError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParameterError::NotNumericScalar {
            param: param.to_string(),
        })
    }
}

pub(crate) fn non_negative(param: &str, value: f64) -> Result<(), ParameterError> {
    if value < 0.0 {
        return Err(ParameterError::Negative {
            param: param.to_string(),
            value,
        });
    }
    Ok(())
}

pub(crate) fn positive(param: &str, value: f64) -> Result<(), ParameterError> {
    if value <= 0.0 {
        return Err(ParameterError::NotPositive {
            param: param.to_string(),
            value,
        });
    }
    Ok(())
}

/// Volume fraction in [0, 1]
pub(crate) fn fraction(param: &str, value: f64) -> Result<(), ParameterError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ParameterError::OutOfUnitRange {
            param: param.to_string(),
            value,
        });
    }
    Ok(())
}

/// Extravascular and plasma fractions cannot exceed the tissue volume
pub(crate) fn volume_sum(ve: f64, vp: f64) -> Result<(), ParameterError> {
    let sum = ve + vp;
    if sum > 1.0 {
        return Err(ParameterError::VolumeSumExceedsOne { ve, vp, sum });
    }
    Ok(())
}

/// Read `key` from a JSON object as a numeric scalar, if present
pub(crate) fn json_scalar(
    object: &Map<String, Value>,
    key: &str,
) -> Result<Option<f64>, ParameterError> {
    match object.get(key) {
        None => Ok(None),
        Some(Value::Number(number)) => match number.as_f64() {
            Some(value) => numeric(key, value).map(Some),
            None => Err(ParameterError::NotNumericScalar {
                param: key.to_string(),
            }),
        },
        Some(_) => Err(ParameterError::NotNumericScalar {
            param: key.to_string(),
        }),
    }
}

/// Read a required numeric scalar from a JSON object
pub(crate) fn json_required(object: &Map<String, Value>, key: &str) -> Result<f64, ParameterError> {
    json_scalar(object, key)?.ok_or_else(|| ParameterError::Missing {
        param: key.to_string(),
    })
}
