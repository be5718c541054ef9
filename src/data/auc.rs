//! Pure AUC (Area Under the Curve) calculation primitives
//!
//! Standalone trapezoidal integration on raw `&[f64]` slices. These are the
//! building blocks for mass-balance checks on tissue curves and for the
//! cumulative integrals of the linearised Tofts fit in [`crate::dro`].
//!
//! # Example
//!
//! ```rust
//! use perfusion::data::auc::{cumulative_trapezoid, trapezoid};
//!
//! let times = [0.0, 1.0, 2.0, 4.0];
//! let concs = [0.0, 10.0, 8.0, 4.0];
//!
//! let total = trapezoid(&times, &concs)?;
//! // (0+10)/2*1 + (10+8)/2*1 + (8+4)/2*2 = 5 + 9 + 12 = 26
//! assert!((total - 26.0).abs() < 1e-10);
//!
//! let running = cumulative_trapezoid(&times, &concs)?;
//! assert_eq!(running, vec![0.0, 5.0, 14.0, 26.0]);
//! # Ok::<(), perfusion::data::GridError>(())
//! ```

use super::grid::{check_lengths, GridError};

/// Linear trapezoidal AUC for a single segment
#[inline]
fn auc_linear(c1: f64, c2: f64, dt: f64) -> f64 {
    (c1 + c2) / 2.0 * dt
}

/// Area under `values` sampled at `times`, by the linear trapezoidal rule
///
/// Fails with [`GridError::ArrayLengthMismatch`] unless there is one value
/// per time point.
pub fn trapezoid(times: &[f64], values: &[f64]) -> Result<f64, GridError> {
    check_lengths(times, values)?;

    Ok(times
        .windows(2)
        .zip(values.windows(2))
        .map(|(t, c)| auc_linear(c[0], c[1], t[1] - t[0]))
        .sum())
}

/// Running trapezoidal integral, starting at zero
///
/// Fails with [`GridError::ArrayLengthMismatch`] unless there is one value
/// per time point.
pub fn cumulative_trapezoid(times: &[f64], values: &[f64]) -> Result<Vec<f64>, GridError> {
    check_lengths(times, values)?;

    let mut total = 0.0;
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return Ok(out);
    }
    out.push(0.0);
    for (t, c) in times.windows(2).zip(values.windows(2)) {
        total += auc_linear(c[0], c[1], t[1] - t[0]);
        out.push(total);
    }
    Ok(out)
}

/// Running trapezoidal integral for samples with a constant spacing `dt`
pub fn cumulative_trapezoid_uniform(values: &[f64], dt: f64) -> Vec<f64> {
    let mut total = 0.0;
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(0.0);
    for c in values.windows(2) {
        total += auc_linear(c[0], c[1], dt);
        out.push(total);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_trapezoid_simple_decreasing() {
        let times = vec![0.0, 1.0, 2.0, 4.0, 8.0];
        let concs = vec![10.0, 8.0, 6.0, 4.0, 2.0];

        // 9 + 7 + 10 + 12
        assert_relative_eq!(trapezoid(&times, &concs).unwrap(), 38.0, epsilon = 1e-10);
    }

    #[test]
    fn test_trapezoid_single_point() {
        assert_eq!(trapezoid(&[0.0], &[10.0]), Ok(0.0));
    }

    #[test]
    fn test_cumulative_matches_total() {
        let times = vec![0.0, 0.5, 1.0, 2.0, 4.0, 8.0];
        let concs = vec![0.0, 5.0, 8.0, 6.0, 3.0, 1.0];
        let running = cumulative_trapezoid(&times, &concs).unwrap();
        assert_eq!(running.len(), times.len());
        assert_relative_eq!(running[5], trapezoid(&times, &concs).unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let mismatch = GridError::ArrayLengthMismatch {
            times: 3,
            values: 2,
        };
        assert_eq!(trapezoid(&[0.0, 1.0, 2.0], &[1.0, 2.0]), Err(mismatch.clone()));
        assert_eq!(cumulative_trapezoid(&[0.0, 1.0, 2.0], &[1.0, 2.0]), Err(mismatch));
    }

    #[test]
    fn test_cumulative_uniform() {
        let running = cumulative_trapezoid_uniform(&[0.0, 2.0, 2.0, 0.0], 0.5);
        assert_eq!(running, vec![0.0, 0.5, 1.5, 2.0]);
        assert!(cumulative_trapezoid_uniform(&[], 1.0).is_empty());
    }
}
