//! Time grids, interpolation and resampling
//!
//! Discrete convolution is only meaningful on a uniformly spaced grid. This
//! module detects irregular sampling, provides the [`UniformGrid`] a curve is
//! resampled onto before convolution, and the interpolation kernels used to
//! go back and forth.

use thiserror::Error;

/// Relative tolerance used when deciding whether a grid is uniform
const UNIFORM_RTOL: f64 = 1e-5;
/// Absolute tolerance used when deciding whether a grid is uniform
const UNIFORM_ATOL: f64 = 1e-8;

/// Errors arising from malformed time grids or sample arrays
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// Insufficient data points for the requested operation
    #[error("Insufficient data: {n} points, need at least {required}")]
    InsufficientData {
        /// Number of points available
        n: usize,
        /// Minimum number required
        required: usize,
    },

    /// Time values are not strictly increasing
    #[error("Invalid time sequence: times must be strictly increasing")]
    InvalidTimeSequence,

    /// Array length mismatch between time points and samples
    #[error("Array length mismatch: {times} time points but {values} samples")]
    ArrayLengthMismatch {
        /// Number of time points
        times: usize,
        /// Number of samples
        values: usize,
    },
}

/// Check that there is one sample per time point
pub fn check_lengths(times: &[f64], values: &[f64]) -> Result<(), GridError> {
    if times.len() != values.len() {
        return Err(GridError::ArrayLengthMismatch {
            times: times.len(),
            values: values.len(),
        });
    }
    Ok(())
}

/// Check that `values` is sampled on `times` and that `times` is a usable grid
pub fn validate(times: &[f64], values: &[f64]) -> Result<(), GridError> {
    check_lengths(times, values)?;
    if times.len() < 2 {
        return Err(GridError::InsufficientData {
            n: times.len(),
            required: 2,
        });
    }
    if times.windows(2).any(|w| !(w[1] > w[0])) {
        return Err(GridError::InvalidTimeSequence);
    }
    Ok(())
}

/// Whether every step of `times` equals the first step within tolerance
pub fn is_uniform(times: &[f64]) -> bool {
    if times.len() < 3 {
        return true;
    }
    let first = times[1] - times[0];
    times
        .windows(2)
        .all(|w| ((w[1] - w[0]) - first).abs() <= UNIFORM_ATOL + UNIFORM_RTOL * first.abs())
}

/// Smallest step between consecutive time points
pub fn min_step(times: &[f64]) -> f64 {
    times
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold(f64::INFINITY, f64::min)
}

/// `n` evenly spaced points from `start` to `stop`, both included
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut points: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            // Avoid accumulated rounding on the end point
            points[n - 1] = stop;
            points
        }
    }
}

/// Points `start, start + step, ...` strictly below `stop`
pub fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || stop <= start {
        return Vec::new();
    }
    let n = ((stop - start) / step - 1e-10).ceil() as usize;
    (0..n).map(|i| start + i as f64 * step).collect()
}

/// Index `i` of the segment `[times[i], times[i + 1]]` containing `x`
///
/// Returns `None` when `x` lies outside the support of `times`.
#[inline]
fn segment(times: &[f64], x: f64) -> Option<usize> {
    let n = times.len();
    if n < 2 || x < times[0] || x > times[n - 1] || x.is_nan() {
        return None;
    }
    let upper = times.partition_point(|&ti| ti <= x);
    Some(upper.saturating_sub(1).min(n - 2))
}

/// Piecewise linear interpolation of `(times, values)` at `x`
///
/// Points outside `[times[0], times[n-1]]` evaluate to `fill`.
pub fn interp_linear(times: &[f64], values: &[f64], x: f64, fill: f64) -> f64 {
    match segment(times, x) {
        None => fill,
        Some(i) => {
            let (t0, t1) = (times[i], times[i + 1]);
            let w = (x - t0) / (t1 - t0);
            values[i] + w * (values[i + 1] - values[i])
        }
    }
}

/// Piecewise quadratic interpolation of `(times, values)` at `x`
///
/// The parabola passes through the two samples bracketing `x` and the
/// nearest neighbouring sample. Points outside the support evaluate to
/// `fill`. Two-sample inputs degrade to linear interpolation.
pub fn interp_quadratic(times: &[f64], values: &[f64], x: f64, fill: f64) -> f64 {
    let n = times.len();
    let Some(i) = segment(times, x) else {
        return fill;
    };
    if n < 3 {
        return interp_linear(times, values, x, fill);
    }

    let first = if i == 0 {
        0
    } else if i + 2 >= n {
        n - 3
    } else if (x - times[i - 1]) <= (times[i + 2] - x) {
        i - 1
    } else {
        i
    };

    let (x0, x1, x2) = (times[first], times[first + 1], times[first + 2]);
    let (y0, y1, y2) = (values[first], values[first + 1], values[first + 2]);

    let l0 = (x - x1) * (x - x2) / ((x0 - x1) * (x0 - x2));
    let l1 = (x - x0) * (x - x2) / ((x1 - x0) * (x1 - x2));
    let l2 = (x - x0) * (x - x1) / ((x2 - x0) * (x2 - x1));
    y0 * l0 + y1 * l1 + y2 * l2
}

/// Shift a curve later in time by `delay`
///
/// The result is zero for `t <= delay` and the linearly interpolated value
/// of the original curve at `t - delay` afterwards. A zero delay returns the
/// curve unchanged.
pub fn shift(times: &[f64], values: &[f64], delay: f64) -> Vec<f64> {
    if delay == 0.0 {
        return values.to_vec();
    }
    times
        .iter()
        .map(|&t| {
            if t > delay {
                interp_linear(times, values, t - delay, 0.0)
            } else {
                0.0
            }
        })
        .collect()
}

/// A uniformly spaced grid spanning the same interval as an irregular one
#[derive(Debug, Clone)]
pub struct UniformGrid {
    times: Vec<f64>,
    step: f64,
}

impl UniformGrid {
    /// Uniform grid over `[times[0], times[n-1]]` at (approximately) the
    /// smallest step observed in `times`, optionally refined `factor` times
    pub fn new(times: &[f64], factor: usize) -> Result<Self, GridError> {
        if times.len() < 2 {
            return Err(GridError::InsufficientData {
                n: times.len(),
                required: 2,
            });
        }
        let start = times[0];
        let stop = times[times.len() - 1];
        let target = min_step(times) / factor.max(1) as f64;
        if !(target > 0.0) {
            return Err(GridError::InvalidTimeSequence);
        }
        let n = ((stop - start) / target).round() as usize + 1;
        let times = linspace(start, stop, n.max(2));
        let step = times[1] - times[0];
        Ok(Self { times, step })
    }

    /// Grid points
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Constant spacing between grid points
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of grid points
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether the grid holds no points
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Elapsed time since the first grid point, for impulse responses
    pub fn elapsed(&self) -> Vec<f64> {
        let start = self.times[0];
        self.times.iter().map(|&t| t - start).collect()
    }

    /// Map samples taken at `times` onto this grid (quadratic, zero fill)
    pub fn resample(&self, times: &[f64], values: &[f64]) -> Vec<f64> {
        self.times
            .iter()
            .map(|&x| interp_quadratic(times, values, x, 0.0))
            .collect()
    }

    /// Map samples on this grid back onto `times` (quadratic, zero fill)
    pub fn restore(&self, values: &[f64], times: &[f64]) -> Vec<f64> {
        times
            .iter()
            .map(|&x| interp_quadratic(&self.times, values, x, 0.0))
            .collect()
    }
}
