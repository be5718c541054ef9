//! Convolution primitives for indicator-dilution models
//!
//! Two discretisations of the convolution integral `∫ a(s) h(t - s) ds` are
//! provided:
//!
//! - [`exp_conv`]: exact convolution with a one-pole exponential kernel,
//!   assuming the input is piecewise linear between samples. Works on any
//!   strictly increasing grid.
//! - [`convolve`] / [`convolve_truncated`]: discrete convolution of two
//!   uniformly sampled sequences, a Riemann approximation of the integral.

use rustfft::{num_complex::Complex64, FftPlanner};

use crate::data::grid::{check_lengths, GridError};

/// Above this many multiply-adds the FFT path is used
const DIRECT_WORK_LIMIT: usize = 1 << 20;

/// Exponential convolution of `a` with `(1/tc)·exp(-t/tc)`
///
/// `a` is treated as piecewise linear between the samples at `t`, which
/// makes every step of the recurrence
///
/// `f[i+1] = E[i]·f[i] + a[i]·(1 - E[i]) + da[i]·(x[i] - (1 - E[i]))`
///
/// exact, with `x[i] = (t[i+1] - t[i]) / tc`, `E[i] = exp(-x[i])` and
/// `da[i] = (a[i+1] - a[i]) / x[i]`. The recurrence carries `f[i]` forward
/// and has to run in index order.
///
/// A zero time constant is an instantaneous system and returns `a` unchanged.
/// Fails with [`GridError::ArrayLengthMismatch`] when `t` and `a` differ in
/// length.
pub fn exp_conv(tc: f64, t: &[f64], a: &[f64]) -> Result<Vec<f64>, GridError> {
    check_lengths(t, a)?;

    if tc == 0.0 {
        return Ok(a.to_vec());
    }

    let n = t.len();
    let mut f = vec![0.0; n];
    for i in 0..n.saturating_sub(1) {
        let x = (t[i + 1] - t[i]) / tc;
        let da = (a[i + 1] - a[i]) / x;
        let e = (-x).exp();
        // 1 - exp(-x) without cancellation for small steps
        let e0 = -(-x).exp_m1();
        let e1 = x - e0;
        f[i + 1] = e * f[i] + a[i] * e0 + da * e1;
    }
    Ok(f)
}

/// Full discrete convolution of `a` and `b`, of length `a.len() + b.len() - 1`
pub fn convolve(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let len = a.len() + b.len() - 1;
    if use_direct(a.len(), b.len()) {
        convolve_direct(a, b, len)
    } else {
        convolve_fft(a, b, len)
    }
}

/// First `a.len()` samples of the convolution of `a` and `b`, scaled by `dt`
///
/// With `a` an input curve and `b` an impulse response sampled at the same
/// spacing `dt`, this approximates the continuous convolution integral at
/// the sample times of `a`.
pub fn convolve_truncated(a: &[f64], b: &[f64], dt: f64) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return vec![0.0; a.len()];
    }
    let mut out = if use_direct(a.len(), b.len()) {
        convolve_direct(a, b, a.len())
    } else {
        let mut full = convolve_fft(a, b, a.len() + b.len() - 1);
        full.truncate(a.len());
        full
    };
    out.iter_mut().for_each(|v| *v *= dt);
    out
}

#[inline]
fn use_direct(n: usize, m: usize) -> bool {
    n.min(m) < 32 || n.saturating_mul(m) <= DIRECT_WORK_LIMIT
}

/// Direct summation of the first `len` samples of `a * b`
fn convolve_direct(a: &[f64], b: &[f64], len: usize) -> Vec<f64> {
    let mut out = vec![0.0; len];
    for (i, &ai) in a.iter().enumerate() {
        if ai == 0.0 || i >= len {
            continue;
        }
        let end = b.len().min(len - i);
        for (o, &bj) in out[i..i + end].iter_mut().zip(&b[..end]) {
            *o += ai * bj;
        }
    }
    out
}

/// Convolution theorem: zero-pad, transform, multiply, transform back
fn convolve_fft(a: &[f64], b: &[f64], len: usize) -> Vec<f64> {
    let size = (a.len() + b.len() - 1).next_power_of_two();
    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(size);
    let inverse = planner.plan_fft_inverse(size);

    let pad = |x: &[f64]| -> Vec<Complex64> {
        let mut buffer = vec![Complex64::new(0.0, 0.0); size];
        for (slot, &v) in buffer.iter_mut().zip(x) {
            slot.re = v;
        }
        buffer
    };

    let mut fa = pad(a);
    let mut fb = pad(b);
    forward.process(&mut fa);
    forward.process(&mut fb);
    for (x, y) in fa.iter_mut().zip(&fb) {
        *x *= *y;
    }
    inverse.process(&mut fa);

    let scale = 1.0 / size as f64;
    fa.iter().take(len).map(|c| c.re * scale).collect()
}
