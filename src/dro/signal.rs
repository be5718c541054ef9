//! Synthetic MR signal volumes from concentration volumes, and the reverse
//! step of extracting signal enhancement from measured data
//!
//! All volumes are `Array4` with time on the last axis; per-voxel maps are
//! `Array3`.

use ndarray::{s, Array3, Array4, ArrayBase, Axis, Data, Ix3, Zip};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{check_shape, DroError};
use crate::signal::{r10_from_reference, signal_spgr_t2star};

/// Percentile of the signal distribution matched by [`SignalScale::MatchPercentile`]
const SCALE_PERCENTILE: f64 = 98.0;

/// Acquisition parameters of a spoiled gradient echo sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpgrSequence {
    /// Repetition time in s
    pub tr: f64,
    /// Echo time in s
    pub te: f64,
    /// Flip angle in degrees
    pub flip: f64,
}

/// Relaxivities of the contrast agent, in 1/s/mM
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Relaxivity {
    pub r1: f64,
    pub r2_star: f64,
}

#[derive(Debug, Clone)]
pub struct RelaxationMaps {
    /// Longitudinal relaxation rate per voxel and frame, 1/s
    pub r1: Array4<f64>,
    /// Effective transverse relaxation rate per voxel and frame, 1/s
    pub r2_star: Array4<f64>,
}

/// How a synthetic signal volume is brought onto the scale of measured data
#[derive(Debug, Clone, Copy)]
pub enum SignalScale<'a> {
    /// Match the 98th percentile of a measured signal volume
    MatchPercentile(&'a Array4<f64>),
    /// A known factor, such as the one found for an earlier visit
    Fixed(f64),
}

#[derive(Debug, Clone)]
pub struct SyntheticSignal {
    pub signal: Array4<f64>,
    /// Factor applied to the unit-magnetisation signal
    pub scale: f64,
}

#[derive(Debug, Clone)]
pub struct Enhancement {
    /// Signal minus the baseline, median filtered in plane frame by frame
    pub enhancement: Array4<f64>,
    /// Mean pre-contrast signal per voxel
    pub baseline: Array3<f64>,
}

/// Native `R1` map from the pre-contrast signal `s0`, normalised to a
/// reference region with signal `s0_ref` and relaxation time `t1_ref` (s)
pub fn r10_map_with_reference(
    s0: &Array3<f64>,
    s0_ref: f64,
    t1_ref: f64,
    sequence: &SpgrSequence,
) -> Array3<f64> {
    let mut r10 = s0.clone();
    r10.par_mapv_inplace(|s| {
        r10_from_reference(s, s0_ref, sequence.tr, sequence.flip, t1_ref)
    });
    r10
}

/// `R1 = R10 + r1·C` and `R2* = R2*0 + r2*·C` for every voxel and frame
///
/// `r10` is a per-voxel map, `r20_star` is taken as uniform.
pub fn relaxation_maps(
    r10: &Array3<f64>,
    r20_star: f64,
    c: &Array4<f64>,
    relaxivity: &Relaxivity,
) -> Result<RelaxationMaps, DroError> {
    let (nx, ny, nz, _) = c.dim();
    check_shape(&[nx, ny, nz], r10.shape())?;

    let mut r1 = Array4::zeros(c.raw_dim());
    Zip::from(&mut r1)
        .and(c)
        .and_broadcast(r10.view().insert_axis(Axis(3)))
        .par_for_each(|r1, &c, &r10| *r1 = r10 + relaxivity.r1 * c);

    let mut r2_star = c.clone();
    r2_star.par_mapv_inplace(|c| r20_star + relaxivity.r2_star * c);

    Ok(RelaxationMaps { r1, r2_star })
}

/// SPGR signal with `T2*` decay for every voxel and frame, scaled by `scale`
pub fn concentration_to_signal(
    maps: &RelaxationMaps,
    sequence: &SpgrSequence,
    scale: SignalScale<'_>,
) -> Result<SyntheticSignal, DroError> {
    check_shape(maps.r1.shape(), maps.r2_star.shape())?;

    let SpgrSequence { tr, te, flip } = *sequence;
    let mut signal = Array4::zeros(maps.r1.raw_dim());
    Zip::from(&mut signal)
        .and(&maps.r1)
        .and(&maps.r2_star)
        .par_for_each(|s, &r1, &r2_star| {
            *s = signal_spgr_t2star(r1, r2_star, 1.0, tr, te, flip);
        });

    let scale = match scale {
        SignalScale::MatchPercentile(measured) => {
            percentile(measured.iter().copied().collect(), SCALE_PERCENTILE)
                / percentile(signal.iter().copied().collect(), SCALE_PERCENTILE)
        }
        SignalScale::Fixed(factor) => factor,
    };
    if !(scale.is_finite() && scale > 0.0) {
        return Err(DroError::InvalidScale(scale));
    }
    tracing::debug!(scale, "scaled synthetic signal");

    signal.par_mapv_inplace(|s| s * scale);
    Ok(SyntheticSignal { signal, scale })
}

/// Baseline and enhancement of a measured signal volume
///
/// The baseline is the mean of the first `baseline_points` frames. Each
/// enhancement frame is passed through [`median_filter_3x3`].
pub fn signal_enhancement(
    s: &Array4<f64>,
    baseline_points: usize,
) -> Result<Enhancement, DroError> {
    let frames = s.len_of(Axis(3));
    if baseline_points == 0 || baseline_points > frames {
        return Err(DroError::BaselinePoints {
            points: baseline_points,
            frames,
        });
    }

    let baseline = s
        .slice(s![.., .., .., ..baseline_points])
        .mean_axis(Axis(3))
        .ok_or(DroError::BaselinePoints {
            points: baseline_points,
            frames,
        })?;

    let mut enhancement = s - &baseline.view().insert_axis(Axis(3));
    enhancement
        .axis_iter_mut(Axis(3))
        .into_par_iter()
        .for_each(|mut frame| {
            let filtered = median_filter_3x3(&frame);
            frame.assign(&filtered);
        });

    Ok(Enhancement {
        enhancement,
        baseline,
    })
}

/// 3×3 median filter in the first two axes, applied to each slice of the
/// third axis independently
///
/// Borders are mirrored (`d c b a | a b c d`), which for a 3×3 window
/// repeats the edge sample.
pub fn median_filter_3x3<S: Data<Elem = f64>>(map: &ArrayBase<S, Ix3>) -> Array3<f64> {
    let (nx, ny, nz) = map.dim();
    Array3::from_shape_fn((nx, ny, nz), |(i, j, k)| {
        let mut window = [0.0; 9];
        let mut n = 0;
        for ii in [i.saturating_sub(1), i, (i + 1).min(nx - 1)] {
            for jj in [j.saturating_sub(1), j, (j + 1).min(ny - 1)] {
                window[n] = map[(ii, jj, k)];
                n += 1;
            }
        }
        window.sort_unstable_by(f64::total_cmp);
        window[4]
    })
}

/// Percentile `p` (0-100) with linear interpolation between order statistics
///
/// NaN for an empty input.
fn percentile(mut values: Vec<f64>, p: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.par_sort_unstable_by(f64::total_cmp);
    let rank = p / 100.0 * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    values[lo] + (rank - lo as f64) * (values[hi] - values[lo])
}
