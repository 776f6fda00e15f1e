//! Wavelength/time interpolators for parameters.
//!
//! Each variant maps a coordinate (wavelength in meters or MJD) to a
//! parameter value. The "shape" settings of an interpolator (keyframe
//! positions, bump centers and widths, reference points, periods) are
//! fixed during fitting; only the amplitude-like values are exposed
//! through the free-vector interface.

use serde::{Deserialize, Serialize};

/// Coordinate an interpolator varies along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dependence {
    /// Wavelength, meters.
    Wl,
    /// Modified Julian Date.
    Mjd,
}

impl Dependence {
    fn pick(self, wl: f64, mjd: f64) -> f64 {
        match self {
            Dependence::Wl => wl,
            Dependence::Mjd => mjd,
        }
    }
}

/// Parameter dependence on wavelength or time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Interp {
    /// Piecewise-linear interpolation through (frame, value) pairs.
    ///
    /// Outside the frame range the value is clamped to the nearest end,
    /// unless `extrapolate` is set, in which case the end segments are
    /// extended linearly.
    Keyframes {
        dependence: Dependence,
        frames: Vec<f64>,
        values: Vec<f64>,
        #[serde(default)]
        extrapolate: bool,
    },
    /// `floor + (peak - floor) * exp(-4 ln2 (x - x0)^2 / fwhm^2)`.
    GaussianBump {
        dependence: Dependence,
        x0: f64,
        fwhm: f64,
        floor: f64,
        peak: f64,
    },
    /// Sum of Gaussian bumps over a shared floor.
    MultiGaussianBump {
        dependence: Dependence,
        x0: Vec<f64>,
        fwhm: Vec<f64>,
        floor: f64,
        peaks: Vec<f64>,
    },
    /// `Σ coeffs[i] * (x - x0)^i`.
    Polynomial {
        dependence: Dependence,
        #[serde(default)]
        x0: f64,
        coeffs: Vec<f64>,
    },
    /// `scale * (x / x0)^index`.
    PowerLaw {
        dependence: Dependence,
        x0: f64,
        scale: f64,
        index: f64,
    },
    /// Periodic cosine in time between `v0` (at phase 0) and `v1`
    /// (at phase 0.5), period `period` days starting at `t0`.
    ///
    /// `inflection` optionally skews the cycle: the phase is remapped
    /// piecewise-linearly through (0, 0) → (inflection, 0.5) → (1, 1).
    CosineTime {
        t0: f64,
        period: f64,
        v0: f64,
        v1: f64,
        #[serde(default)]
        inflection: Option<f64>,
    },
}

const FOUR_LN2: f64 = 4.0 * std::f64::consts::LN_2;

impl Interp {
    /// Evaluate at a (wavelength, MJD) coordinate.
    pub fn eval(&self, wl: f64, mjd: f64) -> f64 {
        match self {
            Interp::Keyframes {
                dependence,
                frames,
                values,
                extrapolate,
            } => linear_interp(dependence.pick(wl, mjd), frames, values, *extrapolate),
            Interp::GaussianBump {
                dependence,
                x0,
                fwhm,
                floor,
                peak,
            } => {
                let x = dependence.pick(wl, mjd);
                floor + (peak - floor) * gauss_shape(x, *x0, *fwhm)
            }
            Interp::MultiGaussianBump {
                dependence,
                x0,
                fwhm,
                floor,
                peaks,
            } => {
                let x = dependence.pick(wl, mjd);
                let mut v = *floor;
                for i in 0..peaks.len().min(x0.len()).min(fwhm.len()) {
                    v += (peaks[i] - floor) * gauss_shape(x, x0[i], fwhm[i]);
                }
                v
            }
            Interp::Polynomial {
                dependence,
                x0,
                coeffs,
            } => {
                let x = dependence.pick(wl, mjd) - x0;
                // Horner evaluation, highest order first.
                coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
            }
            Interp::PowerLaw {
                dependence,
                x0,
                scale,
                index,
            } => {
                let x = dependence.pick(wl, mjd);
                scale * (x / x0).powf(*index)
            }
            Interp::CosineTime {
                t0,
                period,
                v0,
                v1,
                inflection,
            } => {
                let mut phase = ((mjd - t0) / period).rem_euclid(1.0);
                if let Some(x0) = inflection {
                    phase = skew_phase(phase, *x0);
                }
                let c = (phase * std::f64::consts::TAU).cos();
                (c + 1.0) / 2.0 * (v0 - v1) + v1
            }
        }
    }

    /// Number of free values exposed to the sampler.
    pub fn n_free(&self) -> usize {
        match self {
            Interp::Keyframes { values, .. } => values.len(),
            Interp::GaussianBump { .. } => 2,
            Interp::MultiGaussianBump { peaks, .. } => 1 + peaks.len(),
            Interp::Polynomial { coeffs, .. } => coeffs.len(),
            Interp::PowerLaw { .. } => 2,
            Interp::CosineTime { .. } => 2,
        }
    }

    pub fn push_free_values(&self, out: &mut Vec<f64>) {
        match self {
            Interp::Keyframes { values, .. } => out.extend_from_slice(values),
            Interp::GaussianBump { floor, peak, .. } => {
                out.push(*floor);
                out.push(*peak);
            }
            Interp::MultiGaussianBump { floor, peaks, .. } => {
                out.push(*floor);
                out.extend_from_slice(peaks);
            }
            Interp::Polynomial { coeffs, .. } => out.extend_from_slice(coeffs),
            Interp::PowerLaw { scale, index, .. } => {
                out.push(*scale);
                out.push(*index);
            }
            Interp::CosineTime { v0, v1, .. } => {
                out.push(*v0);
                out.push(*v1);
            }
        }
    }

    /// Consume `n_free()` values from the head of `values`.
    pub fn set_free_values(&mut self, values: &[f64]) -> usize {
        match self {
            Interp::Keyframes {
                values: keyvalues, ..
            } => {
                let n = keyvalues.len();
                keyvalues.copy_from_slice(&values[..n]);
                n
            }
            Interp::GaussianBump { floor, peak, .. } => {
                *floor = values[0];
                *peak = values[1];
                2
            }
            Interp::MultiGaussianBump { floor, peaks, .. } => {
                *floor = values[0];
                let n = peaks.len();
                peaks.copy_from_slice(&values[1..1 + n]);
                1 + n
            }
            Interp::Polynomial { coeffs, .. } => {
                let n = coeffs.len();
                coeffs.copy_from_slice(&values[..n]);
                n
            }
            Interp::PowerLaw { scale, index, .. } => {
                *scale = values[0];
                *index = values[1];
                2
            }
            Interp::CosineTime { v0, v1, .. } => {
                *v0 = values[0];
                *v1 = values[1];
                2
            }
        }
    }
}

fn gauss_shape(x: f64, x0: f64, fwhm: f64) -> f64 {
    if fwhm == 0.0 {
        return 0.0;
    }
    (-FOUR_LN2 * (x - x0) * (x - x0) / (fwhm * fwhm)).exp()
}

/// Piecewise-linear interpolation over sorted frames.
fn linear_interp(x: f64, frames: &[f64], values: &[f64], extrapolate: bool) -> f64 {
    let n = frames.len().min(values.len());
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return values[0];
    }

    if x <= frames[0] {
        return if extrapolate {
            segment(x, frames[0], values[0], frames[1], values[1])
        } else {
            values[0]
        };
    }
    if x >= frames[n - 1] {
        return if extrapolate {
            segment(x, frames[n - 2], values[n - 2], frames[n - 1], values[n - 1])
        } else {
            values[n - 1]
        };
    }

    for i in 1..n {
        if x <= frames[i] {
            return segment(x, frames[i - 1], values[i - 1], frames[i], values[i]);
        }
    }
    values[n - 1]
}

fn segment(x: f64, x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    if (x1 - x0).abs() < 1e-300 {
        return y0;
    }
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// Remap phase through (0,0) → (x0,0.5) → (1,1).
fn skew_phase(phase: f64, x0: f64) -> f64 {
    let x0 = x0.clamp(1e-6, 1.0 - 1e-6);
    if phase <= x0 {
        0.5 * phase / x0
    } else {
        0.5 + 0.5 * (phase - x0) / (1.0 - x0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyframes_interpolate_and_clamp() {
        let i = Interp::Keyframes {
            dependence: Dependence::Wl,
            frames: vec![1.0e-6, 2.0e-6],
            values: vec![10.0, 20.0],
            extrapolate: false,
        };
        assert!((i.eval(1.5e-6, 0.0) - 15.0).abs() < 1e-9);
        // Clamped ends.
        assert_eq!(i.eval(0.5e-6, 0.0), 10.0);
        assert_eq!(i.eval(3.0e-6, 0.0), 20.0);
    }

    #[test]
    fn keyframes_extrapolate_extends_end_segments() {
        let i = Interp::Keyframes {
            dependence: Dependence::Wl,
            frames: vec![1.0, 2.0],
            values: vec![10.0, 20.0],
            extrapolate: true,
        };
        assert!((i.eval(3.0, 0.0) - 30.0).abs() < 1e-9);
        assert!((i.eval(0.0, 0.0) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn gaussian_bump_peaks_at_center() {
        let i = Interp::GaussianBump {
            dependence: Dependence::Wl,
            x0: 2.2e-6,
            fwhm: 0.1e-6,
            floor: 1.0,
            peak: 5.0,
        };
        assert!((i.eval(2.2e-6, 0.0) - 5.0).abs() < 1e-9);
        // At x0 ± fwhm/2 the bump is at half amplitude.
        let half = i.eval(2.2e-6 + 0.05e-6, 0.0);
        assert!((half - 3.0).abs() < 1e-9);
        // Far away it settles on the floor.
        assert!((i.eval(10.0e-6, 0.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn polynomial_evaluates_around_reference() {
        let i = Interp::Polynomial {
            dependence: Dependence::Mjd,
            x0: 60000.0,
            coeffs: vec![1.0, 2.0, 3.0], // 1 + 2x + 3x^2
        };
        assert!((i.eval(0.0, 60001.0) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn power_law_hits_scale_at_reference() {
        let i = Interp::PowerLaw {
            dependence: Dependence::Wl,
            x0: 2.0e-6,
            scale: 0.5,
            index: -4.0,
        };
        assert!((i.eval(2.0e-6, 0.0) - 0.5).abs() < 1e-12);
        assert!((i.eval(4.0e-6, 0.0) - 0.5 / 16.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_time_is_periodic() {
        let i = Interp::CosineTime {
            t0: 60000.0,
            period: 10.0,
            v0: 1.0,
            v1: 0.2,
            inflection: None,
        };
        assert!((i.eval(0.0, 60000.0) - 1.0).abs() < 1e-9);
        assert!((i.eval(0.0, 60005.0) - 0.2).abs() < 1e-9);
        assert!((i.eval(0.0, 60010.0) - 1.0).abs() < 1e-9);
        // Negative offsets wrap too.
        assert!((i.eval(0.0, 59995.0) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn free_values_round_trip_for_keyframes() {
        let mut i = Interp::Keyframes {
            dependence: Dependence::Wl,
            frames: vec![1.0, 2.0, 3.0],
            values: vec![5.0, 6.0, 7.0],
            extrapolate: false,
        };
        assert_eq!(i.n_free(), 3);
        let mut out = Vec::new();
        i.push_free_values(&mut out);
        assert_eq!(out, vec![5.0, 6.0, 7.0]);
        assert_eq!(i.set_free_values(&[1.0, 2.0, 3.0]), 3);
        let mut out = Vec::new();
        i.push_free_values(&mut out);
        assert_eq!(out, vec![1.0, 2.0, 3.0]);
    }
}
