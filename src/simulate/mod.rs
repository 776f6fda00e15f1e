//! Model observables at data coordinates, chi-square, residuals.
//!
//! The model's complex visibility is sampled exactly at each observation's
//! spatial frequency. Closure quantities come from the bispectrum over the
//! triangle's three legs. Chi-square runs over the selected observable
//! kinds only, skipping flagged points and points with non-finite values
//! or non-positive errors; phase residuals are wrapped to (-180, 180]
//! before squaring.

use num_complex::Complex64;
use rayon::prelude::*;

use crate::data::{DataSet, FluxPoint, T3Point, Vis2Point, VisPoint};
use crate::domain::{Chi2Breakdown, Chi2Entry, ObsResidual, ObservableKind};
use crate::math::{rad_to_deg, wrap_phase_deg};
use crate::model::Model;

/// Model squared visibility at a VIS2 point.
pub fn vis2_model(model: &Model, p: &Vis2Point) -> f64 {
    model.vis(p.u, p.v, p.wl, p.mjd).norm_sqr()
}

/// Model (amplitude, phase in degrees) at a VIS point.
pub fn vis_model(model: &Model, p: &VisPoint) -> (f64, f64) {
    let v = model.vis(p.u, p.v, p.wl, p.mjd);
    (v.norm(), rad_to_deg(v.arg()))
}

/// Model triple product at a T3 point: bispectrum
/// `V(u1,v1) V(u2,v2) conj(V(u1+u2, v1+v2))`, returned as (amplitude,
/// closure phase in degrees).
pub fn t3_model(model: &Model, p: &T3Point) -> (f64, f64) {
    let v1 = model.vis(p.u1, p.v1, p.wl, p.mjd);
    let v2 = model.vis(p.u2, p.v2, p.wl, p.mjd);
    let v3 = model.vis(p.u1 + p.u2, p.v1 + p.v2, p.wl, p.mjd);
    let bis: Complex64 = v1 * v2 * v3.conj();
    (bis.norm(), rad_to_deg(bis.arg()))
}

/// Model total flux at a FLUX point.
pub fn flux_model(model: &Model, p: &FluxPoint) -> f64 {
    model.total_flux(p.wl, p.mjd)
}

fn usable(observed: f64, error: f64, flag: bool) -> bool {
    !flag && observed.is_finite() && error.is_finite() && error > 0.0
}

/// Chi-square contribution of one point, already wrapped for phases.
fn point_chi2(observed: f64, modeled: f64, error: f64, phase: bool) -> f64 {
    let r = if phase {
        wrap_phase_deg(observed - modeled)
    } else {
        observed - modeled
    };
    (r / error) * (r / error)
}

/// Chi-square over the selected observables. The model's free-parameter
/// count feeds the reduced chi-square.
pub fn chi2(model: &Model, data: &DataSet, kinds: &[ObservableKind]) -> Chi2Breakdown {
    let entries = kinds
        .iter()
        .map(|&kind| {
            let (chi2, n) = match kind {
                ObservableKind::Vis2 => data
                    .vis2
                    .par_iter()
                    .filter(|p| usable(p.vis2, p.err, p.flag))
                    .map(|p| (point_chi2(p.vis2, vis2_model(model, p), p.err, false), 1usize))
                    .reduce(|| (0.0, 0), |a, b| (a.0 + b.0, a.1 + b.1)),
                ObservableKind::VisAmp => data
                    .vis
                    .par_iter()
                    .filter(|p| usable(p.visamp, p.visamp_err, p.flag))
                    .map(|p| {
                        let (amp, _) = vis_model(model, p);
                        (point_chi2(p.visamp, amp, p.visamp_err, false), 1usize)
                    })
                    .reduce(|| (0.0, 0), |a, b| (a.0 + b.0, a.1 + b.1)),
                ObservableKind::VisPhi => data
                    .vis
                    .par_iter()
                    .filter(|p| usable(p.visphi, p.visphi_err, p.flag))
                    .map(|p| {
                        let (_, phi) = vis_model(model, p);
                        (point_chi2(p.visphi, phi, p.visphi_err, true), 1usize)
                    })
                    .reduce(|| (0.0, 0), |a, b| (a.0 + b.0, a.1 + b.1)),
                ObservableKind::T3Phi => data
                    .t3
                    .par_iter()
                    .filter(|p| usable(p.t3phi, p.t3phi_err, p.flag))
                    .map(|p| {
                        let (_, phi) = t3_model(model, p);
                        (point_chi2(p.t3phi, phi, p.t3phi_err, true), 1usize)
                    })
                    .reduce(|| (0.0, 0), |a, b| (a.0 + b.0, a.1 + b.1)),
                ObservableKind::T3Amp => data
                    .t3
                    .par_iter()
                    .filter(|p| usable(p.t3amp, p.t3amp_err, p.flag))
                    .map(|p| {
                        let (amp, _) = t3_model(model, p);
                        (point_chi2(p.t3amp, amp, p.t3amp_err, false), 1usize)
                    })
                    .reduce(|| (0.0, 0), |a, b| (a.0 + b.0, a.1 + b.1)),
                ObservableKind::Flux => data
                    .flux
                    .par_iter()
                    .filter(|p| usable(p.flux, p.err, p.flag))
                    .map(|p| (point_chi2(p.flux, flux_model(model, p), p.err, false), 1usize))
                    .reduce(|| (0.0, 0), |a, b| (a.0 + b.0, a.1 + b.1)),
            };
            Chi2Entry { kind, chi2, n }
        })
        .collect();

    Chi2Breakdown {
        entries,
        n_free: model.n_free(),
    }
}

/// Per-point residuals over the selected observables, for rankings and
/// CSV export. Includes flagged/unusable points only when `keep_all`.
pub fn residuals(
    model: &Model,
    data: &DataSet,
    kinds: &[ObservableKind],
    keep_all: bool,
) -> Vec<ObsResidual> {
    let mut out = Vec::new();
    for &kind in kinds {
        match kind {
            ObservableKind::Vis2 => {
                for p in &data.vis2 {
                    if !keep_all && !usable(p.vis2, p.err, p.flag) {
                        continue;
                    }
                    let modeled = vis2_model(model, p);
                    out.push(ObsResidual {
                        kind,
                        baseline: p.baseline.clone(),
                        spatial_freq: (p.u * p.u + p.v * p.v).sqrt(),
                        wl: p.wl,
                        mjd: p.mjd,
                        observed: p.vis2,
                        model: modeled,
                        error: p.err,
                        residual: p.vis2 - modeled,
                    });
                }
            }
            ObservableKind::VisAmp | ObservableKind::VisPhi => {
                for p in &data.vis {
                    let (amp, phi) = vis_model(model, p);
                    let (observed, modeled, error, phase) = if kind == ObservableKind::VisAmp {
                        (p.visamp, amp, p.visamp_err, false)
                    } else {
                        (p.visphi, phi, p.visphi_err, true)
                    };
                    if !keep_all && !usable(observed, error, p.flag) {
                        continue;
                    }
                    let residual = if phase {
                        wrap_phase_deg(observed - modeled)
                    } else {
                        observed - modeled
                    };
                    out.push(ObsResidual {
                        kind,
                        baseline: p.baseline.clone(),
                        spatial_freq: (p.u * p.u + p.v * p.v).sqrt(),
                        wl: p.wl,
                        mjd: p.mjd,
                        observed,
                        model: modeled,
                        error,
                        residual,
                    });
                }
            }
            ObservableKind::T3Phi | ObservableKind::T3Amp => {
                for p in &data.t3 {
                    let (amp, phi) = t3_model(model, p);
                    let (observed, modeled, error, phase) = if kind == ObservableKind::T3Amp {
                        (p.t3amp, amp, p.t3amp_err, false)
                    } else {
                        (p.t3phi, phi, p.t3phi_err, true)
                    };
                    if !keep_all && !usable(observed, error, p.flag) {
                        continue;
                    }
                    let residual = if phase {
                        wrap_phase_deg(observed - modeled)
                    } else {
                        observed - modeled
                    };
                    let longest_leg = [
                        (p.u1, p.v1),
                        (p.u2, p.v2),
                        (p.u1 + p.u2, p.v1 + p.v2),
                    ]
                    .iter()
                    .map(|(u, v)| (u * u + v * v).sqrt())
                    .fold(0.0, f64::max);
                    out.push(ObsResidual {
                        kind,
                        baseline: p.triangle.clone(),
                        spatial_freq: longest_leg,
                        wl: p.wl,
                        mjd: p.mjd,
                        observed,
                        model: modeled,
                        error,
                        residual,
                    });
                }
            }
            ObservableKind::Flux => {
                for p in &data.flux {
                    if !keep_all && !usable(p.flux, p.err, p.flag) {
                        continue;
                    }
                    let modeled = flux_model(model, p);
                    out.push(ObsResidual {
                        kind,
                        baseline: String::new(),
                        spatial_freq: 0.0,
                        wl: p.wl,
                        mjd: p.mjd,
                        observed: p.flux,
                        model: modeled,
                        error: p.err,
                        residual: p.flux - modeled,
                    });
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Point, UniformDisk};

    const WL: f64 = 2.2e-6;
    const MJD: f64 = 60000.0;

    fn point_model() -> Model {
        let mut m = Model::new("pt");
        m.add(Box::new(Point::new()));
        m
    }

    fn vis2_point(u: f64, v: f64, vis2: f64, err: f64, flag: bool) -> Vis2Point {
        Vis2Point {
            u,
            v,
            base_m: (u * u + v * v).sqrt() * WL,
            wl: WL,
            mjd: MJD,
            vis2,
            err,
            flag,
            baseline: "A0-G1".into(),
        }
    }

    #[test]
    fn point_source_has_unit_vis2_everywhere() {
        let m = point_model();
        let p = vis2_point(5e7, -3e7, 1.0, 0.01, false);
        assert!((vis2_model(&m, &p) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn centered_symmetric_model_has_zero_closure_phase() {
        let mut m = Model::new("ud");
        let mut ud = UniformDisk::new();
        ud.d.value = 4.0;
        m.add(Box::new(ud));
        let p = T3Point {
            u1: 2e7,
            v1: 1e7,
            u2: -1e7,
            v2: 3e7,
            base_m: 100.0,
            wl: WL,
            mjd: MJD,
            t3amp: 0.0,
            t3amp_err: 0.0,
            t3phi: 0.0,
            t3phi_err: 0.0,
            flag: false,
            triangle: "A0-G1-J2".into(),
        };
        let (_, phi) = t3_model(&m, &p);
        // A centrosymmetric source: closure phase 0 or 180.
        assert!(phi.abs() < 1e-6 || (phi.abs() - 180.0).abs() < 1e-6);
    }

    #[test]
    fn offset_point_still_has_zero_closure_phase() {
        // A single shifted point source: position phases cancel around the
        // closed triangle.
        let mut m = Model::new("pt");
        let mut pt = Point::new();
        pt.x.value = 3.0;
        pt.y.value = -1.0;
        m.add(Box::new(pt));
        let p = T3Point {
            u1: 2e7,
            v1: 0.0,
            u2: 0.0,
            v2: 2e7,
            base_m: 100.0,
            wl: WL,
            mjd: MJD,
            t3amp: 0.0,
            t3amp_err: 0.0,
            t3phi: 0.0,
            t3phi_err: 0.0,
            flag: false,
            triangle: "A0-G1-J2".into(),
        };
        let (amp, phi) = t3_model(&m, &p);
        assert!((amp - 1.0).abs() < 1e-9);
        assert!(phi.abs() < 1e-6, "closure phase leaked: {phi}");
    }

    #[test]
    fn chi2_skips_flagged_and_bad_error_points() {
        let m = point_model();
        let data = DataSet {
            vis2: vec![
                vis2_point(1e7, 0.0, 0.9, 0.05, false),
                vis2_point(1e7, 0.0, 0.9, 0.05, true), // flagged
                vis2_point(1e7, 0.0, 0.9, 0.0, false), // zero error
                vis2_point(1e7, 0.0, f64::NAN, 0.05, false),
            ],
            ..DataSet::default()
        };
        let b = chi2(&m, &data, &[ObservableKind::Vis2]);
        assert_eq!(b.entries.len(), 1);
        assert_eq!(b.entries[0].n, 1);
        // (0.9 - 1.0)^2 / 0.05^2 = 4
        assert!((b.entries[0].chi2 - 4.0).abs() < 1e-9);
    }

    #[test]
    fn phase_residual_wraps_across_the_seam() {
        // observed 179, model -179: the residual is -2 degrees, not 358.
        assert!((point_chi2(179.0, -179.0, 1.0, true) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn residuals_report_observed_minus_model() {
        let m = point_model();
        let data = DataSet {
            vis2: vec![vis2_point(1e7, 0.0, 0.8, 0.05, false)],
            ..DataSet::default()
        };
        let rs = residuals(&m, &data, &[ObservableKind::Vis2], false);
        assert_eq!(rs.len(), 1);
        assert!((rs[0].residual - (-0.2)).abs() < 1e-9);
        assert_eq!(rs[0].baseline, "A0-G1");
    }
}
