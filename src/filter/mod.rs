//! Dataset filters.
//!
//! Filters select subsets of a dataset by wavelength, time, projected
//! baseline length, observable kind, or flag status. They never mutate the
//! input: each application returns a filtered copy, so the original loaded
//! data stays available for comparison plots.

use crate::data::DataSet;
use crate::domain::{ObservableKind, RunConfig};

/// One selection criterion.
#[derive(Debug, Clone)]
pub enum DataFilter {
    /// Keep points with wavelength in [min, max], meters.
    WavelengthRange { min: f64, max: f64 },
    /// Keep points with MJD in [min, max].
    MjdRange { min: f64, max: f64 },
    /// Keep points whose projected baseline (longest leg for triangles)
    /// lies in [min, max], meters. Flux points have no baseline and pass.
    BaselineRange { min: f64, max: f64 },
    /// Keep only the listed observable kinds (drops whole point vectors).
    Observables(Vec<ObservableKind>),
    /// Drop flagged points.
    RemoveFlagged,
}

impl DataFilter {
    pub fn apply(&self, data: &DataSet) -> DataSet {
        let mut out = data.clone();
        match self {
            DataFilter::WavelengthRange { min, max } => {
                out.vis2.retain(|p| p.wl >= *min && p.wl <= *max);
                out.vis.retain(|p| p.wl >= *min && p.wl <= *max);
                out.t3.retain(|p| p.wl >= *min && p.wl <= *max);
                out.flux.retain(|p| p.wl >= *min && p.wl <= *max);
            }
            DataFilter::MjdRange { min, max } => {
                out.vis2.retain(|p| p.mjd >= *min && p.mjd <= *max);
                out.vis.retain(|p| p.mjd >= *min && p.mjd <= *max);
                out.t3.retain(|p| p.mjd >= *min && p.mjd <= *max);
                out.flux.retain(|p| p.mjd >= *min && p.mjd <= *max);
            }
            DataFilter::BaselineRange { min, max } => {
                out.vis2.retain(|p| p.base_m >= *min && p.base_m <= *max);
                out.vis.retain(|p| p.base_m >= *min && p.base_m <= *max);
                out.t3.retain(|p| p.base_m >= *min && p.base_m <= *max);
            }
            DataFilter::Observables(kinds) => {
                if !kinds.contains(&ObservableKind::Vis2) {
                    out.vis2.clear();
                }
                if !kinds.contains(&ObservableKind::VisAmp)
                    && !kinds.contains(&ObservableKind::VisPhi)
                {
                    out.vis.clear();
                }
                if !kinds.contains(&ObservableKind::T3Phi)
                    && !kinds.contains(&ObservableKind::T3Amp)
                {
                    out.t3.clear();
                }
                if !kinds.contains(&ObservableKind::Flux) {
                    out.flux.clear();
                }
            }
            DataFilter::RemoveFlagged => {
                out.vis2.retain(|p| !p.flag);
                out.vis.retain(|p| !p.flag);
                out.t3.retain(|p| !p.flag);
                out.flux.retain(|p| !p.flag);
            }
        }
        out
    }
}

/// Apply a filter chain in order.
pub fn apply_filters(data: &DataSet, filters: &[DataFilter]) -> DataSet {
    let mut out = data.clone();
    for f in filters {
        out = f.apply(&out);
    }
    out
}

/// The filter chain implied by a run configuration. Half-open windows use
/// infinite defaults on the missing side.
pub fn filters_from_config(cfg: &RunConfig) -> Vec<DataFilter> {
    let mut filters = Vec::new();
    if cfg.wl_min.is_some() || cfg.wl_max.is_some() {
        filters.push(DataFilter::WavelengthRange {
            min: cfg.wl_min.unwrap_or(0.0),
            max: cfg.wl_max.unwrap_or(f64::INFINITY),
        });
    }
    if cfg.mjd_min.is_some() || cfg.mjd_max.is_some() {
        filters.push(DataFilter::MjdRange {
            min: cfg.mjd_min.unwrap_or(f64::NEG_INFINITY),
            max: cfg.mjd_max.unwrap_or(f64::INFINITY),
        });
    }
    if cfg.baseline_min.is_some() || cfg.baseline_max.is_some() {
        filters.push(DataFilter::BaselineRange {
            min: cfg.baseline_min.unwrap_or(0.0),
            max: cfg.baseline_max.unwrap_or(f64::INFINITY),
        });
    }
    if !cfg.keep_flagged {
        filters.push(DataFilter::RemoveFlagged);
    }
    filters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{T3Point, Vis2Point};

    fn sample() -> DataSet {
        let v2 = |wl: f64, mjd: f64, base: f64, flag: bool| Vis2Point {
            u: base / wl,
            v: 0.0,
            base_m: base,
            wl,
            mjd,
            vis2: 0.5,
            err: 0.01,
            flag,
            baseline: "A0-G1".into(),
        };
        let t3 = |wl: f64| T3Point {
            u1: 1e7,
            v1: 0.0,
            u2: 0.0,
            v2: 1e7,
            base_m: 80.0,
            wl,
            mjd: 60000.0,
            t3amp: 0.4,
            t3amp_err: 0.02,
            t3phi: 5.0,
            t3phi_err: 1.0,
            flag: false,
            triangle: "A0-G1-J2".into(),
        };
        DataSet {
            vis2: vec![
                v2(2.0e-6, 60000.0, 40.0, false),
                v2(2.2e-6, 60001.0, 90.0, false),
                v2(2.4e-6, 60002.0, 130.0, true),
            ],
            t3: vec![t3(2.0e-6), t3(2.4e-6)],
            ..DataSet::default()
        }
    }

    #[test]
    fn wavelength_window_drops_outside_points() {
        let ds = sample();
        let got = DataFilter::WavelengthRange {
            min: 2.1e-6,
            max: 2.3e-6,
        }
        .apply(&ds);
        assert_eq!(got.vis2.len(), 1);
        assert!(got.t3.is_empty());
        // Original untouched.
        assert_eq!(ds.vis2.len(), 3);
    }

    #[test]
    fn flag_filter_removes_flagged_only() {
        let got = DataFilter::RemoveFlagged.apply(&sample());
        assert_eq!(got.vis2.len(), 2);
        assert_eq!(got.t3.len(), 2);
    }

    #[test]
    fn baseline_window_spares_flux() {
        let mut ds = sample();
        ds.flux.push(crate::data::FluxPoint {
            wl: 2.0e-6,
            mjd: 60000.0,
            flux: 1.0,
            err: 0.1,
            flag: false,
        });
        let got = DataFilter::BaselineRange {
            min: 50.0,
            max: 100.0,
        }
        .apply(&ds);
        assert_eq!(got.vis2.len(), 1);
        assert_eq!(got.flux.len(), 1);
    }

    #[test]
    fn observable_selection_clears_vectors() {
        let got =
            DataFilter::Observables(vec![crate::domain::ObservableKind::T3Phi]).apply(&sample());
        assert!(got.vis2.is_empty());
        assert_eq!(got.t3.len(), 2);
    }

    #[test]
    fn config_chain_order_and_content() {
        let cfg = RunConfig {
            wl_min: Some(2.1e-6),
            mjd_max: Some(60001.5),
            ..RunConfig::default()
        };
        let filters = filters_from_config(&cfg);
        // wl window, mjd window, and the default flag removal.
        assert_eq!(filters.len(), 3);
        let got = apply_filters(&sample(), &filters);
        assert_eq!(got.vis2.len(), 1);
        assert_eq!(got.t3.len(), 1);
    }
}
