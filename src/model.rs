//! Model: an ordered collection of components.
//!
//! The model's complex visibility is the flux-weighted sum of its
//! components' normalized visibilities, divided by the total flux, so that
//! the model VIS2 at zero baseline is 1.
//!
//! The model also owns the flat free-parameter vector used by the sampler:
//! components in model order, each component's free parameters in
//! declaration order. `free_values` / `set_free_values` round-trip.
//!
//! Two cross-parameter constraints are handled at the model level (the
//! constrained parameter is forced fixed so it never enters the sampler):
//!
//! - [`ParamLink`]: a parameter mirrors another via `+ factor` or
//!   `× factor` (e.g. a companion pinned at an offset from a primary)
//! - flux normalization: one component's `f` is set to `1 - Σ others`

use num_complex::Complex64;

use crate::components::Component;
use crate::error::AppError;
use crate::params::Param;

/// How a linked parameter follows its source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinkOp {
    Add,
    Mult,
}

/// A value-level link between two parameters, addressed by
/// (component index, parameter name).
#[derive(Debug, Clone)]
pub struct ParamLink {
    pub target: (usize, String),
    pub source: (usize, String),
    pub op: LinkOp,
    pub factor: f64,
}

/// A composite source model.
pub struct Model {
    pub name: String,
    pub components: Vec<Box<dyn Component>>,
    links: Vec<ParamLink>,
    /// Component whose flux absorbs `1 - Σ other fluxes`.
    normalized_flux: Option<usize>,
}

impl Clone for Model {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            components: self.components.clone(),
            links: self.links.clone(),
            normalized_flux: self.normalized_flux,
        }
    }
}

// Manual impl because `dyn Component` is not `Debug`; component codes are
// enough to identify a model in test output.
impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field(
                "components",
                &self.components.iter().map(|c| c.code()).collect::<Vec<_>>(),
            )
            .field("links", &self.links)
            .field("normalized_flux", &self.normalized_flux)
            .finish()
    }
}

impl Model {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            components: Vec::new(),
            links: Vec::new(),
            normalized_flux: None,
        }
    }

    pub fn add(&mut self, component: Box<dyn Component>) -> &mut Self {
        self.components.push(component);
        self
    }

    /// Register a link; the target parameter is forced fixed.
    pub fn add_link(&mut self, link: ParamLink) -> Result<(), AppError> {
        let (ci, name) = (link.target.0, link.target.1.clone());
        let target = self
            .param_mut(ci, &name)
            .ok_or_else(|| AppError::new(2, format!("Unknown link target: c{}.{}", ci + 1, name)))?;
        target.free = false;
        if self.param(link.source.0, &link.source.1).is_none() {
            return Err(AppError::new(
                2,
                format!(
                    "Unknown link source: c{}.{}",
                    link.source.0 + 1,
                    link.source.1
                ),
            ));
        }
        self.links.push(link);
        self.apply_constraints();
        Ok(())
    }

    /// Make component `idx` absorb the remaining flux; its `f` is forced
    /// fixed and recomputed whenever the free vector changes.
    pub fn normalize_total_flux(&mut self, idx: usize) -> Result<(), AppError> {
        let f = self
            .param_mut(idx, "f")
            .ok_or_else(|| AppError::new(2, format!("No component {} for flux normalization", idx + 1)))?;
        f.free = false;
        self.normalized_flux = Some(idx);
        self.apply_constraints();
        Ok(())
    }

    pub fn links(&self) -> &[ParamLink] {
        &self.links
    }

    pub fn normalized_flux(&self) -> Option<usize> {
        self.normalized_flux
    }

    pub fn param(&self, comp: usize, name: &str) -> Option<&Param> {
        self.components
            .get(comp)?
            .params()
            .into_iter()
            .find(|p| p.name == name)
    }

    pub fn param_mut(&mut self, comp: usize, name: &str) -> Option<&mut Param> {
        self.components
            .get_mut(comp)?
            .params_mut()
            .into_iter()
            .find(|p| p.name == name)
    }

    /// Total flux at (wavelength, MJD).
    pub fn total_flux(&self, wl: f64, mjd: f64) -> f64 {
        self.components.iter().map(|c| c.flux(wl, mjd)).sum()
    }

    /// Flux-weighted, normalized complex visibility.
    pub fn vis(&self, u: f64, v: f64, wl: f64, mjd: f64) -> Complex64 {
        let total = self.total_flux(wl, mjd);
        if !(total.is_finite() && total > 0.0) {
            return Complex64::new(0.0, 0.0);
        }
        let mut acc = Complex64::new(0.0, 0.0);
        for c in &self.components {
            let f = c.flux(wl, mjd);
            if f == 0.0 {
                continue;
            }
            acc += c.vis(u, v, wl, mjd) * f;
        }
        acc / total
    }

    pub fn n_free(&self) -> usize {
        self.components
            .iter()
            .flat_map(|c| c.params())
            .map(|p| p.n_free())
            .sum()
    }

    /// Current free values, in stable order.
    pub fn free_values(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.n_free());
        for c in &self.components {
            for p in c.params() {
                p.push_free_values(&mut out);
            }
        }
        out
    }

    /// (min, max) per free value, aligned with `free_values`.
    pub fn free_bounds(&self) -> Vec<(f64, f64)> {
        let mut out = Vec::with_capacity(self.n_free());
        for c in &self.components {
            for p in c.params() {
                for _ in 0..p.n_free() {
                    out.push(p.bounds());
                }
            }
        }
        out
    }

    /// Human-readable labels aligned with `free_values`, e.g. "c1.ud.d".
    pub fn free_labels(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.n_free());
        for (ci, c) in self.components.iter().enumerate() {
            for p in c.params() {
                let n = p.n_free();
                if n == 1 {
                    out.push(format!("c{}.{}.{}", ci + 1, c.code(), p.name));
                } else {
                    for k in 0..n {
                        out.push(format!("c{}.{}.{}[{}]", ci + 1, c.code(), p.name, k));
                    }
                }
            }
        }
        out
    }

    /// Write a flat value vector back into the free parameters, then
    /// re-apply links and flux normalization.
    pub fn set_free_values(&mut self, values: &[f64]) -> Result<(), AppError> {
        let expected = self.n_free();
        if values.len() != expected {
            return Err(AppError::new(
                4,
                format!(
                    "Free vector length mismatch: got {}, model has {expected}",
                    values.len()
                ),
            ));
        }
        let mut offset = 0;
        for c in &mut self.components {
            for p in c.params_mut() {
                offset += p.set_free_values(&values[offset..]);
            }
        }
        self.apply_constraints();
        Ok(())
    }

    /// Write per-parameter 1-sigma errors, aligned with `free_values`.
    /// Interpolated parameters receive the largest error among their values.
    pub fn set_free_errors(&mut self, errors: &[f64]) {
        let mut offset = 0;
        for c in &mut self.components {
            for p in c.params_mut() {
                let n = p.n_free();
                if n == 0 {
                    continue;
                }
                p.error = errors[offset..offset + n]
                    .iter()
                    .copied()
                    .fold(0.0, f64::max);
                offset += n;
            }
        }
    }

    /// True when every entry lies within its parameter bounds.
    pub fn within_bounds(&self, values: &[f64]) -> bool {
        let bounds = self.free_bounds();
        values.len() == bounds.len()
            && values
                .iter()
                .zip(bounds.iter())
                .all(|(v, (lo, hi))| v.is_finite() && *v >= *lo && *v <= *hi)
    }

    /// Re-apply value-level links and flux normalization.
    fn apply_constraints(&mut self) {
        let links = self.links.clone();
        for link in links {
            let Some(src) = self.param(link.source.0, &link.source.1) else {
                continue;
            };
            let v = match link.op {
                LinkOp::Add => src.value + link.factor,
                LinkOp::Mult => src.value * link.factor,
            };
            if let Some(dst) = self.param_mut(link.target.0, &link.target.1) {
                dst.value = v;
            }
        }

        if let Some(idx) = self.normalized_flux {
            let others: f64 = self
                .components
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .filter_map(|(i, _)| self.param(i, "f"))
                .map(|p| p.value)
                .sum();
            if let Some(f) = self.param_mut(idx, "f") {
                f.value = (1.0 - others).max(0.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Background, Gaussian, Point, UniformDisk};

    const WL: f64 = 2.2e-6;
    const MJD: f64 = 60000.0;

    fn binary() -> Model {
        let mut m = Model::new("binary");
        let mut ud = UniformDisk::new();
        ud.d.value = 3.0;
        ud.f.value = 0.7;
        let mut pt = Point::new();
        pt.x.value = 5.0;
        pt.x.free = true;
        pt.f.value = 0.3;
        m.add(Box::new(ud));
        m.add(Box::new(pt));
        m
    }

    #[test]
    fn zero_baseline_vis2_is_one() {
        let m = binary();
        let v = m.vis(0.0, 0.0, WL, MJD);
        assert!((v.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn background_lowers_visibility_everywhere() {
        let mut with_bg = Model::new("g+bg");
        let mut g = Gaussian::new();
        g.fwhm.value = 2.0;
        g.f.value = 0.8;
        let mut bg = Background::new();
        bg.f.value = 0.2;
        with_bg.add(Box::new(g)).add(Box::new(bg));

        let mut alone = Model::new("g");
        let mut g = Gaussian::new();
        g.fwhm.value = 2.0;
        g.f.value = 1.0;
        alone.add(Box::new(g));

        let v_bg = with_bg.vis(2e7, 0.0, WL, MJD).norm();
        let v = alone.vis(2e7, 0.0, WL, MJD).norm();
        assert!(v_bg < v);
        assert!((v_bg - 0.8 * v).abs() < 1e-12);
    }

    #[test]
    fn free_vector_round_trips() {
        let mut m = binary();
        let labels = m.free_labels();
        let values = m.free_values();
        assert_eq!(labels.len(), values.len());
        assert_eq!(m.n_free(), values.len());
        // Free by default: both fluxes, ud diameter, and the freed pt.x.
        assert!(labels.contains(&"c1.ud.d".to_string()));
        assert!(labels.contains(&"c2.pt.x".to_string()));

        let mut bumped = values.clone();
        for v in &mut bumped {
            *v += 0.01;
        }
        m.set_free_values(&bumped).unwrap();
        let got = m.free_values();
        for (a, b) in got.iter().zip(bumped.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn set_free_values_rejects_wrong_length() {
        let mut m = binary();
        let err = m.set_free_values(&[1.0]).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn flux_normalization_tracks_other_components() {
        let mut m = binary();
        m.normalize_total_flux(1).unwrap();
        // pt.f is now fixed and absorbs 1 - ud.f.
        assert!(!m.param(1, "f").unwrap().free);
        assert!((m.param(1, "f").unwrap().value - 0.3).abs() < 1e-12);

        // Change ud.f through the free vector; pt.f follows.
        let labels = m.free_labels();
        let mut values = m.free_values();
        let fi = labels.iter().position(|l| l == "c1.ud.f").unwrap();
        values[fi] = 0.55;
        m.set_free_values(&values).unwrap();
        assert!((m.param(1, "f").unwrap().value - 0.45).abs() < 1e-12);
        assert!((m.total_flux(WL, MJD) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn linked_param_follows_source() {
        let mut m = binary();
        // Pin the point source 2 mas east of the disk center.
        m.param_mut(0, "x").unwrap().free = true;
        m.add_link(ParamLink {
            target: (1, "x".to_string()),
            source: (0, "x".to_string()),
            op: LinkOp::Add,
            factor: 2.0,
        })
        .unwrap();

        assert!(!m.param(1, "x").unwrap().free);
        assert!((m.param(1, "x").unwrap().value - 2.0).abs() < 1e-12);

        let labels = m.free_labels();
        let mut values = m.free_values();
        let xi = labels.iter().position(|l| l == "c1.ud.x").unwrap();
        values[xi] = 1.5;
        m.set_free_values(&values).unwrap();
        assert!((m.param(1, "x").unwrap().value - 3.5).abs() < 1e-12);
    }

    #[test]
    fn debug_output_names_components() {
        // Models end up in assertion messages (`unwrap_err` and friends),
        // so the Debug form must exist and identify the components.
        let dbg = format!("{:?}", binary());
        assert!(dbg.contains("binary"));
        assert!(dbg.contains("ud"));
        assert!(dbg.contains("pt"));
    }

    #[test]
    fn bounds_guard_detects_violations() {
        let m = binary();
        let mut values = m.free_values();
        assert!(m.within_bounds(&values));
        // Fluxes are bounded to [0, 1].
        let labels = m.free_labels();
        let fi = labels.iter().position(|l| l == "c1.ud.f").unwrap();
        values[fi] = 1.5;
        assert!(!m.within_bounds(&values));
    }
}
