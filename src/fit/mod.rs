//! Model fitting with the ensemble sampler.
//!
//! The posterior is `lnp = -chi2/2` over the selected observables, with
//! `-inf` outside the parameter bounds. Walkers start in a tight Gaussian
//! ball around the model's current free values, clipped into bounds. After
//! sampling, the model is updated in place: free values become the
//! per-dimension posterior medians and parameter errors the half-width of
//! the 16th-84th percentile interval.

pub mod sampler;

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::data::DataSet;
use crate::domain::{ObservableKind, RunConfig};
use crate::error::AppError;
use crate::math::percentile;
use crate::model::Model;
use crate::simulate;
pub use sampler::Chain;

/// Sampler settings, resolved from a run configuration.
#[derive(Debug, Clone)]
pub struct FitSettings {
    /// 0 means auto: max(2 * n_free, 16), rounded up to even.
    pub walkers: usize,
    pub steps: usize,
    pub burn: usize,
    pub thin: usize,
    pub seed: u64,
    pub stretch_a: f64,
}

impl FitSettings {
    pub fn from_config(cfg: &RunConfig) -> Self {
        Self {
            walkers: cfg.walkers,
            steps: cfg.steps,
            burn: cfg.burn,
            thin: cfg.thin,
            seed: cfg.seed,
            stretch_a: cfg.stretch_a,
        }
    }

    /// Walker count for a model with `n_free` dimensions. The stretch move
    /// needs at least 2 walkers per dimension and an even total.
    pub fn resolve_walkers(&self, n_free: usize) -> usize {
        let floor = (2 * n_free).max(16);
        let n = if self.walkers == 0 {
            floor
        } else {
            self.walkers.max(floor)
        };
        n + n % 2
    }
}

/// Posterior summary for one free dimension.
#[derive(Debug, Clone)]
pub struct ParamSummary {
    pub label: String,
    pub median: f64,
    /// median - 16th percentile.
    pub minus: f64,
    /// 84th percentile - median.
    pub plus: f64,
    pub best: f64,
}

/// Everything a fit run produces.
#[derive(Debug)]
pub struct FitOutcome {
    pub chain: Chain,
    pub summaries: Vec<ParamSummary>,
    pub best: Vec<f64>,
    pub best_lnprob: f64,
    /// Sample covariance of the retained chain, n_free x n_free.
    pub covariance: DMatrix<f64>,
}

/// Run the sampler and write the posterior medians (and errors) back into
/// the model.
pub fn run_fit(
    model: &mut Model,
    data: &DataSet,
    kinds: &[ObservableKind],
    settings: &FitSettings,
) -> Result<FitOutcome, AppError> {
    let n_free = model.n_free();
    if n_free == 0 {
        return Err(AppError::new(2, "model has no free parameters to fit"));
    }
    if data.n_points() == 0 {
        return Err(AppError::new(3, "no data points left to fit against"));
    }
    if settings.steps == 0 || settings.burn >= settings.steps {
        return Err(AppError::new(
            2,
            format!(
                "need steps > burn (got steps={}, burn={})",
                settings.steps, settings.burn
            ),
        ));
    }

    let n_walkers = settings.resolve_walkers(n_free);
    let init = initial_ball(model, n_walkers, settings.seed)?;

    let base = model.clone();
    let lnprob = |values: &[f64]| -> f64 {
        if !base.within_bounds(values) {
            return f64::NEG_INFINITY;
        }
        let mut m = base.clone();
        if m.set_free_values(values).is_err() {
            return f64::NEG_INFINITY;
        }
        let chi2 = simulate::chi2(&m, data, kinds).total();
        if !chi2.is_finite() {
            return f64::NEG_INFINITY;
        }
        -0.5 * chi2
    };

    let chain = sampler::run(
        init,
        lnprob,
        settings.steps,
        settings.burn,
        settings.thin,
        settings.stretch_a,
        settings.seed,
    );
    if chain.samples.is_empty() {
        return Err(AppError::new(4, "sampler retained no samples"));
    }

    let (best, best_lnprob) = chain
        .best()
        .map(|(s, lp)| (s.to_vec(), lp))
        .ok_or_else(|| AppError::new(4, "no finite-probability sample in the chain"))?;

    let labels = model.free_labels();
    let mut medians = Vec::with_capacity(n_free);
    let mut errors = Vec::with_capacity(n_free);
    let mut summaries = Vec::with_capacity(n_free);
    for d in 0..n_free {
        let vals = chain.dim_values(d);
        let med = percentile(&vals, 50.0)
            .ok_or_else(|| AppError::new(4, "empty posterior for a free parameter"))?;
        let p16 = percentile(&vals, 16.0).unwrap_or(med);
        let p84 = percentile(&vals, 84.0).unwrap_or(med);
        medians.push(med);
        errors.push(0.5 * (p84 - p16));
        summaries.push(ParamSummary {
            label: labels[d].clone(),
            median: med,
            minus: med - p16,
            plus: p84 - med,
            best: best[d],
        });
    }

    model.set_free_values(&medians)?;
    model.set_free_errors(&errors);

    let covariance = chain_covariance(&chain, &medians);

    Ok(FitOutcome {
        chain,
        summaries,
        best,
        best_lnprob,
        covariance,
    })
}

/// Gaussian ball around the model's current free values, clipped to stay
/// strictly inside the bounds.
fn initial_ball(model: &Model, n_walkers: usize, seed: u64) -> Result<Vec<Vec<f64>>, AppError> {
    let center = model.free_values();
    let bounds = model.free_bounds();
    for (c, (lo, hi)) in center.iter().zip(&bounds) {
        if !(c >= lo && c <= hi) {
            return Err(AppError::new(
                2,
                format!("starting value {c} outside its bounds [{lo}, {hi}]"),
            ));
        }
    }

    // Separate stream from the sampler's proposals.
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(0x9e37_79b9));
    let mut walkers = Vec::with_capacity(n_walkers);
    for _ in 0..n_walkers {
        let mut w = Vec::with_capacity(center.len());
        for (d, &c) in center.iter().enumerate() {
            // Stretch-move step sizes scale with the ensemble spread, so a
            // too-tight ball leaves the chain crawling for hundreds of
            // steps before it can reach an optimum a few units away.
            let scale = (0.1 * c.abs()).max(0.01);
            let dist = Normal::new(c, scale)
                .map_err(|e| AppError::new(4, format!("walker init failed: {e}")))?;
            let (lo, hi) = bounds[d];
            let mut v = dist.sample(&mut rng);
            if v < lo || v > hi {
                v = c;
            }
            w.push(v);
        }
        walkers.push(w);
    }
    Ok(walkers)
}

fn chain_covariance(chain: &Chain, means: &[f64]) -> DMatrix<f64> {
    let d = chain.n_dim;
    let n = chain.samples.len();
    let mut cov = DMatrix::zeros(d, d);
    if n < 2 {
        return cov;
    }
    for s in &chain.samples {
        for i in 0..d {
            for j in 0..d {
                cov[(i, j)] += (s[i] - means[i]) * (s[j] - means[j]);
            }
        }
    }
    cov / (n as f64 - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::UniformDisk;
    use crate::data::synthetic::{generate, SynthConfig};

    fn disk_model(d: f64, free_flux: bool) -> Model {
        let mut m = Model::new("disk");
        let mut ud = UniformDisk::new();
        ud.d.value = d;
        ud.f.value = 1.0;
        ud.f.free = free_flux;
        m.add(Box::new(ud));
        m
    }

    #[test]
    fn walker_resolution_is_even_and_covers_dims() {
        let s = FitSettings {
            walkers: 0,
            steps: 10,
            burn: 1,
            thin: 1,
            seed: 1,
            stretch_a: 2.0,
        };
        assert_eq!(s.resolve_walkers(3), 16);
        assert_eq!(s.resolve_walkers(10), 20);
        let s = FitSettings { walkers: 17, ..s };
        assert_eq!(s.resolve_walkers(3), 18);
    }

    #[test]
    fn rejects_model_without_free_parameters() {
        let mut m = disk_model(3.0, false);
        for p in m.components[0].params_mut() {
            p.free = false;
        }
        let data = generate(&disk_model(3.0, false), &SynthConfig::default()).unwrap();
        let settings = FitSettings {
            walkers: 0,
            steps: 10,
            burn: 1,
            thin: 1,
            seed: 1,
            stretch_a: 2.0,
        };
        let err = run_fit(&mut m, &data, &ObservableKind::default_set(), &settings).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn recovers_a_disk_diameter() {
        // Truth: 3 mas disk. Start the fit from 2 mas with only the
        // diameter free.
        let truth = disk_model(3.0, false);
        let data = generate(
            &truth,
            &SynthConfig {
                vis2_err: 0.005,
                ..SynthConfig::default()
            },
        )
        .unwrap();

        let mut m = disk_model(2.0, false);
        for p in m.components[0].params_mut() {
            p.free = p.name == "d";
        }
        let settings = FitSettings {
            walkers: 16,
            steps: 300,
            burn: 100,
            thin: 1,
            seed: 7,
            stretch_a: 2.0,
        };
        let out = run_fit(&mut m, &data, &[ObservableKind::Vis2], &settings).unwrap();

        let d = m.param(0, "d").unwrap();
        assert!((d.value - 3.0).abs() < 0.1, "fitted d = {}", d.value);
        assert!(d.error > 0.0);
        assert_eq!(out.summaries.len(), 1);
        assert_eq!(out.summaries[0].label, "c1.ud.d");
        assert!(out.covariance[(0, 0)] > 0.0);
    }

    #[test]
    fn fits_are_reproducible_for_a_seed() {
        let truth = disk_model(3.0, false);
        let data = generate(&truth, &SynthConfig::default()).unwrap();
        let settings = FitSettings {
            walkers: 16,
            steps: 60,
            burn: 20,
            thin: 1,
            seed: 5,
            stretch_a: 2.0,
        };

        let mut m1 = disk_model(2.5, false);
        for p in m1.components[0].params_mut() {
            p.free = p.name == "d";
        }
        let mut m2 = m1.clone();

        let a = run_fit(&mut m1, &data, &[ObservableKind::Vis2], &settings).unwrap();
        let b = run_fit(&mut m2, &data, &[ObservableKind::Vis2], &settings).unwrap();
        assert_eq!(a.chain.samples, b.chain.samples);
        assert_eq!(
            m1.param(0, "d").unwrap().value,
            m2.param(0, "d").unwrap().value
        );
    }
}
