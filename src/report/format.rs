//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{Chi2Breakdown, DatasetStats, ObsResidual};
use crate::fit::FitOutcome;
use crate::model::Model;

/// Format the full run summary (dataset stats + chi-square + model).
pub fn format_run_summary(
    stats: &DatasetStats,
    breakdown: &Chi2Breakdown,
    model: &Model,
) -> String {
    let mut out = String::new();

    out.push_str("=== oifit - Interferometric Model Comparison ===\n");
    out.push_str(&format!("Model: {}\n", model.name));
    out.push_str(&format!(
        "Points: VIS2={} VIS={} T3={} FLUX={}\n",
        stats.n_vis2, stats.n_vis, stats.n_t3, stats.n_flux
    ));
    let dates = match (
        crate::math::mjd_to_date(stats.mjd_min),
        crate::math::mjd_to_date(stats.mjd_max),
    ) {
        (Some(a), Some(b)) => format!(" ({a} to {b})"),
        _ => String::new(),
    };
    out.push_str(&format!(
        "Wavelength: [{:.3}, {:.3}] um | MJD: [{:.2}, {:.2}]{dates} | Baseline: [{:.1}, {:.1}] m\n",
        stats.wl_min * 1e6,
        stats.wl_max * 1e6,
        stats.mjd_min,
        stats.mjd_max,
        stats.baseline_min,
        stats.baseline_max
    ));

    out.push_str("\nChi-square:\n");
    for e in &breakdown.entries {
        let reduced = if e.n > 0 { e.chi2 / e.n as f64 } else { 0.0 };
        out.push_str(&format!(
            "  {:<8} chi2={:<12.3} n={:<6} chi2/n={:.3}\n",
            e.kind.label(),
            e.chi2,
            e.n,
            reduced
        ));
    }
    out.push_str(&format!(
        "  total    chi2={:.3} n={} n_free={} reduced={:.3}\n",
        breakdown.total(),
        breakdown.n_points(),
        breakdown.n_free,
        breakdown.reduced()
    ));

    out.push_str("\nModel parameters:\n");
    for (ci, c) in model.components.iter().enumerate() {
        out.push_str(&format!(
            "- c{} {} ({})\n",
            ci + 1,
            c.code(),
            c.kind().display_name()
        ));
        for p in c.params() {
            out.push_str(&format!("    {p}\n"));
        }
    }
    out.push('\n');

    out
}

/// Format the sampler diagnostics and per-parameter posterior table.
pub fn format_fit_summary(outcome: &FitOutcome) -> String {
    let mut out = String::new();

    out.push_str("Fit diagnostics:\n");
    out.push_str(&format!(
        "  walkers={} samples={} acceptance={:.3} best_lnprob={:.3}\n",
        outcome.chain.n_walkers,
        outcome.chain.samples.len(),
        outcome.chain.acceptance,
        outcome.best_lnprob
    ));

    out.push_str("\nPosterior (median, 16th-84th percentile):\n");
    out.push_str(&format!(
        "{:<20} {:>12} {:>10} {:>10} {:>12}\n",
        "parameter", "median", "-err", "+err", "best"
    ));
    for s in &outcome.summaries {
        out.push_str(&format!(
            "{:<20} {:>12.5} {:>10.5} {:>10.5} {:>12.5}\n",
            s.label, s.median, s.minus, s.plus, s.best
        ));
    }
    out.push('\n');

    out
}

/// Format the worst-fitting points table.
pub fn format_worst_table(rows: &[ObsResidual]) -> String {
    let mut out = String::new();

    out.push_str("Worst-fitting points (|residual/error|):\n");
    out.push_str(&format!(
        "{:<8} {:<16} {:>10} {:>10} {:>10} {:>10} {:>8}\n",
        "kind", "baseline", "wl[um]", "obs", "model", "residual", "sigma"
    ));
    for r in rows {
        let sigma = if r.error > 0.0 {
            format!("{:.1}", (r.residual / r.error).abs())
        } else {
            "-".to_string()
        };
        out.push_str(&format!(
            "{:<8} {:<16} {:>10.3} {:>10.4} {:>10.4} {:>10.4} {:>8}\n",
            r.kind.label(),
            truncate(&r.baseline, 16),
            r.wl * 1e6,
            r.observed,
            r.model,
            r.residual,
            sigma
        ));
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::UniformDisk;
    use crate::domain::{Chi2Entry, ObservableKind};

    #[test]
    fn run_summary_mentions_totals_and_params() {
        let stats = DatasetStats {
            n_vis2: 120,
            n_t3: 80,
            wl_min: 2.0e-6,
            wl_max: 2.4e-6,
            mjd_min: 60000.0,
            mjd_max: 60000.1,
            baseline_min: 30.0,
            baseline_max: 130.0,
            ..DatasetStats::default()
        };
        let breakdown = Chi2Breakdown {
            entries: vec![
                Chi2Entry {
                    kind: ObservableKind::Vis2,
                    chi2: 130.0,
                    n: 120,
                },
                Chi2Entry {
                    kind: ObservableKind::T3Phi,
                    chi2: 75.0,
                    n: 80,
                },
            ],
            n_free: 2,
        };
        let mut model = Model::new("disk");
        let mut ud = UniformDisk::new();
        ud.d.value = 3.0;
        model.add(Box::new(ud));

        let s = format_run_summary(&stats, &breakdown, &model);
        assert!(s.contains("VIS2"));
        assert!(s.contains("T3PHI"));
        assert!(s.contains("chi2=205.000"));
        assert!(s.contains("c1 ud (uniform disk)"));
        assert!(s.contains("d = 3"));
    }

    #[test]
    fn worst_table_shows_sigma() {
        let rows = vec![ObsResidual {
            kind: ObservableKind::Vis2,
            baseline: "A0-G1".into(),
            spatial_freq: 2e7,
            wl: 2.2e-6,
            mjd: 60000.0,
            observed: 0.5,
            model: 0.4,
            error: 0.02,
            residual: 0.1,
        }];
        let s = format_worst_table(&rows);
        assert!(s.contains("A0-G1"));
        assert!(s.contains("5.0"));
    }
}
