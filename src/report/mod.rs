//! Reporting utilities: residual rankings.

pub mod format;

use crate::domain::ObsResidual;

/// Rank the worst-fitting points by |residual / error| (top-N).
/// Points with non-positive errors sort by |residual| alone, behind the
/// normalized ones.
pub fn rank_worst(residuals: &[ObsResidual], top_n: usize) -> Vec<ObsResidual> {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| {
        significance(b)
            .partial_cmp(&significance(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(top_n);
    sorted
}

fn significance(r: &ObsResidual) -> f64 {
    if r.error.is_finite() && r.error > 0.0 {
        (r.residual / r.error).abs()
    } else if r.residual.is_finite() {
        // Behind every normalized point, but still ordered.
        -1.0 / (1.0 + r.residual.abs())
    } else {
        f64::NEG_INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ObservableKind;

    fn residual(baseline: &str, residual: f64, error: f64) -> ObsResidual {
        ObsResidual {
            kind: ObservableKind::Vis2,
            baseline: baseline.to_string(),
            spatial_freq: 1e7,
            wl: 2.2e-6,
            mjd: 60000.0,
            observed: 0.5,
            model: 0.5 - residual,
            error,
            residual,
        }
    }

    #[test]
    fn ranks_by_normalized_residual() {
        let rs = vec![
            residual("A0-G1", 0.02, 0.01), // 2 sigma
            residual("A0-J2", 0.50, 0.10), // 5 sigma
            residual("G1-J2", 0.03, 0.03), // 1 sigma
        ];
        let worst = rank_worst(&rs, 2);
        assert_eq!(worst.len(), 2);
        assert_eq!(worst[0].baseline, "A0-J2");
        assert_eq!(worst[1].baseline, "A0-G1");
    }

    #[test]
    fn bad_errors_sort_last() {
        let rs = vec![residual("A0-G1", 9.0, 0.0), residual("A0-J2", 0.01, 0.01)];
        let worst = rank_worst(&rs, 2);
        assert_eq!(worst[0].baseline, "A0-J2");
    }
}
