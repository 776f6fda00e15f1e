//! Export per-point residuals to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::ObsResidual;
use crate::error::AppError;

/// Write per-point residuals to a CSV file.
pub fn write_residuals_csv(path: &Path, residuals: &[ObsResidual]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(
        file,
        "kind,baseline,spatial_freq_cyc_rad,wl_m,mjd,observed,model,error,residual"
    )
    .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for r in residuals {
        writeln!(
            file,
            "{},{},{:.6e},{:.6e},{:.6},{:.8},{:.8},{:.8},{:.8}",
            r.kind.label(),
            r.baseline,
            r.spatial_freq,
            r.wl,
            r.mjd,
            r.observed,
            r.model,
            r.error,
            r.residual,
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ObservableKind;

    #[test]
    fn writes_header_and_rows() {
        let dir = std::env::temp_dir().join("oifit-export-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("residuals.csv");

        let rs = vec![ObsResidual {
            kind: ObservableKind::T3Phi,
            baseline: "A0-G1-J2".into(),
            spatial_freq: 2.5e7,
            wl: 2.2e-6,
            mjd: 60000.0,
            observed: 10.0,
            model: 8.0,
            error: 1.0,
            residual: 2.0,
        }];
        write_residuals_csv(&path, &rs).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("kind,baseline"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("T3PHI,A0-G1-J2,"));
        assert!(row.ends_with("2.00000000"));

        std::fs::remove_file(&path).ok();
    }
}
