//! Flattened observation sets.
//!
//! OIFITS stores one row per (baseline, time) with an array over spectral
//! channels. Model evaluation and chi-square want one point per
//! (baseline, time, channel), with spatial frequencies already divided by
//! wavelength. This module flattens loaded tables into per-point vectors,
//! merges multiple files, and summarizes coverage.
//!
//! Conventions: u, v are in cycles/radian (baseline in meters over
//! wavelength in meters); `base_m` keeps the projected baseline length in
//! meters for filtering and reporting (longest leg for triangles).

pub mod synthetic;

use std::path::Path;

use crate::domain::DatasetStats;
use crate::error::AppError;
use crate::oifits::{self, OiFile};

/// One squared-visibility sample.
#[derive(Debug, Clone)]
pub struct Vis2Point {
    pub u: f64,
    pub v: f64,
    pub base_m: f64,
    pub wl: f64,
    pub mjd: f64,
    pub vis2: f64,
    pub err: f64,
    pub flag: bool,
    pub baseline: String,
}

/// One complex-visibility sample (amplitude and phase).
#[derive(Debug, Clone)]
pub struct VisPoint {
    pub u: f64,
    pub v: f64,
    pub base_m: f64,
    pub wl: f64,
    pub mjd: f64,
    pub visamp: f64,
    pub visamp_err: f64,
    pub visphi: f64,
    pub visphi_err: f64,
    pub flag: bool,
    pub baseline: String,
}

/// One closure-triangle sample. The third leg is (u1+u2, v1+v2).
#[derive(Debug, Clone)]
pub struct T3Point {
    pub u1: f64,
    pub v1: f64,
    pub u2: f64,
    pub v2: f64,
    pub base_m: f64,
    pub wl: f64,
    pub mjd: f64,
    pub t3amp: f64,
    pub t3amp_err: f64,
    pub t3phi: f64,
    pub t3phi_err: f64,
    pub flag: bool,
    pub triangle: String,
}

/// One spectral flux sample.
#[derive(Debug, Clone)]
pub struct FluxPoint {
    pub wl: f64,
    pub mjd: f64,
    pub flux: f64,
    pub err: f64,
    pub flag: bool,
}

/// All observations from one or more OIFITS files, flattened per point.
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    pub vis2: Vec<Vis2Point>,
    pub vis: Vec<VisPoint>,
    pub t3: Vec<T3Point>,
    pub flux: Vec<FluxPoint>,
    pub files: Vec<String>,
}

impl DataSet {
    /// Load and merge a list of OIFITS files.
    pub fn load(paths: &[impl AsRef<Path>]) -> Result<Self, AppError> {
        let mut out = DataSet::default();
        for path in paths {
            let file = oifits::load(path.as_ref())?;
            out.extend_from(&file)?;
        }
        if out.is_empty() {
            return Err(AppError::new(3, "no observations found in input files"));
        }
        Ok(out)
    }

    pub fn is_empty(&self) -> bool {
        self.vis2.is_empty() && self.vis.is_empty() && self.t3.is_empty() && self.flux.is_empty()
    }

    pub fn n_points(&self) -> usize {
        self.vis2.len() + self.vis.len() + self.t3.len() + self.flux.len()
    }

    /// Flatten one loaded file into this set.
    pub fn extend_from(&mut self, file: &OiFile) -> Result<(), AppError> {
        let ctx = &file.path;

        for table in &file.vis2 {
            let wl = file.wavelength(&table.insname).ok_or_else(|| {
                AppError::new(
                    5,
                    format!("{ctx}: OI_VIS2 refers to unknown INSNAME '{}'", table.insname),
                )
            })?;
            for row in &table.rows {
                let base_m = (row.ucoord * row.ucoord + row.vcoord * row.vcoord).sqrt();
                let baseline = pair_label(file, table.arrname.as_deref(), row.sta_index);
                for (k, &lambda) in wl.eff_wave.iter().enumerate() {
                    if lambda <= 0.0 {
                        continue;
                    }
                    self.vis2.push(Vis2Point {
                        u: row.ucoord / lambda,
                        v: row.vcoord / lambda,
                        base_m,
                        wl: lambda,
                        mjd: row.mjd,
                        vis2: get(&row.vis2data, k),
                        err: get(&row.vis2err, k),
                        flag: row.flag.get(k).copied().unwrap_or(false),
                        baseline: baseline.clone(),
                    });
                }
            }
        }

        for table in &file.vis {
            let wl = file.wavelength(&table.insname).ok_or_else(|| {
                AppError::new(
                    5,
                    format!("{ctx}: OI_VIS refers to unknown INSNAME '{}'", table.insname),
                )
            })?;
            for row in &table.rows {
                let base_m = (row.ucoord * row.ucoord + row.vcoord * row.vcoord).sqrt();
                let baseline = pair_label(file, table.arrname.as_deref(), row.sta_index);
                for (k, &lambda) in wl.eff_wave.iter().enumerate() {
                    if lambda <= 0.0 {
                        continue;
                    }
                    self.vis.push(VisPoint {
                        u: row.ucoord / lambda,
                        v: row.vcoord / lambda,
                        base_m,
                        wl: lambda,
                        mjd: row.mjd,
                        visamp: get(&row.visamp, k),
                        visamp_err: get(&row.visamperr, k),
                        visphi: get(&row.visphi, k),
                        visphi_err: get(&row.visphierr, k),
                        flag: row.flag.get(k).copied().unwrap_or(false),
                        baseline: baseline.clone(),
                    });
                }
            }
        }

        for table in &file.t3 {
            let wl = file.wavelength(&table.insname).ok_or_else(|| {
                AppError::new(
                    5,
                    format!("{ctx}: OI_T3 refers to unknown INSNAME '{}'", table.insname),
                )
            })?;
            for row in &table.rows {
                let u3 = row.u1coord + row.u2coord;
                let v3 = row.v1coord + row.v2coord;
                let base_m = [
                    (row.u1coord, row.v1coord),
                    (row.u2coord, row.v2coord),
                    (u3, v3),
                ]
                .iter()
                .map(|(u, v)| (u * u + v * v).sqrt())
                .fold(0.0, f64::max);
                let triangle = triple_label(file, table.arrname.as_deref(), row.sta_index);
                for (k, &lambda) in wl.eff_wave.iter().enumerate() {
                    if lambda <= 0.0 {
                        continue;
                    }
                    self.t3.push(T3Point {
                        u1: row.u1coord / lambda,
                        v1: row.v1coord / lambda,
                        u2: row.u2coord / lambda,
                        v2: row.v2coord / lambda,
                        base_m,
                        wl: lambda,
                        mjd: row.mjd,
                        t3amp: get(&row.t3amp, k),
                        t3amp_err: get(&row.t3amperr, k),
                        t3phi: get(&row.t3phi, k),
                        t3phi_err: get(&row.t3phierr, k),
                        flag: row.flag.get(k).copied().unwrap_or(false),
                        triangle: triangle.clone(),
                    });
                }
            }
        }

        for table in &file.flux {
            let wl = file.wavelength(&table.insname).ok_or_else(|| {
                AppError::new(
                    5,
                    format!("{ctx}: OI_FLUX refers to unknown INSNAME '{}'", table.insname),
                )
            })?;
            for row in &table.rows {
                for (k, &lambda) in wl.eff_wave.iter().enumerate() {
                    if lambda <= 0.0 {
                        continue;
                    }
                    self.flux.push(FluxPoint {
                        wl: lambda,
                        mjd: row.mjd,
                        flux: get(&row.fluxdata, k),
                        err: get(&row.fluxerr, k),
                        flag: row.flag.get(k).copied().unwrap_or(false),
                    });
                }
            }
        }

        self.files.push(file.path.clone());
        Ok(())
    }

    /// Coverage summary over all points, flagged or not.
    pub fn stats(&self) -> DatasetStats {
        let mut s = DatasetStats {
            n_vis2: self.vis2.len(),
            n_vis: self.vis.len(),
            n_t3: self.t3.len(),
            n_flux: self.flux.len(),
            wl_min: f64::INFINITY,
            wl_max: f64::NEG_INFINITY,
            mjd_min: f64::INFINITY,
            mjd_max: f64::NEG_INFINITY,
            baseline_min: f64::INFINITY,
            baseline_max: f64::NEG_INFINITY,
        };
        let mut any = false;

        let mut fold = |wl: f64, mjd: f64, base: Option<f64>| {
            any = true;
            s.wl_min = s.wl_min.min(wl);
            s.wl_max = s.wl_max.max(wl);
            s.mjd_min = s.mjd_min.min(mjd);
            s.mjd_max = s.mjd_max.max(mjd);
            if let Some(b) = base {
                s.baseline_min = s.baseline_min.min(b);
                s.baseline_max = s.baseline_max.max(b);
            }
        };
        for p in &self.vis2 {
            fold(p.wl, p.mjd, Some(p.base_m));
        }
        for p in &self.vis {
            fold(p.wl, p.mjd, Some(p.base_m));
        }
        for p in &self.t3 {
            fold(p.wl, p.mjd, Some(p.base_m));
        }
        for p in &self.flux {
            fold(p.wl, p.mjd, None);
        }

        if !any {
            return DatasetStats::default();
        }
        if !s.baseline_min.is_finite() {
            s.baseline_min = 0.0;
            s.baseline_max = 0.0;
        }
        s
    }
}

fn get(values: &[f64], k: usize) -> f64 {
    values.get(k).copied().unwrap_or(f64::NAN)
}

fn pair_label(file: &OiFile, arrname: Option<&str>, sta: [i32; 2]) -> String {
    format!(
        "{}-{}",
        file.station_name(arrname, sta[0]),
        file.station_name(arrname, sta[1])
    )
}

fn triple_label(file: &OiFile, arrname: Option<&str>, sta: [i32; 3]) -> String {
    format!(
        "{}-{}-{}",
        file.station_name(arrname, sta[0]),
        file.station_name(arrname, sta[1]),
        file.station_name(arrname, sta[2])
    )
}
