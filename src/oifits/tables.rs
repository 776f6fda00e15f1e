//! The OIFITS tables: typed views over decoded binary tables.
//!
//! Each OI_* extension becomes a struct holding per-row scalars and
//! per-channel arrays exactly as stored; unit conversion and flattening
//! into per-point observations happens in the data layer. Tables are tied
//! to a spectral setup through INSNAME, which must match an OI_WAVELENGTH
//! extension in the same file.

use std::collections::BTreeMap;

use crate::error::AppError;
use crate::oifits::bintable::BinTable;

/// OI_WAVELENGTH: the spectral channels of one instrument setup.
#[derive(Debug, Clone)]
pub struct OiWavelength {
    pub insname: String,
    /// Effective wavelength per channel, meters.
    pub eff_wave: Vec<f64>,
    /// Effective bandwidth per channel, meters.
    pub eff_band: Vec<f64>,
}

/// OI_ARRAY: station index to station name.
#[derive(Debug, Clone)]
pub struct OiArray {
    pub arrname: String,
    pub stations: BTreeMap<i32, String>,
}

/// One row of an OI_VIS2 table: a single (baseline, time) sample over all
/// spectral channels.
#[derive(Debug, Clone)]
pub struct Vis2Row {
    pub mjd: f64,
    pub ucoord: f64,
    pub vcoord: f64,
    pub vis2data: Vec<f64>,
    pub vis2err: Vec<f64>,
    pub flag: Vec<bool>,
    pub sta_index: [i32; 2],
}

#[derive(Debug, Clone)]
pub struct OiVis2 {
    pub insname: String,
    pub arrname: Option<String>,
    pub rows: Vec<Vis2Row>,
}

/// One row of an OI_VIS table (complex visibility amplitude and phase).
#[derive(Debug, Clone)]
pub struct VisRow {
    pub mjd: f64,
    pub ucoord: f64,
    pub vcoord: f64,
    pub visamp: Vec<f64>,
    pub visamperr: Vec<f64>,
    pub visphi: Vec<f64>,
    pub visphierr: Vec<f64>,
    pub flag: Vec<bool>,
    pub sta_index: [i32; 2],
}

#[derive(Debug, Clone)]
pub struct OiVis {
    pub insname: String,
    pub arrname: Option<String>,
    pub rows: Vec<VisRow>,
}

/// One row of an OI_T3 table: a closure triangle. The third baseline is
/// implicit, (u1+u2, v1+v2).
#[derive(Debug, Clone)]
pub struct T3Row {
    pub mjd: f64,
    pub u1coord: f64,
    pub v1coord: f64,
    pub u2coord: f64,
    pub v2coord: f64,
    pub t3amp: Vec<f64>,
    pub t3amperr: Vec<f64>,
    pub t3phi: Vec<f64>,
    pub t3phierr: Vec<f64>,
    pub flag: Vec<bool>,
    pub sta_index: [i32; 3],
}

#[derive(Debug, Clone)]
pub struct OiT3 {
    pub insname: String,
    pub arrname: Option<String>,
    pub rows: Vec<T3Row>,
}

/// One row of an OI_FLUX table.
#[derive(Debug, Clone)]
pub struct FluxRow {
    pub mjd: f64,
    pub fluxdata: Vec<f64>,
    pub fluxerr: Vec<f64>,
    pub flag: Vec<bool>,
}

#[derive(Debug, Clone)]
pub struct OiFlux {
    pub insname: String,
    pub rows: Vec<FluxRow>,
}

/// Everything read from one OIFITS file.
#[derive(Debug, Clone, Default)]
pub struct OiFile {
    pub path: String,
    pub targets: Vec<String>,
    pub wavelengths: Vec<OiWavelength>,
    pub arrays: Vec<OiArray>,
    pub vis2: Vec<OiVis2>,
    pub vis: Vec<OiVis>,
    pub t3: Vec<OiT3>,
    pub flux: Vec<OiFlux>,
}

impl OiFile {
    /// The wavelength table matching an INSNAME, if present.
    pub fn wavelength(&self, insname: &str) -> Option<&OiWavelength> {
        self.wavelengths.iter().find(|w| w.insname == insname)
    }

    /// Station name for an array/station index pair; falls back to the
    /// numeric index when no OI_ARRAY covers it.
    pub fn station_name(&self, arrname: Option<&str>, index: i32) -> String {
        let hit = self
            .arrays
            .iter()
            .filter(|a| arrname.map_or(true, |n| a.arrname == n))
            .find_map(|a| a.stations.get(&index));
        match hit {
            Some(name) => name.clone(),
            None => index.to_string(),
        }
    }
}

fn require_insname(table: &BinTable, context: &str) -> Result<String, AppError> {
    table
        .header
        .string("INSNAME")
        .map(|s| s.trim().to_string())
        .ok_or_else(|| {
            AppError::new(
                5,
                format!("{context}: {} has no INSNAME keyword", table.extname),
            )
        })
}

fn column<'a>(
    table: &'a BinTable,
    name: &str,
    context: &str,
) -> Result<&'a crate::oifits::bintable::Column, AppError> {
    table.column(name).ok_or_else(|| {
        AppError::new(
            5,
            format!("{context}: {} is missing column {name}", table.extname),
        )
    })
}

fn sta_pair(values: &[i32]) -> [i32; 2] {
    [
        values.first().copied().unwrap_or(0),
        values.get(1).copied().unwrap_or(0),
    ]
}

fn sta_triple(values: &[i32]) -> [i32; 3] {
    [
        values.first().copied().unwrap_or(0),
        values.get(1).copied().unwrap_or(0),
        values.get(2).copied().unwrap_or(0),
    ]
}

pub fn read_wavelength(table: &BinTable, context: &str) -> Result<OiWavelength, AppError> {
    let insname = require_insname(table, context)?;
    let wave = column(table, "EFF_WAVE", context)?;
    let band = column(table, "EFF_BAND", context)?;
    let mut eff_wave = Vec::with_capacity(table.n_rows);
    let mut eff_band = Vec::with_capacity(table.n_rows);
    for row in 0..table.n_rows {
        eff_wave.push(table.f64(row, wave));
        eff_band.push(table.f64(row, band));
    }
    Ok(OiWavelength {
        insname,
        eff_wave,
        eff_band,
    })
}

pub fn read_array(table: &BinTable, context: &str) -> Result<OiArray, AppError> {
    let arrname = table
        .header
        .string("ARRNAME")
        .unwrap_or_default()
        .trim()
        .to_string();
    let name_col = column(table, "STA_NAME", context)?;
    let index_col = column(table, "STA_INDEX", context)?;
    let mut stations = BTreeMap::new();
    for row in 0..table.n_rows {
        let index = table.i32s(row, index_col)[0];
        stations.insert(index, table.string(row, name_col));
    }
    Ok(OiArray { arrname, stations })
}

pub fn read_target(table: &BinTable, context: &str) -> Result<Vec<String>, AppError> {
    let target_col = column(table, "TARGET", context)?;
    Ok((0..table.n_rows)
        .map(|row| table.string(row, target_col))
        .collect())
}

pub fn read_vis2(table: &BinTable, context: &str) -> Result<OiVis2, AppError> {
    let insname = require_insname(table, context)?;
    let arrname = table.header.string("ARRNAME").map(|s| s.trim().to_string());
    let mjd = column(table, "MJD", context)?;
    let ucoord = column(table, "UCOORD", context)?;
    let vcoord = column(table, "VCOORD", context)?;
    let vis2data = column(table, "VIS2DATA", context)?;
    let vis2err = column(table, "VIS2ERR", context)?;
    let flag = column(table, "FLAG", context)?;
    let sta = column(table, "STA_INDEX", context)?;

    let rows = (0..table.n_rows)
        .map(|row| Vis2Row {
            mjd: table.f64(row, mjd),
            ucoord: table.f64(row, ucoord),
            vcoord: table.f64(row, vcoord),
            vis2data: table.f64s(row, vis2data),
            vis2err: table.f64s(row, vis2err),
            flag: table.bools(row, flag),
            sta_index: sta_pair(&table.i32s(row, sta)),
        })
        .collect();
    Ok(OiVis2 {
        insname,
        arrname,
        rows,
    })
}

pub fn read_vis(table: &BinTable, context: &str) -> Result<OiVis, AppError> {
    let insname = require_insname(table, context)?;
    let arrname = table.header.string("ARRNAME").map(|s| s.trim().to_string());
    let mjd = column(table, "MJD", context)?;
    let ucoord = column(table, "UCOORD", context)?;
    let vcoord = column(table, "VCOORD", context)?;
    let visamp = column(table, "VISAMP", context)?;
    let visamperr = column(table, "VISAMPERR", context)?;
    let visphi = column(table, "VISPHI", context)?;
    let visphierr = column(table, "VISPHIERR", context)?;
    let flag = column(table, "FLAG", context)?;
    let sta = column(table, "STA_INDEX", context)?;

    let rows = (0..table.n_rows)
        .map(|row| VisRow {
            mjd: table.f64(row, mjd),
            ucoord: table.f64(row, ucoord),
            vcoord: table.f64(row, vcoord),
            visamp: table.f64s(row, visamp),
            visamperr: table.f64s(row, visamperr),
            visphi: table.f64s(row, visphi),
            visphierr: table.f64s(row, visphierr),
            flag: table.bools(row, flag),
            sta_index: sta_pair(&table.i32s(row, sta)),
        })
        .collect();
    Ok(OiVis {
        insname,
        arrname,
        rows,
    })
}

pub fn read_t3(table: &BinTable, context: &str) -> Result<OiT3, AppError> {
    let insname = require_insname(table, context)?;
    let arrname = table.header.string("ARRNAME").map(|s| s.trim().to_string());
    let mjd = column(table, "MJD", context)?;
    let u1 = column(table, "U1COORD", context)?;
    let v1 = column(table, "V1COORD", context)?;
    let u2 = column(table, "U2COORD", context)?;
    let v2 = column(table, "V2COORD", context)?;
    let t3amp = column(table, "T3AMP", context)?;
    let t3amperr = column(table, "T3AMPERR", context)?;
    let t3phi = column(table, "T3PHI", context)?;
    let t3phierr = column(table, "T3PHIERR", context)?;
    let flag = column(table, "FLAG", context)?;
    let sta = column(table, "STA_INDEX", context)?;

    let rows = (0..table.n_rows)
        .map(|row| T3Row {
            mjd: table.f64(row, mjd),
            u1coord: table.f64(row, u1),
            v1coord: table.f64(row, v1),
            u2coord: table.f64(row, u2),
            v2coord: table.f64(row, v2),
            t3amp: table.f64s(row, t3amp),
            t3amperr: table.f64s(row, t3amperr),
            t3phi: table.f64s(row, t3phi),
            t3phierr: table.f64s(row, t3phierr),
            flag: table.bools(row, flag),
            sta_index: sta_triple(&table.i32s(row, sta)),
        })
        .collect();
    Ok(OiT3 {
        insname,
        arrname,
        rows,
    })
}

pub fn read_flux(table: &BinTable, context: &str) -> Result<OiFlux, AppError> {
    let insname = require_insname(table, context)?;
    let mjd = column(table, "MJD", context)?;
    // OIFITS v1 files used FLUX instead of FLUXDATA.
    let fluxdata = table
        .column("FLUXDATA")
        .or_else(|| table.column("FLUX"))
        .ok_or_else(|| {
            AppError::new(
                5,
                format!("{context}: {} has neither FLUXDATA nor FLUX", table.extname),
            )
        })?;
    let fluxerr = column(table, "FLUXERR", context)?;
    let flag = column(table, "FLAG", context)?;

    let rows = (0..table.n_rows)
        .map(|row| FluxRow {
            mjd: table.f64(row, mjd),
            fluxdata: table.f64s(row, fluxdata),
            fluxerr: table.f64s(row, fluxerr),
            flag: table.bools(row, flag),
        })
        .collect();
    Ok(OiFlux { insname, rows })
}
