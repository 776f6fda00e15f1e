//! Minimal OIFITS output.
//!
//! Serializes the tables a simulated dataset carries (OI_WAVELENGTH plus
//! OI_VIS2 and OI_T3) into a FITS byte stream the reader in this module
//! accepts. Only the columns the toolkit consumes are written; all floats
//! are stored as D (f64) columns.

use std::fs;
use std::path::Path;

use crate::error::AppError;
use crate::oifits::header::{format_card, BLOCK_SIZE, CARD_SIZE};
use crate::oifits::tables::{OiFile, OiT3, OiVis2, OiWavelength};

/// Write an in-memory OIFITS structure to disk.
pub fn save(file: &OiFile, path: &Path) -> Result<(), AppError> {
    let bytes = to_bytes(file);
    fs::write(path, bytes)
        .map_err(|e| AppError::new(3, format!("cannot write {}: {e}", path.display())))
}

/// Serialize to FITS bytes.
pub fn to_bytes(file: &OiFile) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&finish_header(vec![
        format_card("SIMPLE", "T"),
        format_card("BITPIX", "8"),
        format_card("NAXIS", "0"),
        format_card("EXTEND", "T"),
    ]));
    for wl in &file.wavelengths {
        write_wavelength(&mut out, wl);
    }
    for v2 in &file.vis2 {
        write_vis2(&mut out, v2);
    }
    for t3 in &file.t3 {
        write_t3(&mut out, t3);
    }
    out
}

fn finish_header(mut cards: Vec<[u8; CARD_SIZE]>) -> Vec<u8> {
    let mut end = [b' '; CARD_SIZE];
    end[..3].copy_from_slice(b"END");
    cards.push(end);
    let mut bytes = Vec::with_capacity(cards.len() * CARD_SIZE);
    for c in &cards {
        bytes.extend_from_slice(c);
    }
    pad_block(&mut bytes, b' ');
    bytes
}

/// Pad to the next 2880-byte boundary.
fn pad_block(bytes: &mut Vec<u8>, fill: u8) {
    let rem = bytes.len() % BLOCK_SIZE;
    if rem != 0 {
        bytes.resize(bytes.len() + BLOCK_SIZE - rem, fill);
    }
}

fn bintable_cards(
    extname: &str,
    insname: &str,
    row_len: usize,
    n_rows: usize,
    columns: &[(&str, String)],
) -> Vec<[u8; CARD_SIZE]> {
    let mut cards = vec![
        format_card("XTENSION", "'BINTABLE'"),
        format_card("BITPIX", "8"),
        format_card("NAXIS", "2"),
        format_card("NAXIS1", &row_len.to_string()),
        format_card("NAXIS2", &n_rows.to_string()),
        format_card("PCOUNT", "0"),
        format_card("GCOUNT", "1"),
        format_card("TFIELDS", &columns.len().to_string()),
        format_card("EXTNAME", &format!("'{extname}'")),
        format_card("INSNAME", &format!("'{insname}'")),
        format_card("OI_REVN", "2"),
    ];
    for (i, (name, tform)) in columns.iter().enumerate() {
        cards.push(format_card(&format!("TTYPE{}", i + 1), &format!("'{name}'")));
        cards.push(format_card(&format!("TFORM{}", i + 1), &format!("'{tform}'")));
    }
    cards
}

fn push_f64s(row: &mut Vec<u8>, values: &[f64]) {
    for v in values {
        row.extend_from_slice(&v.to_be_bytes());
    }
}

fn push_flags(row: &mut Vec<u8>, flags: &[bool]) {
    for &f in flags {
        row.push(if f { b'T' } else { b'F' });
    }
}

fn write_wavelength(out: &mut Vec<u8>, wl: &OiWavelength) {
    let columns = [
        ("EFF_WAVE", "1D".to_string()),
        ("EFF_BAND", "1D".to_string()),
    ];
    out.extend_from_slice(&finish_header(bintable_cards(
        "OI_WAVELENGTH",
        &wl.insname,
        16,
        wl.eff_wave.len(),
        &columns,
    )));
    let mut data = Vec::new();
    for (w, b) in wl.eff_wave.iter().zip(&wl.eff_band) {
        push_f64s(&mut data, &[*w, *b]);
    }
    pad_block(&mut data, 0);
    out.extend_from_slice(&data);
}

fn write_vis2(out: &mut Vec<u8>, v2: &OiVis2) {
    let n_wl = v2.rows.first().map_or(0, |r| r.vis2data.len());
    let columns = [
        ("MJD", "1D".to_string()),
        ("UCOORD", "1D".to_string()),
        ("VCOORD", "1D".to_string()),
        ("VIS2DATA", format!("{n_wl}D")),
        ("VIS2ERR", format!("{n_wl}D")),
        ("STA_INDEX", "2I".to_string()),
        ("FLAG", format!("{n_wl}L")),
    ];
    let row_len = 8 * 3 + 8 * n_wl * 2 + 2 * 2 + n_wl;
    out.extend_from_slice(&finish_header(bintable_cards(
        "OI_VIS2",
        &v2.insname,
        row_len,
        v2.rows.len(),
        &columns,
    )));
    let mut data = Vec::new();
    for r in &v2.rows {
        push_f64s(&mut data, &[r.mjd, r.ucoord, r.vcoord]);
        push_f64s(&mut data, &r.vis2data);
        push_f64s(&mut data, &r.vis2err);
        for s in r.sta_index {
            data.extend_from_slice(&(s as i16).to_be_bytes());
        }
        push_flags(&mut data, &r.flag);
    }
    pad_block(&mut data, 0);
    out.extend_from_slice(&data);
}

fn write_t3(out: &mut Vec<u8>, t3: &OiT3) {
    let n_wl = t3.rows.first().map_or(0, |r| r.t3phi.len());
    let columns = [
        ("MJD", "1D".to_string()),
        ("U1COORD", "1D".to_string()),
        ("V1COORD", "1D".to_string()),
        ("U2COORD", "1D".to_string()),
        ("V2COORD", "1D".to_string()),
        ("T3AMP", format!("{n_wl}D")),
        ("T3AMPERR", format!("{n_wl}D")),
        ("T3PHI", format!("{n_wl}D")),
        ("T3PHIERR", format!("{n_wl}D")),
        ("STA_INDEX", "3I".to_string()),
        ("FLAG", format!("{n_wl}L")),
    ];
    let row_len = 8 * 5 + 8 * n_wl * 4 + 2 * 3 + n_wl;
    out.extend_from_slice(&finish_header(bintable_cards(
        "OI_T3",
        &t3.insname,
        row_len,
        t3.rows.len(),
        &columns,
    )));
    let mut data = Vec::new();
    for r in &t3.rows {
        push_f64s(&mut data, &[r.mjd, r.u1coord, r.v1coord, r.u2coord, r.v2coord]);
        push_f64s(&mut data, &r.t3amp);
        push_f64s(&mut data, &r.t3amperr);
        push_f64s(&mut data, &r.t3phi);
        push_f64s(&mut data, &r.t3phierr);
        for s in r.sta_index {
            data.extend_from_slice(&(s as i16).to_be_bytes());
        }
        push_flags(&mut data, &r.flag);
    }
    pad_block(&mut data, 0);
    out.extend_from_slice(&data);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oifits::tables::{T3Row, Vis2Row};

    fn sample_file() -> OiFile {
        OiFile {
            wavelengths: vec![OiWavelength {
                insname: "SIM".into(),
                eff_wave: vec![2.0e-6, 2.2e-6],
                eff_band: vec![0.1e-6, 0.1e-6],
            }],
            vis2: vec![OiVis2 {
                insname: "SIM".into(),
                arrname: None,
                rows: vec![Vis2Row {
                    mjd: 60000.0,
                    ucoord: 45.0,
                    vcoord: -12.5,
                    vis2data: vec![0.81, 0.64],
                    vis2err: vec![0.01, 0.02],
                    flag: vec![false, true],
                    sta_index: [1, 2],
                }],
            }],
            t3: vec![OiT3 {
                insname: "SIM".into(),
                arrname: None,
                rows: vec![T3Row {
                    mjd: 60000.0,
                    u1coord: 45.0,
                    v1coord: -12.5,
                    u2coord: 10.0,
                    v2coord: 30.0,
                    t3amp: vec![0.5, 0.4],
                    t3amperr: vec![0.05, 0.05],
                    t3phi: vec![12.0, -7.5],
                    t3phierr: vec![1.0, 1.0],
                    flag: vec![false, false],
                    sta_index: [1, 2, 3],
                }],
            }],
            ..OiFile::default()
        }
    }

    #[test]
    fn output_is_block_aligned() {
        let bytes = to_bytes(&sample_file());
        assert_eq!(bytes.len() % BLOCK_SIZE, 0);
    }

    #[test]
    fn written_file_reads_back() {
        let bytes = to_bytes(&sample_file());
        let file = crate::oifits::parse(&bytes, "roundtrip").unwrap();

        let wl = file.wavelength("SIM").unwrap();
        assert_eq!(wl.eff_wave, vec![2.0e-6, 2.2e-6]);

        assert_eq!(file.vis2.len(), 1);
        let row = &file.vis2[0].rows[0];
        assert_eq!(row.vis2data, vec![0.81, 0.64]);
        assert_eq!(row.flag, vec![false, true]);
        assert_eq!(row.sta_index, [1, 2]);
        assert!((row.ucoord - 45.0).abs() < 1e-12);

        assert_eq!(file.t3.len(), 1);
        let t3 = &file.t3[0].rows[0];
        assert_eq!(t3.t3phi, vec![12.0, -7.5]);
        assert_eq!(t3.sta_index, [1, 2, 3]);
    }
}
