//! OIFITS file access.
//!
//! OIFITS is FITS with a set of standardized binary tables (OI_WAVELENGTH,
//! OI_VIS2, OI_T3, OI_VIS, OI_FLUX, OI_ARRAY, OI_TARGET). The reader here
//! is self-contained: it walks the HDUs of a file, decodes the BINTABLE
//! extensions it knows, and ignores everything else (image extensions,
//! vendor tables). Malformed structure is reported as an error rather than
//! a panic.
//!
//! - `header`: card/block parsing
//! - `bintable`: column layout and big-endian cell decoding
//! - `tables`: typed OI_* table structs
//! - `writer`: minimal OIFITS output for simulated datasets

pub mod bintable;
pub mod header;
pub mod tables;
pub mod writer;

use std::fs;
use std::path::Path;

use crate::error::AppError;
use crate::oifits::bintable::BinTable;
use crate::oifits::header::{parse_header, Header, BLOCK_SIZE};
pub use crate::oifits::tables::OiFile;

/// Load an OIFITS file from disk.
pub fn load(path: &Path) -> Result<OiFile, AppError> {
    let bytes = fs::read(path)
        .map_err(|e| AppError::new(3, format!("cannot read {}: {e}", path.display())))?;
    let mut file = parse(&bytes, &path.display().to_string())?;
    file.path = path.display().to_string();
    Ok(file)
}

/// Parse OIFITS content from a byte buffer.
pub fn parse(bytes: &[u8], context: &str) -> Result<OiFile, AppError> {
    let (primary, mut pos) = parse_header(bytes, 0, context)?;
    if primary.get("SIMPLE").is_none() {
        return Err(AppError::new(5, format!("{context}: not a FITS file (no SIMPLE card)")));
    }
    pos += data_unit_len(&primary, true, context)?;

    let mut file = OiFile::default();
    while pos < bytes.len() {
        // Trailing padding blocks of zeros or blanks end the file.
        if bytes[pos..].iter().all(|&b| b == 0 || b == b' ') {
            break;
        }
        let (header, data_start) = parse_header(bytes, pos, context)?;
        let unit_len = data_unit_len(&header, false, context)?;
        if data_start
            .checked_add(unit_len)
            .map_or(true, |end| end > bytes.len())
        {
            return Err(AppError::new(
                5,
                format!("{context}: truncated data unit at byte {data_start}"),
            ));
        }

        if header.xtension().as_deref() == Some("BINTABLE") {
            let row_bytes = table_bytes(&header, context)?;
            // NAXIS1 * NAXIS2 must also fit inside the file, even when a
            // bogus BITPIX made the declared data unit shorter.
            if data_start
                .checked_add(row_bytes)
                .map_or(true, |end| end > bytes.len())
            {
                return Err(AppError::new(
                    5,
                    format!("{context}: table data at byte {data_start} overruns the file"),
                ));
            }
            let extname = header.string("EXTNAME").unwrap_or_default();
            let data = bytes[data_start..data_start + row_bytes].to_vec();
            match extname.trim() {
                "OI_WAVELENGTH" | "OI_VIS2" | "OI_VIS" | "OI_T3" | "OI_FLUX" | "OI_ARRAY"
                | "OI_TARGET" => {
                    let table = BinTable::new(header, data, context)?;
                    dispatch_table(&mut file, &table, context)?;
                }
                _ => {}
            }
        }
        pos = data_start + unit_len;
    }

    if file.wavelengths.is_empty() {
        return Err(AppError::new(
            5,
            format!("{context}: no OI_WAVELENGTH table found"),
        ));
    }
    Ok(file)
}

fn dispatch_table(file: &mut OiFile, table: &BinTable, context: &str) -> Result<(), AppError> {
    match table.extname.trim() {
        "OI_WAVELENGTH" => file.wavelengths.push(tables::read_wavelength(table, context)?),
        "OI_VIS2" => file.vis2.push(tables::read_vis2(table, context)?),
        "OI_VIS" => file.vis.push(tables::read_vis(table, context)?),
        "OI_T3" => file.t3.push(tables::read_t3(table, context)?),
        "OI_FLUX" => file.flux.push(tables::read_flux(table, context)?),
        "OI_ARRAY" => file.arrays.push(tables::read_array(table, context)?),
        "OI_TARGET" => file.targets.extend(tables::read_target(table, context)?),
        _ => {}
    }
    Ok(())
}

/// NAXIS1 * NAXIS2 of a table extension, rejecting negative or
/// overflowing values.
fn table_bytes(header: &Header, context: &str) -> Result<usize, AppError> {
    let row_len = require_dim(header, "NAXIS1", context)?;
    let n_rows = require_dim(header, "NAXIS2", context)?;
    row_len
        .checked_mul(n_rows)
        .ok_or_else(|| AppError::new(5, format!("{context}: table size overflows")))
}

/// A non-negative axis-length keyword.
fn require_dim(header: &Header, keyword: &str, context: &str) -> Result<usize, AppError> {
    let v = header.require_int(keyword, context)?;
    usize::try_from(v)
        .map_err(|_| AppError::new(5, format!("{context}: negative {keyword} ({v})")))
}

/// Size of an HDU's data unit in bytes, rounded up to a block boundary.
fn data_unit_len(header: &Header, primary: bool, context: &str) -> Result<usize, AppError> {
    let naxis = require_dim(header, "NAXIS", context)?;
    if naxis == 0 {
        return Ok(0);
    }
    let bitpix = header.require_int("BITPIX", context)?.unsigned_abs() as usize;
    let mut elems = 1usize;
    for n in 1..=naxis {
        elems = elems
            .checked_mul(require_dim(header, &format!("NAXIS{n}"), context)?)
            .ok_or_else(|| AppError::new(5, format!("{context}: data unit size overflows")))?;
    }
    let pcount = if primary {
        0
    } else {
        header.int("PCOUNT").unwrap_or(0).max(0) as usize
    };
    let raw = elems
        .checked_mul(bitpix / 8)
        .and_then(|b| b.checked_add(pcount))
        .ok_or_else(|| AppError::new(5, format!("{context}: data unit size overflows")))?;
    raw.div_ceil(BLOCK_SIZE)
        .checked_mul(BLOCK_SIZE)
        .ok_or_else(|| AppError::new(5, format!("{context}: data unit size overflows")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_fits_bytes() {
        let err = parse(&[0u8; BLOCK_SIZE], "test");
        assert!(err.is_err());
    }

    fn header_block(cards: &[[u8; header::CARD_SIZE]]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for c in cards {
            bytes.extend_from_slice(c);
        }
        let mut end = [b' '; header::CARD_SIZE];
        end[..3].copy_from_slice(b"END");
        bytes.extend_from_slice(&end);
        let blocks = bytes.len().div_ceil(BLOCK_SIZE);
        bytes.resize(blocks * BLOCK_SIZE, b' ');
        bytes
    }

    #[test]
    fn missing_wavelength_table_is_an_error() {
        // A bare primary HDU parses as FITS but is useless as OIFITS.
        let bytes = header_block(&[
            header::format_card("SIMPLE", "T"),
            header::format_card("BITPIX", "8"),
            header::format_card("NAXIS", "0"),
        ]);
        let err = parse(&bytes, "test").unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn table_overrunning_the_file_is_an_error() {
        // BITPIX = 0 makes the declared data unit zero bytes long while
        // NAXIS1 * NAXIS2 still claims 10000; the mismatch must be caught
        // before slicing into the file.
        let mut bytes = header_block(&[
            header::format_card("SIMPLE", "T"),
            header::format_card("BITPIX", "8"),
            header::format_card("NAXIS", "0"),
        ]);
        bytes.extend_from_slice(&header_block(&[
            header::format_card("XTENSION", "'BINTABLE'"),
            header::format_card("BITPIX", "0"),
            header::format_card("NAXIS", "2"),
            header::format_card("NAXIS1", "100"),
            header::format_card("NAXIS2", "100"),
            header::format_card("PCOUNT", "0"),
            header::format_card("TFIELDS", "1"),
            header::format_card("TTYPE1", "'EFF_WAVE'"),
            header::format_card("TFORM1", "'D       '"),
            header::format_card("EXTNAME", "'OI_VIS2 '"),
        ]));

        let err = parse(&bytes, "test").unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn negative_axis_length_is_an_error() {
        let mut bytes = header_block(&[
            header::format_card("SIMPLE", "T"),
            header::format_card("BITPIX", "8"),
            header::format_card("NAXIS", "0"),
        ]);
        bytes.extend_from_slice(&header_block(&[
            header::format_card("XTENSION", "'BINTABLE'"),
            header::format_card("BITPIX", "8"),
            header::format_card("NAXIS", "2"),
            header::format_card("NAXIS1", "-16"),
            header::format_card("NAXIS2", "1"),
        ]));

        let err = parse(&bytes, "test").unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }
}
