//! BINTABLE extension decoding.
//!
//! A binary table's layout is described by header keywords: NAXIS1 is the
//! row width in bytes, NAXIS2 the row count, TFIELDS the column count, and
//! TTYPEn/TFORMn the column names and formats. Cell data is big-endian.
//! PCOUNT bytes of heap follow the fixed rows; variable-length arrays are
//! not used by the OIFITS tables read here, so the heap is skipped.

use crate::error::AppError;
use crate::oifits::header::Header;

/// Element type of a table column (the letter of its TFORM code).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColType {
    Logical,
    I16,
    I32,
    F32,
    F64,
    Char,
}

impl ColType {
    /// Bytes per element.
    pub fn width(self) -> usize {
        match self {
            ColType::Logical | ColType::Char => 1,
            ColType::I16 => 2,
            ColType::I32 | ColType::F32 => 4,
            ColType::F64 => 8,
        }
    }
}

/// One column: name, element count per row, element type, and its byte
/// offset within a row.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub repeat: usize,
    pub dtype: ColType,
    pub offset: usize,
}

/// Parse a TFORM code such as `16E`, `1J`, or `8A` into (repeat, type).
pub fn parse_tform(tform: &str, context: &str) -> Result<(usize, ColType), AppError> {
    let s = tform.trim();
    let split = s.find(|c: char| c.is_ascii_alphabetic()).ok_or_else(|| {
        AppError::new(5, format!("{context}: unparseable TFORM '{tform}'"))
    })?;
    let repeat = if split == 0 {
        1
    } else {
        s[..split]
            .parse::<usize>()
            .map_err(|_| AppError::new(5, format!("{context}: bad repeat in TFORM '{tform}'")))?
    };
    // Zero-width columns are legal FITS but meaningless in the OI tables
    // read here; accepting them would leave cells with no first element.
    if repeat == 0 {
        return Err(AppError::new(
            5,
            format!("{context}: zero repeat in TFORM '{tform}'"),
        ));
    }
    let dtype = match &s[split..split + 1] {
        "L" => ColType::Logical,
        "I" => ColType::I16,
        "J" => ColType::I32,
        "E" => ColType::F32,
        "D" => ColType::F64,
        "A" => ColType::Char,
        other => {
            return Err(AppError::new(
                5,
                format!("{context}: unsupported TFORM type '{other}' in '{tform}'"),
            ))
        }
    };
    Ok((repeat, dtype))
}

/// A decoded binary table: column layout plus the raw row bytes.
#[derive(Debug, Clone)]
pub struct BinTable {
    pub extname: String,
    pub header: Header,
    pub columns: Vec<Column>,
    pub n_rows: usize,
    pub row_len: usize,
    data: Vec<u8>,
}

impl BinTable {
    /// Build the column layout from an extension header and take ownership
    /// of the row bytes (`data` must be exactly NAXIS1 * NAXIS2 long).
    pub fn new(header: Header, data: Vec<u8>, context: &str) -> Result<Self, AppError> {
        let row_len = header.require_int("NAXIS1", context)? as usize;
        let n_rows = header.require_int("NAXIS2", context)? as usize;
        let n_fields = header.require_int("TFIELDS", context)? as usize;
        let extname = header.string("EXTNAME").unwrap_or_default();

        if data.len() != row_len * n_rows {
            return Err(AppError::new(
                5,
                format!(
                    "{context}: table {extname} has {} data bytes, expected {}",
                    data.len(),
                    row_len * n_rows
                ),
            ));
        }

        let mut columns = Vec::with_capacity(n_fields);
        let mut offset = 0;
        for n in 1..=n_fields {
            let name = header
                .string(&format!("TTYPE{n}"))
                .ok_or_else(|| AppError::new(5, format!("{context}: missing TTYPE{n}")))?
                .trim()
                .to_string();
            let tform = header
                .string(&format!("TFORM{n}"))
                .ok_or_else(|| AppError::new(5, format!("{context}: missing TFORM{n}")))?;
            let (repeat, dtype) = parse_tform(&tform, context)?;
            columns.push(Column {
                name,
                repeat,
                dtype,
                offset,
            });
            offset += repeat * dtype.width();
        }
        if offset > row_len {
            return Err(AppError::new(
                5,
                format!("{context}: columns of {extname} overrun NAXIS1 ({offset} > {row_len})"),
            ));
        }

        Ok(Self {
            extname,
            header,
            columns,
            n_rows,
            row_len,
            data,
        })
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn cell(&self, row: usize, col: &Column) -> &[u8] {
        let start = row * self.row_len + col.offset;
        &self.data[start..start + col.repeat * col.dtype.width()]
    }

    /// Cell as f64 values, converting integer and f32 columns.
    pub fn f64s(&self, row: usize, col: &Column) -> Vec<f64> {
        let bytes = self.cell(row, col);
        let w = col.dtype.width();
        (0..col.repeat)
            .map(|k| {
                let b = &bytes[k * w..(k + 1) * w];
                match col.dtype {
                    ColType::F64 => f64::from_be_bytes(b.try_into().unwrap()),
                    ColType::F32 => f32::from_be_bytes(b.try_into().unwrap()) as f64,
                    ColType::I32 => i32::from_be_bytes(b.try_into().unwrap()) as f64,
                    ColType::I16 => i16::from_be_bytes(b.try_into().unwrap()) as f64,
                    ColType::Logical | ColType::Char => b[0] as f64,
                }
            })
            .collect()
    }

    /// First element of a cell as f64.
    pub fn f64(&self, row: usize, col: &Column) -> f64 {
        self.f64s(row, col)[0]
    }

    /// Cell as i32 values (I and J columns).
    pub fn i32s(&self, row: usize, col: &Column) -> Vec<i32> {
        let bytes = self.cell(row, col);
        let w = col.dtype.width();
        (0..col.repeat)
            .map(|k| {
                let b = &bytes[k * w..(k + 1) * w];
                match col.dtype {
                    ColType::I32 => i32::from_be_bytes(b.try_into().unwrap()),
                    ColType::I16 => i16::from_be_bytes(b.try_into().unwrap()) as i32,
                    _ => b[0] as i32,
                }
            })
            .collect()
    }

    /// Cell as booleans. FITS logical true is the byte 'T'.
    pub fn bools(&self, row: usize, col: &Column) -> Vec<bool> {
        self.cell(row, col).iter().map(|&b| b == b'T').collect()
    }

    /// Character cell as a trimmed string.
    pub fn string(&self, row: usize, col: &Column) -> String {
        String::from_utf8_lossy(self.cell(row, col))
            .trim_end_matches(['\0', ' '])
            .to_string()
    }
}
