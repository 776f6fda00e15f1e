//! FITS header parsing.
//!
//! A FITS header is a sequence of 2880-byte blocks, each holding 36
//! fixed-width 80-character cards. A card is `KEYWORD = value / comment`;
//! the header ends at the `END` keyword and the data unit starts at the
//! next block boundary.

use crate::error::AppError;

pub const BLOCK_SIZE: usize = 2880;
pub const CARD_SIZE: usize = 80;
pub const CARDS_PER_BLOCK: usize = BLOCK_SIZE / CARD_SIZE;

/// A parsed header card value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Logical(bool),
}

/// A parsed header: keyword/value pairs in file order.
#[derive(Debug, Clone, Default)]
pub struct Header {
    cards: Vec<(String, Value)>,
}

impl Header {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.cards.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::Str(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Integer-valued keyword; floats with integral values are accepted.
    pub fn int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn require_int(&self, key: &str, context: &str) -> Result<i64, AppError> {
        self.int(key)
            .ok_or_else(|| AppError::new(5, format!("{context}: missing integer keyword {key}")))
    }

    /// Value of `XTENSION`, when this is an extension header.
    pub fn xtension(&self) -> Option<String> {
        self.string("XTENSION").map(|s| s.trim().to_string())
    }
}

/// Parse a header starting at `pos`. Returns the header and the byte
/// offset of the start of the data unit (next block boundary after END).
pub fn parse_header(bytes: &[u8], pos: usize, context: &str) -> Result<(Header, usize), AppError> {
    let mut cards = Vec::new();
    let mut offset = pos;

    loop {
        if offset + BLOCK_SIZE > bytes.len() {
            return Err(AppError::new(
                5,
                format!("{context}: truncated header block at byte {offset}"),
            ));
        }
        let block = &bytes[offset..offset + BLOCK_SIZE];
        offset += BLOCK_SIZE;

        let mut saw_end = false;
        for i in 0..CARDS_PER_BLOCK {
            let card = &block[i * CARD_SIZE..(i + 1) * CARD_SIZE];
            let keyword = String::from_utf8_lossy(&card[..8]).trim_end().to_string();
            if keyword == "END" {
                saw_end = true;
                break;
            }
            if keyword.is_empty() || keyword == "COMMENT" || keyword == "HISTORY" {
                continue;
            }
            // Only "KEYWORD = value" cards carry a value.
            if &card[8..10] != b"= " {
                continue;
            }
            if let Some(value) = parse_value(&card[10..]) {
                cards.push((keyword, value));
            }
        }

        if saw_end {
            return Ok((Header { cards }, offset));
        }
    }
}

/// Parse the value field of a card (everything after `"= "`).
fn parse_value(field: &[u8]) -> Option<Value> {
    let text = String::from_utf8_lossy(field);
    let trimmed = text.trim_start();

    if let Some(rest) = trimmed.strip_prefix('\'') {
        // Quoted string; '' is an escaped quote.
        let mut out = String::new();
        let mut chars = rest.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    out.push('\'');
                } else {
                    break;
                }
            } else {
                out.push(c);
            }
        }
        return Some(Value::Str(out.trim_end().to_string()));
    }

    // Strip a trailing comment, then parse logical/int/float.
    let bare = match trimmed.find('/') {
        Some(i) => trimmed[..i].trim(),
        None => trimmed.trim(),
    };
    match bare {
        "" => None,
        "T" => Some(Value::Logical(true)),
        "F" => Some(Value::Logical(false)),
        _ => {
            if let Ok(v) = bare.parse::<i64>() {
                Some(Value::Int(v))
            } else {
                // FITS allows Fortran-style exponents (1.0D-6).
                let norm = bare.replace(['D', 'd'], "E");
                norm.parse::<f64>().ok().map(Value::Float)
            }
        }
    }
}

/// Render a `KEYWORD = value` card, padded to 80 bytes. Used by tests and
/// the synthetic-data writer.
pub fn format_card(keyword: &str, value: &str) -> [u8; CARD_SIZE] {
    let mut card = [b' '; CARD_SIZE];
    let text = format!("{keyword:<8}= {value}");
    let bytes = text.as_bytes();
    let n = bytes.len().min(CARD_SIZE);
    card[..n].copy_from_slice(&bytes[..n]);
    card
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_with_cards(cards: &[[u8; CARD_SIZE]]) -> Vec<u8> {
        let mut out = Vec::new();
        for c in cards {
            out.extend_from_slice(c);
        }
        let mut end = [b' '; CARD_SIZE];
        end[..3].copy_from_slice(b"END");
        out.extend_from_slice(&end);
        out.resize(BLOCK_SIZE, b' ');
        out
    }

    #[test]
    fn parses_simple_header() {
        let bytes = block_with_cards(&[
            format_card("SIMPLE", "T"),
            format_card("BITPIX", "8"),
            format_card("NAXIS", "0"),
            format_card("EXTNAME", "'OI_VIS2 '"),
            format_card("EFFWAVE", "2.2E-06 / microns"),
        ]);
        let (h, next) = parse_header(&bytes, 0, "test").unwrap();
        assert_eq!(next, BLOCK_SIZE);
        assert_eq!(h.get("SIMPLE"), Some(&Value::Logical(true)));
        assert_eq!(h.int("BITPIX"), Some(8));
        assert_eq!(h.string("EXTNAME").as_deref(), Some("OI_VIS2"));
        assert!((h.float("EFFWAVE").unwrap() - 2.2e-6).abs() < 1e-12);
    }

    #[test]
    fn string_with_escaped_quote() {
        let bytes = block_with_cards(&[format_card("OBJECT", "'o''neil  '")]);
        let (h, _) = parse_header(&bytes, 0, "test").unwrap();
        assert_eq!(h.string("OBJECT").as_deref(), Some("o'neil"));
    }

    #[test]
    fn truncated_header_is_an_error() {
        let err = parse_header(&[0u8; 100], 0, "test").unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn fortran_exponent_is_accepted() {
        let bytes = block_with_cards(&[format_card("EFF_WAVE", "1.65D-06")]);
        let (h, _) = parse_header(&bytes, 0, "test").unwrap();
        assert!((h.float("EFF_WAVE").unwrap() - 1.65e-6).abs() < 1e-15);
    }
}
