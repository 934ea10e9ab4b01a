// Cell values carried from decoders to the exporter

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Spreadsheet date serial (days since 1899-12-30, time as fraction)
    DateTime(f64),
}

impl CellValue {
    /// Interpret a delimited-text field.
    ///
    /// Integers with a leading zero ("007", "01234") stay text so zip codes and
    /// account numbers survive the round trip.
    pub fn from_text_field(field: &str) -> Self {
        if field.is_empty() {
            return CellValue::Empty;
        }

        let trimmed = field.trim();
        if !trimmed.is_empty() && !has_leading_zero(trimmed) {
            if is_integer_literal(trimmed) {
                // Past 2^53 a spreadsheet number can no longer hold every digit
                return match trimmed.parse::<i64>() {
                    Ok(n) if n.unsigned_abs() <= MAX_EXACT_INT => CellValue::Int(n),
                    _ => CellValue::Text(field.to_string()),
                };
            }
            if looks_numeric(trimmed) && significant_digits(trimmed) <= MAX_FLOAT_DIGITS {
                if let Ok(n) = trimmed.parse::<f64>() {
                    if n.is_finite() {
                        return CellValue::Float(n);
                    }
                }
            }
        }

        if trimmed.eq_ignore_ascii_case("true") {
            return CellValue::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return CellValue::Bool(false);
        }

        CellValue::Text(field.to_string())
    }

    /// Normalize a spreadsheet number: integral values become `Int`.
    pub fn from_number(n: f64) -> Self {
        if n.fract() == 0.0 && n.abs() < 1e15 {
            CellValue::Int(n as i64)
        } else {
            CellValue::Float(n)
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Int(n) => write!(f, "{}", n),
            CellValue::Float(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            CellValue::DateTime(serial) => match serial_to_datetime(*serial) {
                Some(dt) if serial.fract() == 0.0 => write!(f, "{}", dt.format("%Y-%m-%d")),
                Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
                None => write!(f, "{}", serial),
            },
        }
    }
}

fn has_leading_zero(s: &str) -> bool {
    let digits = s.strip_prefix('-').or_else(|| s.strip_prefix('+')).unwrap_or(s);
    digits.len() > 1 && digits.starts_with('0') && digits.as_bytes()[1].is_ascii_digit()
}

/// Largest magnitude an f64 stores exactly (2^53)
pub const MAX_EXACT_INT: u64 = 9_007_199_254_740_992;

/// Decimal digits an f64 reproduces faithfully
const MAX_FLOAT_DIGITS: usize = 15;

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix('-').or_else(|| s.strip_prefix('+')).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Digits in the mantissa, ignoring leading zeros and trailing fractional zeros
fn significant_digits(s: &str) -> usize {
    let mantissa = s.split(['e', 'E']).next().unwrap_or(s);
    let mut digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    if mantissa.contains('.') {
        digits.truncate(digits.trim_end_matches('0').len());
    }
    digits.trim_start_matches('0').len()
}

/// Rejects words f64::from_str accepts ("inf", "NaN", "infinity")
fn looks_numeric(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
}

/// 9999-12-31 plus one day
const MAX_DATE_SERIAL: f64 = 2_958_466.0;

/// Convert a 1900-system date serial to a calendar date-time.
/// Serials below 61 predate the phantom 1900-02-29 and are shifted by a day.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..MAX_DATE_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = if serial < 61.0 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let days = serial.trunc() as i64;
    let millis = (serial.fract() * 86_400_000.0).round() as i64;
    epoch
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::milliseconds(millis))
}
