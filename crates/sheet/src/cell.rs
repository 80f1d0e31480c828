use serde::{Deserialize, Serialize};
use std::fmt;

/// Text values that load as a missing cell.
///
/// Any spelling of NaN is also missing, since `f64` parsing accepts every casing.
const MISSING_MARKERS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "#N/A", "#NA",
    "<NA>", "#N/A N/A", "-1.#IND", "1.#IND", "-1.#QNAN", "1.#QNAN",
];

/// Represents a cell value in a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Hashable identity of a cell used when comparing whole rows.
///
/// Numeric cells that hold the same number share a key, so `Int(10)` and
/// `Float(10.0)` are the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum CellKey<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(&'a str),
}

impl CellValue {
    /// Check if the value is null
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Check if the value is an integer or a float
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Int(_) | CellValue::Float(_))
    }

    /// Numeric value of an `Int` or `Float` cell.
    ///
    /// Unlike a lenient conversion, strings and booleans yield `None`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get the value as a string, in the form written to delimited text
    #[must_use]
    pub fn as_str(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => format_float(*f),
            CellValue::String(s) => s.clone(),
        }
    }

    /// Short type label, used in previews and logs
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Null => "null",
            CellValue::Bool(_) => "bool",
            CellValue::Int(_) => "int",
            CellValue::Float(_) => "float",
            CellValue::String(_) => "string",
        }
    }

    /// Parse a string into a `CellValue` with type inference
    /// Tries: null -> bool -> int -> float -> string
    ///
    /// Numbers may carry surrounding blanks; booleans must match exactly so
    /// that padded text keeps its original form.
    #[must_use]
    pub fn parse(s: &str) -> CellValue {
        let trimmed = s.trim();

        if trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed) {
            return CellValue::Null;
        }

        if s.eq_ignore_ascii_case("true") {
            return CellValue::Bool(true);
        }
        if s.eq_ignore_ascii_case("false") {
            return CellValue::Bool(false);
        }

        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Int(i);
        }

        if let Ok(f) = trimmed.parse::<f64>() {
            return if f.is_nan() {
                CellValue::Null
            } else {
                CellValue::Float(f)
            };
        }

        CellValue::String(s.to_string())
    }

    pub(crate) fn key(&self) -> CellKey<'_> {
        match self {
            CellValue::Null => CellKey::Null,
            CellValue::Bool(b) => CellKey::Bool(*b),
            CellValue::Int(i) => CellKey::Int(*i),
            CellValue::Float(f) => match integral_f64(*f) {
                Some(i) => CellKey::Int(i),
                None => CellKey::Float(f.to_bits()),
            },
            CellValue::String(s) => CellKey::Str(s),
        }
    }
}

/// Returns the integer a float holds exactly, if any.
pub(crate) fn integral_f64(f: f64) -> Option<i64> {
    // 2^63 bounds the i64 range; anything at or past it cannot round-trip.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_finite() && f.fract() == 0.0 && f >= -LIMIT && f < LIMIT {
        Some(f as i64)
    } else {
        None
    }
}

/// Format a float so that it parses back as a float (`10.0`, never `10`).
fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 {
        if f.abs() < 1e16 {
            format!("{f:.1}")
        } else {
            format!("{f:e}")
        }
    } else {
        f.to_string()
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Null
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}
