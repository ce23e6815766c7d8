use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The scalar value stored in a table cell.
///
/// Serializes to a plain JSON scalar so the canonical hashing form matches
/// the value's semantic content: `null`, booleans, numbers, and strings.
/// Dates serialize as RFC 3339 strings; on deserialization, strings that
/// parse as RFC 3339 timestamps revive as [`CellValue::Date`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    Date(DateTime<Utc>),
    Text(String),
}

impl CellValue {
    /// Returns `true` if this is the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The numeric content, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The text content, if this is a string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the value's type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Date(_) => "date",
            Self::Text(_) => "text",
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        Self::Null
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Date(d) => write!(f, "{}", d.to_rfc3339()),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn null_serializes_as_json_null() {
        let json = serde_json::to_string(&CellValue::Null).unwrap();
        assert_eq!(json, "null");
    }

    #[test]
    fn scalars_serialize_plainly() {
        assert_eq!(serde_json::to_string(&CellValue::Bool(true)).unwrap(), "true");
        assert_eq!(serde_json::to_string(&CellValue::Number(6399.0)).unwrap(), "6399.0");
        assert_eq!(
            serde_json::to_string(&CellValue::Text("hi".into())).unwrap(),
            "\"hi\""
        );
    }

    #[test]
    fn date_serializes_as_rfc3339_string() {
        let d = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let json = serde_json::to_string(&CellValue::Date(d)).unwrap();
        assert!(json.starts_with("\"2024-03-01T12:00:00"));
    }

    #[test]
    fn deserialize_scalar_types() {
        let v: CellValue = serde_json::from_str("42.5").unwrap();
        assert_eq!(v, CellValue::Number(42.5));
        let v: CellValue = serde_json::from_str("false").unwrap();
        assert_eq!(v, CellValue::Bool(false));
        let v: CellValue = serde_json::from_str("null").unwrap();
        assert!(v.is_null());
        let v: CellValue = serde_json::from_str("\"plain text\"").unwrap();
        assert_eq!(v.as_text(), Some("plain text"));
    }

    #[test]
    fn rfc3339_string_revives_as_date() {
        let v: CellValue = serde_json::from_str("\"2024-03-01T12:00:00Z\"").unwrap();
        assert!(matches!(v, CellValue::Date(_)));
    }

    #[test]
    fn accessors() {
        assert_eq!(CellValue::Number(7.0).as_number(), Some(7.0));
        assert_eq!(CellValue::Text("x".into()).as_number(), None);
        assert_eq!(CellValue::Null.type_name(), "null");
        assert_eq!(CellValue::from(3i64), CellValue::Number(3.0));
    }

    #[test]
    fn display_forms() {
        assert_eq!(CellValue::Number(6399.0).to_string(), "6399");
        assert_eq!(CellValue::Text("abc".into()).to_string(), "abc");
        assert_eq!(CellValue::Null.to_string(), "null");
    }
}
