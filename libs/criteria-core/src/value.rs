//! Typed leaf values and the field kinds they belong to.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// Value kind of a schema field. Every criteria leaf and cursor key is typed by one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Number,
    Date,
    Enum,
    Uuid,
    Bool,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Date => "date",
            FieldKind::Enum => "enum",
            FieldKind::Uuid => "uuid",
            FieldKind::Bool => "bool",
        }
    }

    /// Parse a raw request/cursor string into a value of this kind.
    ///
    /// `variants` is only consulted for [`FieldKind::Enum`]; matching is
    /// case-insensitive and the canonical spelling is kept.
    pub fn parse_value(self, raw: &str, variants: &[String]) -> Result<Value, ValueParseError> {
        let fail = || ValueParseError {
            expected: self,
            raw: raw.to_string(),
        };
        Ok(match self {
            FieldKind::String => Value::String(raw.to_string()),
            FieldKind::Number => {
                Value::Number(BigDecimal::from_str(raw.trim()).map_err(|_| fail())?)
            }
            FieldKind::Date => Value::Date(parse_date(raw.trim()).ok_or_else(fail)?),
            FieldKind::Enum => {
                let canonical = variants
                    .iter()
                    .find(|v| v.eq_ignore_ascii_case(raw.trim()))
                    .ok_or_else(fail)?;
                Value::Enum(canonical.clone())
            }
            FieldKind::Uuid => Value::Uuid(raw.trim().parse::<Uuid>().map_err(|_| fail())?),
            FieldKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => return Err(fail()),
            },
        })
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueParseError {
    pub expected: FieldKind,
    pub raw: String,
}

impl fmt::Display for ValueParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid {}", self.raw, self.expected)
    }
}

impl std::error::Error for ValueParseError {}

/// RFC 3339 timestamp, or a bare `YYYY-MM-DD` meaning midnight UTC.
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    let midnight = day.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight))
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    String(String),
    Number(BigDecimal),
    Date(DateTime<Utc>),
    Enum(String),
    Uuid(Uuid),
    Bool(bool),
}

impl Value {
    pub fn kind(&self) -> FieldKind {
        match self {
            Value::String(_) => FieldKind::String,
            Value::Number(_) => FieldKind::Number,
            Value::Date(_) => FieldKind::Date,
            Value::Enum(_) => FieldKind::Enum,
            Value::Uuid(_) => FieldKind::Uuid,
            Value::Bool(_) => FieldKind::Bool,
        }
    }

    /// Canonical string form; `FieldKind::parse_value` reads it back to an equal value.
    pub fn render(&self) -> String {
        match self {
            Value::String(s) | Value::Enum(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Date(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Value::Uuid(u) => u.as_hyphenated().to_string(),
            Value::Bool(b) => b.to_string(),
        }
    }

    /// Ordering between two values of the same kind; `None` across kinds.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) | (Value::Enum(a), Value::Enum(b)) => {
                Some(a.cmp(b))
            }
            (Value::Number(a), Value::Number(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Number(n) => match n.to_i64() {
                Some(i) if BigDecimal::from(i) == *n => serializer.serialize_i64(i),
                _ => match n.to_f64() {
                    Some(f) => serializer.serialize_f64(f),
                    None => serializer.serialize_str(&n.to_string()),
                },
            },
            Value::Bool(b) => serializer.serialize_bool(*b),
            other => serializer.serialize_str(&other.render()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(BigDecimal::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(BigDecimal::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::Date(dt)
    }
}
