//! Filter values and the value kinds attributes are typed with.

use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::sql::expr::{lit_bool, lit_float, lit_int, lit_str, Expr};

/// The kind of value an attribute holds.
///
/// Operators declare which kinds they apply to; values are coerced to the
/// attribute's kind before they reach SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Number,
    /// Calendar dates and timestamps.
    Date,
    /// Text restricted to a declared set of variants.
    Enum,
    Boolean,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Date => "date",
            ValueKind::Enum => "enum",
            ValueKind::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar filter value.
///
/// Deserialized untagged: JSON booleans and numbers map to their variants,
/// strings in RFC 3339 or `YYYY-MM-DD` form become temporal values, and
/// every other string is text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Text(String),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, Value::Date(_) | Value::Timestamp(_))
    }

    /// Parse a raw query-string value the way a JSON body would be read.
    ///
    /// Query strings carry no type information, so only temporal forms are
    /// recognised here; numbers and booleans stay text and are coerced
    /// once the attribute kind is known.
    pub fn from_param(raw: &str) -> Self {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Value::Timestamp(ts.with_timezone(&Utc));
        }
        if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Value::Date(d);
        }
        Value::Text(raw.to_string())
    }

    /// Textual form, as stored in custom-field bags and text columns.
    pub fn to_text(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::Secs, true),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Text(s) => s.clone(),
        }
    }

    /// Coerce to the canonical value for an attribute of `kind`.
    ///
    /// `variants` is the declared variant list for enum attributes; enum
    /// input matches case-insensitively and yields the declared spelling.
    pub fn coerce(&self, kind: ValueKind, variants: &[String]) -> Result<Value, String> {
        match kind {
            ValueKind::String => Ok(Value::Text(self.to_text())),
            ValueKind::Number => match self {
                Value::Int(_) => Ok(self.clone()),
                Value::Float(f) if f.is_finite() => Ok(self.clone()),
                Value::Float(f) => Err(format!("{} is not a finite number", f)),
                Value::Text(s) => {
                    let s = s.trim();
                    if let Ok(n) = s.parse::<i64>() {
                        Ok(Value::Int(n))
                    } else {
                        match s.parse::<f64>() {
                            Ok(f) if f.is_finite() => Ok(Value::Float(f)),
                            _ => Err(format!("'{}' is not a number", s)),
                        }
                    }
                }
                other => Err(format!("{} is not a number", other)),
            },
            ValueKind::Date => match self {
                Value::Date(_) | Value::Timestamp(_) => Ok(Value::Text(self.to_text())),
                Value::Text(s) => match Value::from_param(s) {
                    v @ (Value::Date(_) | Value::Timestamp(_)) => Ok(Value::Text(v.to_text())),
                    _ => Err(format!("'{}' is not a date", s)),
                },
                other => Err(format!("{} is not a date", other)),
            },
            ValueKind::Enum => {
                let text = match self {
                    Value::Text(s) => s,
                    other => return Err(format!("{} is not an enum variant", other)),
                };
                variants
                    .iter()
                    .find(|v| v.eq_ignore_ascii_case(text))
                    .map(|v| Value::Text(v.clone()))
                    .ok_or_else(|| {
                        format!("'{}' is not one of [{}]", text, variants.join(", "))
                    })
            }
            ValueKind::Boolean => match self {
                Value::Bool(_) => Ok(self.clone()),
                Value::Int(0) => Ok(Value::Bool(false)),
                Value::Int(1) => Ok(Value::Bool(true)),
                Value::Text(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
                Value::Text(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
                other => Err(format!("{} is not a boolean", other)),
            },
        }
    }

    /// Widen a date-only value to the last instant of that day.
    ///
    /// Date attributes may hold full timestamps, which compare as text
    /// after the bare date. Inclusive upper bounds (and exclusive lower
    /// bounds) use this so `d` covers everything that happened on `d`.
    /// Timestamps and other values are returned unchanged.
    pub fn end_of_day(&self) -> Value {
        let date = match self {
            Value::Date(d) => *d,
            Value::Text(s) => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                Ok(d) => d,
                Err(_) => return self.clone(),
            },
            other => return other.clone(),
        };
        Value::Text(format!("{}T23:59:59.999999Z", date.format("%Y-%m-%d")))
    }

    /// Render as a SQL literal.
    pub fn to_literal(&self) -> Expr {
        match self {
            Value::Bool(b) => lit_bool(*b),
            Value::Int(n) => lit_int(*n),
            Value::Float(f) => lit_float(*f),
            other => lit_str(&other.to_text()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "'{}'", s),
            other => f.write_str(&other.to_text()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}
