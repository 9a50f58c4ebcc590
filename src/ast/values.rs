use serde::{Deserialize, Serialize};

use crate::error::{KiwiError, KiwiResult};

/// A value supplied by the caller for a field or a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Integer, bound with format code `i`
    Int(i64),
    /// Floating point, bound with format code `d`
    Float(f64),
    /// Text, bound with format code `s`
    Text(String),
    /// Raw SQL literal (e.g. `CURRENT_TIMESTAMP`), inlined into the statement
    /// instead of bound. Must be identifier-safe.
    Raw(String),
}

impl Value {
    /// Raw SQL marker for database-side expressions.
    pub fn raw(sql: impl Into<String>) -> Self {
        Value::Raw(sql.into())
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Value::Raw(_))
    }

    /// The bindable form of this value, `None` for raw SQL.
    pub fn to_param(&self) -> Option<Param> {
        match self {
            Value::Int(n) => Some(Param::Int(*n)),
            Value::Float(n) => Some(Param::Float(*n)),
            Value::Text(s) => Some(Param::Text(s.clone())),
            Value::Raw(_) => None,
        }
    }

    /// Convert a JSON scalar.
    ///
    /// A single-element array holding a string is the raw SQL marker,
    /// e.g. `["CURRENT_TIMESTAMP"]`.
    pub fn from_json(json: &serde_json::Value) -> KiwiResult<Self> {
        match json {
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if n.is_u64() {
                    // integral but wider than i64, a float would lose digits
                    Err(KiwiError::invalid(format!("number out of range: {}", n)))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float(f))
                } else {
                    Err(KiwiError::invalid(format!("number out of range: {}", n)))
                }
            }
            serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
            serde_json::Value::Array(items) => match items.as_slice() {
                [serde_json::Value::String(sql)] => Ok(Value::Raw(sql.clone())),
                _ => Err(KiwiError::invalid(format!("unsupported value: {}", json))),
            },
            other => Err(KiwiError::invalid(format!("unsupported value: {}", other))),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "'{}'", s),
            Value::Raw(s) => write!(f, "{{{}}}", s),
        }
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
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

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Text(s.clone())
    }
}

/// A value that is actually bound to a `?` placeholder.
///
/// The variant decides the format code, so values and the format string
/// can never drift apart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Param {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Param {
    /// Type code used in the bind format string.
    pub fn format_code(&self) -> char {
        match self {
            Param::Int(_) => 'i',
            Param::Float(_) => 'd',
            Param::Text(_) => 's',
        }
    }
}

impl std::fmt::Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Param::Int(n) => write!(f, "{}", n),
            Param::Float(n) => write!(f, "{}", n),
            Param::Text(s) => write!(f, "'{}'", s),
        }
    }
}

/// Build the bind format string for a parameter list.
pub fn format_of(params: &[Param]) -> String {
    params.iter().map(Param::format_code).collect()
}
