//! Typed operand values and string coercion.
//!
//! Operands arrive from the grammars as raw strings. Before a comparison can
//! be built they are coerced to the attribute's declared [`ScalarKind`]; a
//! value that does not convert fails the whole criterion. The sentinel
//! strings `"null"` and `"undefined"` coerce to an explicit null regardless
//! of the declared kind, turning the comparison into a null test.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde_json::Value as Json;

use crate::error::{QueryError, Result};
use crate::schema::ScalarKind;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Sentinels the frontend sends for "no value".
pub fn is_null_sentinel(raw: &str) -> bool {
    raw == "null" || raw == "undefined"
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Decimal(BigDecimal),
    Boolean(bool),
    Date(NaiveDate),
    Null,
}

impl Value {
    /// Coerce a raw operand string to the declared kind.
    pub fn coerce(raw: &str, kind: ScalarKind) -> Result<Value> {
        if is_null_sentinel(raw) {
            return Ok(Value::Null);
        }
        let coercion = || QueryError::Coercion {
            value: raw.to_owned(),
            kind: kind.name(),
        };
        match kind {
            ScalarKind::Text => Ok(Value::Text(raw.to_owned())),
            ScalarKind::Integer => raw.parse::<i64>().map(Value::Integer).map_err(|_| coercion()),
            ScalarKind::Decimal => BigDecimal::from_str(raw)
                .map(Value::Decimal)
                .map_err(|_| coercion()),
            ScalarKind::Boolean => match raw {
                "true" => Ok(Value::Boolean(true)),
                "false" => Ok(Value::Boolean(false)),
                _ => Err(coercion()),
            },
            ScalarKind::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|_| coercion()),
        }
    }

    /// Read a record leaf under the declared kind. `None` when the stored
    /// value does not carry that kind (a comparison against it is no match).
    pub fn from_json(json: &Json, kind: ScalarKind) -> Option<Value> {
        if json.is_null() {
            return Some(Value::Null);
        }
        match kind {
            ScalarKind::Text => json.as_str().map(|s| Value::Text(s.to_owned())),
            ScalarKind::Integer => json.as_i64().map(Value::Integer),
            ScalarKind::Decimal => match json {
                Json::Number(n) => BigDecimal::from_str(&n.to_string()).ok().map(Value::Decimal),
                Json::String(s) => BigDecimal::from_str(s).ok().map(Value::Decimal),
                _ => None,
            },
            ScalarKind::Boolean => json.as_bool().map(Value::Boolean),
            ScalarKind::Date => json
                .as_str()
                .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
                .map(Value::Date),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Natural ordering within one kind. `None` across kinds or when either
    /// side is null.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Decimal(b)) => Some(BigDecimal::from(*a).cmp(b)),
            (Value::Decimal(a), Value::Integer(b)) => Some(a.cmp(&BigDecimal::from(*b))),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", d),
            Value::Null => write!(f, "null"),
        }
    }
}
