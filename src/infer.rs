// 🔎 Type Inference - column types from value inspection
// Every non-null value of a column votes; the narrowest type that fits all wins

use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// COLUMN TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// true/false, stored as 0/1
    Boolean,
    Integer,
    Real,
    Text,
}

impl ColumnType {
    /// SQLite column affinity used in CREATE TABLE
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Boolean | ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Boolean => "boolean",
            ColumnType::Integer => "integer",
            ColumnType::Real => "real",
            ColumnType::Text => "text",
        }
    }

    /// Can a value of this type be compared to an integer flag / year?
    pub fn is_integer_like(&self) -> bool {
        matches!(self, ColumnType::Boolean | ColumnType::Integer)
    }

    fn accepts(&self, raw: &str) -> bool {
        match self {
            ColumnType::Boolean => parse_bool(raw).is_some(),
            ColumnType::Integer => raw.parse::<i64>().is_ok(),
            ColumnType::Real => parse_real(raw).is_some(),
            ColumnType::Text => true,
        }
    }

    /// Convert a raw CSV field into a typed cell.
    /// Returns None when the field does not fit the type.
    pub fn convert(&self, raw: &str) -> Option<Value> {
        if raw.is_empty() {
            return Some(Value::Null);
        }
        match self {
            ColumnType::Boolean => parse_bool(raw).map(|b| Value::Integer(b as i64)),
            ColumnType::Integer => raw.parse().ok().map(Value::Integer),
            ColumnType::Real => parse_real(raw).map(Value::Real),
            ColumnType::Text => Some(Value::Text(raw.to_string())),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Finite numbers written with digits only; `nan`, `inf` and friends stay text
fn parse_real(raw: &str) -> Option<f64> {
    if !raw.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<f64>().ok().filter(|r| r.is_finite())
}

// Narrowest first
const CANDIDATES: [ColumnType; 3] = [ColumnType::Boolean, ColumnType::Integer, ColumnType::Real];

/// Infer a column type from its raw fields. Empty fields are NULL and don't vote.
pub fn infer_column<'a, I>(values: I) -> ColumnType
where
    I: IntoIterator<Item = &'a str>,
{
    let mut remaining: Vec<ColumnType> = CANDIDATES.to_vec();
    let mut saw_value = false;

    for raw in values.into_iter().filter(|v| !v.is_empty()) {
        saw_value = true;
        remaining.retain(|t| t.accepts(raw));
        if remaining.is_empty() {
            return ColumnType::Text;
        }
    }

    if !saw_value {
        return ColumnType::Text;
    }

    remaining.first().copied().unwrap_or(ColumnType::Text)
}

// ============================================================================
// CELL VALUES
// ============================================================================

/// One cell of a loaded table or a query result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Real(r) => ToSqlOutput::Owned(SqlValue::Real(*r)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(r) => Value::Real(r),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            // Blobs never come out of a CSV load
            ValueRef::Blob(b) => Value::Text(format!("<{} bytes>", b.len())),
        }
    }
}
