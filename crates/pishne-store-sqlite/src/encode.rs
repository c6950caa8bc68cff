//! Conversions between frame cells and SQLite values.
//!
//! Numbers are stored as REAL, text as TEXT and nulls as NULL. A layer
//! column is declared REAL only when every non-null cell is a number, so
//! text columns never pick up numeric affinity.

use pishne_core::{frame::Frame, value::Value};
use rusqlite::types::{Value as SqlValue, ValueRef};

pub fn encode_value(v: &Value) -> SqlValue {
  match v {
    Value::Null => SqlValue::Null,
    Value::Number(n) => SqlValue::Real(*n),
    Value::Text(s) => SqlValue::Text(s.clone()),
  }
}

pub fn decode_value(v: ValueRef<'_>) -> Value {
  match v {
    ValueRef::Null => Value::Null,
    ValueRef::Integer(i) => Value::Number(i as f64),
    ValueRef::Real(f) => Value::Number(f),
    ValueRef::Text(t) | ValueRef::Blob(t) => {
      Value::Text(String::from_utf8_lossy(t).into_owned())
    }
  }
}

/// Declared SQL type of column `idx` of `frame`.
pub fn column_type(frame: &Frame, idx: usize) -> &'static str {
  let mut cells = frame.rows().iter().map(|r| &r[idx]).filter(|v| !v.is_null());
  let mut any = false;
  let numeric = cells.all(|v| {
    any = true;
    matches!(v, Value::Number(_))
  });
  if any && numeric { "REAL" } else { "TEXT" }
}

pub fn quote_ident(name: &str) -> String { format!("\"{}\"", name.replace('"', "\"\"")) }
