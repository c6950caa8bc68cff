//! Cell values and column types.
//!
//! Every cell in a table, frame or persisted layer is a [`Value`]. Columns
//! declare a [`FieldType`]; values crossing a boundary (user input, delimited
//! files, the store) are coerced to it with [`Value::coerce`].

use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};

/// The semantic type of a domain column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
  Text,
  Number,
}

/// A single cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
  #[default]
  Null,
  Number(f64),
  Text(String),
}

impl Value {
  pub fn text(s: impl Into<String>) -> Self { Self::Text(s.into()) }

  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::Text(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Self::Number(n) => Some(*n),
      _ => None,
    }
  }

  /// Interpret raw text from a file or a prompt. Blank text is `Null`.
  pub fn parse_raw(raw: &str, kind: FieldType) -> Option<Self> {
    Self::Text(raw.to_owned()).coerce(kind)
  }

  /// Convert to `kind`. Returns `None` when the value cannot represent that
  /// type (e.g. text that is not a number for a [`FieldType::Number`]
  /// column).
  pub fn coerce(self, kind: FieldType) -> Option<Self> {
    match (self, kind) {
      (Self::Null, _) => Some(Self::Null),
      (Self::Text(s), _) if s.trim().is_empty() => Some(Self::Null),
      (Self::Text(s), FieldType::Text) => Some(Self::Text(s)),
      (Self::Text(s), FieldType::Number) => {
        // Accept the decimal comma used in the source spreadsheets.
        let normalised = s.trim().replace(',', ".");
        normalised.parse::<f64>().ok().map(Self::Number)
      }
      (Self::Number(n), FieldType::Number) => Some(Self::Number(n)),
      (n @ Self::Number(_), FieldType::Text) => Some(Self::Text(n.to_string())),
    }
  }

  /// Total order used for sorting frames: nulls first, then numbers, then
  /// text.
  pub fn total_cmp(&self, other: &Self) -> Ordering {
    match (self, other) {
      (Self::Null, Self::Null) => Ordering::Equal,
      (Self::Null, _) => Ordering::Less,
      (_, Self::Null) => Ordering::Greater,
      (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
      (Self::Number(_), Self::Text(_)) => Ordering::Less,
      (Self::Text(_), Self::Number(_)) => Ordering::Greater,
      (Self::Text(a), Self::Text(b)) => a.cmp(b),
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Null => Ok(()),
      Self::Number(n) => write!(f, "{n}"),
      Self::Text(s) => f.write_str(s),
    }
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<String> for Value {
  fn from(s: String) -> Self { Self::Text(s) }
}

impl From<f64> for Value {
  fn from(n: f64) -> Self { Self::Number(n) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self { v.map_or(Self::Null, Into::into) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_text_is_null() {
    assert_eq!(Value::parse_raw("  ", FieldType::Text), Some(Value::Null));
    assert_eq!(Value::parse_raw("", FieldType::Number), Some(Value::Null));
  }

  #[test]
  fn number_columns_accept_decimal_comma() {
    assert_eq!(
      Value::parse_raw("12,5", FieldType::Number),
      Some(Value::Number(12.5))
    );
    assert_eq!(Value::parse_raw("doze", FieldType::Number), None);
  }

  #[test]
  fn numbers_render_into_text_columns() {
    assert_eq!(
      Value::Number(3.0).coerce(FieldType::Text),
      Some(Value::text("3"))
    );
  }

  #[test]
  fn ordering_puts_nulls_first() {
    let mut vals = vec![Value::text("b"), Value::Null, Value::Number(2.0)];
    vals.sort_by(Value::total_cmp);
    assert_eq!(vals, vec![Value::Null, Value::Number(2.0), Value::text("b")]);
  }
}
