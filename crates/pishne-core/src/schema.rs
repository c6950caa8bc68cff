//! Table schemas and derived columns.
//!
//! A [`Schema`] fixes the domain columns of a table, their types, which of
//! them are required on insert, an optional business lookup column and the
//! [`DerivedColumn`]s recomputed after every mutation. Schemas are checked
//! once, at construction.

use std::{collections::HashSet, fmt, sync::Arc};

use crate::{
  Error, Result,
  record::{BASE_COLUMNS, Record},
  value::{FieldType, Value},
};

/// Default zero-padding width of record ids.
pub const DEFAULT_ID_WIDTH: usize = 4;

// ─── Columns ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
  pub name:     String,
  pub kind:     FieldType,
  pub required: bool,
}

impl Column {
  pub fn text(name: &str) -> Self {
    Self { name: name.to_owned(), kind: FieldType::Text, required: true }
  }

  pub fn number(name: &str) -> Self {
    Self { name: name.to_owned(), kind: FieldType::Number, required: true }
  }

  pub fn optional(mut self) -> Self {
    self.required = false;
    self
  }
}

// ─── Derived columns ─────────────────────────────────────────────────────────

/// A column whose values are a pure function of the whole table.
///
/// [`compute`](DerivedColumn::compute) receives every record in table order
/// and must return exactly one value per record, in the same order.
pub trait DerivedColumn: Send + Sync {
  /// The (declared) column this function writes.
  fn column(&self) -> &str;

  fn compute(&self, records: &[Record]) -> Vec<Value>;
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Schema {
  table:    String,
  alias:    String,
  columns:  Vec<Column>,
  lookup:   Option<String>,
  id_width: usize,
  derived:  Vec<Arc<dyn DerivedColumn>>,
}

impl fmt::Debug for Schema {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Schema")
      .field("table", &self.table)
      .field("alias", &self.alias)
      .field("columns", &self.columns)
      .field("lookup", &self.lookup)
      .field("id_width", &self.id_width)
      .field(
        "derived",
        &self.derived.iter().map(|d| d.column()).collect::<Vec<_>>(),
      )
      .finish()
  }
}

/// Builder for [`Schema`]; [`SchemaBuilder::build`] runs the checks.
pub struct SchemaBuilder {
  inner: Schema,
}

impl SchemaBuilder {
  pub fn column(mut self, column: Column) -> Self {
    self.inner.columns.push(column);
    self
  }

  /// Resolve edit/archive keys against this column (among active records)
  /// before falling back to `RecId`.
  pub fn lookup(mut self, column: &str) -> Self {
    self.inner.lookup = Some(column.to_owned());
    self
  }

  pub fn id_width(mut self, width: usize) -> Self {
    self.inner.id_width = width;
    self
  }

  pub fn derived(mut self, derived: impl DerivedColumn + 'static) -> Self {
    self.inner.derived.push(Arc::new(derived));
    self
  }

  pub fn build(self) -> Result<Schema> {
    let s = self.inner;
    if s.table.trim().is_empty() {
      return Err(Error::Schema("table name is empty".into()));
    }
    if s.id_width == 0 {
      return Err(Error::Schema(format!("{}: id width must be positive", s.table)));
    }

    let mut seen = HashSet::new();
    for col in &s.columns {
      if BASE_COLUMNS.contains(&col.name.as_str()) {
        return Err(Error::Schema(format!(
          "{}: column {} clashes with a base column",
          s.table, col.name
        )));
      }
      if !seen.insert(col.name.as_str()) {
        return Err(Error::Schema(format!(
          "{}: duplicate column {}",
          s.table, col.name
        )));
      }
    }

    if let Some(lookup) = &s.lookup {
      if !seen.contains(lookup.as_str()) {
        return Err(Error::Schema(format!(
          "{}: lookup column {lookup} is not declared",
          s.table
        )));
      }
    }

    let mut derived_seen = HashSet::new();
    for d in &s.derived {
      if !seen.contains(d.column()) {
        return Err(Error::Schema(format!(
          "{}: derived column {} is not declared",
          s.table,
          d.column()
        )));
      }
      if !derived_seen.insert(d.column()) {
        return Err(Error::Schema(format!(
          "{}: column {} is derived twice",
          s.table,
          d.column()
        )));
      }
    }

    Ok(s)
  }
}

impl Schema {
  pub fn builder(table: &str, alias: &str) -> SchemaBuilder {
    SchemaBuilder {
      inner: Schema {
        table:    table.to_owned(),
        alias:    alias.to_owned(),
        columns:  Vec::new(),
        lookup:   None,
        id_width: DEFAULT_ID_WIDTH,
        derived:  Vec::new(),
      },
    }
  }

  pub fn table(&self) -> &str { &self.table }

  pub fn alias(&self) -> &str { &self.alias }

  pub fn columns(&self) -> &[Column] { &self.columns }

  pub fn lookup(&self) -> Option<&str> { self.lookup.as_deref() }

  pub fn id_width(&self) -> usize { self.id_width }

  pub fn derived(&self) -> &[Arc<dyn DerivedColumn>] { &self.derived }

  pub fn column(&self, name: &str) -> Option<&Column> {
    self.columns.iter().find(|c| c.name == name)
  }

  pub fn is_derived(&self, name: &str) -> bool {
    self.derived.iter().any(|d| d.column() == name)
  }

  /// Domain column names in declaration order.
  pub fn column_names(&self) -> Vec<&str> {
    self.columns.iter().map(|c| c.name.as_str()).collect()
  }

  /// Base columns followed by domain columns.
  pub fn organized_columns(&self) -> Vec<&str> {
    BASE_COLUMNS
      .iter()
      .copied()
      .chain(self.columns.iter().map(|c| c.name.as_str()))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Constant(&'static str);

  impl DerivedColumn for Constant {
    fn column(&self) -> &str { self.0 }

    fn compute(&self, records: &[Record]) -> Vec<Value> {
      vec![Value::text("x"); records.len()]
    }
  }

  #[test]
  fn rejects_base_column_clash() {
    let err = Schema::builder("t", "T")
      .column(Column::text("RecId"))
      .build()
      .unwrap_err();
    assert!(matches!(err, Error::Schema(_)));
  }

  #[test]
  fn rejects_duplicate_columns() {
    let err = Schema::builder("t", "T")
      .column(Column::text("a"))
      .column(Column::number("a"))
      .build()
      .unwrap_err();
    assert!(matches!(err, Error::Schema(_)));
  }

  #[test]
  fn rejects_undeclared_lookup_and_derived() {
    assert!(
      Schema::builder("t", "T")
        .column(Column::text("a"))
        .lookup("b")
        .build()
        .is_err()
    );
    assert!(
      Schema::builder("t", "T")
        .column(Column::text("a"))
        .derived(Constant("b"))
        .build()
        .is_err()
    );
  }

  #[test]
  fn organized_columns_start_with_base() {
    let schema = Schema::builder("t", "T")
      .column(Column::text("a"))
      .column(Column::number("b").optional())
      .derived(Constant("a"))
      .build()
      .unwrap();
    assert_eq!(
      schema.organized_columns(),
      ["RecId", "RecTable", "RecTimestamp", "RecStatus", "a", "b"]
    );
    assert!(schema.is_derived("a"));
    assert!(!schema.column("b").unwrap().required);
  }
}
