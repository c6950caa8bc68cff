//! [`Frame`] — the plain tabular result type.
//!
//! Views, joins, expansions and summaries all return frames; the store and
//! the delimited codec read and write them. A frame is an ordered list of
//! column names plus rows of cells, always rectangular.

use serde::Serialize;

use crate::{Error, Result, value::Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
  columns: Vec<String>,
  rows:    Vec<Vec<Value>>,
}

impl Frame {
  pub fn new<I, S>(columns: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      columns: columns.into_iter().map(Into::into).collect(),
      rows:    Vec::new(),
    }
  }

  pub fn columns(&self) -> &[String] { &self.columns }

  pub fn rows(&self) -> &[Vec<Value>] { &self.rows }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn into_rows(self) -> Vec<Vec<Value>> { self.rows }

  pub fn column_index(&self, name: &str) -> Option<usize> {
    self.columns.iter().position(|c| c == name)
  }

  fn require(&self, name: &str) -> Result<usize> {
    self
      .column_index(name)
      .ok_or_else(|| Error::MissingColumn(name.to_owned()))
  }

  /// Append a row. Short rows are padded with nulls; extra cells dropped.
  pub fn push_row(&mut self, mut row: Vec<Value>) {
    row.resize(self.columns.len(), Value::Null);
    self.rows.push(row);
  }

  /// Cell at `row` in column `name`, if both exist.
  pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
    let idx = self.column_index(name)?;
    self.rows.get(row).map(|r| &r[idx])
  }

  /// All cells of one column.
  pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
    let idx = self.require(name)?;
    Ok(self.rows.iter().map(|r| &r[idx]).collect())
  }

  /// Add a column filled with `fill`. Replaces the column if it exists.
  pub fn with_column(mut self, name: &str, fill: Value) -> Self {
    match self.column_index(name) {
      Some(idx) => self.rows.iter_mut().for_each(|r| r[idx] = fill.clone()),
      None => {
        self.columns.push(name.to_owned());
        self.rows.iter_mut().for_each(|r| r.push(fill.clone()));
      }
    }
    self
  }

  /// Project onto `names`, in that order.
  pub fn select(&self, names: &[&str]) -> Result<Self> {
    let idxs = names
      .iter()
      .map(|n| self.require(n))
      .collect::<Result<Vec<_>>>()?;
    Ok(Self {
      columns: names.iter().map(|n| (*n).to_owned()).collect(),
      rows:    self
        .rows
        .iter()
        .map(|r| idxs.iter().map(|&i| r[i].clone()).collect())
        .collect(),
    })
  }

  /// Keep rows for which `pred` returns `true`.
  pub fn filter<F>(&self, mut pred: F) -> Self
  where
    F: FnMut(&[Value]) -> bool,
  {
    Self {
      columns: self.columns.clone(),
      rows:    self.rows.iter().filter(|r| pred(r)).cloned().collect(),
    }
  }

  /// Stable sort by one column.
  pub fn sort_by_column(&mut self, name: &str, descending: bool) -> Result<()> {
    let idx = self.require(name)?;
    self.rows.sort_by(|a, b| {
      let ord = a[idx].total_cmp(&b[idx]);
      if descending { ord.reverse() } else { ord }
    });
    Ok(())
  }

  /// Append the rows of `other`, matching columns by name. Columns missing
  /// from `other` are filled with nulls; columns only in `other` are added.
  pub fn concat(&mut self, other: Frame) {
    for col in &other.columns {
      if self.column_index(col).is_none() {
        self.columns.push(col.clone());
        self.rows.iter_mut().for_each(|r| r.push(Value::Null));
      }
    }
    let mapping: Vec<Option<usize>> = self
      .columns
      .iter()
      .map(|c| other.column_index(c))
      .collect();
    for row in other.rows {
      let new_row = mapping
        .iter()
        .map(|m| m.map_or(Value::Null, |i| row[i].clone()))
        .collect();
      self.rows.push(new_row);
    }
  }

  /// Left join on a column present in both frames.
  ///
  /// Every left row is kept; a left row matching several right rows yields
  /// one output row per match; unmatched rows get nulls for the right-hand
  /// columns. Right-hand columns whose names already exist on the left are
  /// dropped.
  pub fn left_join(&self, right: &Frame, on: &str) -> Result<Self> {
    let left_on = self.require(on)?;
    let right_on = right.require(on)?;

    let extra: Vec<usize> = right
      .columns
      .iter()
      .enumerate()
      .filter(|(_, c)| self.column_index(c).is_none())
      .map(|(i, _)| i)
      .collect();

    let mut out = Self {
      columns: self
        .columns
        .iter()
        .cloned()
        .chain(extra.iter().map(|&i| right.columns[i].clone()))
        .collect(),
      rows:    Vec::new(),
    };

    for row in &self.rows {
      let key = &row[left_on];
      let mut matched = false;
      if !key.is_null() {
        for rrow in right.rows.iter().filter(|r| &r[right_on] == key) {
          matched = true;
          let mut new_row = row.clone();
          new_row.extend(extra.iter().map(|&i| rrow[i].clone()));
          out.rows.push(new_row);
        }
      }
      if !matched {
        let mut new_row = row.clone();
        new_row.extend(extra.iter().map(|_| Value::Null));
        out.rows.push(new_row);
      }
    }
    Ok(out)
  }

  /// Serialise as a JSON array of objects keyed by column name.
  pub fn to_json(&self) -> serde_json::Value {
    let records = self
      .rows
      .iter()
      .map(|r| {
        let obj = self
          .columns
          .iter()
          .zip(r)
          .map(|(c, v)| (c.clone(), serde_json::to_value(v).unwrap_or_default()))
          .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(obj)
      })
      .collect();
    serde_json::Value::Array(records)
  }

  pub fn to_json_string(&self) -> Result<String> {
    Ok(serde_json::to_string_pretty(&self.to_json())?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn frame(cols: &[&str], rows: Vec<Vec<Value>>) -> Frame {
    let mut f = Frame::new(cols.iter().copied());
    rows.into_iter().for_each(|r| f.push_row(r));
    f
  }

  #[test]
  fn left_join_keeps_unmatched_and_fans_out_duplicates() {
    let left = frame(
      &["k", "a"],
      vec![
        vec!["x".into(), "1".into()],
        vec!["y".into(), "2".into()],
      ],
    );
    let right = frame(
      &["k", "a", "b"],
      vec![
        vec!["x".into(), "ignored".into(), "bx1".into()],
        vec!["x".into(), "ignored".into(), "bx2".into()],
      ],
    );

    let joined = left.left_join(&right, "k").unwrap();
    assert_eq!(joined.columns(), &["k", "a", "b"]);
    assert_eq!(joined.len(), 3);
    assert_eq!(joined.get(0, "b"), Some(&Value::text("bx1")));
    assert_eq!(joined.get(1, "b"), Some(&Value::text("bx2")));
    assert_eq!(joined.get(2, "b"), Some(&Value::Null));
    assert_eq!(joined.get(0, "a"), Some(&Value::text("1")));
  }

  #[test]
  fn concat_aligns_columns_by_name() {
    let mut a = frame(&["x", "y"], vec![vec!["1".into(), "2".into()]]);
    let b = frame(&["y", "z"], vec![vec!["3".into(), "4".into()]]);
    a.concat(b);
    assert_eq!(a.columns(), &["x", "y", "z"]);
    assert_eq!(a.rows()[1], vec![Value::Null, "3".into(), "4".into()]);
    assert_eq!(a.rows()[0][2], Value::Null);
  }

  #[test]
  fn select_unknown_column_errors() {
    let f = frame(&["x"], vec![]);
    assert!(matches!(f.select(&["nope"]), Err(Error::MissingColumn(_))));
  }

  #[test]
  fn sort_is_stable() {
    let mut f = frame(
      &["k", "n"],
      vec![
        vec!["b".into(), 1.0.into()],
        vec!["a".into(), 2.0.into()],
        vec!["b".into(), 3.0.into()],
      ],
    );
    f.sort_by_column("k", false).unwrap();
    let ns: Vec<_> = f.column("n").unwrap().into_iter().cloned().collect();
    assert_eq!(ns, vec![2.0.into(), 1.0.into(), 3.0.into()]);
  }

  #[test]
  fn json_export_keys_cells_by_column() {
    let f = frame(&["k", "n"], vec![vec!["a".into(), Value::Null], vec!["b".into(), 2.0.into()]]);
    assert_eq!(
      f.to_json(),
      serde_json::json!([{ "k": "a", "n": null }, { "k": "b", "n": 2.0 }])
    );
  }
}
