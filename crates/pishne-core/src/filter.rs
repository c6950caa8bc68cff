//! Row filters and option lists for interactive consumers.
//!
//! These back the value slider, the category dropdown and the cascading
//! component → sub-component → theme selection of an entry form. All of
//! them take a frame (usually [`report::join`](crate::report::join)) and
//! return plain data.

use crate::{
  Error, Result,
  frame::Frame,
  tables::{COD_COMPONENTE, COD_SUBCOMPONENTE, NM_TEMATICA},
  value::Value,
};

/// Levels of the action hierarchy, outermost first.
pub const HIERARCHY: [&str; 3] = [COD_COMPONENTE, COD_SUBCOMPONENTE, NM_TEMATICA];

fn require(frame: &Frame, column: &str) -> Result<usize> {
  frame
    .column_index(column)
    .ok_or_else(|| Error::MissingColumn(column.to_owned()))
}

/// Rows whose numeric `column` lies in `[min, max]`. Nulls are dropped.
pub fn filter_range(frame: &Frame, column: &str, min: f64, max: f64) -> Result<Frame> {
  let idx = require(frame, column)?;
  Ok(frame.filter(|row| row[idx].as_f64().is_some_and(|v| v >= min && v <= max)))
}

/// Rows whose `column` equals `value`, or contains it when `contains` is
/// set. `None` keeps every row.
pub fn filter_category(
  frame: &Frame,
  column: &str,
  value: Option<&str>,
  contains: bool,
) -> Result<Frame> {
  let idx = require(frame, column)?;
  let Some(value) = value else { return Ok(frame.clone()) };
  Ok(frame.filter(|row| {
    let cell = &row[idx];
    if cell.is_null() {
      return false;
    }
    let text = cell.to_string();
    if contains { text.contains(value) } else { text == value }
  }))
}

/// Sorted distinct non-null values of `column`.
pub fn distinct(frame: &Frame, column: &str) -> Result<Vec<Value>> {
  let mut values: Vec<Value> = frame
    .column(column)?
    .into_iter()
    .filter(|v| !v.is_null())
    .cloned()
    .collect();
  values.sort_by(Value::total_cmp);
  values.dedup();
  Ok(values)
}

/// Options for the next level of [`HIERARCHY`] given the choices made so
/// far (outermost first). Empty once every level is chosen.
pub fn cascade_options(frame: &Frame, selections: &[&str]) -> Result<Vec<Value>> {
  let Some(next) = HIERARCHY.get(selections.len()) else { return Ok(Vec::new()) };

  let mut narrowed = frame.clone();
  for (column, choice) in HIERARCHY.iter().zip(selections) {
    narrowed = filter_category(&narrowed, column, Some(*choice), false)?;
  }
  distinct(&narrowed, next)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> Frame {
    let mut f = Frame::new([COD_COMPONENTE, COD_SUBCOMPONENTE, NM_TEMATICA, "valor"]);
    for (c, s, t, v) in [
      ("C1", "S1.1", "Água", 10.0),
      ("C1", "S1.2", "Solo", 20.0),
      ("C1", "S1.1", "Solo", 5.0),
      ("C2", "S2.1", "Água", 40.0),
    ] {
      f.push_row(vec![c.into(), s.into(), t.into(), v.into()]);
    }
    f
  }

  #[test]
  fn range_is_inclusive() {
    let f = filter_range(&sample(), "valor", 10.0, 20.0).unwrap();
    assert_eq!(f.len(), 2);
  }

  #[test]
  fn category_equality_and_contains() {
    let f = sample();
    assert_eq!(filter_category(&f, COD_SUBCOMPONENTE, Some("S1"), false).unwrap().len(), 0);
    assert_eq!(filter_category(&f, COD_SUBCOMPONENTE, Some("S1"), true).unwrap().len(), 3);
    assert_eq!(filter_category(&f, COD_SUBCOMPONENTE, None, false).unwrap().len(), 4);
  }

  #[test]
  fn cascade_narrows_each_level() {
    let f = sample();
    assert_eq!(cascade_options(&f, &[]).unwrap(), vec![Value::text("C1"), Value::text("C2")]);
    assert_eq!(
      cascade_options(&f, &["C1"]).unwrap(),
      vec![Value::text("S1.1"), Value::text("S1.2")]
    );
    assert_eq!(
      cascade_options(&f, &["C1", "S1.1"]).unwrap(),
      vec![Value::text("Solo"), Value::text("Água")]
    );
    assert!(cascade_options(&f, &["C1", "S1.1", "Solo"]).unwrap().is_empty());
  }
}
