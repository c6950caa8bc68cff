//! `;`-delimited text codec for the Pishne registry.
//!
//! Three file shapes share one dialect (UTF-8, `;` separator, header row):
//!
//! - whole tables, one row per record with the organised columns;
//! - record files, two `Field;Value` columns describing one record;
//! - metadata boot files, two `Attribute;Value` columns.
//!
//! Every cell is written with its display form; empty cells read back as
//! nulls. Typing is left to the table schema.

pub mod error;

use std::{
  collections::BTreeMap,
  fs::File,
  io::{Read, Write},
  path::{Path, PathBuf},
};

use csv::{ReaderBuilder, WriterBuilder};
use tracing::{debug, info};

pub use error::{Error, Result};
use pishne_core::{
  frame::Frame,
  metadata::{ATTRIBUTE_FIELD, Dataset, Describe, VALUE_FIELD},
  record::BASE_COLUMNS,
  schema::Schema,
  table::{FIELD_COLUMN, Fields, RecordTable, VALUE_COLUMN},
  value::Value,
};

pub const DELIMITER: u8 = b';';

// ─── Frames ──────────────────────────────────────────────────────────────────

/// Write `frame` with a header row.
pub fn write_frame<W: Write>(frame: &Frame, writer: W) -> Result<()> {
  let mut w = WriterBuilder::new().delimiter(DELIMITER).from_writer(writer);
  w.write_record(frame.columns())?;
  for row in frame.rows() {
    w.write_record(row.iter().map(Value::to_string))?;
  }
  w.flush()?;
  Ok(())
}

/// Read a frame. Cells are text; empty cells are nulls.
pub fn read_frame<R: Read>(reader: R) -> Result<Frame> {
  let mut r = ReaderBuilder::new()
    .delimiter(DELIMITER)
    .has_headers(true)
    .from_reader(reader);
  let mut frame = Frame::new(r.headers()?.iter());
  for record in r.records() {
    let record = record?;
    frame.push_row(
      record
        .iter()
        .map(|cell| if cell.is_empty() { Value::Null } else { Value::text(cell) })
        .collect(),
    );
  }
  Ok(frame)
}

pub fn save_frame(frame: &Frame, path: &Path) -> Result<()> {
  write_frame(frame, File::create(path)?)?;
  debug!(path = %path.display(), rows = frame.len(), "wrote delimited file");
  Ok(())
}

pub fn load_frame(path: &Path) -> Result<Frame> {
  let frame = read_frame(File::open(path)?)?;
  debug!(path = %path.display(), rows = frame.len(), "read delimited file");
  Ok(frame)
}

/// Read a two-column file as ordered key/value pairs, checking the header.
fn load_pairs(path: &Path, key: &str, value: &str) -> Result<Vec<(String, Value)>> {
  let frame = load_frame(path)?;
  let k = frame
    .column_index(key)
    .ok_or_else(|| Error::MissingColumn(key.to_owned()))?;
  let v = frame
    .column_index(value)
    .ok_or_else(|| Error::MissingColumn(value.to_owned()))?;
  Ok(
    frame
      .into_rows()
      .into_iter()
      .filter(|row| !row[k].is_null())
      .map(|row| (row[k].to_string(), row[v].clone()))
      .collect(),
  )
}

// ─── Tables ──────────────────────────────────────────────────────────────────

/// Write the organised columns of `table` to `path` and return the path.
pub fn export_table(table: &RecordTable, path: &Path, active_only: bool) -> Result<PathBuf> {
  save_frame(&table.to_frame(active_only), path)?;
  info!(table = table.name(), path = %path.display(), "exported table");
  Ok(path.to_owned())
}

/// Bulk-load `path` into `table`. Returns the number of rows added.
pub fn import_table(table: &mut RecordTable, path: &Path, append: bool) -> Result<usize> {
  let frame = load_frame(path)?;
  let n = table.set_data(&frame, append)?;
  table.dataset_mut().set_source(path, None);
  info!(table = table.name(), path = %path.display(), records = n, "imported table");
  Ok(n)
}

// ─── Record files ────────────────────────────────────────────────────────────

/// Read a `Field;Value` file into insertable fields.
///
/// Fields the schema does not declare, including the base columns, are
/// dropped. Values are typed by their column.
pub fn load_record(path: &Path, schema: &Schema) -> Result<Fields> {
  let mut fields = Fields::new();
  for (name, value) in load_pairs(path, FIELD_COLUMN, VALUE_COLUMN)? {
    if BASE_COLUMNS.contains(&name.as_str()) {
      continue;
    }
    let Some(col) = schema.column(&name) else {
      debug!(table = schema.table(), field = %name, "ignoring undeclared field");
      continue;
    };
    let value = value.coerce(col.kind).ok_or_else(|| pishne_core::Error::Validation {
      table:  schema.table().to_owned(),
      field:  name.clone(),
      reason: format!("expected {:?}", col.kind),
    })?;
    fields.insert(name, value);
  }
  Ok(fields)
}

/// Write the record matching `key` as a `Field;Value` file.
pub fn export_record(table: &RecordTable, key: &str, path: &Path) -> Result<PathBuf> {
  save_frame(&table.record_frame(key)?, path)?;
  Ok(path.to_owned())
}

// ─── Metadata ────────────────────────────────────────────────────────────────

/// Read an `Attribute;Value` boot file.
pub fn read_metadata(path: &Path) -> Result<BTreeMap<String, String>> {
  Ok(
    load_pairs(path, ATTRIBUTE_FIELD, VALUE_FIELD)?
      .into_iter()
      .map(|(k, v)| (k, v.to_string()))
      .collect(),
  )
}

/// Apply a boot file to `dataset`.
pub fn boot_dataset(dataset: &mut Dataset, path: &Path) -> Result<()> {
  let setter = read_metadata(path)?;
  dataset.set(&setter)?;
  Ok(())
}

pub fn export_metadata(item: &impl Describe, path: &Path) -> Result<PathBuf> {
  save_frame(&item.metadata_frame(), path)?;
  Ok(path.to_owned())
}

#[cfg(test)]
mod tests {
  use pishne_core::tables::{
    COD_ACAO, COD_COMPONENTE, COD_SUBCOMPONENTE, DESC_ACAO, DESC_COMPONENTE, ESCALA_ACAO,
    NM_COMPONENTE, NM_TEMATICA, ORIGEM_INVESTIMENTO, TableKind, VALOR_INVESTIMENTO,
  };

  use super::*;

  fn fields(pairs: &[(&str, Value)]) -> Fields {
    pairs
      .iter()
      .map(|(k, v)| ((*k).to_owned(), v.clone()))
      .collect()
  }

  fn acoes() -> RecordTable {
    let mut t = TableKind::Acoes.table().unwrap();
    for (value, desc) in [(10.0, "Cisternas; poços"), (2.5, "Barragens \"subterrâneas\"")] {
      t.insert(fields(&[
        (COD_COMPONENTE, Value::text("Componente 1")),
        (COD_SUBCOMPONENTE, Value::text("Sub 1.1")),
        (NM_TEMATICA, Value::text("Água")),
        (DESC_ACAO, Value::text(desc)),
        (VALOR_INVESTIMENTO, Value::Number(value)),
        (ORIGEM_INVESTIMENTO, Value::text("Estados")),
        (ESCALA_ACAO, Value::text("CE")),
      ]))
      .unwrap();
    }
    t
  }

  #[test]
  fn frame_text_round_trip() {
    let mut frame = Frame::new(["a", "b"]);
    frame.push_row(vec![Value::text("x;y"), Value::Null]);
    frame.push_row(vec![Value::text("ç"), Value::text("2")]);

    let mut buf = Vec::new();
    write_frame(&frame, &mut buf).unwrap();
    assert!(String::from_utf8(buf.clone()).unwrap().starts_with("a;b\n"));
    assert_eq!(read_frame(buf.as_slice()).unwrap(), frame);
  }

  #[test]
  fn exported_table_imports_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("acoes.csv");
    let mut original = acoes();
    original.archive("Rec0001").unwrap();

    export_table(&original, &path, false).unwrap();

    let mut copy = TableKind::Acoes.table().unwrap();
    assert_eq!(import_table(&mut copy, &path, false).unwrap(), 2);
    assert_eq!(copy.to_frame(false), original.to_frame(false));
    assert_eq!(copy.dataset().file_data.as_deref(), Some(path.as_path()));
  }

  #[test]
  fn active_only_export_skips_archived() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("acoes.csv");
    let mut t = acoes();
    t.archive("Rec0002").unwrap();

    export_table(&t, &path, true).unwrap();
    assert_eq!(load_frame(&path).unwrap().len(), 1);
  }

  #[test]
  fn record_file_round_trip_drops_base_and_derived() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rec.csv");
    let t = acoes();

    export_record(&t, "acao 1.1.2", &path).unwrap();
    let loaded = load_record(&path, t.schema()).unwrap();

    assert_eq!(loaded.get(VALOR_INVESTIMENTO), Some(&Value::Number(2.5)));
    assert_eq!(loaded.get(DESC_ACAO), Some(&Value::text("Barragens \"subterrâneas\"")));
    assert!(!loaded.contains_key("RecId"));

    // The derived code is read but ignored on insert.
    let mut fresh = TableKind::Acoes.table().unwrap();
    fresh.insert(loaded).unwrap();
    assert_eq!(fresh.records()[0].text(COD_ACAO), Some("acao 1.1.1"));
  }

  #[test]
  fn record_file_filters_unknown_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rec.csv");
    std::fs::write(
      &path,
      "Field;Value\ncod_componente;C9\nnm_componente;Nove\nextra;x\ndesc_componente;\n",
    )
    .unwrap();

    let schema = TableKind::Componentes.schema().unwrap();
    let loaded = load_record(&path, &schema).unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded.get(COD_COMPONENTE), Some(&Value::text("C9")));
    assert_eq!(loaded.get(DESC_COMPONENTE), Some(&Value::Null));
    assert!(!loaded.contains_key("extra"));
    assert_eq!(loaded.get(NM_COMPONENTE), Some(&Value::text("Nove")));
  }

  #[test]
  fn record_file_rejects_bad_numbers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rec.csv");
    std::fs::write(&path, "Field;Value\nvalor_investimento;muito\n").unwrap();

    let err = load_record(&path, &TableKind::Acoes.schema().unwrap()).unwrap_err();
    assert!(matches!(err, Error::Core(e) if e.is_validation()));
  }

  #[test]
  fn wrong_header_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("meta.csv");
    std::fs::write(&path, "Key;Value\nName;x\n").unwrap();
    assert!(matches!(read_metadata(&path), Err(Error::MissingColumn(c)) if c == ATTRIBUTE_FIELD));
  }

  #[test]
  fn boot_file_sets_dataset_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("meta.csv");
    std::fs::write(
      &path,
      "Attribute;Value\nName;Ações\nAlias;AX\nColor;red\nDescription;Registro\n",
    )
    .unwrap();

    let mut t = acoes();
    boot_dataset(t.dataset_mut(), &path).unwrap();
    assert_eq!(t.dataset().meta.name, "Ações");
    assert_eq!(t.dataset().meta.alias, "AX");
    assert_eq!(t.dataset().color, "red");

    let out = dir.path().join("meta_out.csv");
    export_metadata(&t, &out).unwrap();
    let back = read_metadata(&out).unwrap();
    assert_eq!(back.get("Size").map(String::as_str), Some("2"));
    assert_eq!(back.get("Description").map(String::as_str), Some("Registro"));
  }

  #[test]
  fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(load_frame(&dir.path().join("nope.csv")), Err(Error::Io(_))));
  }
}
