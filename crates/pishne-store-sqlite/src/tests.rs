//! Integration tests for `SqliteStore` against in-memory and on-disk
//! databases.

use std::fs;

use chrono::NaiveDate;
use pishne_core::{
  database::Database,
  frame::Frame,
  store::TableStore,
  table::Fields,
  tables::{
    CATEGORIA, COD_ACAO, COD_COMPONENTE, COD_SUBCOMPONENTE, DESC_ACAO, ESCALA_ACAO,
    NM_COMPONENTE, NM_TEMATICA, ORIGEM_INVESTIMENTO, TableKind, VALOR_INVESTIMENTO,
  },
  value::Value,
};

use crate::{
  Error, SqliteStore, db_file_name, latest_database,
  schema::{APPLICATION_ID, USER_VERSION},
};

fn store() -> SqliteStore { SqliteStore::open_in_memory().expect("in-memory store") }

fn fields(pairs: &[(&str, Value)]) -> Fields {
  pairs
    .iter()
    .map(|(k, v)| ((*k).to_owned(), v.clone()))
    .collect()
}

fn sample_db() -> Database {
  let mut db = Database::new().unwrap();
  db.table_mut(TableKind::Componentes)
    .insert(fields(&[
      (COD_COMPONENTE, Value::text("Componente 1")),
      (NM_COMPONENTE, Value::text("Água")),
    ]))
    .unwrap();
  for value in [12.5, 3.0] {
    db.acoes_mut()
      .insert(fields(&[
        (COD_COMPONENTE, Value::text("Componente 1")),
        (COD_SUBCOMPONENTE, Value::text("Sub 1.1")),
        (NM_TEMATICA, Value::text("Água")),
        (DESC_ACAO, Value::text("Cisternas; poços")),
        (VALOR_INVESTIMENTO, Value::Number(value)),
        (ORIGEM_INVESTIMENTO, Value::text("Estados")),
        (ESCALA_ACAO, Value::text("CE")),
      ]))
      .unwrap();
  }
  db.table_mut(TableKind::Escala)
    .insert(fields(&[(ESCALA_ACAO, Value::text("CE")), (CATEGORIA, Value::text("UF"))]))
    .unwrap();
  db
}

// ─── Container ───────────────────────────────────────────────────────────────

#[test]
fn new_store_has_geopackage_header() {
  let s = store();
  let app_id: i32 = s
    .conn
    .query_row("PRAGMA application_id", [], |r| r.get(0))
    .unwrap();
  let version: i32 = s
    .conn
    .query_row("PRAGMA user_version", [], |r| r.get(0))
    .unwrap();
  assert_eq!(app_id, APPLICATION_ID);
  assert_eq!(version, USER_VERSION);
  assert!(s.layers().unwrap().is_empty());
}

#[test]
fn missing_layer_reads_as_none() {
  assert!(store().read_layer("acoes").unwrap().is_none());
}

// ─── Layers ──────────────────────────────────────────────────────────────────

#[test]
fn layer_round_trip_keeps_types_and_nulls() {
  let s = store();
  let mut frame = Frame::new(["name", "amount", "note"]);
  frame.push_row(vec![Value::text("a"), Value::Number(1.5), Value::Null]);
  frame.push_row(vec![Value::text("10"), Value::Null, Value::text("x")]);

  s.write_layer("things", &frame).unwrap();
  let back = s.read_layer("things").unwrap().unwrap();

  assert_eq!(back, frame);
  assert_eq!(s.layers().unwrap(), ["things"]);
}

#[test]
fn rewriting_a_layer_replaces_it() {
  let s = store();
  let mut first = Frame::new(["a"]);
  first.push_row(vec![Value::text("x")]);
  first.push_row(vec![Value::text("y")]);
  s.write_layer("t", &first).unwrap();

  let mut second = Frame::new(["a", "b"]);
  second.push_row(vec![Value::text("z"), Value::Number(2.0)]);
  s.write_layer("t", &second).unwrap();

  assert_eq!(s.read_layer("t").unwrap().unwrap(), second);
  assert_eq!(s.layers().unwrap().len(), 1);
}

#[test]
fn layer_names_are_quoted() {
  let s = store();
  let mut frame = Frame::new(["select"]);
  frame.push_row(vec![Value::text("ok")]);
  s.write_layer("order by", &frame).unwrap();
  assert_eq!(s.read_layer("order by").unwrap().unwrap(), frame);
}

#[test]
fn database_round_trip() {
  let s = store();
  let db = sample_db();
  db.save(&s).unwrap();
  assert_eq!(s.layers().unwrap().len(), 6);

  let loaded = Database::load(&s).unwrap();
  for kind in [TableKind::Componentes, TableKind::Acoes, TableKind::Escala] {
    assert_eq!(loaded.table(kind).to_frame(false), db.table(kind).to_frame(false));
  }
  assert_eq!(
    loaded.acoes().get("acao 1.1.2").unwrap().get(VALOR_INVESTIMENTO),
    Value::Number(3.0)
  );
  assert_eq!(loaded.acoes().records()[0].text(COD_ACAO), Some("acao 1.1.1"));
}

#[test]
fn archived_records_survive_persistence() {
  let s = store();
  let mut db = sample_db();
  db.acoes_mut().archive("Rec0001").unwrap();
  db.save(&s).unwrap();

  let loaded = Database::load(&s).unwrap();
  assert_eq!(loaded.acoes().len(), 2);
  assert_eq!(loaded.acoes().active_len(), 1);
  assert_eq!(loaded.acoes().next_rec_id().as_str(), "Rec0003");
}

#[test]
fn loading_an_empty_store_fails() {
  let err = Database::load(&store()).unwrap_err();
  assert!(matches!(err, Error::Core(pishne_core::Error::MissingLayer(_))));
}

// ─── Files ───────────────────────────────────────────────────────────────────

#[test]
fn file_names_carry_the_timestamp() {
  let at = NaiveDate::from_ymd_opt(2024, 3, 7)
    .unwrap()
    .and_hms_opt(9, 5, 2)
    .unwrap();
  assert_eq!(db_file_name(at), "pishne_db_2024-03-07-T09h05m02s.gpkg");
}

#[test]
fn latest_database_is_last_by_name() {
  let dir = tempfile::tempdir().unwrap();
  for name in [
    "pishne_db_2024-01-01-T00h00m00s.gpkg",
    "pishne_db_2024-06-01-T00h00m00s.gpkg",
    "pishne_db_2023-12-31-T23h59m59s.gpkg",
    "other.gpkg",
    "pishne_db_notes.txt",
  ] {
    fs::write(dir.path().join(name), b"").unwrap();
  }

  let latest = latest_database(dir.path()).unwrap();
  assert_eq!(
    latest.file_name().unwrap(),
    "pishne_db_2024-06-01-T00h00m00s.gpkg"
  );
}

#[test]
fn empty_folder_has_no_database() {
  let dir = tempfile::tempdir().unwrap();
  let err = SqliteStore::open_latest(dir.path()).err().unwrap();
  assert!(matches!(err, Error::NoDatabase(_)));
}

#[test]
fn created_store_is_found_and_reloaded() {
  let dir = tempfile::tempdir().unwrap();
  let path = {
    let s = SqliteStore::create(dir.path()).unwrap();
    sample_db().save(&s).unwrap();
    s.location().unwrap().to_owned()
  };

  let s = SqliteStore::open_latest(dir.path()).unwrap();
  assert_eq!(s.location(), Some(path.as_path()));
  let db = Database::load(&s).unwrap();
  assert_eq!(db.acoes().len(), 2);
  assert_eq!(db.acoes().dataset().file_data.as_deref(), Some(path.as_path()));
}

#[test]
fn create_refuses_a_folder_with_a_database() {
  let dir = tempfile::tempdir().unwrap();
  let first = SqliteStore::create(dir.path()).unwrap();
  sample_db().save(&first).unwrap();
  let path = first.location().unwrap().to_owned();

  let err = SqliteStore::create(dir.path()).err().unwrap();
  assert!(matches!(err, Error::DatabaseExists(ref p) if *p == path));
  assert_eq!(latest_database(dir.path()).unwrap(), path);
}

#[test]
fn snapshot_copies_every_layer() {
  let dir = tempfile::tempdir().unwrap();
  let s = store();
  sample_db().save(&s).unwrap();

  let copy = s.snapshot(dir.path()).unwrap();
  assert!(copy.exists());

  let reopened = SqliteStore::open(&copy).unwrap();
  assert_eq!(reopened.layers().unwrap().len(), 6);
  assert_eq!(latest_database(dir.path()).unwrap(), copy);
}
