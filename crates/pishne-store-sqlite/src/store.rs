//! [`SqliteStore`] — the SQLite implementation of [`TableStore`].

use std::{
  fs,
  path::{Path, PathBuf},
};

use chrono::{Local, NaiveDateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter};
use tracing::{debug, info};

use pishne_core::{frame::Frame, store::TableStore};

use crate::{
  Error, Result,
  encode::{column_type, decode_value, encode_value, quote_ident},
  schema::{APPLICATION_ID, FID, SCHEMA, USER_VERSION},
};

pub const DB_PREFIX: &str = "pishne_db_";
pub const DB_SUFFIX: &str = ".gpkg";

/// File name of a database stamped `at`.
pub fn db_file_name(at: NaiveDateTime) -> String {
  format!("{DB_PREFIX}{}{DB_SUFFIX}", at.format("%Y-%m-%d-T%Hh%Mm%Ss"))
}

/// The newest database in `folder`: the last matching file name in
/// lexicographic order.
pub fn latest_database(folder: &Path) -> Result<PathBuf> {
  let mut names = Vec::new();
  for entry in fs::read_dir(folder)? {
    let entry = entry?;
    if !entry.file_type()?.is_file() {
      continue;
    }
    let name = entry.file_name().to_string_lossy().into_owned();
    if name.starts_with(DB_PREFIX) && name.ends_with(DB_SUFFIX) {
      names.push(name);
    }
  }
  names.sort();
  names
    .pop()
    .map(|name| folder.join(name))
    .ok_or_else(|| Error::NoDatabase(folder.to_owned()))
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A registry store backed by a single GeoPackage file.
pub struct SqliteStore {
  pub(crate) conn: Connection,
  path: Option<PathBuf>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and initialise the container.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_owned();
    let conn = Connection::open(&path)?;
    let store = Self { conn, path: Some(path) };
    store.init_schema()?;
    info!(path = %store.path_display(), "opened database");
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub fn open_in_memory() -> Result<Self> {
    let store = Self { conn: Connection::open_in_memory()?, path: None };
    store.init_schema()?;
    Ok(store)
  }

  /// Open the newest database in `folder`.
  pub fn open_latest(folder: impl AsRef<Path>) -> Result<Self> {
    Self::open(latest_database(folder.as_ref())?)
  }

  /// Create a new, empty database in `folder` named after the current time.
  ///
  /// Fails with [`Error::DatabaseExists`] when the folder already holds a
  /// database, since the new file would become the latest and hide it.
  pub fn create(folder: impl AsRef<Path>) -> Result<Self> {
    let folder = folder.as_ref();
    fs::create_dir_all(folder)?;
    match latest_database(folder) {
      Ok(existing) => return Err(Error::DatabaseExists(existing)),
      Err(Error::NoDatabase(_)) => {}
      Err(e) => return Err(e),
    }
    Self::open(folder.join(db_file_name(Local::now().naive_local())))
  }

  fn init_schema(&self) -> Result<()> {
    self.conn.pragma_update(None, "application_id", APPLICATION_ID)?;
    self.conn.pragma_update(None, "user_version", USER_VERSION)?;
    self.conn.execute_batch(SCHEMA)?;
    Ok(())
  }

  fn path_display(&self) -> String {
    self
      .path
      .as_deref()
      .map_or_else(|| ":memory:".to_owned(), |p| p.display().to_string())
  }

  /// Copy the current database to a new timestamped file in `folder` and
  /// return its path. The copy becomes the newest file in the folder.
  pub fn snapshot(&self, folder: impl AsRef<Path>) -> Result<PathBuf> {
    let folder = folder.as_ref();
    fs::create_dir_all(folder)?;
    let target = folder.join(db_file_name(Local::now().naive_local()));
    self
      .conn
      .execute("VACUUM INTO ?1", params![target.to_string_lossy().into_owned()])?;
    info!(from = %self.path_display(), to = %target.display(), "snapshot written");
    Ok(target)
  }

  fn has_layer(&self, layer: &str) -> Result<bool> {
    let found = self
      .conn
      .query_row(
        "SELECT 1 FROM gpkg_contents WHERE table_name = ?1",
        params![layer],
        |_| Ok(()),
      )
      .optional()?;
    Ok(found.is_some())
  }
}

impl TableStore for SqliteStore {
  type Error = Error;

  fn layers(&self) -> Result<Vec<String>> {
    let mut stmt = self.conn.prepare(
      "SELECT table_name FROM gpkg_contents WHERE data_type = 'attributes'
       ORDER BY table_name",
    )?;
    let names = stmt
      .query_map([], |r| r.get(0))?
      .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
  }

  fn read_layer(&self, layer: &str) -> Result<Option<Frame>> {
    if !self.has_layer(layer)? {
      return Ok(None);
    }

    let mut stmt = self
      .conn
      .prepare(&format!("SELECT * FROM {} ORDER BY {FID}", quote_ident(layer)))?;
    let names: Vec<String> = stmt.column_names().into_iter().map(str::to_owned).collect();
    let keep: Vec<usize> = (0..names.len()).filter(|&i| names[i] != FID).collect();

    let mut frame = Frame::new(keep.iter().map(|&i| names[i].as_str()));
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
      let mut cells = Vec::with_capacity(keep.len());
      for &i in &keep {
        cells.push(decode_value(row.get_ref(i)?));
      }
      frame.push_row(cells);
    }

    debug!(layer, rows = frame.len(), "read layer");
    Ok(Some(frame))
  }

  fn write_layer(&self, layer: &str, frame: &Frame) -> Result<()> {
    let table = quote_ident(layer);
    let columns: Vec<String> = frame.columns().iter().map(|c| quote_ident(c)).collect();
    let mut defs = vec![format!("{FID} INTEGER PRIMARY KEY AUTOINCREMENT")];
    defs.extend(
      columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{c} {}", column_type(frame, i))),
    );

    let tx = self.conn.unchecked_transaction()?;
    tx.execute_batch(&format!(
      "DROP TABLE IF EXISTS {table};
       CREATE TABLE {table} ({});",
      defs.join(", ")
    ))?;

    if !columns.is_empty() {
      let placeholders = vec!["?"; columns.len()].join(", ");
      let mut insert = tx.prepare(&format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders})",
        columns.join(", ")
      ))?;
      for row in frame.rows() {
        insert.execute(params_from_iter(row.iter().map(encode_value)))?;
      }
    }

    let now = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
    tx.execute(
      "INSERT INTO gpkg_contents (table_name, data_type, identifier, last_change)
       VALUES (?1, 'attributes', ?1, ?2)
       ON CONFLICT (table_name) DO UPDATE SET last_change = excluded.last_change",
      params![layer, now],
    )?;
    tx.commit()?;

    debug!(layer, rows = frame.len(), "wrote layer");
    Ok(())
  }

  fn location(&self) -> Option<&Path> { self.path.as_deref() }
}
