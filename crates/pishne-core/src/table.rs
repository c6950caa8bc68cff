//! [`RecordTable`] — an append-only table of stamped records.
//!
//! Every record gets a unique `RecId`, a timestamp and an `On`/`Off` status.
//! Records are inserted, edited in place by key, and archived (status flip);
//! nothing is ever physically removed. After each mutation the schema's
//! derived columns are recomputed from the full table.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  frame::Frame,
  metadata::{Dataset, Describe, Metadata},
  record::{
    RECID_FIELD, RECSTATUS_FIELD, RECTIMESTAMP_FIELD, RecId, RecStatus, Record,
    decode_timestamp, timestamp_now,
  },
  schema::Schema,
  store::TableStore,
  value::Value,
};

/// Domain fields keyed by column name, as supplied by callers.
pub type Fields = BTreeMap<String, Value>;

/// Column names of the long (`Field`/`Value`) form of a record.
pub const FIELD_COLUMN: &str = "Field";
pub const VALUE_COLUMN: &str = "Value";

/// Options for [`RecordTable::view`].
#[derive(Debug, Clone, Copy)]
pub struct ViewOptions {
  /// Only records with status `On`.
  pub active_only: bool,
  /// Keep only the N most recent records by timestamp.
  pub limit:       Option<usize>,
}

impl Default for ViewOptions {
  fn default() -> Self { Self { active_only: true, limit: None } }
}

#[derive(Debug, Clone)]
pub struct RecordTable {
  schema:  Schema,
  dataset: Dataset,
  records: Vec<Record>,
}

impl RecordTable {
  pub fn new(schema: Schema) -> Self {
    let meta = Metadata::new(schema.table(), Some(schema.alias().to_owned()));
    Self { schema, dataset: Dataset::new(meta), records: Vec::new() }
  }

  pub fn name(&self) -> &str { self.schema.table() }

  pub fn schema(&self) -> &Schema { &self.schema }

  pub fn dataset(&self) -> &Dataset { &self.dataset }

  pub fn dataset_mut(&mut self) -> &mut Dataset { &mut self.dataset }

  pub fn records(&self) -> &[Record] { &self.records }

  pub fn len(&self) -> usize { self.records.len() }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }

  pub fn active_len(&self) -> usize {
    self.records.iter().filter(|r| r.is_active()).count()
  }

  // ── Identity ──────────────────────────────────────────────────────────────

  fn last_seq(&self) -> u64 {
    self.records.iter().map(|r| r.rec_id.seq()).max().unwrap_or(0)
  }

  /// The id the next insert will receive. Archived records count.
  pub fn next_rec_id(&self) -> RecId {
    RecId::new(self.last_seq() + 1, self.schema.id_width())
  }

  /// Index of the record matching `key`.
  ///
  /// With a lookup column the key is first matched against that column among
  /// active records; otherwise, or when that fails, it is matched against
  /// `RecId` across all records.
  fn position(&self, key: &str) -> Option<usize> {
    let by_lookup = self.schema.lookup().and_then(|col| {
      self
        .records
        .iter()
        .position(|r| r.is_active() && r.text(col) == Some(key))
    });
    by_lookup.or_else(|| {
      let id = key.parse::<RecId>().ok()?;
      self.records.iter().position(|r| r.rec_id == id)
    })
  }

  fn not_found(&self, key: &str) -> Error {
    Error::NotFound { table: self.name().to_owned(), key: key.to_owned() }
  }

  /// Whether `key` resolves to a record.
  pub fn contains(&self, key: &str) -> bool { self.position(key).is_some() }

  pub fn get(&self, key: &str) -> Result<&Record> {
    self
      .position(key)
      .map(|i| &self.records[i])
      .ok_or_else(|| self.not_found(key))
  }

  // ── Input filtering ───────────────────────────────────────────────────────

  fn validation(&self, field: &str, reason: impl Into<String>) -> Error {
    Error::Validation {
      table:  self.name().to_owned(),
      field:  field.to_owned(),
      reason: reason.into(),
    }
  }

  /// Keep declared, non-derived columns and coerce them to their types.
  fn filter_fields(&self, fields: Fields) -> Result<Fields> {
    let mut out = Fields::new();
    for (name, value) in fields {
      let Some(col) = self.schema.column(&name) else {
        debug!(table = self.name(), field = %name, "ignoring undeclared field");
        continue;
      };
      if self.schema.is_derived(&name) {
        continue;
      }
      let coerced = value
        .coerce(col.kind)
        .ok_or_else(|| self.validation(&name, format!("expected {:?}", col.kind)))?;
      out.insert(name, coerced);
    }
    Ok(out)
  }

  fn check_required(&self, fields: &Fields, missing_is_null: bool) -> Result<()> {
    for col in self.schema.columns() {
      if !col.required || self.schema.is_derived(&col.name) {
        continue;
      }
      let null = match fields.get(&col.name) {
        Some(v) => v.is_null(),
        None => missing_is_null,
      };
      if null {
        return Err(self.validation(&col.name, "required field is empty"));
      }
    }
    Ok(())
  }

  /// The first required, non-derived column that is null in `fields`.
  fn first_null_required<'a>(&'a self, fields: &Fields) -> Option<&'a str> {
    self
      .schema
      .columns()
      .iter()
      .filter(|c| c.required && !self.schema.is_derived(&c.name))
      .find(|c| fields.get(&c.name).is_none_or(Value::is_null))
      .map(|c| c.name.as_str())
  }

  /// Run the checks [`insert`](Self::insert) would run, without inserting.
  pub fn check_insert(&self, fields: &Fields) -> Result<()> {
    let filtered = self.filter_fields(fields.clone())?;
    self.check_required(&filtered, true)
  }

  /// Run the checks [`edit`](Self::edit) would run, without editing.
  pub fn check_edit(&self, key: &str, changes: &Fields) -> Result<()> {
    self.get(key)?;
    let filtered = self.filter_fields(changes.clone())?;
    self.check_required(&filtered, false)
  }

  // ── Mutations ─────────────────────────────────────────────────────────────

  /// Append a record built from `fields` and return its id.
  ///
  /// Undeclared and derived fields are ignored. A null or missing required
  /// field rejects the insert and leaves the table unchanged.
  pub fn insert(&mut self, fields: Fields) -> Result<RecId> {
    let fields = self.filter_fields(fields)?;
    self.check_required(&fields, true)?;

    let rec_id = self.next_rec_id();
    let rec_table = self.name().to_owned();
    self.records.push(Record {
      rec_id: rec_id.clone(),
      rec_table,
      rec_timestamp: timestamp_now(),
      rec_status: RecStatus::On,
      fields,
    });
    self.refresh();

    debug!(table = self.name(), %rec_id, "inserted record");
    Ok(rec_id)
  }

  /// Replace the given fields of the record matching `key` and refresh its
  /// timestamp. Returns the record's id.
  pub fn edit(&mut self, key: &str, changes: Fields) -> Result<RecId> {
    let idx = self.position(key).ok_or_else(|| self.not_found(key))?;
    let changes = self.filter_fields(changes)?;
    self.check_required(&changes, false)?;

    let record = &mut self.records[idx];
    record.fields.extend(changes);
    record.rec_timestamp = timestamp_now();
    let rec_id = record.rec_id.clone();
    self.refresh();

    debug!(table = self.name(), %rec_id, "edited record");
    Ok(rec_id)
  }

  /// Set the status of the record matching `key` to `Off`. Archiving an
  /// archived record succeeds and changes nothing but the timestamp.
  pub fn archive(&mut self, key: &str) -> Result<RecId> {
    let idx = self.position(key).ok_or_else(|| self.not_found(key))?;

    let record = &mut self.records[idx];
    record.rec_status = RecStatus::Off;
    record.rec_timestamp = timestamp_now();
    let rec_id = record.rec_id.clone();
    self.refresh();

    debug!(table = self.name(), %rec_id, "archived record");
    Ok(rec_id)
  }

  /// Recompute every derived column from the current table state.
  pub fn refresh(&mut self) {
    for derived in self.schema.derived() {
      let values = derived.compute(&self.records);
      if values.len() != self.records.len() {
        warn!(
          table = self.schema.table(),
          column = derived.column(),
          expected = self.records.len(),
          got = values.len(),
          "derived column returned the wrong number of values"
        );
      }
      for (record, value) in self.records.iter_mut().zip(values) {
        record.fields.insert(derived.column().to_owned(), value);
      }
    }
    self.dataset.update(self.records.len());
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  fn selected(&self, opts: ViewOptions) -> Vec<&Record> {
    let mut selected: Vec<&Record> = self
      .records
      .iter()
      .filter(|r| !opts.active_only || r.is_active())
      .collect();
    if let Some(n) = opts.limit {
      selected.sort_by(|a, b| {
        b.rec_timestamp
          .cmp(&a.rec_timestamp)
          .then_with(|| b.rec_id.cmp(&a.rec_id))
      });
      selected.truncate(n);
    }
    selected
  }

  fn frame_of(&self, columns: &[&str], records: &[&Record]) -> Frame {
    let mut frame = Frame::new(columns.iter().copied());
    for r in records {
      frame.push_row(columns.iter().map(|c| r.get(c)).collect());
    }
    frame
  }

  /// Domain columns only, base columns stripped.
  pub fn view(&self, opts: ViewOptions) -> Frame {
    self.frame_of(&self.schema.column_names(), &self.selected(opts))
  }

  /// Base and domain columns, in organised order.
  pub fn to_frame(&self, active_only: bool) -> Frame {
    let opts = ViewOptions { active_only, limit: None };
    self.frame_of(&self.schema.organized_columns(), &self.selected(opts))
  }

  /// One record in long form: a `Field`/`Value` row per column.
  pub fn record_frame(&self, key: &str) -> Result<Frame> {
    let record = self.get(key)?;
    let mut frame = Frame::new([FIELD_COLUMN, VALUE_COLUMN]);
    for col in self.schema.organized_columns() {
      frame.push_row(vec![Value::text(col), record.get(col)]);
    }
    Ok(frame)
  }

  // ── Bulk load ─────────────────────────────────────────────────────────────

  /// Load rows from `frame`, appending to or replacing the current data.
  ///
  /// `RecTable` is always overwritten. Without a `RecId` column ids are
  /// assigned sequentially; rows whose id is already present are skipped.
  /// Missing timestamps become now, missing statuses `On`, and missing
  /// domain columns null. Rows with an empty required column are loaded
  /// with a warning. Returns the number of rows added. Nothing changes when
  /// any row fails to decode.
  pub fn set_data(&mut self, frame: &Frame, append: bool) -> Result<usize> {
    let id_col = frame.column_index(RECID_FIELD);
    let ts_col = frame.column_index(RECTIMESTAMP_FIELD);
    let status_col = frame.column_index(RECSTATUS_FIELD);
    let domain: Vec<(usize, Option<usize>)> = self
      .schema
      .columns()
      .iter()
      .enumerate()
      .map(|(i, c)| (i, frame.column_index(&c.name)))
      .collect();

    let kept: &[Record] = if append { &self.records } else { &[] };
    let mut seen: HashSet<RecId> = kept.iter().map(|r| r.rec_id.clone()).collect();
    let mut next_seq = kept.iter().map(|r| r.rec_id.seq()).max().unwrap_or(0) + 1;
    let now = timestamp_now();

    let mut incoming = Vec::with_capacity(frame.len());
    for row in frame.rows() {
      let rec_id = match id_col {
        Some(i) => row[i].to_string().parse::<RecId>()?,
        None => {
          let id = RecId::new(next_seq, self.schema.id_width());
          next_seq += 1;
          id
        }
      };
      if !seen.insert(rec_id.clone()) {
        warn!(table = self.name(), %rec_id, "skipping duplicate record id");
        continue;
      }

      let rec_timestamp = match ts_col.map(|i| &row[i]) {
        Some(Value::Null) | None => now,
        Some(v) => decode_timestamp(&v.to_string())?,
      };
      let rec_status = match status_col.map(|i| &row[i]) {
        Some(Value::Null) | None => RecStatus::On,
        Some(v) => RecStatus::parse(&v.to_string())?,
      };

      let mut fields = Fields::new();
      for &(ci, fi) in &domain {
        let col = &self.schema.columns()[ci];
        let raw = fi.map(|i| row[i].clone()).unwrap_or_default();
        let value = raw
          .coerce(col.kind)
          .ok_or_else(|| self.validation(&col.name, format!("expected {:?}", col.kind)))?;
        fields.insert(col.name.clone(), value);
      }
      if let Some(column) = self.first_null_required(&fields) {
        warn!(table = self.name(), %rec_id, column, "required field is empty");
      }

      incoming.push(Record {
        rec_id,
        rec_table: self.name().to_owned(),
        rec_timestamp,
        rec_status,
        fields,
      });
    }

    let added = incoming.len();
    if !append {
      self.records.clear();
    }
    self.records.extend(incoming);
    self.refresh();
    Ok(added)
  }

  // ── Persistence ───────────────────────────────────────────────────────────

  /// Replace this table's contents with its layer in `store`.
  pub fn load<S: TableStore>(&mut self, store: &S) -> Result<usize, S::Error> {
    let frame = store
      .read_layer(self.name())?
      .ok_or_else(|| Error::MissingLayer(self.name().to_owned()))?;
    let n = self.set_data(&frame, false)?;
    if let Some(location) = store.location() {
      self.dataset.set_source(location, Some(self.name().to_owned()));
      self.dataset.update(self.records.len());
    }
    info!(table = self.name(), records = n, "loaded layer");
    Ok(n)
  }

  /// Write the whole table, archived records included, as its layer.
  /// Overwrites whatever the store held for the layer.
  pub fn save<S: TableStore>(&self, store: &S) -> Result<(), S::Error> {
    store.write_layer(self.name(), &self.to_frame(false))?;
    info!(table = self.name(), records = self.len(), "saved layer");
    Ok(())
  }
}

impl Describe for RecordTable {
  fn metadata(&self) -> Vec<(String, Value)> { self.dataset.metadata() }
}
