//! Confirmation-gated insert, edit and remove.
//!
//! Each flow checks the request, shows the caller a [`Proposal`] through an
//! injected [`Confirm`] and, on approval, applies the mutation and writes the
//! table's layer to the store straight away. The gate is a user-experience
//! step only; it does not protect against other writers.

use tracing::info;

use crate::{
  Error, Result,
  frame::Frame,
  record::RecId,
  store::TableStore,
  table::{FIELD_COLUMN, Fields, RecordTable, VALUE_COLUMN},
  value::Value,
};

// ─── Proposals ───────────────────────────────────────────────────────────────

/// One field of an edit: what is stored now and what would replace it.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
  pub field:    String,
  pub current:  Value,
  pub proposed: Value,
}

/// What the caller is asked to approve.
#[derive(Debug, Clone, PartialEq)]
pub enum Proposal {
  Insert {
    table:  String,
    /// `Field`/`Value` rows of the new record.
    fields: Frame,
  },
  Edit {
    table:   String,
    key:     String,
    /// The record as stored, in long form.
    current: Frame,
    changes: Vec<Change>,
  },
  Remove {
    table:   String,
    key:     String,
    current: Frame,
  },
}

/// The result of a flow that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  Committed(RecId),
  Cancelled,
}

impl Outcome {
  pub fn is_committed(&self) -> bool { matches!(self, Self::Committed(_)) }
}

// ─── Confirm ─────────────────────────────────────────────────────────────────

/// Approves or declines a [`Proposal`].
pub trait Confirm {
  fn confirm(&mut self, proposal: &Proposal) -> bool;
}

impl<F> Confirm for F
where
  F: FnMut(&Proposal) -> bool,
{
  fn confirm(&mut self, proposal: &Proposal) -> bool { self(proposal) }
}

// ─── Flows ───────────────────────────────────────────────────────────────────

fn fields_frame(fields: &Fields) -> Frame {
  let mut frame = Frame::new([FIELD_COLUMN, VALUE_COLUMN]);
  for (k, v) in fields {
    frame.push_row(vec![Value::text(k), v.clone()]);
  }
  frame
}

/// Insert a record after confirmation and persist the table.
///
/// A null in any declared, non-derived column rejects the request before
/// the caller is asked. Derived and undeclared fields are ignored, as
/// [`RecordTable::insert`] ignores them.
pub fn insert<S, C>(
  table: &mut RecordTable,
  store: &S,
  fields: Fields,
  confirm: &mut C,
) -> Result<Outcome, S::Error>
where
  S: TableStore,
  C: Confirm + ?Sized,
{
  let schema = table.schema();
  let blank = fields
    .iter()
    .filter(|(k, _)| schema.column(k).is_some() && !schema.is_derived(k))
    .find(|(_, v)| v.is_null());
  if let Some((field, _)) = blank {
    return Err(
      Error::Validation {
        table:  table.name().to_owned(),
        field:  field.clone(),
        reason: "empty field".to_owned(),
      }
      .into(),
    );
  }
  table.check_insert(&fields)?;

  let proposal = Proposal::Insert {
    table:  table.name().to_owned(),
    fields: fields_frame(&fields),
  };
  if !confirm.confirm(&proposal) {
    info!(table = table.name(), "insert cancelled");
    return Ok(Outcome::Cancelled);
  }

  let rec_id = table.insert(fields)?;
  table.save(store)?;
  info!(table = table.name(), %rec_id, "insert committed");
  Ok(Outcome::Committed(rec_id))
}

/// Edit the record matching `key` after confirmation and persist the table.
pub fn edit<S, C>(
  table: &mut RecordTable,
  store: &S,
  key: &str,
  changes: Fields,
  confirm: &mut C,
) -> Result<Outcome, S::Error>
where
  S: TableStore,
  C: Confirm + ?Sized,
{
  table.check_edit(key, &changes)?;
  let record = table.get(key)?;
  let diff = changes
    .iter()
    .map(|(field, proposed)| Change {
      field:    field.clone(),
      current:  record.get(field),
      proposed: proposed.clone(),
    })
    .collect();

  let proposal = Proposal::Edit {
    table:   table.name().to_owned(),
    key:     key.to_owned(),
    current: table.record_frame(key)?,
    changes: diff,
  };
  if !confirm.confirm(&proposal) {
    info!(table = table.name(), key, "edit cancelled");
    return Ok(Outcome::Cancelled);
  }

  let rec_id = table.edit(key, changes)?;
  table.save(store)?;
  info!(table = table.name(), %rec_id, "edit committed");
  Ok(Outcome::Committed(rec_id))
}

/// Archive the record matching `key` after confirmation and persist the
/// table.
pub fn remove<S, C>(
  table: &mut RecordTable,
  store: &S,
  key: &str,
  confirm: &mut C,
) -> Result<Outcome, S::Error>
where
  S: TableStore,
  C: Confirm + ?Sized,
{
  let proposal = Proposal::Remove {
    table:   table.name().to_owned(),
    key:     key.to_owned(),
    current: table.record_frame(key)?,
  };
  if !confirm.confirm(&proposal) {
    info!(table = table.name(), key, "remove cancelled");
    return Ok(Outcome::Cancelled);
  }

  let rec_id = table.archive(key)?;
  table.save(store)?;
  info!(table = table.name(), %rec_id, "remove committed");
  Ok(Outcome::Committed(rec_id))
}
