//! Records — one row of a [`RecordTable`](crate::table::RecordTable).
//!
//! Every record carries four bookkeeping fields (id, owning table,
//! timestamp, status) followed by the domain fields fixed by the table's
//! schema. Records are never physically removed; archival flips the status.

use std::{
  cmp::Ordering,
  collections::BTreeMap,
  fmt,
  hash::{Hash, Hasher},
  str::FromStr,
};

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Error, Result, value::Value};

pub const RECID_FIELD: &str = "RecId";
pub const RECTABLE_FIELD: &str = "RecTable";
pub const RECTIMESTAMP_FIELD: &str = "RecTimestamp";
pub const RECSTATUS_FIELD: &str = "RecStatus";

/// The bookkeeping columns, in the order they are written.
pub const BASE_COLUMNS: [&str; 4] =
  [RECID_FIELD, RECTABLE_FIELD, RECTIMESTAMP_FIELD, RECSTATUS_FIELD];

const RECID_PREFIX: &str = "Rec";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── RecId ───────────────────────────────────────────────────────────────────

/// `"Rec"` followed by a zero-padded sequence number, e.g. `Rec0007`.
///
/// Identity is the sequence number alone: `Rec7` and `Rec0007` are the same
/// id. The text keeps whatever padding it was read with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecId {
  seq:  u64,
  text: String,
}

impl RecId {
  pub fn new(seq: u64, width: usize) -> Self {
    Self { seq, text: format!("{RECID_PREFIX}{seq:0width$}") }
  }

  /// The numeric suffix.
  pub fn seq(&self) -> u64 { self.seq }

  pub fn as_str(&self) -> &str { &self.text }
}

impl PartialEq for RecId {
  fn eq(&self, other: &Self) -> bool { self.seq == other.seq }
}

impl Eq for RecId {}

impl Hash for RecId {
  fn hash<H: Hasher>(&self, state: &mut H) { self.seq.hash(state) }
}

impl PartialOrd for RecId {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for RecId {
  fn cmp(&self, other: &Self) -> Ordering { self.seq.cmp(&other.seq) }
}

impl FromStr for RecId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let digits = s
      .strip_prefix(RECID_PREFIX)
      .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
      .ok_or_else(|| Error::InvalidRecId(s.to_owned()))?;
    let seq = digits
      .parse()
      .map_err(|_| Error::InvalidRecId(s.to_owned()))?;
    Ok(Self { seq, text: s.to_owned() })
  }
}

impl TryFrom<String> for RecId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<RecId> for String {
  fn from(id: RecId) -> Self { id.text }
}

impl fmt::Display for RecId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.text)
  }
}

// ─── RecStatus ───────────────────────────────────────────────────────────────

/// Soft-delete flag.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
pub enum RecStatus {
  #[default]
  On,
  Off,
}

impl RecStatus {
  pub fn is_active(self) -> bool { self == Self::On }

  pub fn parse(s: &str) -> Result<Self> {
    s.trim()
      .parse()
      .map_err(|_| Error::InvalidStatus(s.to_owned()))
  }
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// The current local time truncated to whole seconds.
pub fn timestamp_now() -> NaiveDateTime {
  let now = Local::now().naive_local();
  now.with_nanosecond(0).unwrap_or(now)
}

pub fn encode_timestamp(ts: NaiveDateTime) -> String {
  ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn decode_timestamp(s: &str) -> Result<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
    .map_err(|_| Error::InvalidTimestamp(s.to_owned()))
}

// ─── Record ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
  pub rec_id:        RecId,
  pub rec_table:     String,
  pub rec_timestamp: NaiveDateTime,
  pub rec_status:    RecStatus,
  /// Domain fields keyed by column name. Columns absent from the map read
  /// as null.
  pub fields:        BTreeMap<String, Value>,
}

impl Record {
  pub fn is_active(&self) -> bool { self.rec_status.is_active() }

  /// A domain field, or one of the base fields rendered as text.
  pub fn get(&self, column: &str) -> Value {
    match column {
      RECID_FIELD => Value::text(self.rec_id.as_str()),
      RECTABLE_FIELD => Value::text(&self.rec_table),
      RECTIMESTAMP_FIELD => Value::Text(encode_timestamp(self.rec_timestamp)),
      RECSTATUS_FIELD => Value::Text(self.rec_status.to_string()),
      other => self.fields.get(other).cloned().unwrap_or_default(),
    }
  }

  /// Text of a domain field; `None` for nulls and numbers.
  pub fn text(&self, column: &str) -> Option<&str> {
    self.fields.get(column).and_then(Value::as_str)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rec_id_is_zero_padded() {
    assert_eq!(RecId::new(1, 4).as_str(), "Rec0001");
    assert_eq!(RecId::new(12345, 4).as_str(), "Rec12345");
  }

  #[test]
  fn rec_id_parses_suffix() {
    let id: RecId = "Rec0042".parse().unwrap();
    assert_eq!(id.seq(), 42);
    assert!("Rec".parse::<RecId>().is_err());
    assert!("X0001".parse::<RecId>().is_err());
    assert!("Rec00a1".parse::<RecId>().is_err());
  }

  #[test]
  fn rec_ids_compare_by_sequence() {
    let short: RecId = "Rec1".parse().unwrap();
    let padded: RecId = "Rec0001".parse().unwrap();
    assert_eq!(short, padded);
    assert_eq!(short.as_str(), "Rec1");
    assert!(padded < RecId::new(2, 4));
  }

  #[test]
  fn status_round_trips_through_text() {
    assert_eq!(RecStatus::On.to_string(), "On");
    assert_eq!(RecStatus::parse(" Off").unwrap(), RecStatus::Off);
    assert!(RecStatus::parse("maybe").is_err());
  }

  #[test]
  fn timestamp_has_second_precision() {
    let ts = timestamp_now();
    assert_eq!(ts.nanosecond(), 0);
    let text = encode_timestamp(ts);
    assert_eq!(decode_timestamp(&text).unwrap(), ts);
  }
}
