//! The six tables of the action registry and the action-code operator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{
  Result,
  record::Record,
  schema::{Column, DerivedColumn, Schema},
  table::RecordTable,
  value::Value,
};

pub const COD_COMPONENTE: &str = "cod_componente";
pub const NM_COMPONENTE: &str = "nm_componente";
pub const DESC_COMPONENTE: &str = "desc_componente";
pub const COD_SUBCOMPONENTE: &str = "cod_subcomponente";
pub const DESC_SUBCOMPONENTE: &str = "desc_subcomponente";
pub const NM_TEMATICA: &str = "nm_tematica";
pub const COD_ACAO: &str = "cod_acao";
pub const DESC_ACAO: &str = "desc_acao";
pub const VALOR_INVESTIMENTO: &str = "valor_investimento";
pub const ORIGEM_INVESTIMENTO: &str = "origem_investimento";
pub const ESCALA_ACAO: &str = "escala_acao";
pub const CATEGORIA: &str = "categoria";

/// Code given to every archived action.
pub const ARCHIVED_ACTION_CODE: &str = "acao arquivada";

// ─── TableKind ───────────────────────────────────────────────────────────────

/// The layers of the store. The string form is the layer name.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Display,
  EnumString,
  EnumIter,
  AsRefStr,
  Serialize,
  Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
  Componentes,
  Subcomponentes,
  Tematicas,
  Acoes,
  Escala,
  Origem,
}

impl TableKind {
  /// The column schema of this table.
  pub fn schema(self) -> Result<Schema> {
    let b = Schema::builder(self.as_ref(), self.alias());
    match self {
      Self::Componentes => b
        .column(Column::text(COD_COMPONENTE))
        .column(Column::text(NM_COMPONENTE))
        .column(Column::text(DESC_COMPONENTE).optional()),
      Self::Subcomponentes => b
        .column(Column::text(COD_SUBCOMPONENTE))
        .column(Column::text(DESC_SUBCOMPONENTE).optional())
        .column(Column::text(COD_COMPONENTE)),
      Self::Tematicas => b
        .column(Column::text(COD_SUBCOMPONENTE))
        .column(Column::text(NM_TEMATICA)),
      Self::Acoes => b
        .column(Column::text(COD_COMPONENTE))
        .column(Column::text(COD_SUBCOMPONENTE))
        .column(Column::text(NM_TEMATICA))
        .column(Column::text(COD_ACAO))
        .column(Column::text(DESC_ACAO))
        .column(Column::number(VALOR_INVESTIMENTO))
        .column(Column::text(ORIGEM_INVESTIMENTO))
        .column(Column::text(ESCALA_ACAO))
        .lookup(COD_ACAO)
        .derived(ActionCodes),
      Self::Escala => b
        .column(Column::text(ESCALA_ACAO))
        .column(Column::text(CATEGORIA)),
      Self::Origem => b
        .column(Column::text(ORIGEM_INVESTIMENTO))
        .column(Column::text(CATEGORIA)),
    }
    .build()
  }

  pub fn alias(self) -> &'static str {
    match self {
      Self::Componentes => "CM",
      Self::Subcomponentes => "SC",
      Self::Tematicas => "TM",
      Self::Acoes => "AC",
      Self::Escala => "ES",
      Self::Origem => "OR",
    }
  }

  /// An empty table with this kind's schema.
  pub fn table(self) -> Result<RecordTable> { Ok(RecordTable::new(self.schema()?)) }
}

// ─── Action codes ────────────────────────────────────────────────────────────

/// Numbers the active actions of each sub-component as `acao <prefix>.<n>`,
/// in table order, where `<prefix>` is the last word of the sub-component
/// code. Archived actions get [`ARCHIVED_ACTION_CODE`].
#[derive(Debug, Clone, Copy)]
pub struct ActionCodes;

fn subcomponent_prefix(code: &str) -> &str {
  code.split_whitespace().next_back().unwrap_or_default()
}

impl DerivedColumn for ActionCodes {
  fn column(&self) -> &str { COD_ACAO }

  fn compute(&self, records: &[Record]) -> Vec<Value> {
    let mut counters: HashMap<&str, usize> = HashMap::new();
    records
      .iter()
      .map(|r| {
        if !r.is_active() {
          return Value::text(ARCHIVED_ACTION_CODE);
        }
        let sub = r.text(COD_SUBCOMPONENTE).unwrap_or_default();
        let n = counters.entry(sub).or_default();
        *n += 1;
        Value::Text(format!("acao {}.{n}", subcomponent_prefix(sub)))
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator;

  use super::*;
  use crate::table::Fields;

  fn action(sub: &str) -> Fields {
    [
      (COD_COMPONENTE, Value::text("Componente 1")),
      (COD_SUBCOMPONENTE, Value::text(sub)),
      (NM_TEMATICA, Value::text("Água")),
      (DESC_ACAO, Value::text("Cisternas")),
      (VALOR_INVESTIMENTO, Value::Number(10.0)),
      (ORIGEM_INVESTIMENTO, Value::text("Estados")),
      (ESCALA_ACAO, Value::text("CE")),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v))
    .collect()
  }

  fn codes(table: &RecordTable) -> Vec<String> {
    table
      .records()
      .iter()
      .map(|r| r.text(COD_ACAO).unwrap_or_default().to_owned())
      .collect()
  }

  #[test]
  fn all_schemas_are_valid() {
    for kind in TableKind::iter() {
      let schema = kind.schema().unwrap();
      assert_eq!(schema.table(), kind.to_string());
    }
  }

  #[test]
  fn layer_names_parse_back() {
    assert_eq!("acoes".parse::<TableKind>().unwrap(), TableKind::Acoes);
    assert_eq!(TableKind::Subcomponentes.as_ref(), "subcomponentes");
  }

  #[test]
  fn codes_number_per_subcomponent_in_table_order() {
    let mut t = TableKind::Acoes.table().unwrap();
    t.insert(action("Subcomponente 1.1")).unwrap();
    t.insert(action("Subcomponente 2.1")).unwrap();
    t.insert(action("Subcomponente 1.1")).unwrap();

    assert_eq!(codes(&t), ["acao 1.1.1", "acao 2.1.1", "acao 1.1.2"]);
  }

  #[test]
  fn archived_actions_get_sentinel_and_free_their_number() {
    let mut t = TableKind::Acoes.table().unwrap();
    t.insert(action("Sub 3")).unwrap();
    t.insert(action("Sub 3")).unwrap();
    t.insert(action("Sub 3")).unwrap();

    t.archive("acao 3.1").unwrap();
    assert_eq!(codes(&t), [ARCHIVED_ACTION_CODE, "acao 3.1", "acao 3.2"]);
  }

  #[test]
  fn caller_supplied_codes_are_ignored() {
    let mut t = TableKind::Acoes.table().unwrap();
    let mut fields = action("Sub 7");
    fields.insert(COD_ACAO.to_owned(), Value::text("made up"));
    t.insert(fields).unwrap();
    assert_eq!(codes(&t), ["acao 7.1"]);
  }

  #[test]
  fn actions_are_edited_by_code() {
    let mut t = TableKind::Acoes.table().unwrap();
    t.insert(action("Sub 1")).unwrap();
    let mut changes = Fields::new();
    changes.insert(DESC_ACAO.to_owned(), Value::text("Poços"));

    let id = t.edit("acao 1.1", changes).unwrap();
    assert_eq!(id.as_str(), "Rec0001");
    assert_eq!(t.records()[0].text(DESC_ACAO), Some("Poços"));
  }
}
