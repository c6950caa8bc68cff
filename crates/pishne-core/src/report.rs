//! Reporting views over a [`Database`]: the flat join, the per-geography
//! expansion and grouped investment summaries.
//!
//! Everything here is computed on demand from the active records; nothing is
//! persisted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  database::Database,
  frame::Frame,
  table::ViewOptions,
  tables::{
    CATEGORIA, COD_ACAO, COD_COMPONENTE, COD_SUBCOMPONENTE, DESC_ACAO, DESC_COMPONENTE,
    DESC_SUBCOMPONENTE, ESCALA_ACAO, NM_COMPONENTE, NM_TEMATICA, ORIGEM_INVESTIMENTO,
    TableKind, VALOR_INVESTIMENTO,
  },
  value::Value,
};

/// Geography label added by [`expand`].
pub const ESCALA_LOCAL: &str = "escala_local";

pub const MEDIA: &str = "media";
pub const SOMA: &str = "soma";
pub const MIN: &str = "min";
pub const MAX: &str = "max";
pub const CONTAGEM: &str = "contagem";
pub const UNIDADE: &str = "unidade";
/// Key of the synthetic row appended by [`summarize`].
pub const TOTALS_KEY: &str = "totais";

/// Column order of the joined view.
pub const JOIN_COLUMNS: [&str; 11] = [
  COD_COMPONENTE,
  NM_COMPONENTE,
  DESC_COMPONENTE,
  COD_SUBCOMPONENTE,
  DESC_SUBCOMPONENTE,
  NM_TEMATICA,
  COD_ACAO,
  DESC_ACAO,
  VALOR_INVESTIMENTO,
  ORIGEM_INVESTIMENTO,
  ESCALA_ACAO,
];

// ─── Configuration ───────────────────────────────────────────────────────────

/// Geography and unit settings used by [`expand`] and [`summarize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
  /// Scale category whose records name geographies.
  pub category:    String,
  /// Scale that stands for every geography.
  pub wildcard:    String,
  /// The geographies the wildcard fans out to.
  pub geographies: Vec<String>,
  /// Label attached to summary rows.
  pub unit_label:  String,
}

impl Default for ReportConfig {
  fn default() -> Self {
    Self {
      category:    "UF".to_owned(),
      wildcard:    "Todos Estados".to_owned(),
      geographies: ["MA", "PI", "CE", "RN", "PB", "PE", "AL", "SE", "BA"]
        .into_iter()
        .map(str::to_owned)
        .collect(),
      unit_label:  "Mi R$".to_owned(),
    }
  }
}

// ─── Join ────────────────────────────────────────────────────────────────────

/// Active actions left-joined with their sub-component and component.
pub fn join(db: &Database) -> Result<Frame> {
  let view = |kind| db.table(kind).view(ViewOptions::default());

  view(TableKind::Acoes)
    .left_join(&view(TableKind::Subcomponentes), COD_SUBCOMPONENTE)?
    .left_join(&view(TableKind::Componentes), COD_COMPONENTE)?
    .select(&JOIN_COLUMNS)
}

// ─── Expand ──────────────────────────────────────────────────────────────────

/// One row per (action, geography) pair.
///
/// For every active scale record, the joined rows whose `escala_acao`
/// contains the scale name are selected. The wildcard scale of the
/// configured category is copied once per configured geography; any other
/// scale keeps its own name as label. The label goes in [`ESCALA_LOCAL`] and
/// the result is ordered by action code.
pub fn expand(db: &Database, config: &ReportConfig) -> Result<Frame> {
  let joined = join(db)?;
  let scale_idx = joined
    .column_index(ESCALA_ACAO)
    .ok_or_else(|| Error::MissingColumn(ESCALA_ACAO.to_owned()))?;

  let mut out = Frame::new(
    joined
      .columns()
      .iter()
      .map(String::as_str)
      .chain([ESCALA_LOCAL]),
  );

  for scale in db.table(TableKind::Escala).records().iter().filter(|r| r.is_active()) {
    let Some(name) = scale.text(ESCALA_ACAO) else { continue };
    let category = scale.text(CATEGORIA).unwrap_or_default();

    let matched = joined.filter(|row| {
      row[scale_idx]
        .as_str()
        .is_some_and(|s| s.contains(name))
    });

    let labels: Vec<&str> = if category == config.category && name == config.wildcard {
      config.geographies.iter().map(String::as_str).collect()
    } else {
      vec![name]
    };

    for label in labels {
      out.concat(matched.clone().with_column(ESCALA_LOCAL, Value::text(label)));
    }
  }

  out.sort_by_column(COD_ACAO, false)?;
  Ok(out)
}

// ─── Summarize ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Stats {
  sum:   f64,
  min:   Option<f64>,
  max:   Option<f64>,
  count: usize,
}

impl Stats {
  fn add(&mut self, v: f64) {
    self.sum += v;
    self.min = Some(self.min.map_or(v, |m| m.min(v)));
    self.max = Some(self.max.map_or(v, |m| m.max(v)));
    self.count += 1;
  }

  fn mean(&self) -> Option<f64> {
    (self.count > 0).then(|| self.sum / self.count as f64)
  }
}

/// Investment statistics of the expanded view grouped by `key`.
///
/// `escala_acao` groups by the expanded geography label. Groups are sorted
/// by `soma`, largest first, and followed by a `totais` row. Grouping by a
/// component or sub-component code appends that table's descriptive
/// columns.
pub fn summarize(db: &Database, key: &str, config: &ReportConfig) -> Result<Frame> {
  let key = if key == ESCALA_ACAO { ESCALA_LOCAL } else { key };
  let expanded = expand(db, config)?;
  let key_idx = expanded
    .column_index(key)
    .ok_or_else(|| Error::MissingColumn(key.to_owned()))?;
  let val_idx = expanded
    .column_index(VALOR_INVESTIMENTO)
    .ok_or_else(|| Error::MissingColumn(VALOR_INVESTIMENTO.to_owned()))?;

  let mut index: HashMap<String, usize> = HashMap::new();
  let mut groups: Vec<(Value, Stats)> = Vec::new();
  for row in expanded.rows() {
    let k = &row[key_idx];
    if k.is_null() {
      continue;
    }
    let slot = *index.entry(k.to_string()).or_insert_with(|| {
      groups.push((k.clone(), Stats::default()));
      groups.len() - 1
    });
    if let Some(v) = row[val_idx].as_f64() {
      groups[slot].1.add(v);
    }
  }
  groups.sort_by(|a, b| b.1.sum.total_cmp(&a.1.sum));

  let mut totals = Stats::default();
  let mut means = Vec::new();
  let mut out = Frame::new([key, MEDIA, SOMA, MIN, MAX, CONTAGEM]);
  for (k, s) in &groups {
    totals.sum += s.sum;
    totals.count += s.count;
    totals.min = match (totals.min, s.min) {
      (Some(a), Some(b)) => Some(a.min(b)),
      (a, b) => a.or(b),
    };
    totals.max = match (totals.max, s.max) {
      (Some(a), Some(b)) => Some(a.max(b)),
      (a, b) => a.or(b),
    };
    means.extend(s.mean());
    out.push_row(stats_row(k.clone(), s.mean(), s));
  }
  let mean_of_means =
    (!means.is_empty()).then(|| means.iter().sum::<f64>() / means.len() as f64);
  out.push_row(stats_row(Value::text(TOTALS_KEY), mean_of_means, &totals));

  let out = out.with_column(UNIDADE, Value::text(&config.unit_label));

  let descriptive = match key {
    COD_COMPONENTE => Some(TableKind::Componentes),
    COD_SUBCOMPONENTE => Some(TableKind::Subcomponentes),
    _ => None,
  };
  match descriptive {
    Some(kind) => out.left_join(&db.table(kind).view(ViewOptions::default()), key),
    None => Ok(out),
  }
}

fn stats_row(key: Value, mean: Option<f64>, s: &Stats) -> Vec<Value> {
  vec![
    key,
    mean.into(),
    Value::Number(s.sum),
    s.min.into(),
    s.max.into(),
    Value::Number(s.count as f64),
  ]
}
