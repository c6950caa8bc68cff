//! [`Database`] — the six tables, loaded and saved together.

use strum::IntoEnumIterator;
use tracing::info;

use crate::{Result, store::TableStore, table::RecordTable, tables::TableKind};

#[derive(Debug, Clone)]
pub struct Database {
  componentes:    RecordTable,
  subcomponentes: RecordTable,
  tematicas:      RecordTable,
  acoes:          RecordTable,
  escala:         RecordTable,
  origem:         RecordTable,
}

impl Database {
  /// Empty tables for every layer.
  pub fn new() -> Result<Self> {
    Ok(Self {
      componentes:    TableKind::Componentes.table()?,
      subcomponentes: TableKind::Subcomponentes.table()?,
      tematicas:      TableKind::Tematicas.table()?,
      acoes:          TableKind::Acoes.table()?,
      escala:         TableKind::Escala.table()?,
      origem:         TableKind::Origem.table()?,
    })
  }

  /// Read every layer from `store`. A missing layer is an error.
  pub fn load<S: TableStore>(store: &S) -> Result<Self, S::Error> {
    let mut db = Self::new()?;
    for kind in TableKind::iter() {
      db.table_mut(kind).load(store)?;
    }
    info!("database loaded");
    Ok(db)
  }

  /// Write every layer to `store`.
  pub fn save<S: TableStore>(&self, store: &S) -> Result<(), S::Error> {
    for kind in TableKind::iter() {
      self.table(kind).save(store)?;
    }
    Ok(())
  }

  pub fn table(&self, kind: TableKind) -> &RecordTable {
    match kind {
      TableKind::Componentes => &self.componentes,
      TableKind::Subcomponentes => &self.subcomponentes,
      TableKind::Tematicas => &self.tematicas,
      TableKind::Acoes => &self.acoes,
      TableKind::Escala => &self.escala,
      TableKind::Origem => &self.origem,
    }
  }

  pub fn table_mut(&mut self, kind: TableKind) -> &mut RecordTable {
    match kind {
      TableKind::Componentes => &mut self.componentes,
      TableKind::Subcomponentes => &mut self.subcomponentes,
      TableKind::Tematicas => &mut self.tematicas,
      TableKind::Acoes => &mut self.acoes,
      TableKind::Escala => &mut self.escala,
      TableKind::Origem => &mut self.origem,
    }
  }

  pub fn acoes(&self) -> &RecordTable { &self.acoes }

  pub fn acoes_mut(&mut self) -> &mut RecordTable { &mut self.acoes }
}
