//! Runtime settings: an optional TOML file layered under `PISHNE_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use pishne_core::report::ReportConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Folder holding the `pishne_db_*.gpkg` files.
  pub data_dir:   PathBuf,
  pub unit_label: String,
  pub expand:     ExpandSettings,
}

/// How scales fan out to geographies.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExpandSettings {
  pub category:    String,
  pub wildcard:    String,
  pub geographies: Vec<String>,
}

impl Default for Settings {
  fn default() -> Self {
    let report = ReportConfig::default();
    Self {
      data_dir:   PathBuf::from("data"),
      unit_label: report.unit_label,
      expand:     ExpandSettings {
        category:    report.category,
        wildcard:    report.wildcard,
        geographies: report.geographies,
      },
    }
  }
}

impl Default for ExpandSettings {
  fn default() -> Self { Settings::default().expand }
}

impl Settings {
  /// Read `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("PISHNE")
          .separator("__")
          .list_separator(",")
          .with_list_parse_key("expand.geographies")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  pub fn report_config(&self) -> ReportConfig {
    ReportConfig {
      category:    self.expand.category.clone(),
      wildcard:    self.expand.wildcard.clone(),
      geographies: self.expand.geographies.clone(),
      unit_label:  self.unit_label.clone(),
    }
  }
}
