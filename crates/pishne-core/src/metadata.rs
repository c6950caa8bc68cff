//! Named objects and the datasets built on them.
//!
//! Every table carries a [`Metadata`] (name + alias) and a [`Dataset`]
//! descriptor (source, size, plotting specs). Both export their attributes
//! as `Attribute`/`Value` pairs through [`Describe`], which is what the
//! delimited boot files read back in.

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, frame::Frame, value::Value};

pub const ATTRIBUTE_FIELD: &str = "Attribute";
pub const VALUE_FIELD: &str = "Value";

pub const NAME_FIELD: &str = "Name";
pub const ALIAS_FIELD: &str = "Alias";
pub const SIZE_FIELD: &str = "Size";
pub const COLOR_FIELD: &str = "Color";
pub const SOURCE_FIELD: &str = "Source";
pub const DESCRIPTION_FIELD: &str = "Description";
pub const FILE_DATA_FIELD: &str = "File_Data";

// ─── Describe ────────────────────────────────────────────────────────────────

/// Anything that can export its metadata as ordered attribute/value pairs.
pub trait Describe {
  fn metadata(&self) -> Vec<(String, Value)>;

  /// The metadata as a two-column `Attribute`/`Value` frame.
  fn metadata_frame(&self) -> Frame {
    let mut frame = Frame::new([ATTRIBUTE_FIELD, VALUE_FIELD]);
    for (k, v) in self.metadata() {
      frame.push_row(vec![Value::Text(k), v]);
    }
    frame
  }
}

// ─── Metadata ────────────────────────────────────────────────────────────────

/// A name/alias pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
  pub name:  String,
  pub alias: String,
}

impl Metadata {
  /// When `alias` is `None` it is the first and last character of `name`.
  pub fn new(name: impl Into<String>, alias: Option<String>) -> Self {
    let name = name.into();
    let alias = alias.unwrap_or_else(|| default_alias(&name));
    Self { name, alias }
  }

  /// Overwrite name and alias from a setter map, as read from a boot file.
  /// Both keys are required.
  pub fn set(&mut self, setter: &BTreeMap<String, String>) -> Result<()> {
    let name = setter
      .get(NAME_FIELD)
      .ok_or_else(|| Error::MissingColumn(NAME_FIELD.to_owned()))?;
    let alias = setter
      .get(ALIAS_FIELD)
      .ok_or_else(|| Error::MissingColumn(ALIAS_FIELD.to_owned()))?;
    self.name = name.clone();
    self.alias = alias.clone();
    Ok(())
  }
}

fn default_alias(name: &str) -> String {
  let mut chars = name.chars();
  match (chars.next(), chars.next_back()) {
    (Some(first), Some(last)) => format!("{first}{last}"),
    _ => name.to_owned(),
  }
}

impl Describe for Metadata {
  fn metadata(&self) -> Vec<(String, Value)> {
    vec![
      (NAME_FIELD.to_owned(), Value::text(&self.name)),
      (ALIAS_FIELD.to_owned(), Value::text(&self.alias)),
    ]
  }
}

// ─── Plotting specs ──────────────────────────────────────────────────────────

/// Plotting configuration carried alongside a dataset. Rendering is left to
/// the consumer; this only records the choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSpecs {
  pub folder:     Option<PathBuf>,
  pub filename:   String,
  pub fig_format: String,
  pub dpi:        u32,
  pub title:      String,
  pub width:      f64,
  pub height:     f64,
  pub xvar:       String,
  pub yvar:       String,
  pub xlabel:     String,
  pub ylabel:     String,
  pub color:      String,
  pub xmin:       Option<f64>,
  pub xmax:       Option<f64>,
  pub ymin:       Option<f64>,
  pub ymax:       Option<f64>,
}

impl ViewSpecs {
  fn for_dataset(name: &str, folder: Option<PathBuf>, color: &str) -> Self {
    Self {
      folder,
      filename: name.to_owned(),
      fig_format: "jpg".to_owned(),
      dpi: 300,
      title: name.to_owned(),
      width: 5.0 * 1.618,
      height: 5.0 * 1.618,
      xvar: String::new(),
      yvar: String::new(),
      xlabel: String::new(),
      ylabel: String::new(),
      color: color.to_owned(),
      xmin: None,
      xmax: None,
      ymin: None,
      ymax: None,
    }
  }
}

// ─── Dataset ─────────────────────────────────────────────────────────────────

/// Descriptor for a single tabular resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
  pub meta:        Metadata,
  /// File the data was loaded from (a store file or a delimited file).
  pub file_data:   Option<PathBuf>,
  /// Layer within `file_data`, for multi-layer stores.
  pub layer:       Option<String>,
  /// Row count as of the last [`Dataset::update`].
  pub size:        usize,
  pub color:       String,
  pub source:      Option<String>,
  pub description: Option<String>,
  pub view_specs:  ViewSpecs,
}

impl Dataset {
  pub fn new(meta: Metadata) -> Self {
    let view_specs = ViewSpecs::for_dataset(&meta.name, None, "blue");
    Self {
      meta,
      file_data: None,
      layer: None,
      size: 0,
      color: "blue".to_owned(),
      source: None,
      description: None,
      view_specs,
    }
  }

  /// Folder containing the data file.
  pub fn folder(&self) -> Option<&Path> {
    self.file_data.as_deref().and_then(Path::parent)
  }

  /// Record where the data came from.
  pub fn set_source(&mut self, file: impl Into<PathBuf>, layer: Option<String>) {
    self.file_data = Some(file.into());
    self.layer = layer;
  }

  /// Refresh derived attributes after the data changed.
  pub fn update(&mut self, size: usize) {
    self.size = size;
    self.view_specs.folder = self.folder().map(Path::to_path_buf);
    self.view_specs.color = self.color.clone();
    if self.view_specs.filename.is_empty() {
      self.view_specs.filename = self.meta.name.clone();
    }
  }

  /// Overwrite attributes from a setter map. `Name` and `Alias` are
  /// required; the remaining keys are applied when present.
  pub fn set(&mut self, setter: &BTreeMap<String, String>) -> Result<()> {
    self.meta.set(setter)?;
    if let Some(color) = setter.get(COLOR_FIELD) {
      self.color = color.clone();
    }
    if let Some(source) = setter.get(SOURCE_FIELD) {
      self.source = Some(source.clone());
    }
    if let Some(descr) = setter.get(DESCRIPTION_FIELD) {
      self.description = Some(descr.clone());
    }
    if let Some(file) = setter.get(FILE_DATA_FIELD) {
      self.file_data = Some(PathBuf::from(file));
    }
    self.update(self.size);
    Ok(())
  }
}

impl Describe for Dataset {
  fn metadata(&self) -> Vec<(String, Value)> {
    let mut out = self.meta.metadata();
    out.extend([
      (SIZE_FIELD.to_owned(), Value::Number(self.size as f64)),
      (COLOR_FIELD.to_owned(), Value::text(&self.color)),
      (SOURCE_FIELD.to_owned(), self.source.clone().into()),
      (DESCRIPTION_FIELD.to_owned(), self.description.clone().into()),
      (
        FILE_DATA_FIELD.to_owned(),
        self
          .file_data
          .as_ref()
          .map(|p| p.display().to_string())
          .into(),
      ),
    ]);
    out
  }
}
