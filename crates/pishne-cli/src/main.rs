//! `pishne` — command-line front end for the Pishne action registry.
//!
//! # Usage
//!
//! ```text
//! pishne init
//! pishne view acoes --limit 10
//! pishne insert acoes --file nova_acao.csv
//! pishne edit acoes "acao 1.1.2" --set valor_investimento=12,5
//! pishne summarize cod_componente --out resumo.csv
//! ```
//!
//! Tables and reports are written `;`-delimited to stdout or `--out`.

mod confirm;
mod settings;

use std::{
  io::{self, Write as _},
  path::{Path, PathBuf},
};

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use pishne_core::{
  database::Database,
  filter,
  flows::{self, Confirm, Outcome, Proposal},
  frame::Frame,
  metadata::Describe,
  report,
  store::TableStore as _,
  table::{Fields, ViewOptions},
  tables::TableKind,
  value::Value,
};
use pishne_store_sqlite::SqliteStore;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use crate::{confirm::Prompt, settings::Settings};

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "pishne", version, about = "Registry of actions, components and investments")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "pishne.toml")]
  config: PathBuf,

  /// Folder holding the database files; overrides the config file.
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Write output to this file instead of stdout.
  #[arg(short, long, global = true)]
  out: Option<PathBuf>,

  /// Approve every change without asking.
  #[arg(short, long, global = true)]
  yes: bool,

  /// Print frames as JSON instead of delimited text.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create an empty database in a data folder that has none.
  Init,
  /// Copy the current database to a new timestamped file.
  Snapshot,
  /// List the records of a table.
  View {
    table: TableKind,
    /// Include archived records.
    #[arg(long)]
    all:   bool,
    /// Only the N most recently changed records.
    #[arg(long)]
    limit: Option<usize>,
  },
  /// Show one record as `Field;Value` rows.
  Record { table: TableKind, key: String },
  /// Show a table's metadata as `Attribute;Value` rows.
  Metadata {
    table: TableKind,
    /// Apply an `Attribute;Value` boot file first.
    #[arg(long)]
    boot:  Option<PathBuf>,
  },
  /// Actions joined with their sub-component and component.
  Join {
    /// Lower bound on `valor_investimento`.
    #[arg(long)]
    min:      Option<f64>,
    /// Upper bound on `valor_investimento`.
    #[arg(long)]
    max:      Option<f64>,
    /// Keep rows where COLUMN=VALUE.
    #[arg(long = "where", value_name = "COLUMN=VALUE", value_parser = parse_assignment)]
    filter:   Option<(String, String)>,
    /// Match `--where` as a substring.
    #[arg(long)]
    contains: bool,
  },
  /// One row per action and geography.
  Expand,
  /// Investment statistics grouped by a column.
  Summarize { key: String },
  /// Options for the next level of component → sub-component → theme.
  Options { selections: Vec<String> },
  /// Add a record.
  Insert {
    table: TableKind,
    #[command(flatten)]
    input: FieldInput,
  },
  /// Change fields of a record.
  Edit {
    table: TableKind,
    key:   String,
    #[command(flatten)]
    input: FieldInput,
  },
  /// Archive a record.
  Remove { table: TableKind, key: String },
  /// Write a table to a delimited file.
  Export {
    table: TableKind,
    path:  PathBuf,
    /// Include archived records.
    #[arg(long)]
    all:   bool,
  },
  /// Load a delimited file into a table and save it.
  Import {
    table:  TableKind,
    path:   PathBuf,
    /// Keep the current records.
    #[arg(long)]
    append: bool,
  },
}

/// Field values from a `Field;Value` file and/or `--set` pairs.
#[derive(clap::Args, Debug)]
struct FieldInput {
  /// A `Field;Value` record file.
  #[arg(long)]
  file: Option<PathBuf>,

  /// FIELD=VALUE; applied after `--file`.
  #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
  set: Vec<(String, String)>,
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
  let (k, v) = s
    .split_once('=')
    .ok_or_else(|| format!("expected FIELD=VALUE, got {s:?}"))?;
  Ok((k.trim().to_owned(), v.to_owned()))
}

// ─── Entry point ─────────────────────────────────────────────────────────────

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut settings = Settings::load(&cli.config)?;
  if let Some(dir) = &cli.data_dir {
    settings.data_dir = dir.clone();
  }

  match &cli.command {
    Command::Init => {
      let store = SqliteStore::create(&settings.data_dir)
        .with_context(|| format!("failed to create database in {:?}", settings.data_dir))?;
      Database::new()?.save(&store)?;
      if let Some(path) = store.location() {
        println!("{}", path.display());
      }
      Ok(())
    }
    Command::Snapshot => {
      let store = open_store(&settings)?;
      let path = store.snapshot(&settings.data_dir)?;
      println!("{}", path.display());
      Ok(())
    }
    command => {
      let store = open_store(&settings)?;
      let mut db = Database::load(&store).context("failed to load database")?;
      run(command, &cli, &settings, &store, &mut db)
    }
  }
}

fn open_store(settings: &Settings) -> Result<SqliteStore> {
  SqliteStore::open_latest(&settings.data_dir)
    .with_context(|| format!("failed to open database in {:?}", settings.data_dir))
}

fn run(
  command: &Command,
  cli: &Cli,
  settings: &Settings,
  store: &SqliteStore,
  db: &mut Database,
) -> Result<()> {
  let show = |frame: &Frame| emit(frame, cli.out.as_deref(), cli.json);

  match command {
    Command::View { table, all, limit } => {
      let opts = ViewOptions { active_only: !*all, limit: *limit };
      show(&db.table(*table).view(opts))
    }
    Command::Record { table, key } => show(&db.table(*table).record_frame(key)?),
    Command::Metadata { table, boot } => {
      let t = db.table_mut(*table);
      if let Some(path) = boot {
        pishne_delim::boot_dataset(t.dataset_mut(), path)
          .with_context(|| format!("failed to read boot file {}", path.display()))?;
      }
      show(&t.metadata_frame())
    }
    Command::Join { min, max, filter: by, contains } => {
      let mut frame = report::join(db)?;
      if min.is_some() || max.is_some() {
        frame = filter::filter_range(
          &frame,
          pishne_core::tables::VALOR_INVESTIMENTO,
          min.unwrap_or(f64::NEG_INFINITY),
          max.unwrap_or(f64::INFINITY),
        )?;
      }
      if let Some((column, value)) = by {
        frame = filter::filter_category(&frame, column, Some(value.as_str()), *contains)?;
      }
      show(&frame)
    }
    Command::Expand => show(&report::expand(db, &settings.report_config())?),
    Command::Summarize { key } => {
      show(&report::summarize(db, key, &settings.report_config())?)
    }
    Command::Options { selections } => {
      let selections: Vec<&str> = selections.iter().map(String::as_str).collect();
      let options = filter::cascade_options(&report::join(db)?, &selections)?;
      let mut stdout = io::stdout().lock();
      for option in options {
        writeln!(stdout, "{option}")?;
      }
      Ok(())
    }
    Command::Insert { table, input } => {
      let t = db.table_mut(*table);
      let fields = input.fields(t.schema())?;
      let outcome = flows::insert(t, store, fields, confirmer(cli).as_mut())?;
      report_outcome(&outcome);
      Ok(())
    }
    Command::Edit { table, key, input } => {
      let t = db.table_mut(*table);
      let fields = input.fields(t.schema())?;
      if fields.is_empty() {
        bail!("nothing to change; pass --file or --set");
      }
      let outcome = flows::edit(t, store, key, fields, confirmer(cli).as_mut())?;
      report_outcome(&outcome);
      Ok(())
    }
    Command::Remove { table, key } => {
      let outcome = flows::remove(db.table_mut(*table), store, key, confirmer(cli).as_mut())?;
      report_outcome(&outcome);
      Ok(())
    }
    Command::Export { table, path, all } => {
      let path = pishne_delim::export_table(db.table(*table), path, !*all)?;
      println!("{}", path.display());
      Ok(())
    }
    Command::Import { table, path, append } => {
      let t = db.table_mut(*table);
      let n = pishne_delim::import_table(t, path, *append)?;
      t.save(store)?;
      info!(table = %table, records = n, "import saved");
      Ok(())
    }
    // Handled in `main` before the database is loaded.
    Command::Init | Command::Snapshot => Ok(()),
  }
}

impl FieldInput {
  fn fields(&self, schema: &pishne_core::schema::Schema) -> Result<Fields> {
    let mut fields = match &self.file {
      Some(path) => pishne_delim::load_record(path, schema)
        .with_context(|| format!("failed to read record file {}", path.display()))?,
      None => Fields::new(),
    };
    for (k, v) in &self.set {
      let value = match schema.column(k) {
        Some(col) => Value::parse_raw(v, col.kind)
          .with_context(|| format!("{k}: expected {:?}, got {v:?}", col.kind))?,
        None => Value::text(v),
      };
      fields.insert(k.clone(), value);
    }
    Ok(fields)
  }
}

fn confirmer(cli: &Cli) -> Box<dyn Confirm> {
  if cli.yes {
    Box::new(|_: &Proposal| true)
  } else {
    Box::new(Prompt::new(io::stdin().lock(), io::stderr()))
  }
}

fn report_outcome(outcome: &Outcome) {
  match outcome {
    Outcome::Committed(id) => println!("{id}"),
    Outcome::Cancelled => eprintln!("cancelado"),
  }
}

fn emit(frame: &Frame, out: Option<&Path>, json: bool) -> Result<()> {
  match (out, json) {
    (Some(path), false) => {
      pishne_delim::save_frame(frame, path)?;
      info!(path = %path.display(), rows = frame.len(), "written");
    }
    (Some(path), true) => std::fs::write(path, frame.to_json_string()?)?,
    (None, false) => pishne_delim::write_frame(frame, io::stdout().lock())?,
    (None, true) => println!("{}", frame.to_json_string()?),
  }
  Ok(())
}
