//! Interactive confirmation on a terminal.

use std::io::{BufRead, Write};

use pishne_core::{
  flows::{Confirm, Proposal},
  frame::Frame,
};

/// Prints each proposal to `output` and reads `s`/`n` from `input`.
/// Anything but a yes, including end of input, declines.
pub struct Prompt<R, W> {
  input:  R,
  output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
  pub fn new(input: R, output: W) -> Self { Self { input, output } }

  fn render(&mut self, proposal: &Proposal) -> std::io::Result<()> {
    match proposal {
      Proposal::Insert { table, fields } => {
        writeln!(self.output, "Inserir em {table}:")?;
        self.frame(fields)?;
      }
      Proposal::Edit { table, key, current, changes } => {
        writeln!(self.output, "Editar {key} em {table}:")?;
        self.frame(current)?;
        writeln!(self.output, "Alterações:")?;
        for c in changes {
          writeln!(self.output, "  {}: {} -> {}", c.field, c.current, c.proposed)?;
        }
      }
      Proposal::Remove { table, key, current } => {
        writeln!(self.output, "Arquivar {key} em {table}:")?;
        self.frame(current)?;
      }
    }
    write!(self.output, "Confirmar? [s/n] ")?;
    self.output.flush()
  }

  fn frame(&mut self, frame: &Frame) -> std::io::Result<()> {
    for row in frame.rows() {
      let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
      writeln!(self.output, "  {}", cells.join(": "))?;
    }
    Ok(())
  }
}

impl<R: BufRead, W: Write> Confirm for Prompt<R, W> {
  fn confirm(&mut self, proposal: &Proposal) -> bool {
    if let Err(e) = self.render(proposal) {
      tracing::warn!("failed to show proposal: {e}");
      return false;
    }
    let mut line = String::new();
    match self.input.read_line(&mut line) {
      Ok(_) => is_yes(&line),
      Err(e) => {
        tracing::warn!("failed to read answer: {e}");
        false
      }
    }
  }
}

fn is_yes(answer: &str) -> bool {
  matches!(answer.trim().to_lowercase().as_str(), "s" | "sim" | "y" | "yes")
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use pishne_core::value::Value;

  use super::*;

  fn proposal() -> Proposal {
    let mut fields = Frame::new(["Field", "Value"]);
    fields.push_row(vec![Value::text("nm_componente"), Value::text("Água")]);
    Proposal::Insert { table: "componentes".to_owned(), fields }
  }

  #[test]
  fn yes_answers() {
    for answer in ["s\n", "Sim\n", " y \n"] {
      let mut out = Vec::new();
      let mut p = Prompt::new(Cursor::new(answer), &mut out);
      assert!(p.confirm(&proposal()), "{answer:?}");
    }
  }

  #[test]
  fn anything_else_declines() {
    for answer in ["n\n", "talvez\n", ""] {
      let mut out = Vec::new();
      let mut p = Prompt::new(Cursor::new(answer), &mut out);
      assert!(!p.confirm(&proposal()), "{answer:?}");
    }
  }

  #[test]
  fn proposal_is_shown() {
    let mut out = Vec::new();
    Prompt::new(Cursor::new("n\n"), &mut out).confirm(&proposal());
    let shown = String::from_utf8(out).unwrap();
    assert!(shown.contains("Inserir em componentes"));
    assert!(shown.contains("nm_componente: Água"));
  }
}
