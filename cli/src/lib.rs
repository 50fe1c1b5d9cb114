pub mod commands;
mod util;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use synvm_core::io::{Chain, LineSource, ReaderLines, ScriptedLines};
use synvm_core::runtime::Program;

pub const SYNVM_VERSION_MESSAGE: &str = concat!("synvm ", env!("CARGO_PKG_VERSION"));

pub fn load_program(path: &Path) -> Result<Program> {
  let program = Program::from_file(path)
    .with_context(|| format!("while loading image `{}`", path.display()))?;
  tracing::debug!(words = program.len(), path = %path.display(), "loaded image");
  Ok(program)
}

/// Lines from `script`, if any, followed by the terminal.
pub fn line_source(script: Option<&Path>) -> Result<Box<dyn LineSource>> {
  let stdin = ReaderLines::stdin();
  let Some(path) = script else {
    return Ok(Box::new(stdin));
  };
  let text = std::fs::read_to_string(path)
    .with_context(|| format!("while reading script `{}`", path.display()))?;
  let script = ScriptedLines::from_script(&text);
  tracing::info!(lines = script.remaining(), "replaying script");
  Ok(Box::new(Chain::new(script, stdin)))
}

pub(crate) fn open(path: &Path) -> Result<BufReader<File>> {
  let file = File::open(path).with_context(|| format!("while opening `{}`", path.display()))?;
  Ok(BufReader::new(file))
}

pub(crate) fn stdout_sink() -> Box<dyn io::Write> {
  Box::new(io::stdout())
}
