use anyhow::Result;
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;

use synvm_core::disassembler::disassemble;

use crate::load_program;

#[derive(Parser)]
#[command(name = "disasm", about = "Print a listing of a program image")]
pub struct DisasmCmd {
  image: PathBuf,

  /// First address to decode.
  #[arg(long, default_value_t = 0)]
  start: usize,

  /// Address to stop at (exclusive). Defaults to the end of the image.
  #[arg(long)]
  end: Option<usize>,
}

impl DisasmCmd {
  pub fn run(&self) -> Result<()> {
    let program = load_program(&self.image)?;
    let end = self.end.unwrap_or(program.len());

    let mut out = io::stdout().lock();
    for line in disassemble(&program.image, self.start, end) {
      writeln!(out, "{line}")?;
    }
    Ok(())
  }
}
