use anyhow::Result;
use clap::{Parser, Subcommand};
use synvm_cli::{
  commands::{disasm::DisasmCmd, run::RunCmd},
  SYNVM_VERSION_MESSAGE,
};

#[derive(Parser)]
#[command(name = "synvm", author, about, long_about = None, version = SYNVM_VERSION_MESSAGE)]
pub struct SynvmCli {
  #[clap(subcommand)]
  pub command: SynvmCliCommands,
}

#[derive(Subcommand)]
pub enum SynvmCliCommands {
  Run(RunCmd),
  Disasm(DisasmCmd),
}

fn main() -> Result<()> {
  let args = SynvmCli::parse();
  match args.command {
    SynvmCliCommands::Run(cmd) => cmd.run(),
    SynvmCliCommands::Disasm(cmd) => cmd.run(),
  }
}
