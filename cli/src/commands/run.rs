use anstyle::*;
use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::path::PathBuf;
use std::time::Instant;

use synvm_core::calibration::{CalibrationConfig, CalibrationController, CalibrationOutcome};
use synvm_core::runtime::{ExecutionError, Fault, Runtime};
use synvm_core::utils::setup_logger;

use crate::{
  line_source, load_program, open, stdout_sink,
  util::{elapsed, write_status},
};

#[derive(Parser)]
#[command(name = "run", about = "Run a program image")]
pub struct RunCmd {
  /// The program image: little-endian 16-bit words.
  image: PathBuf,

  /// Input lines replayed before reading the terminal.
  #[clap(long, env = "SYNVM_SCRIPT")]
  script: Option<PathBuf>,

  /// Calibration config (JSON). The register search runs before normal execution resumes.
  #[clap(long, value_name = "CONFIG")]
  calibrate: Option<PathBuf>,

  #[clap(long, action)]
  verbose: bool,
}

impl RunCmd {
  pub fn run(&self) -> Result<()> {
    if env::var("RUST_LOG").is_err() {
      env::set_var("RUST_LOG", if self.verbose { "info" } else { "warn" });
    }
    setup_logger();

    let program = load_program(&self.image)?;
    let source = line_source(self.script.as_deref())?;
    let mut runtime = Runtime::new(&program, source).with_output(stdout_sink());
    self.drive(&mut runtime)
  }

  /// Calibrate if configured, then run to halt.
  fn drive(&self, runtime: &mut Runtime) -> Result<()> {
    let start_time = Instant::now();
    let green = AnsiColor::Green.on_default().effects(Effects::BOLD);
    let yellow = AnsiColor::Yellow.on_default().effects(Effects::BOLD);

    if let Some(ref path) = self.calibrate {
      let config: CalibrationConfig = serde_json::from_reader(open(path)?)
        .with_context(|| format!("while parsing calibration config `{}`", path.display()))?;
      let mut controller = CalibrationController::new(config)?;
      let report = controller.run(runtime)?;
      let summary = format!(
        "{} attempts, {} transitions",
        report.attempts,
        report.transitions.len()
      );
      match report.outcome {
        CalibrationOutcome::Accepted { candidate } => {
          write_status(
            &green,
            "Calibrated",
            format!("{} = {candidate} ({summary})", controller.config().register).as_str(),
          );
        }
        CalibrationOutcome::Exhausted => {
          write_status(&yellow, "Exhausted", summary.as_str());
          return Ok(());
        }
        CalibrationOutcome::Halted => {
          write_status(&yellow, "Halted", "before calibration armed");
          return Ok(());
        }
      }
    }

    if let Err(err) = runtime.execute() {
      if matches!(
        err,
        ExecutionError::Fault {
          fault: Fault::InputExhausted,
          ..
        }
      ) {
        write_status(&yellow, "Stopped", "input exhausted");
      }
      return Err(err).context("while executing program");
    }

    write_status(
      &green,
      "Finished",
      format!(
        "{} instructions in {}",
        runtime.steps(),
        elapsed(start_time.elapsed())
      )
      .as_str(),
    );

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use synvm_core::io::ScriptedLines;
  use synvm_core::instruction::Opcode;
  use synvm_core::runtime::Program;

  use super::*;

  const R0: u16 = 32768;
  const R7: u16 = 32775;

  // out 'A'; gt r0 r7 4; jt r0 13; out 'N'; halt; noop; out 'Y'; halt
  const GATE: [u16; 16] = [19, 65, 5, R0, R7, 4, 7, R0, 13, 19, 78, 0, 21, 19, 89, 0];

  fn cmd(calibrate: Option<PathBuf>) -> RunCmd {
    RunCmd {
      image: PathBuf::from("challenge.bin"),
      script: None,
      calibrate,
      verbose: false,
    }
  }

  fn runtime(words: &[u16], lines: &[&str]) -> Runtime {
    let program = Program::new(words.to_vec()).unwrap();
    Runtime::new(&program, Box::new(ScriptedLines::new(lines.iter().copied())))
  }

  fn config_file(json: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
  }

  #[test]
  fn runs_to_halt() {
    let mut rt = runtime(&[20, R0, 19, R0, 0], &["x"]);
    cmd(None).drive(&mut rt).unwrap();
    assert_eq!(rt.output(), "x");
    assert_eq!(rt.steps(), 3);
  }

  #[test]
  fn input_exhausted_is_an_error() {
    let mut rt = runtime(&[20, R0, 0], &[]);
    let err = cmd(None).drive(&mut rt).unwrap_err();
    assert_eq!(
      err.downcast_ref::<ExecutionError>(),
      Some(&ExecutionError::Fault {
        pc: 0,
        opcode: Opcode::In,
        fault: Fault::InputExhausted
      })
    );
    assert!(err.to_string().contains("while executing program"));
  }

  #[test]
  fn calibrates_then_keeps_running() {
    let config = config_file(
      r#"{ "register": 7, "arm": { "output": "A" }, "accept": "Y", "reject": "N" }"#,
    );
    let mut rt = runtime(&GATE, &[]);
    cmd(Some(config.path().to_path_buf())).drive(&mut rt).unwrap();
    assert_eq!(rt.output(), "ANNNNNY");
    assert!(rt.state.halted);
  }

  #[test]
  fn exhausted_calibration_is_not_a_failure() {
    let config = config_file(
      r#"{ "register": 7, "arm": { "output": "A" }, "accept": "Y", "reject": "N",
          "first_candidate": 1, "last_candidate": 2 }"#,
    );
    let mut rt = runtime(&GATE, &[]);
    cmd(Some(config.path().to_path_buf())).drive(&mut rt).unwrap();
    assert_eq!(rt.output(), "ANN");
  }

  #[test]
  fn bad_config_is_reported() {
    let config = config_file(r#"{ "register": 9 }"#);
    let mut rt = runtime(&GATE, &[]);
    let err = cmd(Some(config.path().to_path_buf())).drive(&mut rt).unwrap_err();
    assert!(err.to_string().contains("while parsing calibration config"));
  }
}
