//! Search for the value of one register that makes a program's own verification routine
//! succeed.
//!
//! The controller runs the program step by step. When the arming trigger fires it captures a
//! single checkpoint and writes the first candidate into the designated register. Each time the
//! rejection oracle shows up in the output it restores the checkpoint and tries the next
//! candidate, so every attempt costs one run of the verification routine rather than a replay of
//! the whole program.

mod config;

pub use config::*;

use std::ops::RangeInclusive;

use strum_macros::Display;
use thiserror::Error;

use crate::runtime::{CheckpointError, CheckpointManager, Event, ExecutionError, Runtime};
use crate::word::Word;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
  Idle,
  Armed,
  Testing,
  Retry,
  Accepted,
  Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationOutcome {
  /// The acceptance oracle appeared while `candidate` was in the register.
  Accepted { candidate: Word },
  /// Every candidate was rejected.
  Exhausted,
  /// The program halted before the arming trigger fired.
  Halted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationReport {
  pub outcome: CalibrationOutcome,
  /// Candidates tried, including the accepted one.
  pub attempts: u32,
  /// Writes of a candidate into the designated register.
  pub candidate_writes: u32,
  pub checkpoints_captured: u32,
  /// Every phase entered, starting with `Idle`.
  pub transitions: Vec<Phase>,
}

#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CalibrationError {
  #[error(transparent)]
  Execution(#[from] ExecutionError),
  #[error(transparent)]
  Checkpoint(#[from] CheckpointError),
  #[error("invalid calibration config: {0}")]
  Config(#[from] ConfigError),
}

enum Verdict {
  Accept,
  Reject,
}

pub struct CalibrationController {
  config: CalibrationConfig,
  candidates: RangeInclusive<Word>,
  phase: Phase,
  candidate: Word,
  checkpoints: CheckpointManager,
  /// Output length when the current attempt started; oracles must appear after it.
  attempt_mark: usize,
  attempts: u32,
  candidate_writes: u32,
  transitions: Vec<Phase>,
}

impl CalibrationController {
  pub fn new(config: CalibrationConfig) -> Result<Self, CalibrationError> {
    config.validate()?;
    let candidates = config.candidates()?;
    Ok(Self {
      candidate: *candidates.start(),
      candidates,
      config,
      phase: Phase::Idle,
      checkpoints: CheckpointManager::new(),
      attempt_mark: 0,
      attempts: 0,
      candidate_writes: 0,
      transitions: vec![Phase::Idle],
    })
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  /// The candidate currently under test.
  pub fn candidate(&self) -> Word {
    self.candidate
  }

  pub fn config(&self) -> &CalibrationConfig {
    &self.config
  }

  /// Drive `runtime` until the search reaches an outcome.
  pub fn run(&mut self, runtime: &mut Runtime) -> Result<CalibrationReport, CalibrationError> {
    tracing::info!(
      register = %self.config.register,
      first = %self.candidates.start(),
      last = %self.candidates.end(),
      "starting calibration"
    );
    loop {
      let event = runtime.step()?;
      if let Some(outcome) = self.observe(runtime, event)? {
        let report = self.report(outcome);
        tracing::info!(
          outcome = ?report.outcome,
          attempts = report.attempts,
          steps = runtime.steps(),
          "calibration finished"
        );
        return Ok(report);
      }
    }
  }

  /// Inspect the runtime after one step that produced `event`.
  ///
  /// Returns an outcome once the search is over; the runtime is left where the outcome was
  /// decided, so an accepted candidate can keep running.
  pub fn observe(
    &mut self,
    runtime: &mut Runtime,
    event: Option<Event>,
  ) -> Result<Option<CalibrationOutcome>, CalibrationError> {
    match self.phase {
      Phase::Idle => {
        if self.arming_fired(runtime, event) {
          if runtime.register(self.config.register) == Word::ZERO {
            self.arm(runtime)?;
          } else {
            tracing::debug!(register = %self.config.register, "register already set, not arming");
          }
          Ok(None)
        } else if event == Some(Event::Halted) {
          Ok(Some(CalibrationOutcome::Halted))
        } else {
          Ok(None)
        }
      }
      Phase::Testing => match self.verdict(runtime, event) {
        Some(Verdict::Accept) => {
          self.transition(Phase::Accepted);
          Ok(Some(CalibrationOutcome::Accepted {
            candidate: self.candidate,
          }))
        }
        Some(Verdict::Reject) => self.retry(runtime),
        None => Ok(None),
      },
      Phase::Accepted => Ok(Some(CalibrationOutcome::Accepted {
        candidate: self.candidate,
      })),
      Phase::Exhausted => Ok(Some(CalibrationOutcome::Exhausted)),
      // transient, never observed between steps
      Phase::Armed | Phase::Retry => Ok(None),
    }
  }

  fn arming_fired(&self, runtime: &Runtime, event: Option<Event>) -> bool {
    match (&self.config.arm, event) {
      (ArmTrigger::Output(marker), Some(Event::Output(_))) => runtime.output().ends_with(marker.as_str()),
      (ArmTrigger::Input(prefix), Some(Event::LineRead)) => runtime
        .last_line()
        .is_some_and(|line| line.starts_with(prefix.as_str())),
      _ => false,
    }
  }

  fn verdict(&self, runtime: &Runtime, event: Option<Event>) -> Option<Verdict> {
    match event {
      Some(Event::Output(_)) => {
        let output = runtime.output();
        let seen = |oracle: &str| {
          output.len() >= self.attempt_mark + oracle.len() && output.ends_with(oracle)
        };
        if seen(&self.config.accept) {
          Some(Verdict::Accept)
        } else if seen(&self.config.reject) {
          Some(Verdict::Reject)
        } else {
          None
        }
      }
      // the routine gave up without the acceptance oracle
      Some(Event::Halted) => Some(Verdict::Reject),
      _ => None,
    }
  }

  fn arm(&mut self, runtime: &mut Runtime) -> Result<(), CalibrationError> {
    self.transition(Phase::Armed);
    self.attempt_mark = self.checkpoints.capture(runtime)?.output_len();
    self.candidate = *self.candidates.start();
    self.write_candidate(runtime);
    self.transition(Phase::Testing);
    Ok(())
  }

  fn retry(&mut self, runtime: &mut Runtime) -> Result<Option<CalibrationOutcome>, CalibrationError> {
    tracing::debug!(candidate = %self.candidate, "candidate rejected");
    if self.candidate >= *self.candidates.end() {
      self.transition(Phase::Exhausted);
      return Ok(Some(CalibrationOutcome::Exhausted));
    }
    self.transition(Phase::Retry);
    self.checkpoints.restore(runtime)?;
    self.candidate = self.candidate.wrapping_add(Word::ONE);
    self.attempt_mark = runtime.output().len();
    self.write_candidate(runtime);
    self.transition(Phase::Testing);
    Ok(None)
  }

  fn write_candidate(&mut self, runtime: &mut Runtime) {
    runtime.set_register(self.config.register, self.candidate);
    self.candidate_writes += 1;
    self.attempts += 1;
  }

  fn transition(&mut self, phase: Phase) {
    tracing::debug!(from = %self.phase, to = %phase, candidate = %self.candidate, "calibration");
    self.phase = phase;
    self.transitions.push(phase);
  }

  fn report(&self, outcome: CalibrationOutcome) -> CalibrationReport {
    CalibrationReport {
      outcome,
      attempts: self.attempts,
      candidate_writes: self.candidate_writes,
      checkpoints_captured: self.checkpoints.is_captured() as u32,
      transitions: self.transitions.clone(),
    }
  }
}
