use std::collections::VecDeque;

use thiserror::Error;

use super::{ExecutionState, Runtime};

/// An independent snapshot of a runtime: memory, registers, stack, program counter and queued
/// input, plus the output length at capture time. Output itself is never rolled back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
  state: ExecutionState,
  input: VecDeque<u8>,
  output_len: usize,
}

impl Checkpoint {
  pub fn state(&self) -> &ExecutionState {
    &self.state
  }

  pub fn pending_input(&self) -> &VecDeque<u8> {
    &self.input
  }

  /// Length of the output log when the checkpoint was taken.
  pub fn output_len(&self) -> usize {
    self.output_len
  }
}

impl Runtime {
  /// Deep copy of the current machine state.
  pub fn checkpoint(&self) -> Checkpoint {
    Checkpoint {
      state: self.state.clone(),
      input: self.io.pending_input().clone(),
      output_len: self.output().len(),
    }
  }

  /// Replaces memory, registers, stack, program counter and queued input with the
  /// checkpoint's copies.
  pub fn restore(&mut self, checkpoint: &Checkpoint) {
    self.state.clone_from(&checkpoint.state);
    self.io.replace_input(checkpoint.input.clone());
  }
}

#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CheckpointError {
  #[error("a checkpoint was already captured for this session")]
  AlreadyCaptured,
  #[error("no checkpoint has been captured")]
  NotCaptured,
}

/// Holds at most one checkpoint per session.
#[derive(Debug, Default)]
pub struct CheckpointManager {
  slot: Option<Checkpoint>,
}

impl CheckpointManager {
  pub fn new() -> Self {
    Self::default()
  }

  /// Captures the runtime's state. A second capture is rejected.
  pub fn capture(&mut self, runtime: &Runtime) -> Result<&Checkpoint, CheckpointError> {
    if self.slot.is_some() {
      return Err(CheckpointError::AlreadyCaptured);
    }
    let checkpoint = runtime.checkpoint();
    tracing::debug!(
      pc = checkpoint.state.pc,
      stack = checkpoint.state.stack.len(),
      output_len = checkpoint.output_len,
      "captured checkpoint"
    );
    Ok(self.slot.insert(checkpoint))
  }

  pub fn restore(&self, runtime: &mut Runtime) -> Result<&Checkpoint, CheckpointError> {
    let checkpoint = self.slot.as_ref().ok_or(CheckpointError::NotCaptured)?;
    runtime.restore(checkpoint);
    tracing::debug!(pc = checkpoint.state.pc, "restored checkpoint");
    Ok(checkpoint)
  }

  pub fn get(&self) -> Option<&Checkpoint> {
    self.slot.as_ref()
  }

  pub fn is_captured(&self) -> bool {
    self.slot.is_some()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::io::ScriptedLines;
  use crate::runtime::{Program, Register};
  use crate::word::Word;

  // in r1; loop: add r0 r0 1; push r0; wmem 100 r0; jmp loop
  const COUNTER: [u16; 13] = [20, 32769, 9, 32768, 32768, 1, 2, 32768, 16, 100, 32768, 6, 2];

  fn runtime() -> Runtime {
    let program = Program::new(COUNTER.to_vec()).unwrap();
    Runtime::new(&program, Box::new(ScriptedLines::new(["xyz"])))
  }

  fn steps(runtime: &mut Runtime, n: usize) {
    for _ in 0..n {
      runtime.step().unwrap();
    }
  }

  #[test]
  fn restore_is_bit_for_bit() {
    let mut rt = runtime();
    steps(&mut rt, 3);
    let checkpoint = rt.checkpoint();
    let state = rt.state.clone();
    let input = rt.pending_input();
    assert_eq!(input, b"yz\n");
    assert_eq!(checkpoint.pending_input(), &input);

    steps(&mut rt, 20);
    assert_ne!(rt.state, state);

    rt.restore(&checkpoint);
    assert_eq!(rt.state, state);
    assert_eq!(rt.pending_input(), input);
    assert_eq!(rt.state.pc, checkpoint.state().pc);
  }

  #[test]
  fn checkpoint_does_not_alias_live_state() {
    let mut rt = runtime();
    steps(&mut rt, 2);
    let checkpoint = rt.checkpoint();
    let before = checkpoint.clone();
    steps(&mut rt, 10);
    rt.set_register(Register::R5, Word::MAX);
    assert_eq!(checkpoint, before);
  }

  #[test]
  fn manager_holds_one_checkpoint() {
    let mut rt = runtime();
    let mut manager = CheckpointManager::new();
    assert_eq!(
      manager.restore(&mut rt).unwrap_err(),
      CheckpointError::NotCaptured
    );
    assert!(manager.get().is_none());
    manager.capture(&rt).unwrap();
    assert!(manager.is_captured());
    assert_eq!(manager.get(), Some(&rt.checkpoint()));
    assert_eq!(
      manager.capture(&rt).unwrap_err(),
      CheckpointError::AlreadyCaptured
    );
  }

  #[test]
  fn output_is_not_rolled_back() {
    let program = Program::new(vec![19, 65, 19, 66, 0]).unwrap();
    let mut rt = Runtime::new(&program, Box::new(ScriptedLines::default()));
    let mut manager = CheckpointManager::new();
    rt.step().unwrap();
    let mark = manager.capture(&rt).unwrap().output_len();
    assert_eq!(mark, 1);
    rt.step().unwrap();
    manager.restore(&mut rt).unwrap();
    assert_eq!(rt.output(), "AB");
    assert_eq!(rt.state.pc, 2);
  }
}
