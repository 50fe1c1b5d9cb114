use super::{Memory, Registers, Stack};

/// Holds data describing the current state of a program's execution.
///
/// Everything here is owned by a single runtime; checkpoints hold an independent copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionState {
  /// The program counter: address of the next word to fetch.
  pub pc: u16,

  /// The memory which instructions operate over.
  pub memory: Memory,

  pub(crate) regs: Registers,

  pub stack: Stack,

  /// Set once `halt` executes.
  pub halted: bool,
}

impl ExecutionState {
  pub fn new(memory: Memory) -> Self {
    Self {
      pc: 0,
      memory,
      regs: Registers::new(),
      stack: Stack::new(),
      halted: false,
    }
  }
}
