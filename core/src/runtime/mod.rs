mod checkpoint;
mod io;
mod memory;
mod program;
mod register;
mod stack;
mod state;

pub use checkpoint::*;
pub use io::*;
pub use memory::*;
pub use program::*;
pub use register::*;
pub use stack::*;
pub use state::*;

use thiserror::Error;

use crate::instruction::{decode, Instruction, Opcode, Operand};
use crate::io::LineSource;
use crate::word::Word;

/// An implementation of a runtime for the 15-bit register machine.
///
/// The runtime owns its memory, registers, stack and I/O channel, so independent runtimes never
/// share state. It executes one instruction per [`Runtime::step`], which lets a driver observe
/// and adjust the machine between instructions.
pub struct Runtime {
  /// The state of the execution.
  pub state: ExecutionState,

  io: IoChannel,

  /// Instructions executed so far. Not rolled back by [`Runtime::restore`].
  steps: u64,
}

/// Conditions that stop the machine. Each is raised by one component and tagged by the runtime
/// with the instruction that hit it.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Fault {
  #[error("invalid operand {0}")]
  InvalidOperand(u16),
  #[error("memory address {0} out of range")]
  AddressOutOfRange(usize),
  #[error("stack underflow")]
  StackUnderflow,
  #[error("input exhausted")]
  InputExhausted,
  #[error("line source failed: {0}")]
  LineSourceFailed(String),
  #[error("division by zero")]
  DivisionByZero,
  #[error("memory value {0} is not a word")]
  InvalidWord(u16),
}

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
  #[error("illegal opcode {opcode} at address {pc}")]
  IllegalOpcode { pc: u16, opcode: u16 },
  #[error("{fault} in `{opcode}` at address {pc}")]
  Fault {
    pc: u16,
    opcode: Opcode,
    #[source]
    fault: Fault,
  },
  #[error("failed to fetch instruction at address {pc}")]
  InstructionFetchFailed { pc: u16 },
}

/// Observable effects of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
  /// `out` appended this character to the output.
  Output(char),
  /// `in` pulled a new line from the line source.
  LineRead,
  /// The machine is halted.
  Halted,
}

impl Runtime {
  /// Create a runtime with `program` loaded at address 0, reading input from `source`.
  pub fn new(program: &Program, source: Box<dyn LineSource>) -> Self {
    Self {
      state: ExecutionState::new(Memory::with_image(&program.image)),
      io: IoChannel::new(source),
      steps: 0,
    }
  }

  /// Get the current value of a register.
  pub fn register(&self, register: Register) -> Word {
    self.rr(register)
  }

  /// Set a register, e.g. to inject a value between steps.
  pub fn set_register(&mut self, register: Register, value: Word) {
    self.rw(register, value)
  }

  pub fn registers(&self) -> &[Word] {
    self.state.regs.all()
  }

  /// Number of instructions executed so far.
  pub fn steps(&self) -> u64 {
    self.steps
  }

  /// Read from a register.
  fn rr(&self, register: Register) -> Word {
    self.state.regs.read(register)
  }

  /// Write to a register.
  fn rw(&mut self, register: Register, value: Word) {
    self.state.regs.write(register, value)
  }

  /// Resolve a source operand.
  fn ro(&self, operand: Operand) -> Word {
    operand.resolve(&self.state.regs)
  }

  /// Execute the instruction, given the address of the word after it.
  fn execute_instruction(
    &mut self,
    instruction: Instruction,
    mut next_pc: u16,
  ) -> Result<Option<Event>, Fault> {
    let mut event = None;

    match instruction {
      Instruction::Halt => {
        self.state.halted = true;
        event = Some(Event::Halted);
      }

      Instruction::Set(a, b) => {
        self.rw(a, self.ro(b));
      }

      // Stack
      Instruction::Push(a) => {
        let value = self.ro(a);
        self.state.stack.push(value);
      }
      Instruction::Pop(a) => {
        let value = self.state.stack.pop()?;
        self.rw(a, value);
      }

      // Comparison
      Instruction::Eq(a, b, c) => {
        self.rw(a, Word::from(self.ro(b) == self.ro(c)));
      }
      Instruction::Gt(a, b, c) => {
        self.rw(a, Word::from(self.ro(b) > self.ro(c)));
      }

      // Jumps
      Instruction::Jmp(a) => {
        next_pc = self.ro(a).get();
      }
      Instruction::Jt(a, b) => {
        if self.ro(a) != Word::ZERO {
          next_pc = self.ro(b).get();
        }
      }
      Instruction::Jf(a, b) => {
        if self.ro(a) == Word::ZERO {
          next_pc = self.ro(b).get();
        }
      }

      // Arithmetic, modulo 32768
      Instruction::Add(a, b, c) => {
        self.rw(a, self.ro(b).wrapping_add(self.ro(c)));
      }
      Instruction::Mult(a, b, c) => {
        self.rw(a, self.ro(b).wrapping_mul(self.ro(c)));
      }
      Instruction::Mod(a, b, c) => {
        let value = self
          .ro(b)
          .checked_rem(self.ro(c))
          .ok_or(Fault::DivisionByZero)?;
        self.rw(a, value);
      }

      // Bitwise
      Instruction::And(a, b, c) => {
        self.rw(a, self.ro(b) & self.ro(c));
      }
      Instruction::Or(a, b, c) => {
        self.rw(a, self.ro(b) | self.ro(c));
      }
      Instruction::Not(a, b) => {
        self.rw(a, !self.ro(b));
      }

      // Memory
      Instruction::Rmem(a, b) => {
        let raw = self.state.memory.read(self.ro(b).into())?;
        let value = Word::new(raw).ok_or(Fault::InvalidWord(raw))?;
        self.rw(a, value);
      }
      Instruction::Wmem(a, b) => {
        let addr = self.ro(a);
        let value = self.ro(b);
        self.state.memory.write(addr.into(), value.get())?;
      }

      // Subroutines
      Instruction::Call(a) => {
        let target = self.ro(a);
        let ret = Word::new(next_pc).ok_or(Fault::AddressOutOfRange(next_pc as usize))?;
        self.state.stack.push(ret);
        next_pc = target.get();
      }
      Instruction::Ret => {
        next_pc = self.state.stack.pop()?.get();
      }

      // I/O
      Instruction::Out(a) => {
        let code = self.ro(a);
        let c = self.io.write_char(code);
        event = Some(Event::Output(c));
      }
      Instruction::In(a) => {
        let (byte, refilled) = self.io.read_char()?;
        self.rw(a, Word::from(byte));
        if refilled {
          event = Some(Event::LineRead);
        }
      }

      Instruction::Noop => {}
    }

    self.state.pc = next_pc;
    Ok(event)
  }

  /// Fetch, decode and execute one instruction.
  ///
  /// Stepping a halted machine does nothing and reports [`Event::Halted`] again.
  pub fn step(&mut self) -> Result<Option<Event>, ExecutionError> {
    if self.state.halted {
      return Ok(Some(Event::Halted));
    }

    let pc = self.state.pc;
    let (instruction, next_pc) =
      decode(self.state.memory.as_slice(), pc).inspect_err(|err| tracing::error!(%err))?;
    self.trace_execution(pc, instruction);

    let event = self
      .execute_instruction(instruction, next_pc)
      .map_err(|fault| ExecutionError::Fault {
        pc,
        opcode: instruction.opcode(),
        fault,
      })
      .inspect_err(|err| tracing::error!(%err))?;
    self.steps += 1;

    Ok(event)
  }

  /// Execute the program until it halts, returning the number of instructions executed.
  pub fn execute(&mut self) -> Result<u64, ExecutionError> {
    tracing::info!(pc = self.state.pc, "starting execution");
    let start = self.steps;
    // Loop until program finishes execution or until an error occurs, whichever comes first
    loop {
      if Some(Event::Halted) == self.step()? {
        break;
      }
    }
    let executed = self.steps - start;
    tracing::info!(executed, pc = self.state.pc, "execution finished");
    Ok(executed)
  }

  fn trace_execution(&self, pc: u16, instruction: Instruction) {
    tracing::trace!(
      step = self.steps,
      pc,
      instruction = %instruction,
      registers = ?self.state.regs.all(),
      stack = self.state.stack.len(),
    );
  }
}
