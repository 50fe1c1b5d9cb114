use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

use crate::word::Word;

/// Operand value that names register 0. The eight registers occupy `32768..=32775`.
pub const REGISTER_BASE: u16 = 32768;

/// Number of general purpose registers.
pub const REGISTER_COUNT: usize = 8;

/// A register holds one word. Registers live in their own address space, disjoint from memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Register {
  R0 = 0,
  R1 = 1,
  R2 = 2,
  R3 = 3,
  R4 = 4,
  R5 = 5,
  R6 = 6,
  R7 = 7,
}

impl Register {
  /// Maps an encoded operand in `32768..=32775` to its register.
  pub fn from_address(raw: u16) -> Option<Self> {
    raw
      .checked_sub(REGISTER_BASE)
      .and_then(|index| Self::try_from(index).ok())
  }

  /// The encoded operand that names this register.
  pub const fn address(self) -> u16 {
    REGISTER_BASE + self as u16
  }

  pub const fn index(self) -> usize {
    self as usize
  }
}

impl TryFrom<u16> for Register {
  type Error = &'static str;
  fn try_from(value: u16) -> Result<Self, Self::Error> {
    match value {
      0 => Ok(Register::R0),
      1 => Ok(Register::R1),
      2 => Ok(Register::R2),
      3 => Ok(Register::R3),
      4 => Ok(Register::R4),
      5 => Ok(Register::R5),
      6 => Ok(Register::R6),
      7 => Ok(Register::R7),
      _ => Err("register out of bounds"),
    }
  }
}

impl From<Register> for u16 {
  fn from(reg: Register) -> Self {
    reg as u16
  }
}

impl fmt::Display for Register {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "r{}", self.index())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Registers {
  register_space: [Word; REGISTER_COUNT],
}

impl Registers {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  pub(crate) fn write(&mut self, reg: Register, value: Word) {
    self.register_space[reg.index()] = value;
  }

  pub(crate) fn read(&self, reg: Register) -> Word {
    self.register_space[reg.index()]
  }

  pub(crate) fn all(&self) -> &[Word] {
    &self.register_space
  }
}
