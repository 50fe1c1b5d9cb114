use std::fmt;

use strum_macros::{EnumIter, IntoStaticStr};

use crate::runtime::{ExecutionError, Fault, Register, Registers};
use crate::word::Word;

/// Opcodes of the instruction set, numbered as they are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Opcode {
  Halt = 0,
  Set = 1,
  Push = 2,
  Pop = 3,
  Eq = 4,
  Gt = 5,
  Jmp = 6,
  Jt = 7,
  Jf = 8,
  Add = 9,
  Mult = 10,
  Mod = 11,
  And = 12,
  Or = 13,
  Not = 14,
  Rmem = 15,
  Wmem = 16,
  Call = 17,
  Ret = 18,
  Out = 19,
  In = 20,
  Noop = 21,
}

impl Opcode {
  /// Number of operand words following the opcode.
  pub const fn operand_count(self) -> usize {
    match self {
      Opcode::Halt | Opcode::Ret | Opcode::Noop => 0,
      Opcode::Push | Opcode::Pop | Opcode::Jmp | Opcode::Call | Opcode::Out | Opcode::In => 1,
      Opcode::Set | Opcode::Jt | Opcode::Jf | Opcode::Not | Opcode::Rmem | Opcode::Wmem => 2,
      Opcode::Eq
      | Opcode::Gt
      | Opcode::Add
      | Opcode::Mult
      | Opcode::Mod
      | Opcode::And
      | Opcode::Or => 3,
    }
  }

  pub fn mnemonic(self) -> &'static str {
    self.into()
  }
}

impl TryFrom<u16> for Opcode {
  type Error = u16;
  fn try_from(value: u16) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => Opcode::Halt,
      1 => Opcode::Set,
      2 => Opcode::Push,
      3 => Opcode::Pop,
      4 => Opcode::Eq,
      5 => Opcode::Gt,
      6 => Opcode::Jmp,
      7 => Opcode::Jt,
      8 => Opcode::Jf,
      9 => Opcode::Add,
      10 => Opcode::Mult,
      11 => Opcode::Mod,
      12 => Opcode::And,
      13 => Opcode::Or,
      14 => Opcode::Not,
      15 => Opcode::Rmem,
      16 => Opcode::Wmem,
      17 => Opcode::Call,
      18 => Opcode::Ret,
      19 => Opcode::Out,
      20 => Opcode::In,
      21 => Opcode::Noop,
      other => return Err(other),
    })
  }
}

impl fmt::Display for Opcode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.mnemonic())
  }
}

/// A source operand: either a literal word or a register whose value is read at execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
  Literal(Word),
  Register(Register),
}

impl Operand {
  /// Classifies an encoded operand. Values past `32775` are invalid.
  pub fn decode(raw: u16) -> Result<Self, Fault> {
    if let Some(word) = Word::new(raw) {
      Ok(Operand::Literal(word))
    } else {
      Register::from_address(raw)
        .map(Operand::Register)
        .ok_or(Fault::InvalidOperand(raw))
    }
  }

  pub(crate) fn resolve(self, regs: &Registers) -> Word {
    match self {
      Operand::Literal(word) => word,
      Operand::Register(reg) => regs.read(reg),
    }
  }
}

impl fmt::Display for Operand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Operand::Literal(word) => word.fmt(f),
      Operand::Register(reg) => reg.fmt(f),
    }
  }
}

/// A destination operand is used raw and must name a register.
fn destination(raw: u16) -> Result<Register, Fault> {
  Register::from_address(raw).ok_or(Fault::InvalidOperand(raw))
}

/// A decoded instruction.
///
/// `Register` fields are destinations taken from the raw operand; `Operand` fields are
/// resolved when the instruction executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
  Halt,
  Set(Register, Operand),
  Push(Operand),
  Pop(Register),
  Eq(Register, Operand, Operand),
  Gt(Register, Operand, Operand),
  Jmp(Operand),
  Jt(Operand, Operand),
  Jf(Operand, Operand),
  Add(Register, Operand, Operand),
  Mult(Register, Operand, Operand),
  Mod(Register, Operand, Operand),
  And(Register, Operand, Operand),
  Or(Register, Operand, Operand),
  Not(Register, Operand),
  Rmem(Register, Operand),
  // address, value
  Wmem(Operand, Operand),
  Call(Operand),
  Ret,
  Out(Operand),
  In(Register),
  Noop,
}

impl Instruction {
  pub fn opcode(&self) -> Opcode {
    match self {
      Instruction::Halt => Opcode::Halt,
      Instruction::Set(..) => Opcode::Set,
      Instruction::Push(..) => Opcode::Push,
      Instruction::Pop(..) => Opcode::Pop,
      Instruction::Eq(..) => Opcode::Eq,
      Instruction::Gt(..) => Opcode::Gt,
      Instruction::Jmp(..) => Opcode::Jmp,
      Instruction::Jt(..) => Opcode::Jt,
      Instruction::Jf(..) => Opcode::Jf,
      Instruction::Add(..) => Opcode::Add,
      Instruction::Mult(..) => Opcode::Mult,
      Instruction::Mod(..) => Opcode::Mod,
      Instruction::And(..) => Opcode::And,
      Instruction::Or(..) => Opcode::Or,
      Instruction::Not(..) => Opcode::Not,
      Instruction::Rmem(..) => Opcode::Rmem,
      Instruction::Wmem(..) => Opcode::Wmem,
      Instruction::Call(..) => Opcode::Call,
      Instruction::Ret => Opcode::Ret,
      Instruction::Out(..) => Opcode::Out,
      Instruction::In(..) => Opcode::In,
      Instruction::Noop => Opcode::Noop,
    }
  }

  /// Builds an instruction from its opcode and exactly `opcode.operand_count()` raw operands.
  pub(crate) fn from_operands(opcode: Opcode, raw: &[u16]) -> Result<Self, Fault> {
    let src = |i: usize| Operand::decode(raw[i]);
    let dst = |i: usize| destination(raw[i]);

    Ok(match opcode {
      Opcode::Halt => Instruction::Halt,
      Opcode::Set => Instruction::Set(dst(0)?, src(1)?),
      Opcode::Push => Instruction::Push(src(0)?),
      Opcode::Pop => Instruction::Pop(dst(0)?),
      Opcode::Eq => Instruction::Eq(dst(0)?, src(1)?, src(2)?),
      Opcode::Gt => Instruction::Gt(dst(0)?, src(1)?, src(2)?),
      Opcode::Jmp => Instruction::Jmp(src(0)?),
      Opcode::Jt => Instruction::Jt(src(0)?, src(1)?),
      Opcode::Jf => Instruction::Jf(src(0)?, src(1)?),
      Opcode::Add => Instruction::Add(dst(0)?, src(1)?, src(2)?),
      Opcode::Mult => Instruction::Mult(dst(0)?, src(1)?, src(2)?),
      Opcode::Mod => Instruction::Mod(dst(0)?, src(1)?, src(2)?),
      Opcode::And => Instruction::And(dst(0)?, src(1)?, src(2)?),
      Opcode::Or => Instruction::Or(dst(0)?, src(1)?, src(2)?),
      Opcode::Not => Instruction::Not(dst(0)?, src(1)?),
      Opcode::Rmem => Instruction::Rmem(dst(0)?, src(1)?),
      Opcode::Wmem => Instruction::Wmem(src(0)?, src(1)?),
      Opcode::Call => Instruction::Call(src(0)?),
      Opcode::Ret => Instruction::Ret,
      Opcode::Out => Instruction::Out(src(0)?),
      Opcode::In => Instruction::In(dst(0)?),
      Opcode::Noop => Instruction::Noop,
    })
  }
}

/// Decodes the instruction at `pc`, returning it with the address of the word that follows it.
pub fn decode(words: &[u16], pc: u16) -> Result<(Instruction, u16), ExecutionError> {
  let at = pc as usize;
  let raw_opcode = *words
    .get(at)
    .ok_or(ExecutionError::InstructionFetchFailed { pc })?;
  let opcode = Opcode::try_from(raw_opcode)
    .map_err(|opcode| ExecutionError::IllegalOpcode { pc, opcode })?;

  let end = at + 1 + opcode.operand_count();
  let operands = words
    .get(at + 1..end)
    .ok_or(ExecutionError::Fault {
      pc,
      opcode,
      fault: Fault::AddressOutOfRange(words.len()),
    })?;
  let instruction = Instruction::from_operands(opcode, operands)
    .map_err(|fault| ExecutionError::Fault { pc, opcode, fault })?;

  // `end` is at most MEMORY_SIZE, which fits in a u16.
  Ok((instruction, end as u16))
}

impl fmt::Display for Instruction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let op = self.opcode();
    match self {
      Instruction::Halt | Instruction::Ret | Instruction::Noop => write!(f, "{op}"),
      Instruction::Pop(a) | Instruction::In(a) => write!(f, "{op} {a}"),
      Instruction::Push(a) | Instruction::Jmp(a) | Instruction::Call(a) | Instruction::Out(a) => {
        write!(f, "{op} {a}")
      }
      Instruction::Set(a, b) | Instruction::Not(a, b) | Instruction::Rmem(a, b) => {
        write!(f, "{op} {a} {b}")
      }
      Instruction::Jt(a, b) | Instruction::Jf(a, b) | Instruction::Wmem(a, b) => {
        write!(f, "{op} {a} {b}")
      }
      Instruction::Eq(a, b, c)
      | Instruction::Gt(a, b, c)
      | Instruction::Add(a, b, c)
      | Instruction::Mult(a, b, c)
      | Instruction::Mod(a, b, c)
      | Instruction::And(a, b, c)
      | Instruction::Or(a, b, c) => write!(f, "{op} {a} {b} {c}"),
    }
  }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator;

  use super::*;

  fn lit(value: u16) -> Operand {
    Operand::Literal(Word::new(value).unwrap())
  }

  #[test]
  fn opcode_encoding_roundtrip() {
    for opcode in Opcode::iter() {
      assert_eq!(Opcode::try_from(opcode as u16), Ok(opcode));
    }
    assert_eq!(Opcode::try_from(22), Err(22));
    assert_eq!(Opcode::iter().count(), 22);
  }

  #[test]
  fn operand_classes() {
    assert_eq!(Operand::decode(0), Ok(lit(0)));
    assert_eq!(Operand::decode(32767), Ok(lit(32767)));
    assert_eq!(Operand::decode(32768), Ok(Operand::Register(Register::R0)));
    assert_eq!(Operand::decode(32775), Ok(Operand::Register(Register::R7)));
    assert_eq!(Operand::decode(32776), Err(Fault::InvalidOperand(32776)));
    assert_eq!(Operand::decode(u16::MAX), Err(Fault::InvalidOperand(u16::MAX)));
  }

  #[test]
  fn resolve_reads_registers_without_mutation() {
    let mut regs = Registers::new();
    regs.write(Register::R3, Word::new(77).unwrap());
    let before = regs.clone();
    assert_eq!(lit(5).resolve(&regs), Word::new(5).unwrap());
    assert_eq!(
      Operand::Register(Register::R3).resolve(&regs),
      Word::new(77).unwrap()
    );
    assert_eq!(regs, before);
  }

  #[test]
  fn decode_add() {
    let (instruction, next) = decode(&[9, 32768, 4, 5], 0).unwrap();
    assert_eq!(instruction, Instruction::Add(Register::R0, lit(4), lit(5)));
    assert_eq!(next, 4);
    assert_eq!(instruction.to_string(), "add r0 4 5");
  }

  #[test]
  fn decode_rejects_literal_destination() {
    let err = decode(&[1, 5, 6], 0).unwrap_err();
    assert_eq!(
      err,
      ExecutionError::Fault {
        pc: 0,
        opcode: Opcode::Set,
        fault: Fault::InvalidOperand(5)
      }
    );
  }

  #[test]
  fn decode_illegal_opcode() {
    assert_eq!(
      decode(&[0, 22], 1).unwrap_err(),
      ExecutionError::IllegalOpcode { pc: 1, opcode: 22 }
    );
  }

  #[test]
  fn decode_truncated_operands() {
    assert_eq!(
      decode(&[9, 32768], 0).unwrap_err(),
      ExecutionError::Fault {
        pc: 0,
        opcode: Opcode::Add,
        fault: Fault::AddressOutOfRange(2)
      }
    );
  }

  #[test]
  fn mnemonics() {
    assert_eq!(Opcode::Mult.mnemonic(), "mult");
    assert_eq!(Opcode::Noop.to_string(), "noop");
    assert_eq!(
      Instruction::Wmem(Operand::Register(Register::R1), lit(3)).to_string(),
      "wmem r1 3"
    );
  }
}
