use std::fmt;

use crate::instruction::{decode, Instruction, Operand};

/// One line of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
  pub addr: u16,
  pub kind: LineKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
  Instruction(Instruction),
  /// A word that does not decode as an instruction.
  Data(u16),
}

impl Line {
  /// Number of memory words the line covers.
  pub fn len(&self) -> usize {
    match &self.kind {
      LineKind::Instruction(instruction) => 1 + instruction.opcode().operand_count(),
      LineKind::Data(_) => 1,
    }
  }

  pub fn is_empty(&self) -> bool {
    false
  }
}

impl fmt::Display for Line {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:5}: ", self.addr)?;
    match &self.kind {
      LineKind::Instruction(Instruction::Out(Operand::Literal(code))) => {
        let c = char::from_u32(code.get() as u32).unwrap_or(char::REPLACEMENT_CHARACTER);
        write!(f, "out {code:<5} ; {c:?}")
      }
      LineKind::Instruction(instruction) => write!(f, "{instruction}"),
      LineKind::Data(word) => write!(f, ".word {word}"),
    }
  }
}

/// Disassemble `words[start..end]`. Words that do not decode become `.word` data and the
/// listing resynchronizes on the next word.
pub fn disassemble(words: &[u16], start: usize, end: usize) -> Vec<Line> {
  let end = end.min(words.len());
  let mut lines = Vec::new();
  let mut addr = start;

  while addr < end {
    let line = match decode(&words[..end], addr as u16) {
      Ok((instruction, _)) => Line {
        addr: addr as u16,
        kind: LineKind::Instruction(instruction),
      },
      Err(_) => Line {
        addr: addr as u16,
        kind: LineKind::Data(words[addr]),
      },
    };
    addr += line.len();
    lines.push(line);
  }

  lines
}
