use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

/// Arithmetic on words is taken modulo this value.
pub const MODULUS: u32 = 32768;

/// A 15-bit machine word.
///
/// The only way to obtain a `Word` is through a checked or reducing constructor, so a value
/// outside `0..=32767` is never representable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Word(u16);

impl Word {
  pub const ZERO: Word = Word(0);
  pub const ONE: Word = Word(1);
  pub const MAX: Word = Word((MODULUS - 1) as u16);

  /// Returns the word for `value` if it fits in 15 bits.
  pub const fn new(value: u16) -> Option<Word> {
    if (value as u32) < MODULUS {
      Some(Word(value))
    } else {
      None
    }
  }

  /// Reduces `value` modulo 32768.
  pub const fn wrapping(value: u32) -> Word {
    Word((value % MODULUS) as u16)
  }

  pub const fn get(self) -> u16 {
    self.0
  }

  pub const fn wrapping_add(self, rhs: Word) -> Word {
    Word::wrapping(self.0 as u32 + rhs.0 as u32)
  }

  pub const fn wrapping_mul(self, rhs: Word) -> Word {
    Word::wrapping(self.0 as u32 * rhs.0 as u32)
  }

  /// Remainder of `self / rhs`, or `None` when `rhs` is zero.
  pub const fn checked_rem(self, rhs: Word) -> Option<Word> {
    if rhs.0 == 0 {
      None
    } else {
      Some(Word(self.0 % rhs.0))
    }
  }
}

/// 15-bit one's complement.
impl Not for Word {
  type Output = Word;

  fn not(self) -> Word {
    Word(Word::MAX.0 - self.0)
  }
}

impl BitAnd for Word {
  type Output = Word;

  fn bitand(self, rhs: Word) -> Word {
    Word(self.0 & rhs.0)
  }
}

impl BitOr for Word {
  type Output = Word;

  fn bitor(self, rhs: Word) -> Word {
    Word(self.0 | rhs.0)
  }
}

impl From<bool> for Word {
  fn from(value: bool) -> Self {
    Word(value as u16)
  }
}

impl From<u8> for Word {
  fn from(value: u8) -> Self {
    Word(value as u16)
  }
}

impl From<Word> for u16 {
  fn from(word: Word) -> Self {
    word.0
  }
}

impl From<Word> for usize {
  fn from(word: Word) -> Self {
    word.0 as usize
  }
}

impl TryFrom<u16> for Word {
  type Error = &'static str;
  fn try_from(value: u16) -> Result<Self, Self::Error> {
    Word::new(value).ok_or("value does not fit in 15 bits")
  }
}

impl fmt::Display for Word {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}
