use super::Fault;
use crate::word::Word;

/// Unbounded LIFO of words, shared by `call`/`ret` and `push`/`pop`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
  items: Vec<Word>,
}

impl Stack {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, value: Word) {
    self.items.push(value);
  }

  pub fn pop(&mut self) -> Result<Word, Fault> {
    self.items.pop().ok_or(Fault::StackUnderflow)
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  /// Bottom of the stack first.
  pub fn as_slice(&self) -> &[Word] {
    &self.items
  }
}
