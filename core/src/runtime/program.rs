use std::fs;
use std::path::Path;

use thiserror::Error;

use super::MEMORY_SIZE;

/// A program image: the initial contents of memory, starting at address 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
  pub image: Vec<u16>,
}

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProgramError {
  #[error("image length {0} is not a whole number of 16-bit words")]
  OddLength(usize),
  #[error("image holds {0} words, memory holds {MEMORY_SIZE}")]
  TooLarge(usize),
  #[error("reading image failed: {0}")]
  Io(#[from] std::io::Error),
}

impl Program {
  pub fn new(image: Vec<u16>) -> Result<Self, ProgramError> {
    if image.len() > MEMORY_SIZE {
      return Err(ProgramError::TooLarge(image.len()));
    }
    Ok(Self { image })
  }

  /// Decodes an image of little-endian 16-bit words.
  pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProgramError> {
    if bytes.len() % 2 != 0 {
      return Err(ProgramError::OddLength(bytes.len()));
    }
    let image = bytes
      .chunks_exact(2)
      .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
      .collect();
    Self::new(image)
  }

  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProgramError> {
    let bytes = fs::read(path)?;
    Self::from_bytes(&bytes)
  }

  pub fn len(&self) -> usize {
    self.image.len()
  }

  pub fn is_empty(&self) -> bool {
    self.image.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  #[test]
  fn little_endian_words() {
    let program = Program::from_bytes(&[0x09, 0x00, 0x00, 0x80, 0x04, 0x00, 0x05, 0x00]).unwrap();
    assert_eq!(program.image, vec![9, 32768, 4, 5]);
  }

  #[test]
  fn odd_length_is_rejected() {
    assert!(matches!(
      Program::from_bytes(&[1, 0, 2]),
      Err(ProgramError::OddLength(3))
    ));
  }

  #[test]
  fn oversized_image_is_rejected() {
    let bytes = vec![0u8; (MEMORY_SIZE + 1) * 2];
    assert!(matches!(
      Program::from_bytes(&bytes),
      Err(ProgramError::TooLarge(n)) if n == MEMORY_SIZE + 1
    ));
    assert_eq!(Program::new(vec![0; MEMORY_SIZE]).unwrap().len(), MEMORY_SIZE);
  }

  #[test]
  fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[0x13, 0x00, 0x41, 0x00, 0x00, 0x00]).unwrap();
    let program = Program::from_file(file.path()).unwrap();
    assert_eq!(program.image, vec![19, 65, 0]);
  }

  #[test]
  fn missing_file() {
    assert!(matches!(
      Program::from_file("/nonexistent/challenge.bin"),
      Err(ProgramError::Io(_))
    ));
  }
}
