use std::fmt;

use super::Fault;

/// Number of addressable words.
pub const MEMORY_SIZE: usize = 32768;

/// Flat, self-modifiable program memory.
///
/// Cells hold raw 16-bit values: the image encodes register operands as `32768..=32775`, so a
/// cell is not necessarily a [`Word`](crate::word::Word).
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
  cells: Box<[u16]>,
}

impl Memory {
  /// Zeroed memory.
  pub fn new() -> Self {
    Self {
      cells: vec![0; MEMORY_SIZE].into_boxed_slice(),
    }
  }

  /// Memory holding `image` at address 0. Words past `MEMORY_SIZE` are ignored.
  pub fn with_image(image: &[u16]) -> Self {
    let mut memory = Self::new();
    let len = image.len().min(MEMORY_SIZE);
    memory.cells[..len].copy_from_slice(&image[..len]);
    memory
  }

  pub fn read(&self, addr: usize) -> Result<u16, Fault> {
    self
      .cells
      .get(addr)
      .copied()
      .ok_or(Fault::AddressOutOfRange(addr))
  }

  pub fn write(&mut self, addr: usize, value: u16) -> Result<(), Fault> {
    let cell = self
      .cells
      .get_mut(addr)
      .ok_or(Fault::AddressOutOfRange(addr))?;
    *cell = value;
    Ok(())
  }

  pub fn as_slice(&self) -> &[u16] {
    &self.cells
  }
}

impl Default for Memory {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for Memory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let used = self.cells.iter().filter(|cell| **cell != 0).count();
    f.debug_struct("Memory")
      .field("size", &self.cells.len())
      .field("nonzero", &used)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use rand::Rng;

  use super::*;

  #[test]
  fn image_is_loaded_at_zero() {
    let memory = Memory::with_image(&[9, 32768, 4, 5]);
    assert_eq!(&memory.as_slice()[..5], &[9, 32768, 4, 5, 0]);
    assert_eq!(memory.as_slice().len(), MEMORY_SIZE);
  }

  #[test]
  fn out_of_range_access_faults() {
    let mut memory = Memory::new();
    assert_eq!(memory.read(MEMORY_SIZE), Err(Fault::AddressOutOfRange(MEMORY_SIZE)));
    assert_eq!(
      memory.write(MEMORY_SIZE + 5, 1),
      Err(Fault::AddressOutOfRange(MEMORY_SIZE + 5))
    );
    assert_eq!(memory.read(MEMORY_SIZE - 1), Ok(0));
  }

  #[test]
  fn write_then_read() {
    let mut memory = Memory::new();
    let mut rng = rand::thread_rng();
    for _ in 0..1000 {
      let addr = rng.gen_range(0..MEMORY_SIZE);
      let value = rng.gen_range(0..32768);
      memory.write(addr, value).unwrap();
      assert_eq!(memory.read(addr), Ok(value));
    }
    memory.write(0, 32767).unwrap();
    memory.write(MEMORY_SIZE - 1, 32767).unwrap();
    assert_eq!(memory.read(0), Ok(32767));
    assert_eq!(memory.read(MEMORY_SIZE - 1), Ok(32767));
  }
}
