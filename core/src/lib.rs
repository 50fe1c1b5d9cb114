#![warn(unused_extern_crates)]

pub mod calibration;
pub mod disassembler;
pub mod instruction;
pub mod io;
pub mod runtime;
pub mod utils;
pub mod word;

#[cfg(test)]
mod tests {
  use crate::io::ScriptedLines;
  use crate::runtime::{Program, Runtime};
  use crate::utils::setup_test_logger;

  #[test]
  fn test_load_and_run_image() {
    setup_test_logger();

    // out 'h'; out 'i'; out '\n'; halt, little-endian
    let bytes = [19, 0, 104, 0, 19, 0, 105, 0, 19, 0, 10, 0, 0, 0];
    let program = Program::from_bytes(&bytes).unwrap();
    let mut runtime = Runtime::new(&program, Box::new(ScriptedLines::default()));
    assert_eq!(runtime.execute().unwrap(), 4);
    assert_eq!(runtime.output(), "hi\n");
  }
}
