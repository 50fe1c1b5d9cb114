use std::collections::VecDeque;
use std::io::{self, BufRead};

/// Supplies input to the machine one full line at a time.
#[mockall::automock]
pub trait LineSource {
  /// Returns the next line including its terminating newline, or `None` once the source is
  /// drained.
  fn next_line(&mut self) -> io::Result<Option<String>>;
}

fn terminated(mut line: String) -> String {
  if !line.ends_with('\n') {
    line.push('\n');
  }
  line
}

/// A pre-recorded sequence of input lines.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLines {
  lines: VecDeque<String>,
}

impl ScriptedLines {
  pub fn new<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
    Self {
      lines: lines.into_iter().map(|line| terminated(line.into())).collect(),
    }
  }

  /// One line per line of `script`.
  pub fn from_script(script: &str) -> Self {
    Self::new(script.lines())
  }

  pub fn remaining(&self) -> usize {
    self.lines.len()
  }
}

impl LineSource for ScriptedLines {
  fn next_line(&mut self) -> io::Result<Option<String>> {
    Ok(self.lines.pop_front())
  }
}

/// Lines read from any buffered reader, such as a locked stdin.
#[derive(Debug)]
pub struct ReaderLines<R> {
  reader: R,
}

impl<R: BufRead> ReaderLines<R> {
  pub fn new(reader: R) -> Self {
    Self { reader }
  }
}

impl ReaderLines<io::StdinLock<'static>> {
  pub fn stdin() -> Self {
    Self::new(io::stdin().lock())
  }
}

impl<R: BufRead> LineSource for ReaderLines<R> {
  fn next_line(&mut self) -> io::Result<Option<String>> {
    let mut line = String::new();
    if self.reader.read_line(&mut line)? == 0 {
      return Ok(None);
    }
    Ok(Some(terminated(line)))
  }
}

/// Drains `first`, then reads from `second`.
#[derive(Debug)]
pub struct Chain<A, B> {
  first: A,
  second: B,
  first_done: bool,
}

impl<A: LineSource, B: LineSource> Chain<A, B> {
  pub fn new(first: A, second: B) -> Self {
    Self {
      first,
      second,
      first_done: false,
    }
  }
}

impl<A: LineSource, B: LineSource> LineSource for Chain<A, B> {
  fn next_line(&mut self) -> io::Result<Option<String>> {
    if !self.first_done {
      match self.first.next_line()? {
        Some(line) => return Ok(Some(line)),
        None => {
          tracing::debug!("scripted input drained");
          self.first_done = true;
        }
      }
    }
    self.second.next_line()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn script_lines_are_terminated() {
    let mut script = ScriptedLines::from_script("north\ntake tablet\nuse tablet");
    assert_eq!(script.remaining(), 3);
    assert_eq!(script.next_line().unwrap().as_deref(), Some("north\n"));
    assert_eq!(script.next_line().unwrap().as_deref(), Some("take tablet\n"));
    assert_eq!(script.next_line().unwrap().as_deref(), Some("use tablet\n"));
    assert_eq!(script.next_line().unwrap(), None);
  }

  #[test]
  fn reader_lines() {
    let mut lines = ReaderLines::new("look\ninv".as_bytes());
    assert_eq!(lines.next_line().unwrap().as_deref(), Some("look\n"));
    assert_eq!(lines.next_line().unwrap().as_deref(), Some("inv\n"));
    assert_eq!(lines.next_line().unwrap(), None);
  }

  #[test]
  fn chain_falls_back() {
    let mut fallback = MockLineSource::new();
    fallback
      .expect_next_line()
      .once()
      .returning(|| Ok(Some("help\n".to_string())));
    let mut chain = Chain::new(ScriptedLines::new(["go"]), fallback);
    assert_eq!(chain.next_line().unwrap().as_deref(), Some("go\n"));
    assert_eq!(chain.next_line().unwrap().as_deref(), Some("help\n"));
  }
}
