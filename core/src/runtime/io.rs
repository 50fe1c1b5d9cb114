use std::collections::VecDeque;
use std::io::Write;

use super::{Fault, Runtime};
use crate::io::LineSource;
use crate::word::Word;

/// Character I/O for a running program.
///
/// Output is kept as an append-only log of the whole session and optionally echoed to a sink.
/// Input is line buffered: a line is queued whole before its first character is consumed.
pub struct IoChannel {
  output: String,
  input: VecDeque<u8>,
  last_line: Option<String>,
  source: Box<dyn LineSource>,
  sink: Option<Box<dyn Write>>,
}

impl IoChannel {
  pub fn new(source: Box<dyn LineSource>) -> Self {
    Self {
      output: String::new(),
      input: VecDeque::new(),
      last_line: None,
      source,
      sink: None,
    }
  }

  pub(crate) fn set_sink(&mut self, sink: Box<dyn Write>) {
    self.sink = Some(sink);
  }

  /// Appends the character with code `code` to the output.
  pub(crate) fn write_char(&mut self, code: Word) -> char {
    let c = char::from_u32(code.get() as u32).unwrap_or(char::REPLACEMENT_CHARACTER);
    self.output.push(c);
    if let Some(sink) = self.sink.as_mut() {
      let mut buf = [0; 4];
      let result = sink.write_all(c.encode_utf8(&mut buf).as_bytes()).and_then(|_| {
        if c == '\n' {
          sink.flush()
        } else {
          Ok(())
        }
      });
      if let Err(err) = result {
        tracing::warn!(%err, "output sink failed");
      }
    }
    c
  }

  /// Consumes the next input byte, refilling from the line source when the buffer is empty.
  /// The flag reports whether a new line was queued for this read.
  pub(crate) fn read_char(&mut self) -> Result<(u8, bool), Fault> {
    let mut refilled = false;
    if self.input.is_empty() {
      let line = match self.source.next_line() {
        Ok(Some(line)) if !line.is_empty() => line,
        Ok(_) => return Err(Fault::InputExhausted),
        Err(err) => {
          tracing::error!(%err, "line source failed");
          return Err(Fault::LineSourceFailed(err.to_string()));
        }
      };
      tracing::debug!(line = line.trim_end(), "queued input line");
      self.input.extend(line.bytes());
      self.last_line = Some(line);
      refilled = true;
    }
    let byte = self.input.pop_front().ok_or(Fault::InputExhausted)?;
    Ok((byte, refilled))
  }

  pub(crate) fn pending_input(&self) -> &VecDeque<u8> {
    &self.input
  }

  pub(crate) fn replace_input(&mut self, input: VecDeque<u8>) {
    self.input = input;
  }
}

impl Runtime {
  /// Everything the program has written this session.
  pub fn output(&self) -> &str {
    &self.io.output
  }

  /// The most recent line pulled from the line source.
  pub fn last_line(&self) -> Option<&str> {
    self.io.last_line.as_deref()
  }

  /// Input bytes queued but not yet consumed.
  pub fn pending_input(&self) -> Vec<u8> {
    self.io.pending_input().iter().copied().collect()
  }

  /// Echo output to `sink` as it is produced.
  pub fn with_output(mut self, sink: Box<dyn Write>) -> Self {
    self.io.set_sink(sink);
    self
  }
}
