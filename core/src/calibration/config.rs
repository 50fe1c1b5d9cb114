use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runtime::Register;
use crate::word::Word;

/// What tells the controller the program is about to run its verification routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmTrigger {
  /// The output ends with this marker.
  Output(String),
  /// The program starts consuming an input line beginning with this prefix.
  Input(String),
}

/// Calibration session settings.
///
/// ```
/// use synvm_core::calibration::*;
/// use synvm_core::runtime::Register;
///
/// let config = CalibrationConfig::new(Register::R7).with_options([
///   with_arming_input("use teleporter"),
///   with_acceptance("You wake up"),
///   with_rejection("Miscalibration detected"),
/// ]);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalibrationConfig {
  /// The register whose value is swept.
  pub register: Register,
  pub arm: ArmTrigger,
  /// Output text reporting that verification succeeded.
  pub accept: String,
  /// Output text reporting that verification failed.
  pub reject: String,
  #[serde(default = "default_first")]
  pub first_candidate: u16,
  #[serde(default = "default_last")]
  pub last_candidate: u16,
}

fn default_first() -> u16 {
  0
}

fn default_last() -> u16 {
  Word::MAX.get()
}

/// A functional option for [`CalibrationConfig::with_options`].
pub type CalibrationOption = Box<dyn FnOnce(&mut CalibrationConfig)>;

#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
  #[error("the {0} oracle must not be empty")]
  EmptyOracle(&'static str),
  #[error("candidate {0} is not a word")]
  CandidateOutOfRange(u16),
  #[error("candidate range {0}..={1} is empty")]
  EmptyRange(u16, u16),
}

impl CalibrationConfig {
  pub fn new(register: Register) -> Self {
    Self {
      register,
      arm: ArmTrigger::Output(String::new()),
      accept: String::new(),
      reject: String::new(),
      first_candidate: default_first(),
      last_candidate: default_last(),
    }
  }

  // options run in order, so a later one overrides an earlier one
  pub fn with_options(mut self, opts: impl IntoIterator<Item = CalibrationOption>) -> Self {
    for opt in opts {
      opt(&mut self);
    }
    self
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    let arm = match &self.arm {
      ArmTrigger::Output(marker) => marker,
      ArmTrigger::Input(prefix) => prefix,
    };
    if arm.is_empty() {
      return Err(ConfigError::EmptyOracle("arming"));
    }
    if self.accept.is_empty() {
      return Err(ConfigError::EmptyOracle("acceptance"));
    }
    if self.reject.is_empty() {
      return Err(ConfigError::EmptyOracle("rejection"));
    }
    self.candidates().map(|_| ())
  }

  /// The inclusive candidate range as words.
  pub fn candidates(&self) -> Result<RangeInclusive<Word>, ConfigError> {
    let first = Word::new(self.first_candidate)
      .ok_or(ConfigError::CandidateOutOfRange(self.first_candidate))?;
    let last = Word::new(self.last_candidate)
      .ok_or(ConfigError::CandidateOutOfRange(self.last_candidate))?;
    if first > last {
      return Err(ConfigError::EmptyRange(self.first_candidate, self.last_candidate));
    }
    Ok(first..=last)
  }
}

pub fn with_arming_output(marker: impl Into<String>) -> CalibrationOption {
  let marker = marker.into();
  Box::new(move |config: &mut CalibrationConfig| config.arm = ArmTrigger::Output(marker))
}

pub fn with_arming_input(prefix: impl Into<String>) -> CalibrationOption {
  let prefix = prefix.into();
  Box::new(move |config: &mut CalibrationConfig| config.arm = ArmTrigger::Input(prefix))
}

pub fn with_acceptance(oracle: impl Into<String>) -> CalibrationOption {
  let oracle = oracle.into();
  Box::new(move |config: &mut CalibrationConfig| config.accept = oracle)
}

pub fn with_rejection(oracle: impl Into<String>) -> CalibrationOption {
  let oracle = oracle.into();
  Box::new(move |config: &mut CalibrationConfig| config.reject = oracle)
}

pub fn with_candidates(range: RangeInclusive<u16>) -> CalibrationOption {
  Box::new(move |config: &mut CalibrationConfig| {
    config.first_candidate = *range.start();
    config.last_candidate = *range.end();
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn complete() -> CalibrationConfig {
    CalibrationConfig::new(Register::R7).with_options([
      with_arming_output("ARM"),
      with_acceptance("YES"),
      with_rejection("NO"),
    ])
  }

  #[test]
  fn defaults_sweep_every_word() {
    let config = complete();
    assert_eq!(config.candidates().unwrap(), Word::ZERO..=Word::MAX);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn empty_oracles_are_rejected() {
    let config = CalibrationConfig::new(Register::R0);
    assert_eq!(config.validate(), Err(ConfigError::EmptyOracle("arming")));
    let config = complete().with_options([with_rejection("")]);
    assert_eq!(config.validate(), Err(ConfigError::EmptyOracle("rejection")));
  }

  #[test]
  fn candidate_range_checks() {
    let config = complete().with_options([with_candidates(10..=32768)]);
    assert_eq!(config.validate(), Err(ConfigError::CandidateOutOfRange(32768)));
    let config = complete().with_options([with_candidates(10..=9)]);
    assert_eq!(config.validate(), Err(ConfigError::EmptyRange(10, 9)));
  }

  #[test]
  fn parses_json() {
    let config: CalibrationConfig = serde_json::from_str(
      r#"{
        "register": 7,
        "arm": { "input": "use teleporter" },
        "accept": "You wake up",
        "reject": "Miscalibration detected",
        "last_candidate": 100
      }"#,
    )
    .unwrap();
    assert_eq!(config.register, Register::R7);
    assert_eq!(config.arm, ArmTrigger::Input("use teleporter".into()));
    assert_eq!(config.first_candidate, 0);
    assert_eq!(config.last_candidate, 100);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn unknown_fields_are_rejected() {
    let result = serde_json::from_str::<CalibrationConfig>(
      r#"{ "register": 7, "arm": { "output": "x" }, "accept": "a", "reject": "b", "extra": 1 }"#,
    );
    assert!(result.is_err());
  }
}
