//! Retirement policy: when an initiative's count falls strictly below the
//! threshold it is removed, together with all of its votes, for good.

use serde::{Deserialize, Serialize};

/// Counts strictly below this value retire an initiative.
pub const DEFAULT_RETIREMENT_THRESHOLD: i64 = -10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetirementPolicy {
  /// Exclusive lower bound for a live initiative's count.
  pub threshold: i64,
}

impl Default for RetirementPolicy {
  fn default() -> Self { Self { threshold: DEFAULT_RETIREMENT_THRESHOLD } }
}

impl RetirementPolicy {
  pub fn new(threshold: i64) -> Self { Self { threshold } }

  pub fn should_retire(&self, count: i64) -> bool { count < self.threshold }

  /// Classify the count an initiative reached after a delta was applied.
  pub fn decide(&self, count: i64) -> RetirementDecision {
    if self.should_retire(count) {
      RetirementDecision::Retired { final_count: count }
    } else {
      RetirementDecision::Active { count }
    }
  }
}

/// State of an initiative after a delta was applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RetirementDecision {
  Active { count: i64 },
  /// Terminal: the initiative and its votes no longer exist.
  Retired { final_count: i64 },
}

impl RetirementDecision {
  pub fn is_retired(&self) -> bool { matches!(self, Self::Retired { .. }) }

  pub fn count(&self) -> i64 {
    match *self {
      Self::Active { count } => count,
      Self::Retired { final_count } => final_count,
    }
  }
}
