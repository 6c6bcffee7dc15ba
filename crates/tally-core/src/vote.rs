//! Votes: one signed record per (user, initiative) pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  initiative::InitiativeId,
  retirement::RetirementDecision,
  user::UserId,
  Error,
};

// ─── Direction ───────────────────────────────────────────────────────────────

/// The sign of a vote. Serialised as the integers `1` and `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Direction {
  Up,
  Down,
}

impl Direction {
  pub fn value(self) -> i64 {
    match self {
      Self::Up => 1,
      Self::Down => -1,
    }
  }
}

impl From<Direction> for i64 {
  fn from(d: Direction) -> Self { d.value() }
}

impl TryFrom<i64> for Direction {
  type Error = Error;

  fn try_from(v: i64) -> Result<Self, Self::Error> {
    match v {
      1 => Ok(Self::Up),
      -1 => Ok(Self::Down),
      other => Err(Error::InvalidDirection(other.to_string())),
    }
  }
}

impl std::str::FromStr for Direction {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "1" | "+1" => Ok(Self::Up),
      "-1" => Ok(Self::Down),
      other => Err(Error::InvalidDirection(other.to_owned())),
    }
  }
}

/// A direction as it arrives from a request payload: either a JSON number or
/// a numeric string. Convert with [`DirectionInput::parse`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DirectionInput {
  Number(i64),
  Text(String),
}

impl DirectionInput {
  pub fn parse(&self) -> crate::Result<Direction> {
    match self {
      Self::Number(n) => Direction::try_from(*n),
      Self::Text(s) => s.parse(),
    }
  }
}

// ─── Vote record ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
  pub user_id:       UserId,
  pub initiative_id: InitiativeId,
  pub direction:     Direction,
  pub created_at:    DateTime<Utc>,
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// What a cast did to the caller's vote row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChange {
  /// No prior vote; a new one was recorded.
  Cast,
  /// The same direction was cast again; the prior vote was removed.
  Retracted,
  /// The opposite direction was cast; the prior vote was replaced.
  Flipped,
}

/// The full result of a cast: the ledger change, the delta applied to the
/// aggregate, and the initiative's state afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
  pub initiative_id: InitiativeId,
  pub change:        VoteChange,
  pub delta:         i64,
  pub outcome:       RetirementDecision,
}
