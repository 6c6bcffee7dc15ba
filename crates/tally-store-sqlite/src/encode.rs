//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so they sort lexicographically. UUIDs are stored as
//! hyphenated lowercase strings. Vote directions are stored as `1` / `-1`.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use rusqlite::{Row, types::Type};
use tally_core::{
  initiative::{Initiative, InitiativeId, InitiativeListing, Retirement},
  user::{User, UserId},
  vote::{Direction, Vote},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_user_id(id: UserId) -> String { encode_uuid(id.0) }

pub fn encode_initiative_id(id: InitiativeId) -> String { encode_uuid(id.0) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Direction ───────────────────────────────────────────────────────────────

/// Decode a stored direction. The column carries a CHECK constraint, so a
/// failure here means the file was edited behind our back.
pub fn decode_direction(idx: usize, v: i64) -> rusqlite::Result<Direction> {
  Direction::try_from(v).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, v))
}

/// Surface a decode failure from inside a `tokio_rusqlite` closure.
pub fn conversion_error(idx: usize, e: Error) -> rusqlite::Error {
  rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawUser::from_row`].
pub const USER_COLUMNS: &str = "user_id, username, password_hash, is_admin, created_at";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub password_hash: String,
  pub is_admin:      bool,
  pub created_at:    String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      username:      row.get(1)?,
      password_hash: row.get(2)?,
      is_admin:      row.get(3)?,
      created_at:    row.get(4)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       UserId(decode_uuid(&self.user_id)?),
      username:      self.username,
      password_hash: self.password_hash,
      is_admin:      self.is_admin,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawInitiative::from_row`], qualified with `i.`.
pub const INITIATIVE_COLUMNS: &str =
  "i.initiative_id, i.title, i.description, i.author_id, i.votes, i.created_at";

/// Raw values read directly from an `initiatives` row.
pub struct RawInitiative {
  pub initiative_id: String,
  pub title:         String,
  pub description:   String,
  pub author_id:     String,
  pub votes:         i64,
  pub created_at:    String,
}

impl RawInitiative {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      initiative_id: row.get(0)?,
      title:         row.get(1)?,
      description:   row.get(2)?,
      author_id:     row.get(3)?,
      votes:         row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  pub fn into_initiative(self) -> Result<Initiative> {
    Ok(Initiative {
      initiative_id: InitiativeId(decode_uuid(&self.initiative_id)?),
      title:         self.title,
      description:   self.description,
      author_id:     UserId(decode_uuid(&self.author_id)?),
      votes:         self.votes,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// An initiative row joined with its author's username (column 6).
pub struct RawListing {
  pub initiative: RawInitiative,
  pub author:     String,
}

impl RawListing {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { initiative: RawInitiative::from_row(row)?, author: row.get(6)? })
  }

  pub fn into_listing(self) -> Result<InitiativeListing> {
    Ok(InitiativeListing {
      initiative: self.initiative.into_initiative()?,
      author:     self.author,
    })
  }
}

/// Raw values read directly from a `votes` row.
pub struct RawVote {
  pub user_id:       String,
  pub initiative_id: String,
  pub direction:     Direction,
  pub created_at:    String,
}

impl RawVote {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      initiative_id: row.get(1)?,
      direction:     decode_direction(2, row.get(2)?)?,
      created_at:    row.get(3)?,
    })
  }

  pub fn into_vote(self) -> Result<Vote> {
    Ok(Vote {
      user_id:       UserId(decode_uuid(&self.user_id)?),
      initiative_id: InitiativeId(decode_uuid(&self.initiative_id)?),
      direction:     self.direction,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `retirements` row.
pub struct RawRetirement {
  pub initiative_id: String,
  pub final_count:   i64,
  pub retired_at:    String,
}

impl RawRetirement {
  pub fn into_retirement(self) -> Result<Retirement> {
    Ok(Retirement {
      initiative_id: InitiativeId(decode_uuid(&self.initiative_id)?),
      final_count:   self.final_count,
      retired_at:    decode_dt(&self.retired_at)?,
    })
  }
}
