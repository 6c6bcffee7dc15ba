//! Initiatives: the community proposals users vote on.
//!
//! An initiative's `votes` field is a cached aggregate. It is only ever
//! written by the retirement engine's delta application, so it always equals
//! the sum of the directions of the initiative's surviving votes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::UserId;

/// Opaque identifier of an [`Initiative`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct InitiativeId(pub Uuid);

impl InitiativeId {
  pub fn new() -> Self { Self(Uuid::new_v4()) }
}

impl Default for InitiativeId {
  fn default() -> Self { Self::new() }
}

impl fmt::Display for InitiativeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Initiative {
  pub initiative_id: InitiativeId,
  pub title:         String,
  pub description:   String,
  pub author_id:     UserId,
  /// Running sum of vote directions; starts at 0.
  pub votes:         i64,
  pub created_at:    DateTime<Utc>,
}

/// Input for [`InitiativeStore::create_initiative`](crate::store::InitiativeStore::create_initiative).
#[derive(Debug, Clone, Deserialize)]
pub struct NewInitiative {
  pub title:       String,
  pub description: String,
}

impl NewInitiative {
  pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
    Self { title: title.into(), description: description.into() }
  }

  pub fn validate(&self) -> crate::Result<()> {
    if self.title.trim().is_empty() || self.description.trim().is_empty() {
      return Err(crate::Error::InvalidInput(
        "title and description are required".into(),
      ));
    }
    Ok(())
  }
}

/// An initiative joined with its author's handle, as shown in listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiativeListing {
  #[serde(flatten)]
  pub initiative: Initiative,
  pub author:     String,
}

/// One page of [`InitiativeListing`]s plus the total number of live initiatives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiativePage {
  pub initiatives: Vec<InitiativeListing>,
  pub total:       u64,
  pub page:        u32,
  pub limit:       u32,
}

/// A record that an initiative was retired by the vote engine.
///
/// Only the identity and final count survive; title, body and votes are gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retirement {
  pub initiative_id: InitiativeId,
  pub final_count:   i64,
  pub retired_at:    DateTime<Utc>,
}
