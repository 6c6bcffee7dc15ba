//! Users: the people who author initiatives and cast votes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of a [`User`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
  pub fn new() -> Self { Self(Uuid::new_v4()) }
}

impl Default for UserId {
  fn default() -> Self { Self::new() }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// A registered account.
///
/// The credential hash never leaves the process in serialised form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:       UserId,
  /// Unique handle chosen at registration.
  pub username:      String,
  /// argon2 PHC string, e.g. `$argon2id$v=19$…`
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub is_admin:      bool,
  pub created_at:    DateTime<Utc>,
}

/// Input for [`InitiativeStore::register_user`](crate::store::InitiativeStore::register_user).
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub password_hash: String,
  pub is_admin:      bool,
}

impl NewUser {
  /// A regular (non-admin) account.
  pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
    Self {
      username:      username.into(),
      password_hash: password_hash.into(),
      is_admin:      false,
    }
  }

  /// Reject blank handles and missing hashes before touching storage.
  pub fn validate(&self) -> crate::Result<()> {
    if self.username.trim().is_empty() {
      return Err(crate::Error::InvalidInput("username must not be empty".into()));
    }
    if self.password_hash.is_empty() {
      return Err(crate::Error::InvalidInput("password must not be empty".into()));
    }
    Ok(())
  }
}
