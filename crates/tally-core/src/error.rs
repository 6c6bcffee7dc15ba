//! Error types for `tally-core`.

use thiserror::Error;

use crate::{initiative::InitiativeId, user::UserId};

#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(UserId),

  #[error("initiative not found: {0}")]
  InitiativeNotFound(InitiativeId),

  #[error("initiative {0} has been retired")]
  InitiativeRetired(InitiativeId),

  #[error("invalid vote direction: {0:?} (expected 1 or -1)")]
  InvalidDirection(String),

  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("username already taken: {0:?}")]
  UsernameTaken(String),

  #[error("administrators cannot delete themselves")]
  SelfDeletion,

  #[error("user {0} is not allowed to perform this action")]
  Forbidden(UserId),
}

/// Coarse classification of a failure, used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  InvalidInput,
  Conflict,
  Forbidden,
  Internal,
}

/// Implemented by every error type a store backend can return.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::UserNotFound(_) | Self::InitiativeNotFound(_) => ErrorKind::NotFound,
      Self::InvalidDirection(_) | Self::InvalidInput(_) => ErrorKind::InvalidInput,
      Self::InitiativeRetired(_) | Self::UsernameTaken(_) | Self::SelfDeletion => {
        ErrorKind::Conflict
      }
      Self::Forbidden(_) => ErrorKind::Forbidden,
    }
  }
}

impl Classify for std::convert::Infallible {
  fn kind(&self) -> ErrorKind { match *self {} }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
