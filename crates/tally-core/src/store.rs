//! The `InitiativeStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `tally-store-sqlite`).
//! Higher layers (`tally-api`, `tally-server`) depend on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use crate::{
  error::Classify,
  initiative::{
    Initiative, InitiativeId, InitiativeListing, InitiativePage, NewInitiative, Retirement,
  },
  stats::{PlatformStats, UserStats},
  user::{NewUser, User, UserId},
  vote::{Direction, Vote, VoteReceipt},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Default number of initiatives per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// 1-based page selector for [`InitiativeStore::list_initiatives`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
  pub number: u32,
  pub limit:  u32,
}

impl Default for Page {
  fn default() -> Self { Self { number: 1, limit: DEFAULT_PAGE_SIZE } }
}

impl Page {
  pub fn new(number: u32, limit: u32) -> Self {
    Self { number: number.max(1), limit: limit.max(1) }
  }

  pub fn offset(&self) -> u64 { u64::from(self.number.max(1) - 1) * u64::from(self.limit) }
}

/// Parameters for [`InitiativeStore::search`].
#[derive(Debug, Clone, Default)]
pub struct InitiativeQuery {
  /// Substring matched against the title and the author's username.
  pub text:  String,
  pub limit: Option<u32>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Tally storage backend.
///
/// Every mutating method is atomic: it either commits in full or leaves the
/// store untouched. Implementations must keep each initiative's `votes` equal
/// to the sum of its surviving vote directions and must retire an initiative,
/// with its votes, the moment that sum drops below the retirement threshold.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait InitiativeStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create a new account. Fails if the username is taken.
  fn register_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn find_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// All users, newest first.
  fn list_users(&self) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Flip the admin flag of `target`. `actor` must be an administrator.
  fn toggle_admin(
    &self,
    actor: UserId,
    target: UserId,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Remove `target`, their initiatives, and their votes. `actor` must be an
  /// administrator other than `target`. Removing votes adjusts (and may
  /// retire) the initiatives they were cast on.
  fn delete_user(
    &self,
    actor: UserId,
    target: UserId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Initiatives ───────────────────────────────────────────────────────

  fn create_initiative(
    &self,
    author: UserId,
    input: NewInitiative,
  ) -> impl Future<Output = Result<Initiative, Self::Error>> + Send + '_;

  /// Current state of an initiative. `None` if it never existed, was
  /// deleted, or was retired.
  fn get_initiative(
    &self,
    id: InitiativeId,
  ) -> impl Future<Output = Result<Option<Initiative>, Self::Error>> + Send + '_;

  /// The retirement record of an initiative the vote engine removed.
  fn get_retirement(
    &self,
    id: InitiativeId,
  ) -> impl Future<Output = Result<Option<Retirement>, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_initiatives(
    &self,
    page: Page,
  ) -> impl Future<Output = Result<InitiativePage, Self::Error>> + Send + '_;

  fn list_by_author(
    &self,
    author: UserId,
  ) -> impl Future<Output = Result<Vec<Initiative>, Self::Error>> + Send + '_;

  /// Case-insensitive substring search over titles and author usernames.
  fn search<'a>(
    &'a self,
    query: &'a InitiativeQuery,
  ) -> impl Future<Output = Result<Vec<InitiativeListing>, Self::Error>> + Send + 'a;

  /// Delete an initiative and its votes. `actor` must own it or be an admin.
  fn delete_initiative(
    &self,
    actor: UserId,
    id: InitiativeId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Votes ─────────────────────────────────────────────────────────────

  /// Cast, flip, or retract `user`'s vote on `initiative`, update the
  /// running count, and retire the initiative if the count fell below the
  /// threshold. Voting on a retired initiative is a conflict.
  fn cast_vote(
    &self,
    user: UserId,
    initiative: InitiativeId,
    direction: Direction,
  ) -> impl Future<Output = Result<VoteReceipt, Self::Error>> + Send + '_;

  fn get_vote(
    &self,
    user: UserId,
    initiative: InitiativeId,
  ) -> impl Future<Output = Result<Option<Vote>, Self::Error>> + Send + '_;

  fn votes_for(
    &self,
    initiative: InitiativeId,
  ) -> impl Future<Output = Result<Vec<Vote>, Self::Error>> + Send + '_;

  // ── Statistics ────────────────────────────────────────────────────────

  fn user_stats(
    &self,
    user: UserId,
  ) -> impl Future<Output = Result<UserStats, Self::Error>> + Send + '_;

  fn platform_stats(&self) -> impl Future<Output = Result<PlatformStats, Self::Error>> + Send + '_;
}
