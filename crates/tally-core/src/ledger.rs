//! Vote ledger resolution.
//!
//! Given the caller's existing vote (if any) on an initiative and the
//! direction they just submitted, decide what happens to their vote row and
//! which signed delta the aggregate must absorb. Storage backends apply the
//! resulting [`LedgerStep`] and the delta in the same transaction.

use crate::vote::{Direction, VoteChange};

/// The write a backend must perform on the (user, initiative) vote row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowWrite {
  /// Insert a fresh row with this direction.
  Insert(Direction),
  /// Delete the existing row.
  Delete,
  /// Delete the existing row and insert one with this direction.
  Replace(Direction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerStep {
  pub change: VoteChange,
  pub write:  RowWrite,
  /// Signed change to the initiative's running count.
  pub delta:  i64,
}

impl LedgerStep {
  /// The direction stored for the pair once the step is applied.
  pub fn resulting(&self) -> Option<Direction> {
    match self.write {
      RowWrite::Insert(d) | RowWrite::Replace(d) => Some(d),
      RowWrite::Delete => None,
    }
  }
}

/// Resolve a cast of `requested` against the caller's `existing` vote.
pub fn resolve(existing: Option<Direction>, requested: Direction) -> LedgerStep {
  match existing {
    None => LedgerStep {
      change: VoteChange::Cast,
      write:  RowWrite::Insert(requested),
      delta:  requested.value(),
    },
    Some(prev) if prev == requested => LedgerStep {
      change: VoteChange::Retracted,
      write:  RowWrite::Delete,
      delta:  -prev.value(),
    },
    Some(prev) => LedgerStep {
      change: VoteChange::Flipped,
      write:  RowWrite::Replace(requested),
      delta:  requested.value() - prev.value(),
    },
  }
}
