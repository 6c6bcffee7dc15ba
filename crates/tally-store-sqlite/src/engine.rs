//! Transactional primitives: the vote ledger, the aggregate/retirement engine,
//! and the moderation paths built on them.
//!
//! Every function here takes the open [`Transaction`] explicitly and returns
//! a nested result: the outer [`rusqlite::Result`] carries storage failures,
//! the inner one carries domain rejections. A domain rejection makes the
//! caller drop the transaction, which rolls back any partial writes.

use rusqlite::{Connection, OptionalExtension as _, Transaction, TransactionBehavior, params};
use tally_core::{
  Error as CoreError,
  authz,
  initiative::{Initiative, InitiativeId, NewInitiative},
  ledger::{self, RowWrite},
  retirement::{RetirementDecision, RetirementPolicy},
  user::{NewUser, User, UserId},
  vote::{Direction, VoteReceipt},
};

use crate::encode::{
  INITIATIVE_COLUMNS, RawInitiative, RawUser, USER_COLUMNS, conversion_error, decode_direction,
  decode_uuid, encode_dt, encode_initiative_id, encode_user_id, now,
};

/// Storage failure outside, domain rejection inside.
pub type TxOutcome<T> = rusqlite::Result<Result<T, CoreError>>;

/// Run `body` in an `IMMEDIATE` transaction; commit only if it succeeds.
pub fn in_immediate_tx<T>(
  conn: &mut Connection,
  body: impl FnOnce(&Transaction<'_>) -> TxOutcome<T>,
) -> TxOutcome<T> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  match body(&tx)? {
    Ok(value) => {
      tx.commit()?;
      Ok(Ok(value))
    }
    // Dropping `tx` rolls back.
    Err(rejection) => Ok(Err(rejection)),
  }
}

// ─── Loaders ─────────────────────────────────────────────────────────────────

pub fn load_user(conn: &Connection, id: UserId) -> rusqlite::Result<Option<User>> {
  conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
      params![encode_user_id(id)],
      RawUser::from_row,
    )
    .optional()?
    .map(|raw| raw.into_user().map_err(|e| conversion_error(0, e)))
    .transpose()
}

pub fn load_user_by_name(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
  conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
      params![username],
      RawUser::from_row,
    )
    .optional()?
    .map(|raw| raw.into_user().map_err(|e| conversion_error(0, e)))
    .transpose()
}

pub fn load_initiative(
  conn: &Connection,
  id: InitiativeId,
) -> rusqlite::Result<Option<Initiative>> {
  conn
    .query_row(
      &format!("SELECT {INITIATIVE_COLUMNS} FROM initiatives i WHERE i.initiative_id = ?1"),
      params![encode_initiative_id(id)],
      RawInitiative::from_row,
    )
    .optional()?
    .map(|raw| raw.into_initiative().map_err(|e| conversion_error(0, e)))
    .transpose()
}

fn is_retired(conn: &Connection, id: InitiativeId) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM retirements WHERE initiative_id = ?1",
        params![encode_initiative_id(id)],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

fn existing_direction(
  conn: &Connection,
  user: &str,
  initiative: &str,
) -> rusqlite::Result<Option<Direction>> {
  conn
    .query_row(
      "SELECT direction FROM votes WHERE user_id = ?1 AND initiative_id = ?2",
      params![user, initiative],
      |row| decode_direction(0, row.get(0)?),
    )
    .optional()
}

// ─── Aggregate & retirement ──────────────────────────────────────────────────

/// Add `delta` to the initiative's running count and retire it if the new
/// count falls below the policy threshold.
///
/// This is the only code path that writes `initiatives.votes`. The caller
/// must have verified that the initiative exists within `tx`.
pub fn apply_delta(
  tx: &Transaction<'_>,
  id: InitiativeId,
  delta: i64,
  policy: RetirementPolicy,
) -> rusqlite::Result<RetirementDecision> {
  let id_str = encode_initiative_id(id);

  let count: i64 = tx.query_row(
    "UPDATE initiatives SET votes = votes + ?2 WHERE initiative_id = ?1 RETURNING votes",
    params![id_str, delta],
    |row| row.get(0),
  )?;

  let decision = policy.decide(count);
  if decision.is_retired() {
    tx.execute("DELETE FROM votes WHERE initiative_id = ?1", params![id_str])?;
    tx.execute("DELETE FROM initiatives WHERE initiative_id = ?1", params![id_str])?;
    tx.execute(
      "INSERT INTO retirements (initiative_id, final_count, retired_at) VALUES (?1, ?2, ?3)",
      params![id_str, count, encode_dt(now())],
    )?;
  }
  Ok(decision)
}

// ─── Vote ledger ─────────────────────────────────────────────────────────────

/// Resolve the caller's vote against their existing one, write the vote row,
/// and push the resulting delta through [`apply_delta`].
pub fn cast_vote(
  tx: &Transaction<'_>,
  user: UserId,
  initiative: InitiativeId,
  direction: Direction,
  policy: RetirementPolicy,
) -> TxOutcome<VoteReceipt> {
  let user_str       = encode_user_id(user);
  let initiative_str = encode_initiative_id(initiative);

  if load_user(tx, user)?.is_none() {
    return Ok(Err(CoreError::UserNotFound(user)));
  }
  if load_initiative(tx, initiative)?.is_none() {
    return Ok(Err(if is_retired(tx, initiative)? {
      CoreError::InitiativeRetired(initiative)
    } else {
      CoreError::InitiativeNotFound(initiative)
    }));
  }

  let existing = existing_direction(tx, &user_str, &initiative_str)?;
  let step     = ledger::resolve(existing, direction);

  if matches!(step.write, RowWrite::Delete | RowWrite::Replace(_)) {
    tx.execute(
      "DELETE FROM votes WHERE user_id = ?1 AND initiative_id = ?2",
      params![user_str, initiative_str],
    )?;
  }
  if let RowWrite::Insert(d) | RowWrite::Replace(d) = step.write {
    tx.execute(
      "INSERT INTO votes (user_id, initiative_id, direction, created_at)
       VALUES (?1, ?2, ?3, ?4)",
      params![user_str, initiative_str, d.value(), encode_dt(now())],
    )?;
  }

  let outcome = apply_delta(tx, initiative, step.delta, policy)?;

  Ok(Ok(VoteReceipt {
    initiative_id: initiative,
    change: step.change,
    delta: step.delta,
    outcome,
  }))
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub fn register_user(tx: &Transaction<'_>, input: NewUser) -> TxOutcome<User> {
  if load_user_by_name(tx, &input.username)?.is_some() {
    return Ok(Err(CoreError::UsernameTaken(input.username)));
  }

  let user = User {
    user_id:       UserId::new(),
    username:      input.username,
    password_hash: input.password_hash,
    is_admin:      input.is_admin,
    created_at:    now(),
  };

  tx.execute(
    "INSERT INTO users (user_id, username, password_hash, is_admin, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    params![
      encode_user_id(user.user_id),
      user.username,
      user.password_hash,
      user.is_admin,
      encode_dt(user.created_at),
    ],
  )?;
  Ok(Ok(user))
}

/// Load `actor` and require the admin flag.
fn admin(tx: &Transaction<'_>, actor: UserId) -> TxOutcome<User> {
  let Some(user) = load_user(tx, actor)? else {
    return Ok(Err(CoreError::UserNotFound(actor)));
  };
  Ok(authz::ensure_admin(&user).map(|()| user))
}

pub fn toggle_admin(tx: &Transaction<'_>, actor: UserId, target: UserId) -> TxOutcome<User> {
  if let Err(e) = admin(tx, actor)? {
    return Ok(Err(e));
  }

  let changed = tx.execute(
    "UPDATE users SET is_admin = NOT is_admin WHERE user_id = ?1",
    params![encode_user_id(target)],
  )?;
  if changed == 0 {
    return Ok(Err(CoreError::UserNotFound(target)));
  }

  match load_user(tx, target)? {
    Some(user) => Ok(Ok(user)),
    None => Ok(Err(CoreError::UserNotFound(target))),
  }
}

/// Remove `target` and everything attached to them. Returns the initiatives
/// that were retired because the target's votes were withdrawn.
pub fn delete_user(
  tx: &Transaction<'_>,
  actor: UserId,
  target: UserId,
  policy: RetirementPolicy,
) -> TxOutcome<Vec<InitiativeId>> {
  if let Err(e) = admin(tx, actor)? {
    return Ok(Err(e));
  }
  if actor == target {
    return Ok(Err(CoreError::SelfDeletion));
  }
  if load_user(tx, target)?.is_none() {
    return Ok(Err(CoreError::UserNotFound(target)));
  }

  let target_str = encode_user_id(target);

  // The target's own initiatives go first, together with every vote on them.
  tx.execute(
    "DELETE FROM votes WHERE initiative_id IN
       (SELECT initiative_id FROM initiatives WHERE author_id = ?1)",
    params![target_str],
  )?;
  tx.execute("DELETE FROM initiatives WHERE author_id = ?1", params![target_str])?;

  // Votes on other people's initiatives are withdrawn one by one so each
  // count stays equal to its surviving votes.
  let held: Vec<(String, Direction)> = {
    let mut stmt = tx.prepare("SELECT initiative_id, direction FROM votes WHERE user_id = ?1")?;
    let rows = stmt
      .query_map(params![target_str], |row| {
        Ok((row.get(0)?, decode_direction(1, row.get(1)?)?))
      })?
      .collect::<rusqlite::Result<_>>()?;
    rows
  };

  let mut retired = Vec::new();
  for (initiative_str, direction) in held {
    let initiative =
      InitiativeId(decode_uuid(&initiative_str).map_err(|e| conversion_error(0, e))?);
    tx.execute(
      "DELETE FROM votes WHERE user_id = ?1 AND initiative_id = ?2",
      params![target_str, initiative_str],
    )?;
    if apply_delta(tx, initiative, -direction.value(), policy)?.is_retired() {
      retired.push(initiative);
    }
  }

  tx.execute("DELETE FROM users WHERE user_id = ?1", params![target_str])?;
  Ok(Ok(retired))
}

// ─── Initiatives ─────────────────────────────────────────────────────────────

pub fn create_initiative(
  tx: &Transaction<'_>,
  author: UserId,
  input: NewInitiative,
) -> TxOutcome<Initiative> {
  if load_user(tx, author)?.is_none() {
    return Ok(Err(CoreError::UserNotFound(author)));
  }

  let initiative = Initiative {
    initiative_id: InitiativeId::new(),
    title:         input.title,
    description:   input.description,
    author_id:     author,
    votes:         0,
    created_at:    now(),
  };

  tx.execute(
    "INSERT INTO initiatives (initiative_id, title, description, author_id, votes, created_at)
     VALUES (?1, ?2, ?3, ?4, 0, ?5)",
    params![
      encode_initiative_id(initiative.initiative_id),
      initiative.title,
      initiative.description,
      encode_user_id(author),
      encode_dt(initiative.created_at),
    ],
  )?;
  Ok(Ok(initiative))
}

pub fn delete_initiative(tx: &Transaction<'_>, actor: UserId, id: InitiativeId) -> TxOutcome<()> {
  let Some(user) = load_user(tx, actor)? else {
    return Ok(Err(CoreError::UserNotFound(actor)));
  };
  let Some(initiative) = load_initiative(tx, id)? else {
    return Ok(Err(CoreError::InitiativeNotFound(id)));
  };
  if let Err(e) = authz::ensure_owner_or_admin(&user, &initiative) {
    return Ok(Err(e));
  }

  let id_str = encode_initiative_id(id);
  tx.execute("DELETE FROM votes WHERE initiative_id = ?1", params![id_str])?;
  tx.execute("DELETE FROM initiatives WHERE initiative_id = ?1", params![id_str])?;
  Ok(Ok(()))
}
