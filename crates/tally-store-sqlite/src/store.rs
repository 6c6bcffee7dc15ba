//! [`SqliteStore`], the SQLite implementation of [`InitiativeStore`].

use std::{path::Path, time::Duration};

use rusqlite::{Connection, ErrorCode, OptionalExtension as _, functions::FunctionFlags};
use tracing::{debug, info, warn};

use tally_core::{
  initiative::{
    Initiative, InitiativeId, InitiativeListing, InitiativePage, NewInitiative, Retirement,
  },
  retirement::RetirementPolicy,
  stats::{PlatformStats, UserStats},
  store::{DEFAULT_PAGE_SIZE, InitiativeQuery, InitiativeStore, Page},
  user::{NewUser, User, UserId},
  vote::{Direction, Vote, VoteReceipt},
};

use crate::{
  Result,
  encode::{
    INITIATIVE_COLUMNS, RawInitiative, RawListing, RawRetirement, RawUser, RawVote, USER_COLUMNS,
    encode_initiative_id, encode_user_id,
  },
  engine::{self, TxOutcome, in_immediate_tx},
  schema::SCHEMA,
};

/// Attempts made for one write transaction before a busy error is surfaced.
pub const MAX_TX_ATTEMPTS: u32 = 5;

/// Back-off before retry `n` is `n * RETRY_BACKOFF`.
const RETRY_BACKOFF: Duration = Duration::from_millis(20);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tally store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:   tokio_rusqlite::Connection,
  policy: RetirementPolicy,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with_policy(path, RetirementPolicy::default()).await
  }

  /// Like [`open`](Self::open) with a non-default retirement threshold.
  pub async fn open_with_policy(path: impl AsRef<Path>, policy: RetirementPolicy) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, policy };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    Self::open_in_memory_with_policy(RetirementPolicy::default()).await
  }

  pub async fn open_in_memory_with_policy(policy: RetirementPolicy) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, policy };
    store.init_schema().await?;
    Ok(store)
  }

  pub fn policy(&self) -> RetirementPolicy { self.policy }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        register_functions(conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `op` as one write transaction, retrying while SQLite reports the
  /// database as busy or locked.
  async fn write<T, F>(&self, op: F) -> Result<T>
  where
    T: Send + 'static,
    F: Fn(&mut Connection) -> TxOutcome<T> + Clone + Send + 'static,
  {
    let mut attempt = 1;
    loop {
      let op = op.clone();
      match self.conn.call(move |conn| Ok(op(conn)?)).await {
        Ok(outcome) => return Ok(outcome?),
        Err(e) if is_busy(&e) && attempt < MAX_TX_ATTEMPTS => {
          warn!(attempt, error = %e, "database busy; retrying transaction");
          tokio::time::sleep(RETRY_BACKOFF * attempt).await;
          attempt += 1;
        }
        Err(e) => return Err(e.into()),
      }
    }
  }
}

/// `lower_unicode(text)`: full Unicode lowercasing. SQLite's own `lower()`
/// and `LIKE` only fold ASCII.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
  conn.create_scalar_function(
    "lower_unicode",
    1,
    FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
    |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
  )
}

fn is_busy(e: &tokio_rusqlite::Error) -> bool {
  matches!(
    e,
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(f, _))
      if matches!(f.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
  )
}

/// Escape `%`, `_` and `\` for a `LIKE … ESCAPE '\'` pattern.
fn like_pattern(text: &str) -> String {
  let mut out = String::with_capacity(text.len() + 2);
  out.push('%');
  for c in text.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  out
}

// ─── InitiativeStore impl ────────────────────────────────────────────────────

impl InitiativeStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn register_user(&self, input: NewUser) -> Result<User> {
    input.validate()?;
    let user = self
      .write(move |conn| in_immediate_tx(conn, |tx| engine::register_user(tx, input.clone())))
      .await?;
    info!(user = %user.user_id, username = %user.username, "registered user");
    Ok(user)
  }

  async fn get_user(&self, id: UserId) -> Result<Option<User>> {
    Ok(self.conn.call(move |conn| Ok(engine::load_user(conn, id)?)).await?)
  }

  async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
    let username = username.to_owned();
    Ok(
      self
        .conn
        .call(move |conn| Ok(engine::load_user_by_name(conn, &username)?))
        .await?,
    )
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn toggle_admin(&self, actor: UserId, target: UserId) -> Result<User> {
    let user = self
      .write(move |conn| in_immediate_tx(conn, |tx| engine::toggle_admin(tx, actor, target)))
      .await?;
    info!(%actor, target = %user.user_id, is_admin = user.is_admin, "toggled admin flag");
    Ok(user)
  }

  async fn delete_user(&self, actor: UserId, target: UserId) -> Result<()> {
    let policy = self.policy;
    let retired = self
      .write(move |conn| {
        in_immediate_tx(conn, |tx| engine::delete_user(tx, actor, target, policy))
      })
      .await?;
    info!(%actor, %target, "deleted user");
    for initiative in retired {
      info!(%initiative, "initiative retired after voter removal");
    }
    Ok(())
  }

  // ── Initiatives ───────────────────────────────────────────────────────────

  async fn create_initiative(&self, author: UserId, input: NewInitiative) -> Result<Initiative> {
    input.validate()?;
    let initiative = self
      .write(move |conn| {
        in_immediate_tx(conn, |tx| engine::create_initiative(tx, author, input.clone()))
      })
      .await?;
    debug!(initiative = %initiative.initiative_id, %author, "created initiative");
    Ok(initiative)
  }

  async fn get_initiative(&self, id: InitiativeId) -> Result<Option<Initiative>> {
    Ok(self.conn.call(move |conn| Ok(engine::load_initiative(conn, id)?)).await?)
  }

  async fn get_retirement(&self, id: InitiativeId) -> Result<Option<Retirement>> {
    let id_str = encode_initiative_id(id);

    let raw: Option<RawRetirement> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT initiative_id, final_count, retired_at FROM retirements
               WHERE initiative_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawRetirement {
                  initiative_id: row.get(0)?,
                  final_count:   row.get(1)?,
                  retired_at:    row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRetirement::into_retirement).transpose()
  }

  async fn list_initiatives(&self, page: Page) -> Result<InitiativePage> {
    let limit  = i64::from(page.limit);
    let offset = page.offset() as i64;

    let (raws, total): (Vec<RawListing>, i64) = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {INITIATIVE_COLUMNS}, u.username
           FROM initiatives i
           JOIN users u ON u.user_id = i.author_id
           ORDER BY i.created_at DESC, i.rowid DESC
           LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit, offset], RawListing::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM initiatives", [], |r| r.get(0))?;
        Ok((rows, total))
      })
      .await?;

    Ok(InitiativePage {
      initiatives: raws.into_iter().map(RawListing::into_listing).collect::<Result<_>>()?,
      total:       total as u64,
      page:        page.number,
      limit:       page.limit,
    })
  }

  async fn list_by_author(&self, author: UserId) -> Result<Vec<Initiative>> {
    let author_str = encode_user_id(author);

    let raws: Vec<RawInitiative> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {INITIATIVE_COLUMNS} FROM initiatives i
           WHERE i.author_id = ?1
           ORDER BY i.created_at DESC, i.rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![author_str], RawInitiative::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInitiative::into_initiative).collect()
  }

  async fn search(&self, query: &InitiativeQuery) -> Result<Vec<InitiativeListing>> {
    let text = query.text.trim();
    if text.is_empty() {
      return Ok(Vec::new());
    }
    let pattern = like_pattern(&text.to_lowercase());
    let limit   = i64::from(query.limit.unwrap_or(DEFAULT_PAGE_SIZE));

    let raws: Vec<RawListing> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {INITIATIVE_COLUMNS}, u.username
           FROM initiatives i
           JOIN users u ON u.user_id = i.author_id
           WHERE lower_unicode(i.title) LIKE ?1 ESCAPE '\\'
              OR lower_unicode(u.username) LIKE ?1 ESCAPE '\\'
           ORDER BY i.created_at DESC, i.rowid DESC
           LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![pattern, limit], RawListing::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawListing::into_listing).collect()
  }

  async fn delete_initiative(&self, actor: UserId, id: InitiativeId) -> Result<()> {
    self
      .write(move |conn| in_immediate_tx(conn, |tx| engine::delete_initiative(tx, actor, id)))
      .await?;
    info!(initiative = %id, %actor, "deleted initiative");
    Ok(())
  }

  // ── Votes ─────────────────────────────────────────────────────────────────

  async fn cast_vote(
    &self,
    user:       UserId,
    initiative: InitiativeId,
    direction:  Direction,
  ) -> Result<VoteReceipt> {
    let policy = self.policy;
    let receipt = self
      .write(move |conn| {
        in_immediate_tx(conn, |tx| engine::cast_vote(tx, user, initiative, direction, policy))
      })
      .await?;

    debug!(
      %user,
      %initiative,
      change = ?receipt.change,
      delta = receipt.delta,
      count = receipt.outcome.count(),
      "vote applied"
    );
    if receipt.outcome.is_retired() {
      info!(%initiative, final_count = receipt.outcome.count(), "initiative retired");
    }
    Ok(receipt)
  }

  async fn get_vote(&self, user: UserId, initiative: InitiativeId) -> Result<Option<Vote>> {
    let user_str       = encode_user_id(user);
    let initiative_str = encode_initiative_id(initiative);

    let raw: Option<RawVote> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, initiative_id, direction, created_at FROM votes
               WHERE user_id = ?1 AND initiative_id = ?2",
              rusqlite::params![user_str, initiative_str],
              RawVote::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVote::into_vote).transpose()
  }

  async fn votes_for(&self, initiative: InitiativeId) -> Result<Vec<Vote>> {
    let initiative_str = encode_initiative_id(initiative);

    let raws: Vec<RawVote> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, initiative_id, direction, created_at FROM votes
           WHERE initiative_id = ?1
           ORDER BY created_at",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![initiative_str], RawVote::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVote::into_vote).collect()
  }

  // ── Statistics ────────────────────────────────────────────────────────────

  async fn user_stats(&self, user: UserId) -> Result<UserStats> {
    let user_str = encode_user_id(user);

    let (initiatives, total, positive, negative, received): (i64, i64, i64, i64, i64) = self
      .conn
      .call(move |conn| {
        let initiatives: i64 = conn.query_row(
          "SELECT COUNT(*) FROM initiatives WHERE author_id = ?1",
          rusqlite::params![user_str],
          |r| r.get(0),
        )?;
        let (total, positive, negative): (i64, i64, i64) = conn.query_row(
          "SELECT COALESCE(SUM(direction), 0),
                  COUNT(*) FILTER (WHERE direction = 1),
                  COUNT(*) FILTER (WHERE direction = -1)
           FROM votes WHERE user_id = ?1",
          rusqlite::params![user_str],
          |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?;
        let received: i64 = conn.query_row(
          "SELECT COALESCE(SUM(votes), 0) FROM initiatives WHERE author_id = ?1",
          rusqlite::params![user_str],
          |r| r.get(0),
        )?;
        Ok((initiatives, total, positive, negative, received))
      })
      .await?;

    Ok(UserStats {
      initiatives_count: initiatives as u64,
      total_votes:       total,
      positive_votes:    positive as u64,
      negative_votes:    negative as u64,
      initiatives_votes: received,
    })
  }

  async fn platform_stats(&self) -> Result<PlatformStats> {
    let (users, initiatives, votes, retired): (i64, i64, i64, i64) = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT (SELECT COUNT(*) FROM users),
                  (SELECT COUNT(*) FROM initiatives),
                  (SELECT COUNT(*) FROM votes),
                  (SELECT COUNT(*) FROM retirements)",
          [],
          |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )?)
      })
      .await?;

    Ok(PlatformStats {
      total_users:         users as u64,
      total_initiatives:   initiatives as u64,
      total_votes:         votes as u64,
      retired_initiatives: retired as u64,
    })
  }
}
