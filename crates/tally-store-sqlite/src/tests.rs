//! Integration tests for `SqliteStore` against an in-memory database.

use tally_core::{
  Classify, ErrorKind,
  initiative::{Initiative, InitiativeId, NewInitiative},
  retirement::{RetirementDecision, RetirementPolicy},
  store::{InitiativeQuery, InitiativeStore, Page},
  user::{NewUser, User, UserId},
  vote::{Direction, VoteChange},
};

use crate::{Error, SqliteStore};

use Direction::{Down, Up};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, name: &str) -> User {
  s.register_user(NewUser::new(name, "$argon2id$test"))
    .await
    .unwrap()
}

async fn admin(s: &SqliteStore, name: &str) -> User {
  let mut input = NewUser::new(name, "$argon2id$test");
  input.is_admin = true;
  s.register_user(input).await.unwrap()
}

async fn initiative(s: &SqliteStore, author: &User, title: &str) -> Initiative {
  s.create_initiative(author.user_id, NewInitiative::new(title, "details"))
    .await
    .unwrap()
}

async fn voters(s: &SqliteStore, n: usize) -> Vec<User> {
  let mut out = Vec::with_capacity(n);
  for i in 0..n {
    out.push(user(s, &format!("voter{i}")).await);
  }
  out
}

/// Stored count must equal the sum of surviving vote directions.
async fn assert_sum_invariant(s: &SqliteStore, id: InitiativeId) {
  let stored = s.get_initiative(id).await.unwrap().expect("live initiative").votes;
  let summed: i64 = s
    .votes_for(id)
    .await
    .unwrap()
    .iter()
    .map(|v| v.direction.value())
    .sum();
  assert_eq!(stored, summed, "count drifted from ledger");
}

fn kind(e: &Error) -> ErrorKind { e.kind() }

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_and_lookup_user() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  assert!(!alice.is_admin);

  let by_id = s.get_user(alice.user_id).await.unwrap().unwrap();
  assert_eq!(by_id.username, "alice");
  assert_eq!(by_id.password_hash, "$argon2id$test");

  let by_name = s.find_user_by_username("alice").await.unwrap().unwrap();
  assert_eq!(by_name.user_id, alice.user_id);

  assert!(s.find_user_by_username("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_conflicts() {
  let s = store().await;
  user(&s, "alice").await;
  let err = s
    .register_user(NewUser::new("alice", "other"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(tally_core::Error::UsernameTaken(_))));
  assert_eq!(kind(&err), ErrorKind::Conflict);
}

#[tokio::test]
async fn blank_registration_is_invalid() {
  let s = store().await;
  let err = s.register_user(NewUser::new("", "hash")).await.unwrap_err();
  assert_eq!(kind(&err), ErrorKind::InvalidInput);
  assert!(s.list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_users_newest_first() {
  let s = store().await;
  user(&s, "first").await;
  user(&s, "second").await;
  let names: Vec<_> = s
    .list_users()
    .await
    .unwrap()
    .into_iter()
    .map(|u| u.username)
    .collect();
  assert_eq!(names, ["second", "first"]);
}

#[tokio::test]
async fn toggle_admin_requires_admin() {
  let s = store().await;
  let root  = admin(&s, "root").await;
  let alice = user(&s, "alice").await;
  let bob   = user(&s, "bob").await;

  let err = s.toggle_admin(alice.user_id, bob.user_id).await.unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Forbidden);

  let promoted = s.toggle_admin(root.user_id, alice.user_id).await.unwrap();
  assert!(promoted.is_admin);
  let demoted = s.toggle_admin(root.user_id, alice.user_id).await.unwrap();
  assert!(!demoted.is_admin);

  let err = s.toggle_admin(root.user_id, UserId::new()).await.unwrap_err();
  assert_eq!(kind(&err), ErrorKind::NotFound);
}

// ─── Initiatives ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_initiative_starts_at_zero() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let item  = initiative(&s, &alice, "Water coolers").await;

  assert_eq!(item.votes, 0);
  assert_eq!(item.author_id, alice.user_id);

  let fetched = s.get_initiative(item.initiative_id).await.unwrap().unwrap();
  assert_eq!(fetched, item);
}

#[tokio::test]
async fn create_initiative_validates_input_and_author() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let err = s
    .create_initiative(alice.user_id, NewInitiative::new("  ", "body"))
    .await
    .unwrap_err();
  assert_eq!(kind(&err), ErrorKind::InvalidInput);

  let err = s
    .create_initiative(UserId::new(), NewInitiative::new("title", "body"))
    .await
    .unwrap_err();
  assert_eq!(kind(&err), ErrorKind::NotFound);
}

#[tokio::test]
async fn list_initiatives_pages_newest_first() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  for i in 0..5 {
    initiative(&s, &alice, &format!("idea {i}")).await;
  }

  let first = s.list_initiatives(Page::new(1, 2)).await.unwrap();
  assert_eq!(first.total, 5);
  let titles: Vec<_> = first.initiatives.iter().map(|l| l.initiative.title.as_str()).collect();
  assert_eq!(titles, ["idea 4", "idea 3"]);
  assert!(first.initiatives.iter().all(|l| l.author == "alice"));

  let last = s.list_initiatives(Page::new(3, 2)).await.unwrap();
  assert_eq!(last.initiatives.len(), 1);
  assert_eq!(last.initiatives[0].initiative.title, "idea 0");
}

#[tokio::test]
async fn list_by_author_only_returns_own() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob   = user(&s, "bob").await;
  initiative(&s, &alice, "a1").await;
  initiative(&s, &bob, "b1").await;
  initiative(&s, &alice, "a2").await;

  let mine = s.list_by_author(alice.user_id).await.unwrap();
  assert_eq!(mine.len(), 2);
  assert!(mine.iter().all(|i| i.author_id == alice.user_id));
  assert_eq!(mine[0].title, "a2");
}

#[tokio::test]
async fn search_matches_title_or_author() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob   = user(&s, "bob").await;
  initiative(&s, &alice, "Bicycle parking").await;
  initiative(&s, &bob, "English courses").await;

  let q = |text: &str| InitiativeQuery { text: text.into(), limit: None };

  let by_title = s.search(&q("bicycle")).await.unwrap();
  assert_eq!(by_title.len(), 1);
  assert_eq!(by_title[0].author, "alice");

  let by_author = s.search(&q("BOB")).await.unwrap();
  assert_eq!(by_author.len(), 1);
  assert_eq!(by_author[0].initiative.title, "English courses");

  assert!(s.search(&q("   ")).await.unwrap().is_empty());
  assert!(s.search(&q("%")).await.unwrap().is_empty());
}

#[tokio::test]
async fn search_folds_non_ascii_case() {
  let s = store().await;
  let maria = user(&s, "Мария").await;
  let alice = user(&s, "alice").await;
  initiative(&s, &maria, "Идея парка").await;
  initiative(&s, &alice, "Straße sanieren").await;

  let q = |text: &str| InitiativeQuery { text: text.into(), limit: None };

  for text in ["идея", "ИДЕЯ", "ПаРкА"] {
    let hits = s.search(&q(text)).await.unwrap();
    assert_eq!(hits.len(), 1, "{text}");
    assert_eq!(hits[0].initiative.title, "Идея парка");
  }

  let by_author = s.search(&q("мария")).await.unwrap();
  assert_eq!(by_author.len(), 1);
  assert_eq!(by_author[0].author, "Мария");

  assert_eq!(s.search(&q("STRASSE")).await.unwrap().len(), 0);
  assert_eq!(s.search(&q("STRAßE")).await.unwrap().len(), 1);
}

#[tokio::test]
async fn owner_or_admin_may_delete_initiative() {
  let s = store().await;
  let root  = admin(&s, "root").await;
  let alice = user(&s, "alice").await;
  let bob   = user(&s, "bob").await;

  let a = initiative(&s, &alice, "a").await;
  let b = initiative(&s, &alice, "b").await;
  s.cast_vote(bob.user_id, a.initiative_id, Up).await.unwrap();

  let err = s.delete_initiative(bob.user_id, a.initiative_id).await.unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Forbidden);
  assert!(s.get_initiative(a.initiative_id).await.unwrap().is_some());

  s.delete_initiative(alice.user_id, a.initiative_id).await.unwrap();
  assert!(s.get_initiative(a.initiative_id).await.unwrap().is_none());
  assert!(s.votes_for(a.initiative_id).await.unwrap().is_empty());

  s.delete_initiative(root.user_id, b.initiative_id).await.unwrap();
  let err = s.delete_initiative(root.user_id, b.initiative_id).await.unwrap_err();
  assert_eq!(kind(&err), ErrorKind::NotFound);
}

// ─── Vote ledger ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_cast_records_vote() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob   = user(&s, "bob").await;
  let item  = initiative(&s, &alice, "idea").await;

  let receipt = s.cast_vote(bob.user_id, item.initiative_id, Down).await.unwrap();
  assert_eq!(receipt.change, VoteChange::Cast);
  assert_eq!(receipt.delta, -1);
  assert_eq!(receipt.outcome, RetirementDecision::Active { count: -1 });

  let vote = s.get_vote(bob.user_id, item.initiative_id).await.unwrap().unwrap();
  assert_eq!(vote.direction, Down);
  assert_sum_invariant(&s, item.initiative_id).await;
}

#[tokio::test]
async fn repeat_cast_retracts() {
  // Scenario C / P3.
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob   = user(&s, "bob").await;
  let item  = initiative(&s, &alice, "idea").await;

  let first = s.cast_vote(bob.user_id, item.initiative_id, Up).await.unwrap();
  assert_eq!(first.outcome.count(), 1);

  let second = s.cast_vote(bob.user_id, item.initiative_id, Up).await.unwrap();
  assert_eq!(second.change, VoteChange::Retracted);
  assert_eq!(second.delta, -1);
  assert_eq!(second.outcome, RetirementDecision::Active { count: 0 });

  assert!(s.get_vote(bob.user_id, item.initiative_id).await.unwrap().is_none());
  assert_sum_invariant(&s, item.initiative_id).await;
}

#[tokio::test]
async fn opposite_cast_flips() {
  // Scenario D / P4.
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob   = user(&s, "bob").await;
  let item  = initiative(&s, &alice, "idea").await;

  s.cast_vote(bob.user_id, item.initiative_id, Up).await.unwrap();
  let flip = s.cast_vote(bob.user_id, item.initiative_id, Down).await.unwrap();

  assert_eq!(flip.change, VoteChange::Flipped);
  assert_eq!(flip.delta, -2);
  assert_eq!(flip.outcome, RetirementDecision::Active { count: -1 });

  let votes = s.votes_for(item.initiative_id).await.unwrap();
  assert_eq!(votes.len(), 1);
  assert_eq!(votes[0].direction, Down);
  assert_eq!(votes[0].user_id, bob.user_id);
}

#[tokio::test]
async fn at_most_one_vote_per_pair() {
  // P1 + P2 over an arbitrary sequence.
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob   = user(&s, "bob").await;
  let carol = user(&s, "carol").await;
  let item  = initiative(&s, &alice, "idea").await;

  let sequence = [
    (&bob, Up),
    (&carol, Down),
    (&bob, Down),
    (&bob, Down),
    (&carol, Down),
    (&bob, Up),
    (&carol, Up),
    (&carol, Down),
  ];
  for (who, dir) in sequence {
    s.cast_vote(who.user_id, item.initiative_id, dir).await.unwrap();
    let votes = s.votes_for(item.initiative_id).await.unwrap();
    for voter in [&bob, &carol] {
      assert!(votes.iter().filter(|v| v.user_id == voter.user_id).count() <= 1);
    }
    assert_sum_invariant(&s, item.initiative_id).await;
  }

  let final_votes = s.votes_for(item.initiative_id).await.unwrap();
  assert_eq!(final_votes.len(), 2);
  assert_eq!(s.get_initiative(item.initiative_id).await.unwrap().unwrap().votes, 0);
}

#[tokio::test]
async fn unknown_user_or_initiative_is_not_found() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let item  = initiative(&s, &alice, "idea").await;

  let err = s.cast_vote(UserId::new(), item.initiative_id, Up).await.unwrap_err();
  assert!(matches!(err, Error::Core(tally_core::Error::UserNotFound(_))));
  assert_eq!(kind(&err), ErrorKind::NotFound);

  let err = s.cast_vote(alice.user_id, InitiativeId::new(), Up).await.unwrap_err();
  assert!(matches!(err, Error::Core(tally_core::Error::InitiativeNotFound(_))));

  assert_eq!(s.get_initiative(item.initiative_id).await.unwrap().unwrap().votes, 0);
}

// ─── Retirement ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn eleven_downvotes_retire() {
  // Scenario A.
  let s = store().await;
  let alice = user(&s, "alice").await;
  let item  = initiative(&s, &alice, "doomed").await;
  let crowd = voters(&s, 11).await;

  for (i, voter) in crowd.iter().enumerate() {
    let receipt = s.cast_vote(voter.user_id, item.initiative_id, Down).await.unwrap();
    if i < 10 {
      assert_eq!(receipt.outcome, RetirementDecision::Active { count: -(i as i64 + 1) });
    } else {
      assert_eq!(receipt.outcome, RetirementDecision::Retired { final_count: -11 });
    }
  }

  assert!(s.get_initiative(item.initiative_id).await.unwrap().is_none());
  assert!(s.votes_for(item.initiative_id).await.unwrap().is_empty());

  let record = s.get_retirement(item.initiative_id).await.unwrap().unwrap();
  assert_eq!(record.final_count, -11);
}

#[tokio::test]
async fn minus_ten_is_not_retired() {
  // Scenario B: the threshold is exclusive.
  let s = store().await;
  let alice = user(&s, "alice").await;
  let item  = initiative(&s, &alice, "borderline").await;
  let crowd = voters(&s, 10).await;

  for voter in &crowd[..9] {
    s.cast_vote(voter.user_id, item.initiative_id, Down).await.unwrap();
  }
  assert_eq!(s.get_initiative(item.initiative_id).await.unwrap().unwrap().votes, -9);

  let receipt = s.cast_vote(crowd[9].user_id, item.initiative_id, Down).await.unwrap();
  assert_eq!(receipt.outcome, RetirementDecision::Active { count: -10 });
  assert!(s.get_retirement(item.initiative_id).await.unwrap().is_none());
  assert_sum_invariant(&s, item.initiative_id).await;
}

#[tokio::test]
async fn flip_can_trigger_retirement() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let item  = initiative(&s, &alice, "idea").await;
  let crowd = voters(&s, 11).await;

  s.cast_vote(crowd[0].user_id, item.initiative_id, Up).await.unwrap();
  for voter in &crowd[1..] {
    s.cast_vote(voter.user_id, item.initiative_id, Down).await.unwrap();
  }
  assert_eq!(s.get_initiative(item.initiative_id).await.unwrap().unwrap().votes, -9);

  let receipt = s.cast_vote(crowd[0].user_id, item.initiative_id, Down).await.unwrap();
  assert_eq!(receipt.change, VoteChange::Flipped);
  assert_eq!(receipt.outcome, RetirementDecision::Retired { final_count: -11 });
}

#[tokio::test]
async fn retired_initiative_rejects_votes() {
  // P5.
  let s = SqliteStore::open_in_memory_with_policy(RetirementPolicy::new(0))
    .await
    .unwrap();
  let alice = user(&s, "alice").await;
  let bob   = user(&s, "bob").await;
  let item  = initiative(&s, &alice, "idea").await;

  let receipt = s.cast_vote(bob.user_id, item.initiative_id, Down).await.unwrap();
  assert!(receipt.outcome.is_retired());

  for dir in [Up, Down] {
    let err = s.cast_vote(alice.user_id, item.initiative_id, dir).await.unwrap_err();
    assert!(matches!(err, Error::Core(tally_core::Error::InitiativeRetired(_))));
    assert_eq!(kind(&err), ErrorKind::Conflict);
  }
  assert!(s.votes_for(item.initiative_id).await.unwrap().is_empty());
  assert!(s.get_initiative(item.initiative_id).await.unwrap().is_none());

  let err = s.delete_initiative(alice.user_id, item.initiative_id).await.unwrap_err();
  assert_eq!(kind(&err), ErrorKind::NotFound);
}

// ─── Concurrency ─────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_votes_keep_sum_invariant() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let item  = initiative(&s, &alice, "popular").await;
  let crowd = voters(&s, 8).await;

  let mut tasks = Vec::new();
  for (i, voter) in crowd.iter().enumerate() {
    let s  = s.clone();
    let id = voter.user_id;
    let item_id = item.initiative_id;
    tasks.push(tokio::spawn(async move {
      let dirs = if i % 2 == 0 { [Up, Down, Down, Up] } else { [Down, Up, Up, Down] };
      for dir in dirs {
        s.cast_vote(id, item_id, dir).await.unwrap();
      }
    }));
  }
  for task in tasks {
    task.await.unwrap();
  }

  // Even voters end on Up, odd voters on Down.
  let votes = s.votes_for(item.initiative_id).await.unwrap();
  assert_eq!(votes.len(), 8);
  assert_sum_invariant(&s, item.initiative_id).await;
  assert_eq!(s.get_initiative(item.initiative_id).await.unwrap().unwrap().votes, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_connections_share_one_file() {
  let path = std::env::temp_dir().join(format!("tally-{}.db", uuid::Uuid::new_v4()));
  let a = SqliteStore::open(&path).await.unwrap();
  let b = SqliteStore::open(&path).await.unwrap();

  let alice = user(&a, "alice").await;
  let item  = initiative(&a, &alice, "shared").await;
  let crowd = voters(&a, 6).await;

  let mut tasks = Vec::new();
  for (i, voter) in crowd.iter().enumerate() {
    let s = if i % 2 == 0 { a.clone() } else { b.clone() };
    let (uid, iid) = (voter.user_id, item.initiative_id);
    tasks.push(tokio::spawn(async move {
      s.cast_vote(uid, iid, Up).await.unwrap();
      s.cast_vote(uid, iid, Down).await.unwrap();
    }));
  }
  for task in tasks {
    task.await.unwrap();
  }

  assert_eq!(b.get_initiative(item.initiative_id).await.unwrap().unwrap().votes, -6);
  assert_sum_invariant(&a, item.initiative_id).await;

  drop((a, b));
  let _ = std::fs::remove_file(&path);
}

// ─── User deletion ───────────────────────────────────────────────────────────

#[tokio::test]
async fn deleting_user_withdraws_their_votes() {
  let s = store().await;
  let root  = admin(&s, "root").await;
  let alice = user(&s, "alice").await;
  let bob   = user(&s, "bob").await;

  let others = initiative(&s, &alice, "alice's").await;
  let own    = initiative(&s, &bob, "bob's").await;
  s.cast_vote(bob.user_id, others.initiative_id, Up).await.unwrap();
  s.cast_vote(alice.user_id, others.initiative_id, Up).await.unwrap();
  s.cast_vote(alice.user_id, own.initiative_id, Down).await.unwrap();

  s.delete_user(root.user_id, bob.user_id).await.unwrap();

  assert!(s.get_user(bob.user_id).await.unwrap().is_none());
  assert!(s.get_initiative(own.initiative_id).await.unwrap().is_none());
  assert!(s.get_vote(alice.user_id, own.initiative_id).await.unwrap().is_none());

  let remaining = s.get_initiative(others.initiative_id).await.unwrap().unwrap();
  assert_eq!(remaining.votes, 1);
  assert_sum_invariant(&s, others.initiative_id).await;
}

#[tokio::test]
async fn withdrawing_an_upvote_can_retire() {
  let s = store().await;
  let root  = admin(&s, "root").await;
  let alice = user(&s, "alice").await;
  let item  = initiative(&s, &alice, "fragile").await;
  let crowd = voters(&s, 12).await;

  s.cast_vote(crowd[0].user_id, item.initiative_id, Up).await.unwrap();
  for voter in &crowd[1..] {
    s.cast_vote(voter.user_id, item.initiative_id, Down).await.unwrap();
  }
  assert_eq!(s.get_initiative(item.initiative_id).await.unwrap().unwrap().votes, -10);

  s.delete_user(root.user_id, crowd[0].user_id).await.unwrap();

  assert!(s.get_initiative(item.initiative_id).await.unwrap().is_none());
  assert!(s.votes_for(item.initiative_id).await.unwrap().is_empty());
  assert_eq!(
    s.get_retirement(item.initiative_id).await.unwrap().unwrap().final_count,
    -11
  );
}

#[tokio::test]
async fn delete_user_guards() {
  let s = store().await;
  let root  = admin(&s, "root").await;
  let alice = user(&s, "alice").await;

  let err = s.delete_user(alice.user_id, root.user_id).await.unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Forbidden);

  let err = s.delete_user(root.user_id, root.user_id).await.unwrap_err();
  assert!(matches!(err, Error::Core(tally_core::Error::SelfDeletion)));

  let err = s.delete_user(root.user_id, UserId::new()).await.unwrap_err();
  assert_eq!(kind(&err), ErrorKind::NotFound);

  assert_eq!(s.list_users().await.unwrap().len(), 2);
}

// ─── Statistics ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn user_and_platform_stats() {
  let s = SqliteStore::open_in_memory_with_policy(RetirementPolicy::new(-1))
    .await
    .unwrap();
  let alice = user(&s, "alice").await;
  let bob   = user(&s, "bob").await;
  let carol = user(&s, "carol").await;

  let a1 = initiative(&s, &alice, "a1").await;
  let a2 = initiative(&s, &alice, "a2").await;
  let doomed = initiative(&s, &carol, "c1").await;

  s.cast_vote(bob.user_id, a1.initiative_id, Up).await.unwrap();
  s.cast_vote(carol.user_id, a1.initiative_id, Up).await.unwrap();
  s.cast_vote(bob.user_id, a2.initiative_id, Down).await.unwrap();
  s.cast_vote(bob.user_id, doomed.initiative_id, Down).await.unwrap();
  s.cast_vote(alice.user_id, doomed.initiative_id, Down).await.unwrap();

  let alice_stats = s.user_stats(alice.user_id).await.unwrap();
  assert_eq!(alice_stats.initiatives_count, 2);
  assert_eq!(alice_stats.initiatives_votes, 1);
  // alice's vote vanished with the retired initiative.
  assert_eq!(alice_stats.negative_votes, 0);

  let bob_stats = s.user_stats(bob.user_id).await.unwrap();
  assert_eq!(bob_stats.positive_votes, 1);
  assert_eq!(bob_stats.negative_votes, 1);
  assert_eq!(bob_stats.total_votes, 0);

  let platform = s.platform_stats().await.unwrap();
  assert_eq!(platform.total_users, 3);
  assert_eq!(platform.total_initiatives, 2);
  assert_eq!(platform.total_votes, 3);
  assert_eq!(platform.retired_initiatives, 1);
}

#[tokio::test]
async fn reopening_file_preserves_state() {
  let path = std::env::temp_dir().join(format!("tally-{}.db", uuid::Uuid::new_v4()));
  let item_id = {
    let s = SqliteStore::open(&path).await.unwrap();
    let alice = user(&s, "alice").await;
    let bob   = user(&s, "bob").await;
    let item  = initiative(&s, &alice, "persistent").await;
    s.cast_vote(bob.user_id, item.initiative_id, Up).await.unwrap();
    item.initiative_id
  };

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.get_initiative(item_id).await.unwrap().unwrap().votes, 1);
  assert_eq!(s.votes_for(item_id).await.unwrap().len(), 1);

  drop(s);
  let _ = std::fs::remove_file(&path);
}
