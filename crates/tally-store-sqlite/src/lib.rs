//! SQLite backend for the Tally initiatives store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every mutation runs in an `IMMEDIATE`
//! transaction that is retried a bounded number of times when the database
//! file is busy.

mod encode;
mod engine;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
