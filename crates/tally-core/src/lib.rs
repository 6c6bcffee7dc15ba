//! Core types and trait definitions for the Tally initiatives platform.
//!
//! No HTTP or database dependencies.
//! The vote ledger resolution and the retirement policy live here as pure
//! functions; storage backends compose them inside their own transactions.

pub mod authz;
pub mod error;
pub mod initiative;
pub mod ledger;
pub mod retirement;
pub mod stats;
pub mod store;
pub mod user;
pub mod vote;

pub use error::{Classify, Error, ErrorKind, Result};
