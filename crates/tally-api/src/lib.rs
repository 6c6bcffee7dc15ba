//! JSON REST API for Tally.
//!
//! Exposes an axum [`Router`] backed by any [`tally_core::store::InitiativeStore`].
//! Every route except `POST /register` requires HTTP Basic credentials; TLS and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(tally_api::api_router(ApiState::new(store, page_size)))
//! ```

pub mod admin;
pub mod auth;
pub mod error;
pub mod initiatives;
pub mod users;
pub mod votes;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use tally_core::store::{DEFAULT_PAGE_SIZE, InitiativeStore};

pub use error::ApiError;

/// Shared handler state: the store plus listing settings.
pub struct ApiState<S> {
  pub store:     Arc<S>,
  pub page_size: u32,
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>, page_size: u32) -> Self { Self { store, page_size } }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone(), page_size: self.page_size } }
}

impl<S> From<Arc<S>> for ApiState<S> {
  fn from(store: Arc<S>) -> Self { Self::new(store, DEFAULT_PAGE_SIZE) }
}

/// Build a fully-materialised API router for `state`.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: InitiativeStore + 'static,
{
  Router::new()
    // Accounts
    .route("/register", post(users::register::<S>))
    .route("/me", get(users::me::<S>))
    .route("/me/initiatives", get(users::my_initiatives::<S>))
    // Initiatives
    .route(
      "/initiatives",
      get(initiatives::list::<S>).post(initiatives::create::<S>),
    )
    .route(
      "/initiatives/{id}",
      get(initiatives::get_one::<S>).delete(initiatives::delete_one::<S>),
    )
    // Votes
    .route("/vote", post(votes::cast::<S>))
    // Administration
    .route("/admin/users", get(admin::list_users::<S>))
    .route("/admin/users/{id}", axum::routing::delete(admin::delete_user::<S>))
    .route("/admin/users/{id}/toggle-admin", post(admin::toggle_admin::<S>))
    .route("/admin/stats", get(admin::stats::<S>))
    .route("/admin/search", get(admin::search::<S>))
    .with_state(state)
}
