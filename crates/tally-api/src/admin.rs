//! Administrator endpoints. Every handler rejects non-admin callers with 403.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/admin/users` | Newest first |
//! | `GET`    | `/admin/stats` | Platform totals |
//! | `GET`    | `/admin/search` | `?q=<text>` over titles and authors |
//! | `POST`   | `/admin/users/{id}/toggle-admin` | |
//! | `DELETE` | `/admin/users/{id}` | Cannot target the caller |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use serde::Deserialize;
use tally_core::{
  authz,
  initiative::InitiativeListing,
  stats::PlatformStats,
  store::{InitiativeQuery, InitiativeStore},
  user::{User, UserId},
};

use crate::{ApiState, auth::CurrentUser, error::ApiError};

/// `GET /admin/users`
pub async fn list_users<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(caller): CurrentUser,
) -> Result<Json<Vec<User>>, ApiError>
where
  S: InitiativeStore + 'static,
{
  authz::ensure_admin(&caller)?;
  let users = state.store.list_users().await.map_err(ApiError::from_store)?;
  Ok(Json(users))
}

/// `GET /admin/stats`
pub async fn stats<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(caller): CurrentUser,
) -> Result<Json<PlatformStats>, ApiError>
where
  S: InitiativeStore + 'static,
{
  authz::ensure_admin(&caller)?;
  let stats = state
    .store
    .platform_stats()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(stats))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  #[serde(default)]
  pub q:     String,
  pub limit: Option<u32>,
}

/// `GET /admin/search?q=<text>[&limit=N]`
pub async fn search<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(caller): CurrentUser,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<InitiativeListing>>, ApiError>
where
  S: InitiativeStore + 'static,
{
  authz::ensure_admin(&caller)?;
  let query = InitiativeQuery { text: params.q, limit: params.limit };
  let hits = state.store.search(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(hits))
}

/// `POST /admin/users/{id}/toggle-admin`
pub async fn toggle_admin<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(caller): CurrentUser,
  Path(target): Path<UserId>,
) -> Result<Json<User>, ApiError>
where
  S: InitiativeStore + 'static,
{
  let user = state
    .store
    .toggle_admin(caller.user_id, target)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(user))
}

/// `DELETE /admin/users/{id}`
pub async fn delete_user<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(caller): CurrentUser,
  Path(target): Path<UserId>,
) -> Result<StatusCode, ApiError>
where
  S: InitiativeStore + 'static,
{
  state
    .store
    .delete_user(caller.user_id, target)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
