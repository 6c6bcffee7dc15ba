//! Handlers for account endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/register` | Body: `{"username":"…","password":"…"}`; no auth |
//! | `GET`  | `/me` | Profile plus vote statistics |
//! | `GET`  | `/me/initiatives` | Caller's initiatives, newest first |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tally_core::{
  initiative::Initiative,
  stats::UserStats,
  store::InitiativeStore,
  user::{NewUser, User},
};

use crate::{
  ApiState,
  auth::{CurrentUser, hash_password},
  error::ApiError,
};

// ─── Register ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub username: String,
  pub password: String,
}

/// `POST /register`
pub async fn register<S>(
  State(state): State<ApiState<S>>,
  body: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: InitiativeStore + 'static,
{
  let Json(body) = body?;
  if body.password.is_empty() {
    return Err(ApiError::BadRequest("password is required".into()));
  }
  let hash = hash_password(&body.password)
    .map_err(|e| ApiError::Store(format!("argon2 error: {e}").into()))?;

  let user = state
    .store
    .register_user(NewUser::new(body.username.trim(), hash))
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(user_id = %user.user_id, username = %user.username, "registered");
  Ok((StatusCode::CREATED, Json(user)))
}

// ─── Profile ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Profile {
  pub user:  User,
  pub stats: UserStats,
}

/// `GET /me`
pub async fn me<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Profile>, ApiError>
where
  S: InitiativeStore + 'static,
{
  let stats = state
    .store
    .user_stats(user.user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(Profile { user, stats }))
}

/// `GET /me/initiatives`
pub async fn my_initiatives<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Initiative>>, ApiError>
where
  S: InitiativeStore + 'static,
{
  let items = state
    .store
    .list_by_author(user.user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(items))
}
