//! Handlers for `/initiatives` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/initiatives` | Optional `?page=N` (1-based); no auth |
//! | `POST`   | `/initiatives` | Body: `{"title":"…","description":"…"}` |
//! | `GET`    | `/initiatives/{id}` | No auth; 404 once deleted or retired |
//! | `DELETE` | `/initiatives/{id}` | Author or administrator only |

use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tally_core::{
  initiative::{Initiative, InitiativeId, InitiativePage, NewInitiative},
  store::{InitiativeStore, Page},
};

use crate::{ApiState, auth::CurrentUser, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub page: Option<u32>,
}

/// `GET /initiatives[?page=N]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<InitiativePage>, ApiError>
where
  S: InitiativeStore + 'static,
{
  let page = Page::new(params.page.unwrap_or(1), state.page_size);
  let listing = state
    .store
    .list_initiatives(page)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(listing))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /initiatives`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(user): CurrentUser,
  body: Result<Json<NewInitiative>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: InitiativeStore + 'static,
{
  let Json(body) = body?;
  let initiative = state
    .store
    .create_initiative(user.user_id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(initiative)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /initiatives/{id}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<InitiativeId>,
) -> Result<Json<Initiative>, ApiError>
where
  S: InitiativeStore + 'static,
{
  state
    .store
    .get_initiative(id)
    .await
    .map_err(ApiError::from_store)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("initiative {id} not found")))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /initiatives/{id}`
pub async fn delete_one<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<InitiativeId>,
) -> Result<StatusCode, ApiError>
where
  S: InitiativeStore + 'static,
{
  state
    .store
    .delete_initiative(user.user_id, id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
