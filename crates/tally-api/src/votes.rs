//! `POST /vote`: cast, flip, or retract a vote.
//!
//! Body: `{"initiative_id":"<uuid>","vote":1}`. The direction may be given as
//! a number or a string (`1`, `"+1"`, `-1`, `"-1"`). Any other value is a 400;
//! voting on a retired initiative is a 409.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use tally_core::{
  initiative::InitiativeId,
  store::InitiativeStore,
  vote::{DirectionInput, VoteReceipt},
};

use crate::{ApiState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct VoteBody {
  pub initiative_id: InitiativeId,
  pub vote:          DirectionInput,
}

/// `POST /vote`
pub async fn cast<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(user): CurrentUser,
  body: Result<Json<VoteBody>, JsonRejection>,
) -> Result<Json<VoteReceipt>, ApiError>
where
  S: InitiativeStore + 'static,
{
  let Json(body) = body?;
  let direction = body.vote.parse()?;
  let receipt = state
    .store
    .cast_vote(user.user_id, body.initiative_id, direction)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(receipt))
}
