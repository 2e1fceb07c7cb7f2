//! Handlers for `/candidates` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/candidates` | Caller's candidates, newest first |
//! | `POST` | `/candidates` | Body: `{"name","photo_url"}`; 201 |
//! | `GET`  | `/candidates/:id` | 404 if absent or not owned |
//! | `PUT`  | `/candidates/:id` | Partial update |
//! | `DELETE` | `/candidates/:id` | Member lists referencing the candidate are NOT pruned |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use drawlot_core::{
  candidate::{Candidate, NewCandidate},
  store::RecordStore,
};

use crate::{AppState, auth::CurrentUser, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /candidates`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<Candidate>>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let candidates = state
    .store
    .list_candidates(user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(candidates))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:      String,
  pub photo_url: Option<String>,
}

/// `POST /candidates`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("name is required".into()));
  }

  let candidate = state
    .store
    .create_candidate(NewCandidate {
      name:      body.name,
      photo_url: body.photo_url,
      user_id,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  tracing::info!(candidate_id = %candidate.id, name = %candidate.name, "candidate created");
  Ok((StatusCode::CREATED, Json(candidate)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /candidates/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Candidate>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let candidate = state
    .store
    .get_candidate(id, user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound("candidate not found".into()))?;
  Ok(Json(candidate))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub name:      Option<String>,
  pub photo_url: Option<String>,
}

/// `PUT /candidates/:id` — partial update; omitted fields are unchanged.
pub async fn update<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Candidate>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let mut candidate = state
    .store
    .get_candidate(id, user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound("candidate not found".into()))?;

  if let Some(name) = body.name
    && !name.trim().is_empty()
  {
    candidate.name = name;
  }
  if let Some(url) = body.photo_url {
    candidate.photo_url = Some(url);
  }

  let updated = state
    .store
    .update_candidate(candidate)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(updated))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /candidates/:id` — projects keep any stale reference to the
/// deleted candidate; draws resolve those defensively.
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  state
    .store
    .get_candidate(id, user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound("candidate not found".into()))?;

  state
    .store
    .delete_candidate(id, user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  tracing::info!(candidate_id = %id, "candidate deleted");
  Ok(StatusCode::NO_CONTENT)
}
