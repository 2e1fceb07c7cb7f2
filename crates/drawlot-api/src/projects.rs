//! Handlers for `/projects` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/projects` | Caller's projects, newest first |
//! | `POST` | `/projects` | Body: `{"name","candidate_ids":[…]}`; 201 |
//! | `GET`  | `/projects/:id` | 404 if absent or not owned |
//! | `PUT`  | `/projects/:id` | Partial update of name and/or member list |
//! | `DELETE` | `/projects/:id` | Cascades to the project's history rows |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use drawlot_core::{
  project::{NewProject, Project},
  store::RecordStore,
};

use crate::{AppState, auth::CurrentUser, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /projects`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<Project>>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let projects = state
    .store
    .list_projects(user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(projects))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:          String,
  #[serde(default)]
  pub candidate_ids: Vec<Uuid>,
}

/// `POST /projects`
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

  let project = state
    .store
    .create_project(NewProject {
      name:       body.name,
      user_id,
      member_ids: body.candidate_ids,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  tracing::info!(project_id = %project.id, name = %project.name, "project created");
  Ok((StatusCode::CREATED, Json(project)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /projects/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Project>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let project = state
    .store
    .get_project(id, user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound("project not found".into()))?;
  Ok(Json(project))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub name:          Option<String>,
  pub candidate_ids: Option<Vec<Uuid>>,
}

/// `PUT /projects/:id` — partial update; omitted fields are unchanged. The
/// member list is replaced wholesale when present.
pub async fn update<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Project>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let mut project = state
    .store
    .get_project(id, user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound("project not found".into()))?;

  if let Some(name) = body.name
    && !name.trim().is_empty()
  {
    project.name = name;
  }
  if let Some(ids) = body.candidate_ids {
    project.candidate_ids = serde_json::to_string(&ids)
      .map_err(|e| ApiError::Internal(e.to_string()))?;
  }

  let updated = state
    .store
    .update_project(project)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(updated))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /projects/:id` — also deletes the project's history rows.
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
    .get_project(id, user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound("project not found".into()))?;

  state
    .store
    .delete_project(id, user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  state
    .store
    .delete_history_for_project(id, user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  tracing::info!(project_id = %id, "project deleted");
  Ok(StatusCode::NO_CONTENT)
}
