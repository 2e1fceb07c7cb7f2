//! Handler for the `/randomize` endpoint — the HTTP face of the draw
//! service.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/randomize` | Body: `{"project_id"}`; 400 when the project has no drawable candidates |

use axum::{
  Json,
  extract::State,
};
use serde::Deserialize;
use uuid::Uuid;

use drawlot_core::{
  draw::{self, DrawError, Selection},
  store::RecordStore,
};

use crate::{AppState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct RandomizeBody {
  pub project_id: Uuid,
}

/// `POST /randomize`
pub async fn randomize<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
  Json(body): Json<RandomizeBody>,
) -> Result<Json<Selection>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let outcome = draw::execute(state.store.as_ref(), body.project_id, user_id)
    .await
    .map_err(|e| match e {
      DrawError::ProjectNotFound(_) => {
        ApiError::NotFound("project not found".into())
      }
      DrawError::MalformedMembers(e) => ApiError::Internal(e.to_string()),
      DrawError::Store(e) => ApiError::Store(Box::new(e)),
    })?;

  let selection = outcome
    .ok_or_else(|| ApiError::BadRequest("no candidates available".into()))?;

  tracing::info!(
    project_id = %body.project_id,
    candidate_id = %selection.candidate_id,
    "draw performed"
  );
  Ok(Json(selection))
}
