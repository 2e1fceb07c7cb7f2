//! Handler for the `/history` endpoint.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/history` | Optional `?project_id=<uuid>&limit=<n>`; newest first, default limit 20 |

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use uuid::Uuid;

use drawlot_core::{
  history::History,
  store::{HistoryQuery, RecordStore},
};

use crate::{AppState, auth::CurrentUser, error::ApiError};

const DEFAULT_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub project_id: Option<Uuid>,
  pub limit:      Option<usize>,
}

/// `GET /history[?project_id=<uuid>][&limit=<n>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<History>>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let limit = params
    .limit
    .filter(|l| *l > 0)
    .unwrap_or(DEFAULT_LIMIT);

  let rows = state
    .store
    .list_history(HistoryQuery {
      user_id,
      project_id: params.project_id,
      limit,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(rows))
}
