//! Handlers for candidate photo endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/candidates/:id/photo` | Legacy single upload (field `photo`); sets `photo_url` only |
//! | `GET`  | `/candidates/:id/photos` | Candidate's photos, newest first |
//! | `POST` | `/candidates/:id/photos` | Batch upload (repeated field `photos`); 201 |
//! | `PUT`  | `/candidates/:id/avatar` | Body: `{"photo_id"}`; flips the avatar flag |
//! | `DELETE` | `/candidates/:id/photos/:photo_id` | Re-elects the avatar if needed |
//!
//! Photos have no direct owner column; every handler pre-checks that the
//! candidate belongs to the caller before touching its photos.

use axum::{
  Json,
  extract::{Multipart, Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use drawlot_core::{
  candidate::{Candidate, CandidatePhoto, NewPhoto},
  store::RecordStore,
};

use crate::{AppState, auth::CurrentUser, error::ApiError, upload};

async fn owned_candidate<S>(
  state: &AppState<S>,
  id: Uuid,
  user_id: Uuid,
) -> Result<Candidate, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  state
    .store
    .get_candidate(id, user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound("candidate not found".into()))
}

/// Pull all files under `field_name` out of a multipart body.
async fn collect_files(
  multipart: &mut Multipart,
  field_name: &str,
) -> Result<Vec<(String, Vec<u8>)>, ApiError> {
  let mut files = Vec::new();
  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
  {
    if field.name() != Some(field_name) {
      continue;
    }
    let name = field.file_name().unwrap_or("upload").to_string();
    let bytes = field
      .bytes()
      .await
      .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?;
    files.push((name, bytes.to_vec()));
  }
  Ok(files)
}

// ─── Legacy single upload ────────────────────────────────────────────────────

/// `POST /candidates/:id/photo` — saves the file and points the candidate's
/// `photo_url` at it without creating a photo record.
pub async fn upload_legacy<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<Uuid>,
  mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  owned_candidate(&state, id, user_id).await?;

  let mut files = collect_files(&mut multipart, "photo").await?;
  let Some((name, bytes)) = files.pop() else {
    return Err(ApiError::BadRequest("no file uploaded".into()));
  };

  let photo_url = upload::save_upload(&state.config.upload_dir, &name, &bytes)
    .await
    .map_err(|e| ApiError::Internal(format!("failed to save upload: {e}")))?;

  state
    .store
    .set_candidate_photo_url(id, user_id, Some(photo_url.clone()))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  tracing::info!(candidate_id = %id, %photo_url, "photo uploaded");
  Ok(Json(json!({ "photo_url": photo_url })))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /candidates/:id/photos`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<CandidatePhoto>>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  owned_candidate(&state, id, user_id).await?;

  let photos = state
    .store
    .list_photos(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(photos))
}

// ─── Batch upload ────────────────────────────────────────────────────────────

/// `POST /candidates/:id/photos` — saves every file under the repeated
/// `photos` field. If the candidate has no avatar yet, the first uploaded
/// photo becomes it.
pub async fn upload_batch<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<Uuid>,
  mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let candidate = owned_candidate(&state, id, user_id).await?;

  let files = collect_files(&mut multipart, "photos").await?;
  if files.is_empty() {
    return Err(ApiError::BadRequest("no files uploaded".into()));
  }

  let mut new_photos = Vec::with_capacity(files.len());
  for (name, bytes) in &files {
    let photo_url = upload::save_upload(&state.config.upload_dir, name, bytes)
      .await
      .map_err(|e| ApiError::Internal(format!("failed to save upload: {e}")))?;
    new_photos.push(NewPhoto {
      candidate_id: id,
      photo_url,
      is_avatar: false,
    });
  }

  let photos = state
    .store
    .add_photos(new_photos)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  // First photo of an avatar-less candidate is promoted automatically.
  // Best-effort: a failure here leaves a valid upload, so it is only logged.
  if candidate.photo_url.is_none()
    && let Some(first) = photos.first()
  {
    if let Err(e) = state.store.set_avatar(id, first.id).await {
      tracing::error!(candidate_id = %id, error = %e, "failed to promote first photo to avatar");
    } else if let Err(e) = state
      .store
      .set_candidate_photo_url(id, user_id, Some(first.photo_url.clone()))
      .await
    {
      tracing::error!(candidate_id = %id, error = %e, "failed to update candidate photo url");
    }
  }

  tracing::info!(candidate_id = %id, count = photos.len(), "photos uploaded");
  Ok((StatusCode::CREATED, Json(photos)))
}

// ─── Set avatar ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SetAvatarBody {
  pub photo_id: Uuid,
}

/// `PUT /candidates/:id/avatar`
pub async fn set_avatar<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<SetAvatarBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  owned_candidate(&state, id, user_id).await?;

  let photo = state
    .store
    .get_photo(body.photo_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .filter(|p| p.candidate_id == id)
    .ok_or_else(|| ApiError::NotFound("photo not found".into()))?;

  state
    .store
    .set_avatar(id, photo.id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  state
    .store
    .set_candidate_photo_url(id, user_id, Some(photo.photo_url.clone()))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  tracing::info!(candidate_id = %id, photo_id = %photo.id, "avatar set");
  Ok(Json(json!({ "photo_url": photo.photo_url })))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /candidates/:id/photos/:photo_id` — when the deleted photo was
/// the avatar, the newest remaining photo is promoted; with no photos left
/// the candidate's `photo_url` is cleared.
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
  Path((id, photo_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  owned_candidate(&state, id, user_id).await?;

  let photo = state
    .store
    .get_photo(photo_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .filter(|p| p.candidate_id == id)
    .ok_or_else(|| ApiError::NotFound("photo not found".into()))?;

  state
    .store
    .delete_photo(photo_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  if photo.is_avatar {
    let remaining = state
      .store
      .list_photos(id)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;

    if let Some(next) = remaining.first() {
      state
        .store
        .set_avatar(id, next.id)
        .await
        .map_err(|e| ApiError::Store(Box::new(e)))?;
      state
        .store
        .set_candidate_photo_url(id, user_id, Some(next.photo_url.clone()))
        .await
        .map_err(|e| ApiError::Store(Box::new(e)))?;
      tracing::info!(candidate_id = %id, photo_id = %next.id, "avatar re-elected");
    } else {
      state
        .store
        .set_candidate_photo_url(id, user_id, None)
        .await
        .map_err(|e| ApiError::Store(Box::new(e)))?;
    }
  }

  tracing::info!(candidate_id = %id, %photo_id, "photo deleted");
  Ok(StatusCode::NO_CONTENT)
}
