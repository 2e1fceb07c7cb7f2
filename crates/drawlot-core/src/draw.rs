//! The draw service — the one piece of business logic in the system.
//!
//! Given a project, resolve its member candidate set, select one uniformly
//! at random, and append a history record denormalizing the names current
//! at draw time. Stateless per call; the history row is the only side
//! effect.

use std::collections::HashMap;

use rand::Rng as _;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{history::NewHistory, store::RecordStore};

// ─── Result types ────────────────────────────────────────────────────────────

/// The outcome of a successful draw.
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
  pub candidate_id:   Uuid,
  pub candidate_name: String,
}

/// Errors produced by [`execute`]. A project whose member list resolves to
/// nothing is NOT an error — that is the `Ok(None)` "no selection" result.
#[derive(Debug, Error)]
pub enum DrawError<E> {
  #[error("project not found: {0}")]
  ProjectNotFound(Uuid),

  #[error("stored member list is not a JSON array of ids: {0}")]
  MalformedMembers(#[source] serde_json::Error),

  #[error("store error: {0}")]
  Store(E),
}

// ─── Execute ─────────────────────────────────────────────────────────────────

/// Perform one draw for `(project_id, user_id)`.
///
/// The member list is re-expanded after resolution so that a candidate id
/// appearing twice keeps twice the weight, while stale ids (deleted
/// candidates) drop out. Resolution re-filters by `user_id` even though the
/// project already belongs to the user: a stale id could otherwise point at
/// another user's recreated candidate.
///
/// A failure to append the history row is logged and swallowed — the
/// selection is still returned.
pub async fn execute<S: RecordStore>(
  store: &S,
  project_id: Uuid,
  user_id: Uuid,
) -> Result<Option<Selection>, DrawError<S::Error>> {
  let project = store
    .get_project(project_id, user_id)
    .await
    .map_err(DrawError::Store)?
    .ok_or(DrawError::ProjectNotFound(project_id))?;

  let member_ids = project.member_ids().map_err(DrawError::MalformedMembers)?;
  if member_ids.is_empty() {
    return Ok(None);
  }

  let fetched = store
    .get_candidates_by_ids(member_ids.clone(), user_id)
    .await
    .map_err(DrawError::Store)?;

  // Walk the member list against the fetched set: duplicates keep their
  // multiplicity, stale ids drop out.
  let by_id: HashMap<Uuid, &crate::candidate::Candidate> =
    fetched.iter().map(|c| (c.id, c)).collect();
  let resolved: Vec<_> = member_ids
    .iter()
    .filter_map(|id| by_id.get(id).copied())
    .collect();

  if resolved.is_empty() {
    return Ok(None);
  }

  // `ThreadRng` is seeded per thread, not per call; keep it scoped so the
  // future stays `Send`.
  let selected = {
    let index = rand::thread_rng().gen_range(0..resolved.len());
    resolved[index]
  };

  let record = NewHistory {
    project_id:     project.id,
    project_name:   project.name.clone(),
    candidate_id:   selected.id,
    candidate_name: selected.name.clone(),
    user_id,
  };
  if let Err(e) = store.record_history(record).await {
    tracing::warn!(
      project_id = %project.id,
      candidate_id = %selected.id,
      error = %e,
      "failed to record draw history"
    );
  }

  Ok(Some(Selection {
    candidate_id:   selected.id,
    candidate_name: selected.name.clone(),
  }))
}
