//! Candidate and CandidatePhoto — user-owned nominees and their images.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A nominee that can participate in draws.
///
/// `photo_url` mirrors the current avatar photo (or a directly-uploaded
/// legacy photo) and is cleared when the last photo is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
  pub id:         Uuid,
  pub name:       String,
  pub photo_url:  Option<String>,
  pub user_id:    Uuid,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCandidate {
  pub name:      String,
  pub photo_url: Option<String>,
  pub user_id:   Uuid,
}

/// One of possibly many images belonging to a candidate.
///
/// Invariant: at most one photo per candidate has `is_avatar = true`. The
/// store's `set_avatar` enforces this transactionally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatePhoto {
  pub id:           Uuid,
  pub candidate_id: Uuid,
  pub photo_url:    String,
  pub is_avatar:    bool,
  pub created_at:   DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPhoto {
  pub candidate_id: Uuid,
  pub photo_url:    String,
  pub is_avatar:    bool,
}
