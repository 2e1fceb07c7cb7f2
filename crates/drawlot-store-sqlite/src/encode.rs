//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Member id lists are stored
//! as compact JSON. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use drawlot_core::{
  candidate::{Candidate, CandidatePhoto},
  history::History,
  project::Project,
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Member id lists ─────────────────────────────────────────────────────────

pub fn encode_member_ids(ids: &[Uuid]) -> Result<String> {
  Ok(serde_json::to_string(ids)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub password_hash: String,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:            decode_uuid(&self.user_id)?,
      username:      self.username,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `projects` row.
pub struct RawProject {
  pub project_id:    String,
  pub name:          String,
  pub user_id:       String,
  pub candidate_ids: String,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawProject {
  pub fn into_project(self) -> Result<Project> {
    Ok(Project {
      id:            decode_uuid(&self.project_id)?,
      name:          self.name,
      user_id:       decode_uuid(&self.user_id)?,
      candidate_ids: self.candidate_ids,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `candidates` row.
pub struct RawCandidate {
  pub candidate_id: String,
  pub name:         String,
  pub photo_url:    Option<String>,
  pub user_id:      String,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawCandidate {
  pub fn into_candidate(self) -> Result<Candidate> {
    Ok(Candidate {
      id:         decode_uuid(&self.candidate_id)?,
      name:       self.name,
      photo_url:  self.photo_url,
      user_id:    decode_uuid(&self.user_id)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `candidate_photos` row.
pub struct RawPhoto {
  pub photo_id:     String,
  pub candidate_id: String,
  pub photo_url:    String,
  pub is_avatar:    bool,
  pub created_at:   String,
}

impl RawPhoto {
  pub fn into_photo(self) -> Result<CandidatePhoto> {
    Ok(CandidatePhoto {
      id:           decode_uuid(&self.photo_id)?,
      candidate_id: decode_uuid(&self.candidate_id)?,
      photo_url:    self.photo_url,
      is_avatar:    self.is_avatar,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `history` row.
pub struct RawHistory {
  pub history_id:     String,
  pub project_id:     String,
  pub project_name:   String,
  pub candidate_id:   String,
  pub candidate_name: String,
  pub selected_at:    String,
  pub user_id:        String,
}

impl RawHistory {
  pub fn into_history(self) -> Result<History> {
    Ok(History {
      id:             decode_uuid(&self.history_id)?,
      project_id:     decode_uuid(&self.project_id)?,
      project_name:   self.project_name,
      candidate_id:   decode_uuid(&self.candidate_id)?,
      candidate_name: self.candidate_name,
      selected_at:    decode_dt(&self.selected_at)?,
      user_id:        decode_uuid(&self.user_id)?,
    })
  }
}
