//! Project — a named, user-owned grouping of candidates.
//!
//! The member candidate list is carried as a JSON array of UUIDs inside a
//! text field, stored and returned verbatim. Duplicates are allowed and
//! order is preserved; a duplicate id weights its candidate proportionally
//! in a draw. The list is never pruned when a candidate is deleted — stale
//! references are resolved defensively at draw time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
  pub id:            Uuid,
  pub name:          String,
  pub user_id:       Uuid,
  /// JSON array of member candidate UUIDs, e.g. `["a…","b…"]`. Empty string
  /// means no members.
  pub candidate_ids: String,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl Project {
  /// Decode the member candidate id list. An empty stored representation
  /// decodes to an empty list; malformed JSON is an error.
  pub fn member_ids(&self) -> Result<Vec<Uuid>, serde_json::Error> {
    if self.candidate_ids.is_empty() {
      return Ok(Vec::new());
    }
    serde_json::from_str(&self.candidate_ids)
  }
}

/// Input for [`RecordStore::create_project`](crate::store::RecordStore::create_project).
#[derive(Debug, Clone)]
pub struct NewProject {
  pub name:       String,
  pub user_id:    Uuid,
  /// Initial member candidate ids; may be empty.
  pub member_ids: Vec<Uuid>,
}
