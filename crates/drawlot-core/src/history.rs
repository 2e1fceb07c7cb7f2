//! History — the immutable audit record of one completed draw.
//!
//! Project and candidate names are denormalized snapshots taken at draw
//! time, not live references: a history row stays readable and meaningful
//! after the project or candidate is renamed or deleted. Rows are only ever
//! created by the draw service and deleted as a cascade of project deletion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
  pub id:             Uuid,
  pub project_id:     Uuid,
  pub project_name:   String,
  pub candidate_id:   Uuid,
  pub candidate_name: String,
  pub selected_at:    DateTime<Utc>,
  pub user_id:        Uuid,
}

/// Input for [`RecordStore::record_history`](crate::store::RecordStore::record_history).
/// The id and `selected_at` timestamp are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewHistory {
  pub project_id:     Uuid,
  pub project_name:   String,
  pub candidate_id:   Uuid,
  pub candidate_name: String,
  pub user_id:        Uuid,
}
