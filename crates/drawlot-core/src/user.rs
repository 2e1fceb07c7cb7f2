//! User — the identity that owns every other entity.
//!
//! A user is created at registration and never deleted. All reads and writes
//! on projects, candidates, and history are scoped by the owning user id;
//! that scoping is the only access-control invariant in the system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id:            Uuid,
  pub username:      String,
  /// Argon2 PHC string. Never leaves the server.
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

/// Input for [`RecordStore::create_user`](crate::store::RecordStore::create_user).
/// The id and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub password_hash: String,
}
