//! The `RecordStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `drawlot-store-sqlite`).
//! Higher layers (`drawlot-api`, the draw service) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  candidate::{Candidate, CandidatePhoto, NewCandidate, NewPhoto},
  history::{History, NewHistory},
  project::{NewProject, Project},
  user::{NewUser, User},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`RecordStore::list_history`].
#[derive(Debug, Clone)]
pub struct HistoryQuery {
  pub user_id:    Uuid,
  /// Restrict to draws performed for one project.
  pub project_id: Option<Uuid>,
  /// Maximum number of rows, newest first.
  pub limit:      usize,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a drawlot storage backend.
///
/// Every query on Project, Candidate, and History is scoped by the owning
/// user id; CandidatePhoto is scoped transitively via its candidate, so
/// callers must pre-check candidate ownership. Deletes are idempotent:
/// deleting an absent row is Ok.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create and persist a new user. Fails if the username is taken.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Retrieve a user by exact username. Returns `None` if not found.
  fn get_user_by_username(
    &self,
    username: String,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  // ── Projects ──────────────────────────────────────────────────────────

  /// List the user's projects, newest-created first.
  fn list_projects(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<Vec<Project>, Self::Error>> + Send + '_;

  /// Retrieve a project by `(id, owner)`. Returns `None` if absent or owned
  /// by a different user.
  fn get_project(
    &self,
    id: Uuid,
    owner: Uuid,
  ) -> impl Future<Output = Result<Option<Project>, Self::Error>> + Send + '_;

  /// Create a project, assigning a fresh id. The initial member list may be
  /// empty.
  fn create_project(
    &self,
    input: NewProject,
  ) -> impl Future<Output = Result<Project, Self::Error>> + Send + '_;

  /// Full replace of a project row; refreshes `updated_at`.
  fn update_project(
    &self,
    project: Project,
  ) -> impl Future<Output = Result<Project, Self::Error>> + Send + '_;

  /// Replace a project's member candidate id list wholesale.
  fn set_project_members(
    &self,
    id: Uuid,
    owner: Uuid,
    members: Vec<Uuid>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn delete_project(
    &self,
    id: Uuid,
    owner: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Candidates ────────────────────────────────────────────────────────

  /// List the user's candidates, newest-created first.
  fn list_candidates(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<Vec<Candidate>, Self::Error>> + Send + '_;

  fn get_candidate(
    &self,
    id: Uuid,
    owner: Uuid,
  ) -> impl Future<Output = Result<Option<Candidate>, Self::Error>> + Send + '_;

  /// Resolve candidates by id, filtered by owner. Returns the distinct
  /// subset that exists and is owned by `owner`; ids that resolve to
  /// nothing are silently dropped.
  fn get_candidates_by_ids(
    &self,
    ids: Vec<Uuid>,
    owner: Uuid,
  ) -> impl Future<Output = Result<Vec<Candidate>, Self::Error>> + Send + '_;

  fn create_candidate(
    &self,
    input: NewCandidate,
  ) -> impl Future<Output = Result<Candidate, Self::Error>> + Send + '_;

  /// Full replace of a candidate row; refreshes `updated_at`.
  fn update_candidate(
    &self,
    candidate: Candidate,
  ) -> impl Future<Output = Result<Candidate, Self::Error>> + Send + '_;

  fn delete_candidate(
    &self,
    id: Uuid,
    owner: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Update only the candidate's mirrored avatar URL; `None` clears it.
  fn set_candidate_photo_url(
    &self,
    id: Uuid,
    owner: Uuid,
    photo_url: Option<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Candidate photos ──────────────────────────────────────────────────

  /// List a candidate's photos, newest-created first.
  fn list_photos(
    &self,
    candidate_id: Uuid,
  ) -> impl Future<Output = Result<Vec<CandidatePhoto>, Self::Error>> + Send + '_;

  fn get_photo(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<CandidatePhoto>, Self::Error>> + Send + '_;

  /// Persist a batch of photo records, assigning fresh ids.
  fn add_photos(
    &self,
    photos: Vec<NewPhoto>,
  ) -> impl Future<Output = Result<Vec<CandidatePhoto>, Self::Error>> + Send + '_;

  fn delete_photo(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Clear the avatar flag on every photo of `candidate_id`, then set it on
  /// exactly `photo_id` — one transaction, so concurrent reassignments on
  /// the same candidate cannot produce two avatars or none. Fails (and
  /// rolls back the clearing) if `photo_id` does not belong to the
  /// candidate.
  fn set_avatar(
    &self,
    candidate_id: Uuid,
    photo_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The photo currently flagged as the candidate's avatar, if any.
  fn get_avatar(
    &self,
    candidate_id: Uuid,
  ) -> impl Future<Output = Result<Option<CandidatePhoto>, Self::Error>> + Send + '_;

  // ── History ───────────────────────────────────────────────────────────

  /// List draw records matching `query`, newest-selected first.
  fn list_history(
    &self,
    query: HistoryQuery,
  ) -> impl Future<Output = Result<Vec<History>, Self::Error>> + Send + '_;

  /// Append one draw record. The id and `selected_at` are set by the store.
  fn record_history(
    &self,
    input: NewHistory,
  ) -> impl Future<Output = Result<History, Self::Error>> + Send + '_;

  /// Delete every history row for `(project_id, owner)` — the project
  /// deletion cascade.
  fn delete_history_for_project(
    &self,
    project_id: Uuid,
    owner: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
