//! [`SqliteStore`] — the SQLite implementation of [`RecordStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use drawlot_core::{
  candidate::{Candidate, CandidatePhoto, NewCandidate, NewPhoto},
  history::{History, NewHistory},
  project::{NewProject, Project},
  store::{HistoryQuery, RecordStore},
  user::{NewUser, User},
};

use crate::{
  Error, Result,
  encode::{
    RawCandidate, RawHistory, RawPhoto, RawProject, RawUser, encode_dt,
    encode_member_ids, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A drawlot record store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row mapping helpers ─────────────────────────────────────────────────────

fn project_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawProject> {
  Ok(RawProject {
    project_id:    row.get(0)?,
    name:          row.get(1)?,
    user_id:       row.get(2)?,
    candidate_ids: row.get(3)?,
    created_at:    row.get(4)?,
    updated_at:    row.get(5)?,
  })
}

fn candidate_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCandidate> {
  Ok(RawCandidate {
    candidate_id: row.get(0)?,
    name:         row.get(1)?,
    photo_url:    row.get(2)?,
    user_id:      row.get(3)?,
    created_at:   row.get(4)?,
    updated_at:   row.get(5)?,
  })
}

fn photo_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPhoto> {
  Ok(RawPhoto {
    photo_id:     row.get(0)?,
    candidate_id: row.get(1)?,
    photo_url:    row.get(2)?,
    is_avatar:    row.get(3)?,
    created_at:   row.get(4)?,
  })
}

fn history_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawHistory> {
  Ok(RawHistory {
    history_id:     row.get(0)?,
    project_id:     row.get(1)?,
    project_name:   row.get(2)?,
    candidate_id:   row.get(3)?,
    candidate_name: row.get(4)?,
    selected_at:    row.get(5)?,
    user_id:        row.get(6)?,
  })
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:       row.get(0)?,
    username:      row.get(1)?,
    password_hash: row.get(2)?,
    created_at:    row.get(3)?,
    updated_at:    row.get(4)?,
  })
}

const PROJECT_COLS: &str =
  "project_id, name, user_id, candidate_ids, created_at, updated_at";
const CANDIDATE_COLS: &str =
  "candidate_id, name, photo_url, user_id, created_at, updated_at";
const PHOTO_COLS: &str =
  "photo_id, candidate_id, photo_url, is_avatar, created_at";
const HISTORY_COLS: &str =
  "history_id, project_id, project_name, candidate_id, candidate_name, \
   selected_at, user_id";
const USER_COLS: &str =
  "user_id, username, password_hash, created_at, updated_at";

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let now = Utc::now();
    let user = User {
      id:            Uuid::new_v4(),
      username:      input.username,
      password_hash: input.password_hash,
      created_at:    now,
      updated_at:    now,
    };

    let id_str   = encode_uuid(user.id);
    let username = user.username.clone();
    let hash     = user.password_hash.clone();
    let at_str   = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, username, password_hash, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?4)",
          rusqlite::params![id_str, username, hash, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLS} FROM users WHERE user_id = ?1"),
            rusqlite::params![id_str],
            user_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn get_user_by_username(&self, username: String) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLS} FROM users WHERE username = ?1"),
            rusqlite::params![username],
            user_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  // ── Projects ──────────────────────────────────────────────────────────────

  async fn list_projects(&self, owner: Uuid) -> Result<Vec<Project>> {
    let owner_str = encode_uuid(owner);

    let raws: Vec<RawProject> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROJECT_COLS} FROM projects WHERE user_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str], project_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProject::into_project).collect()
  }

  async fn get_project(&self, id: Uuid, owner: Uuid) -> Result<Option<Project>> {
    let id_str    = encode_uuid(id);
    let owner_str = encode_uuid(owner);

    let raw: Option<RawProject> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {PROJECT_COLS} FROM projects
               WHERE project_id = ?1 AND user_id = ?2"
            ),
            rusqlite::params![id_str, owner_str],
            project_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawProject::into_project).transpose()
  }

  async fn create_project(&self, input: NewProject) -> Result<Project> {
    let now = Utc::now();
    let candidate_ids = if input.member_ids.is_empty() {
      String::new()
    } else {
      encode_member_ids(&input.member_ids)?
    };
    let project = Project {
      id: Uuid::new_v4(),
      name: input.name,
      user_id: input.user_id,
      candidate_ids,
      created_at: now,
      updated_at: now,
    };

    let id_str    = encode_uuid(project.id);
    let name      = project.name.clone();
    let owner_str = encode_uuid(project.user_id);
    let members   = project.candidate_ids.clone();
    let at_str    = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO projects (project_id, name, user_id, candidate_ids, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          rusqlite::params![id_str, name, owner_str, members, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(project)
  }

  async fn update_project(&self, project: Project) -> Result<Project> {
    let updated = Project { updated_at: Utc::now(), ..project };

    let id_str    = encode_uuid(updated.id);
    let owner_str = encode_uuid(updated.user_id);
    let name      = updated.name.clone();
    let members   = updated.candidate_ids.clone();
    let at_str    = encode_dt(updated.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE projects SET name = ?1, candidate_ids = ?2, updated_at = ?3
           WHERE project_id = ?4 AND user_id = ?5",
          rusqlite::params![name, members, at_str, id_str, owner_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(updated)
  }

  async fn set_project_members(
    &self,
    id: Uuid,
    owner: Uuid,
    members: Vec<Uuid>,
  ) -> Result<()> {
    let id_str      = encode_uuid(id);
    let owner_str   = encode_uuid(owner);
    let members_str = encode_member_ids(&members)?;
    let at_str      = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE projects SET candidate_ids = ?1, updated_at = ?2
           WHERE project_id = ?3 AND user_id = ?4",
          rusqlite::params![members_str, at_str, id_str, owner_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  async fn delete_project(&self, id: Uuid, owner: Uuid) -> Result<()> {
    let id_str    = encode_uuid(id);
    let owner_str = encode_uuid(owner);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM projects WHERE project_id = ?1 AND user_id = ?2",
          rusqlite::params![id_str, owner_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  // ── Candidates ────────────────────────────────────────────────────────────

  async fn list_candidates(&self, owner: Uuid) -> Result<Vec<Candidate>> {
    let owner_str = encode_uuid(owner);

    let raws: Vec<RawCandidate> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CANDIDATE_COLS} FROM candidates WHERE user_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str], candidate_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCandidate::into_candidate).collect()
  }

  async fn get_candidate(&self, id: Uuid, owner: Uuid) -> Result<Option<Candidate>> {
    let id_str    = encode_uuid(id);
    let owner_str = encode_uuid(owner);

    let raw: Option<RawCandidate> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {CANDIDATE_COLS} FROM candidates
               WHERE candidate_id = ?1 AND user_id = ?2"
            ),
            rusqlite::params![id_str, owner_str],
            candidate_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCandidate::into_candidate).transpose()
  }

  async fn get_candidates_by_ids(
    &self,
    ids: Vec<Uuid>,
    owner: Uuid,
  ) -> Result<Vec<Candidate>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }

    let id_strs: Vec<String> = ids.iter().copied().map(encode_uuid).collect();
    let owner_str = encode_uuid(owner);

    let raws: Vec<RawCandidate> = self
      .conn
      .call(move |conn| {
        let placeholders = (1..=id_strs.len())
          .map(|i| format!("?{i}"))
          .collect::<Vec<_>>()
          .join(", ");
        let sql = format!(
          "SELECT {CANDIDATE_COLS} FROM candidates
           WHERE candidate_id IN ({placeholders}) AND user_id = ?{owner_pos}",
          owner_pos = id_strs.len() + 1,
        );

        let mut stmt = conn.prepare(&sql)?;
        let params = rusqlite::params_from_iter(
          id_strs.iter().map(String::as_str).chain([owner_str.as_str()]),
        );
        let rows = stmt
          .query_map(params, candidate_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCandidate::into_candidate).collect()
  }

  async fn create_candidate(&self, input: NewCandidate) -> Result<Candidate> {
    let now = Utc::now();
    let candidate = Candidate {
      id:         Uuid::new_v4(),
      name:       input.name,
      photo_url:  input.photo_url,
      user_id:    input.user_id,
      created_at: now,
      updated_at: now,
    };

    let id_str    = encode_uuid(candidate.id);
    let name      = candidate.name.clone();
    let photo_url = candidate.photo_url.clone();
    let owner_str = encode_uuid(candidate.user_id);
    let at_str    = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO candidates (candidate_id, name, photo_url, user_id, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          rusqlite::params![id_str, name, photo_url, owner_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(candidate)
  }

  async fn update_candidate(&self, candidate: Candidate) -> Result<Candidate> {
    let updated = Candidate { updated_at: Utc::now(), ..candidate };

    let id_str    = encode_uuid(updated.id);
    let owner_str = encode_uuid(updated.user_id);
    let name      = updated.name.clone();
    let photo_url = updated.photo_url.clone();
    let at_str    = encode_dt(updated.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE candidates SET name = ?1, photo_url = ?2, updated_at = ?3
           WHERE candidate_id = ?4 AND user_id = ?5",
          rusqlite::params![name, photo_url, at_str, id_str, owner_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(updated)
  }

  async fn delete_candidate(&self, id: Uuid, owner: Uuid) -> Result<()> {
    let id_str    = encode_uuid(id);
    let owner_str = encode_uuid(owner);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM candidates WHERE candidate_id = ?1 AND user_id = ?2",
          rusqlite::params![id_str, owner_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  async fn set_candidate_photo_url(
    &self,
    id: Uuid,
    owner: Uuid,
    photo_url: Option<String>,
  ) -> Result<()> {
    let id_str    = encode_uuid(id);
    let owner_str = encode_uuid(owner);
    let at_str    = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE candidates SET photo_url = ?1, updated_at = ?2
           WHERE candidate_id = ?3 AND user_id = ?4",
          rusqlite::params![photo_url, at_str, id_str, owner_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  // ── Candidate photos ──────────────────────────────────────────────────────

  async fn list_photos(&self, candidate_id: Uuid) -> Result<Vec<CandidatePhoto>> {
    let cand_str = encode_uuid(candidate_id);

    let raws: Vec<RawPhoto> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PHOTO_COLS} FROM candidate_photos WHERE candidate_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![cand_str], photo_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPhoto::into_photo).collect()
  }

  async fn get_photo(&self, id: Uuid) -> Result<Option<CandidatePhoto>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPhoto> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PHOTO_COLS} FROM candidate_photos WHERE photo_id = ?1"),
            rusqlite::params![id_str],
            photo_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPhoto::into_photo).transpose()
  }

  async fn add_photos(&self, photos: Vec<NewPhoto>) -> Result<Vec<CandidatePhoto>> {
    if photos.is_empty() {
      return Ok(Vec::new());
    }

    let now = Utc::now();
    let built: Vec<CandidatePhoto> = photos
      .into_iter()
      .map(|p| CandidatePhoto {
        id:           Uuid::new_v4(),
        candidate_id: p.candidate_id,
        photo_url:    p.photo_url,
        is_avatar:    p.is_avatar,
        created_at:   now,
      })
      .collect();

    let rows: Vec<(String, String, String, bool, String)> = built
      .iter()
      .map(|p| {
        (
          encode_uuid(p.id),
          encode_uuid(p.candidate_id),
          p.photo_url.clone(),
          p.is_avatar,
          encode_dt(p.created_at),
        )
      })
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for (id, cand, url, avatar, at) in &rows {
          tx.execute(
            "INSERT INTO candidate_photos (photo_id, candidate_id, photo_url, is_avatar, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![id, cand, url, avatar, at],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(built)
  }

  async fn delete_photo(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM candidate_photos WHERE photo_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  async fn set_avatar(&self, candidate_id: Uuid, photo_id: Uuid) -> Result<()> {
    let cand_str  = encode_uuid(candidate_id);
    let photo_str = encode_uuid(photo_id);

    // Clear-then-set must be one transaction: two concurrent reassignments
    // on the same candidate otherwise race into zero or two avatars.
    let updated: usize = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "UPDATE candidate_photos SET is_avatar = 0 WHERE candidate_id = ?1",
          rusqlite::params![cand_str],
        )?;
        let n = tx.execute(
          "UPDATE candidate_photos SET is_avatar = 1
           WHERE photo_id = ?1 AND candidate_id = ?2",
          rusqlite::params![photo_str, cand_str],
        )?;
        if n == 0 {
          // Unknown photo id: drop the transaction so the clearing rolls
          // back and the previous avatar survives.
          return Ok(0);
        }
        tx.commit()?;
        Ok(n)
      })
      .await?;

    if updated == 0 {
      return Err(Error::PhotoNotFound(photo_id));
    }
    Ok(())
  }

  async fn get_avatar(&self, candidate_id: Uuid) -> Result<Option<CandidatePhoto>> {
    let cand_str = encode_uuid(candidate_id);

    let raw: Option<RawPhoto> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {PHOTO_COLS} FROM candidate_photos
               WHERE candidate_id = ?1 AND is_avatar = 1"
            ),
            rusqlite::params![cand_str],
            photo_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPhoto::into_photo).transpose()
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn list_history(&self, query: HistoryQuery) -> Result<Vec<History>> {
    let owner_str   = encode_uuid(query.user_id);
    let project_str = query.project_id.map(encode_uuid);
    let limit       = query.limit as i64;

    let raws: Vec<RawHistory> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(p) = project_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {HISTORY_COLS} FROM history
             WHERE user_id = ?1 AND project_id = ?2
             ORDER BY selected_at DESC, rowid DESC LIMIT ?3"
          ))?;
          stmt
            .query_map(rusqlite::params![owner_str, p, limit], history_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {HISTORY_COLS} FROM history WHERE user_id = ?1
             ORDER BY selected_at DESC, rowid DESC LIMIT ?2"
          ))?;
          stmt
            .query_map(rusqlite::params![owner_str, limit], history_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHistory::into_history).collect()
  }

  async fn record_history(&self, input: NewHistory) -> Result<History> {
    let record = History {
      id:             Uuid::new_v4(),
      project_id:     input.project_id,
      project_name:   input.project_name,
      candidate_id:   input.candidate_id,
      candidate_name: input.candidate_name,
      selected_at:    Utc::now(),
      user_id:        input.user_id,
    };

    let id_str     = encode_uuid(record.id);
    let proj_str   = encode_uuid(record.project_id);
    let proj_name  = record.project_name.clone();
    let cand_str   = encode_uuid(record.candidate_id);
    let cand_name  = record.candidate_name.clone();
    let at_str     = encode_dt(record.selected_at);
    let owner_str  = encode_uuid(record.user_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO history (history_id, project_id, project_name,
             candidate_id, candidate_name, selected_at, user_id)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str, proj_str, proj_name, cand_str, cand_name, at_str, owner_str
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(record)
  }

  async fn delete_history_for_project(
    &self,
    project_id: Uuid,
    owner: Uuid,
  ) -> Result<()> {
    let proj_str  = encode_uuid(project_id);
    let owner_str = encode_uuid(owner);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM history WHERE project_id = ?1 AND user_id = ?2",
          rusqlite::params![proj_str, owner_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(())
  }
}
