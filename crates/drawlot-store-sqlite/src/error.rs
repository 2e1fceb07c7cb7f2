//! Error type for `drawlot-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// `set_avatar` was given a photo id that does not belong to the
  /// candidate. The transaction rolled back; the previous avatar survives.
  #[error("photo not found: {0}")]
  PhotoNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
