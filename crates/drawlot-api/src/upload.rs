//! Saving uploaded files under the public upload directory.
//!
//! Stored filenames are `{uuid}_{sanitized original name}` so concurrent
//! uploads of identically-named files cannot collide; responses reference
//! the file by its public `/uploads/...` URL.

use std::path::Path;

use uuid::Uuid;

/// Write `bytes` into `dir` and return the public URL path for the file.
pub async fn save_upload(
  dir: &Path,
  original_name: &str,
  bytes: &[u8],
) -> std::io::Result<String> {
  let filename = format!("{}_{}", Uuid::new_v4(), sanitize(original_name));
  tokio::fs::create_dir_all(dir).await?;
  tokio::fs::write(dir.join(&filename), bytes).await?;
  Ok(format!("/uploads/{filename}"))
}

/// Reduce a client-supplied filename to a safe single path component.
fn sanitize(name: &str) -> String {
  let base = name
    .rsplit(['/', '\\'])
    .next()
    .unwrap_or(name);
  let cleaned: String = base
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
        c
      } else {
        '_'
      }
    })
    .collect();
  if cleaned.is_empty() {
    "upload".to_string()
  } else {
    cleaned
  }
}
