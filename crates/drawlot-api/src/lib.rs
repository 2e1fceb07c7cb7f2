//! JSON REST API for drawlot.
//!
//! Exposes an axum [`Router`] backed by any
//! [`drawlot_core::store::RecordStore`]. Uploaded photos are written under
//! the configured upload directory and served back statically at
//! `/uploads/...`.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = drawlot_api::router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod candidates;
pub mod error;
pub mod history;
pub mod photos;
pub mod projects;
pub mod randomize;
pub mod upload;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{delete, get, post, put},
};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use auth::AuthKeys;
use drawlot_core::store::RecordStore;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// `DRAWLOT_*` environment. Every field has a default so the server runs
/// with no config file at all.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_database_path")]
  pub database_path:    PathBuf,
  #[serde(default = "default_upload_dir")]
  pub upload_dir:       PathBuf,
  #[serde(default = "default_jwt_secret")]
  pub jwt_secret:       String,
  #[serde(default = "default_token_ttl_days")]
  pub token_ttl_days:   i64,
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes: usize,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_database_path() -> PathBuf { PathBuf::from("./data/drawlot.db") }
fn default_upload_dir() -> PathBuf { PathBuf::from("./uploads") }
fn default_jwt_secret() -> String { "drawlot-dev-secret".to_string() }
fn default_token_ttl_days() -> i64 { 7 }
fn default_max_upload_bytes() -> usize { 10 * 1024 * 1024 }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             default_host(),
      port:             default_port(),
      database_path:    default_database_path(),
      upload_dir:       default_upload_dir(),
      jwt_secret:       default_jwt_secret(),
      token_ttl_days:   default_token_ttl_days(),
      max_upload_bytes: default_max_upload_bytes(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: RecordStore> {
  pub store:  Arc<S>,
  pub auth:   Arc<AuthKeys>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: the JSON API under `/api` plus static
/// serving of uploaded files under `/uploads`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let api = Router::new()
    // Auth
    .route("/auth/register", post(auth::register::<S>))
    .route("/auth/login", post(auth::login::<S>))
    .route("/auth/me", get(auth::me::<S>))
    // Projects
    .route(
      "/projects",
      get(projects::list::<S>).post(projects::create::<S>),
    )
    .route(
      "/projects/{id}",
      get(projects::get_one::<S>)
        .put(projects::update::<S>)
        .delete(projects::delete_one::<S>),
    )
    // Candidates
    .route(
      "/candidates",
      get(candidates::list::<S>).post(candidates::create::<S>),
    )
    .route(
      "/candidates/{id}",
      get(candidates::get_one::<S>)
        .put(candidates::update::<S>)
        .delete(candidates::delete_one::<S>),
    )
    // Photos
    .route("/candidates/{id}/photo", post(photos::upload_legacy::<S>))
    .route(
      "/candidates/{id}/photos",
      get(photos::list::<S>).post(photos::upload_batch::<S>),
    )
    .route("/candidates/{id}/avatar", put(photos::set_avatar::<S>))
    .route(
      "/candidates/{id}/photos/{photo_id}",
      delete(photos::delete_one::<S>),
    )
    // History & draws
    .route("/history", get(history::list::<S>))
    .route("/randomize", post(randomize::randomize::<S>));

  Router::new()
    .nest("/api", api)
    .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
    .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use drawlot_core::{candidate::NewPhoto, store::RecordStore as _};
  use drawlot_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let config = ServerConfig {
      upload_dir: std::env::temp_dir().join(format!("drawlot-test-{}", Uuid::new_v4())),
      ..ServerConfig::default()
    };
    AppState {
      store:  Arc::new(store),
      auth:   Arc::new(AuthKeys::new(&config.jwt_secret, config.token_ttl_days)),
      config: Arc::new(config),
    }
  }

  async fn send(
    state: &AppState<SqliteStore>,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let resp = router(state.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
  }

  /// Register a user and return their bearer token.
  async fn register(state: &AppState<SqliteStore>, username: &str) -> String {
    let (status, body) = send(
      state,
      "POST",
      "/api/auth/register",
      None,
      Some(json!({ "username": username, "password": "hunter22" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    body["token"].as_str().unwrap().to_string()
  }

  async fn create_candidate(
    state: &AppState<SqliteStore>,
    token: &str,
    name: &str,
  ) -> Uuid {
    let (status, body) = send(
      state,
      "POST",
      "/api/candidates",
      Some(token),
      Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().parse().unwrap()
  }

  async fn create_project(
    state: &AppState<SqliteStore>,
    token: &str,
    name: &str,
    members: &[Uuid],
  ) -> Uuid {
    let (status, body) = send(
      state,
      "POST",
      "/api/projects",
      Some(token),
      Some(json!({ "name": name, "candidate_ids": members })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().parse().unwrap()
  }

  // ── Auth ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn register_login_me_roundtrip() {
    let state = make_state().await;
    let token = register(&state, "alice").await;

    let (status, body) = send(&state, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    // The hash must never appear in a response.
    assert!(body.get("password_hash").is_none(), "body: {body}");

    let (status, body) = send(
      &state,
      "POST",
      "/api/auth/login",
      None,
      Some(json!({ "username": "alice", "password": "hunter22" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());
  }

  #[tokio::test]
  async fn register_rejects_short_username_and_duplicates() {
    let state = make_state().await;

    let (status, _) = send(
      &state,
      "POST",
      "/api/auth/register",
      None,
      Some(json!({ "username": "ab", "password": "hunter22" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    register(&state, "alice").await;
    let (status, body) = send(
      &state,
      "POST",
      "/api/auth/register",
      None,
      Some(json!({ "username": "alice", "password": "hunter22" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("taken"));
  }

  #[tokio::test]
  async fn login_with_bad_password_is_401() {
    let state = make_state().await;
    register(&state, "alice").await;

    let (status, _) = send(
      &state,
      "POST",
      "/api/auth/login",
      None,
      Some(json!({ "username": "alice", "password": "wrong!!" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn requests_without_token_are_401() {
    let state = make_state().await;
    for (method, uri) in [
      ("GET", "/api/projects"),
      ("GET", "/api/candidates"),
      ("GET", "/api/history"),
      ("GET", "/api/auth/me"),
    ] {
      let (status, _) = send(&state, method, uri, None, None).await;
      assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
    }

    let (status, _) = send(
      &state,
      "POST",
      "/api/randomize",
      Some("not-a-jwt"),
      Some(json!({ "project_id": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  // ── Projects ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn project_crud_roundtrip() {
    let state = make_state().await;
    let token = register(&state, "alice").await;
    let a = create_candidate(&state, &token, "A").await;

    let id = create_project(&state, &token, "chores", &[a]).await;

    let (status, body) =
      send(&state, "GET", &format!("/api/projects/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "chores");
    // The member list is carried verbatim as a JSON text field.
    assert_eq!(body["candidate_ids"], json!(format!("[\"{a}\"]")));

    let (status, body) = send(
      &state,
      "PUT",
      &format!("/api/projects/{id}"),
      Some(&token),
      Some(json!({ "name": "renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "renamed");

    let (status, body) = send(&state, "GET", "/api/projects", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) =
      send(&state, "DELETE", &format!("/api/projects/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) =
      send(&state, "GET", &format!("/api/projects/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn projects_are_invisible_across_users() {
    let state = make_state().await;
    let alice = register(&state, "alice").await;
    let bob   = register(&state, "bobby").await;

    let id = create_project(&state, &alice, "chores", &[]).await;

    let (status, _) =
      send(&state, "GET", &format!("/api/projects/{id}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
      send(&state, "DELETE", &format!("/api/projects/{id}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Candidates ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn candidate_crud_roundtrip() {
    let state = make_state().await;
    let token = register(&state, "alice").await;

    let id = create_candidate(&state, &token, "A").await;

    let (status, body) = send(
      &state,
      "PUT",
      &format!("/api/candidates/{id}"),
      Some(&token),
      Some(json!({ "name": "A2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "A2");

    let (status, _) = send(
      &state,
      "DELETE",
      &format!("/api/candidates/{id}"),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) =
      send(&state, "GET", &format!("/api/candidates/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn candidate_create_requires_name() {
    let state = make_state().await;
    let token = register(&state, "alice").await;

    let (status, _) = send(
      &state,
      "POST",
      "/api/candidates",
      Some(&token),
      Some(json!({ "name": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  // ── Draws & history ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn randomize_draws_and_records_history() {
    let state = make_state().await;
    let token = register(&state, "alice").await;
    let a = create_candidate(&state, &token, "A").await;
    let b = create_candidate(&state, &token, "B").await;
    let project = create_project(&state, &token, "chores", &[a, b]).await;

    let (status, body) = send(
      &state,
      "POST",
      "/api/randomize",
      Some(&token),
      Some(json!({ "project_id": project })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let selected: Uuid = body["candidate_id"].as_str().unwrap().parse().unwrap();
    assert!(selected == a || selected == b, "unexpected winner: {selected}");

    let (status, body) = send(
      &state,
      "GET",
      &format!("/api/history?project_id={project}"),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["candidate_id"].as_str().unwrap().parse::<Uuid>().unwrap(), selected);
    assert_eq!(rows[0]["project_name"], "chores");
  }

  #[tokio::test]
  async fn randomize_empty_project_is_400() {
    let state = make_state().await;
    let token = register(&state, "alice").await;
    let project = create_project(&state, &token, "chores", &[]).await;

    let (status, body) = send(
      &state,
      "POST",
      "/api/randomize",
      Some(&token),
      Some(json!({ "project_id": project })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "no candidates available");
  }

  #[tokio::test]
  async fn randomize_unknown_project_is_404() {
    let state = make_state().await;
    let token = register(&state, "alice").await;

    let (status, _) = send(
      &state,
      "POST",
      "/api/randomize",
      Some(&token),
      Some(json!({ "project_id": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn history_rejects_malformed_project_id() {
    let state = make_state().await;
    let token = register(&state, "alice").await;

    let (status, _) = send(
      &state,
      "GET",
      "/api/history?project_id=not-a-uuid",
      Some(&token),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn deleting_project_deletes_its_history() {
    let state = make_state().await;
    let token = register(&state, "alice").await;
    let a = create_candidate(&state, &token, "A").await;
    let p1 = create_project(&state, &token, "one", &[a]).await;
    let p2 = create_project(&state, &token, "two", &[a]).await;

    for p in [p1, p2] {
      let (status, _) = send(
        &state,
        "POST",
        "/api/randomize",
        Some(&token),
        Some(json!({ "project_id": p })),
      )
      .await;
      assert_eq!(status, StatusCode::OK);
    }

    let (status, _) =
      send(&state, "DELETE", &format!("/api/projects/{p1}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&state, "GET", "/api/history", Some(&token), None).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["project_id"].as_str().unwrap().parse::<Uuid>().unwrap(), p2);
  }

  // ── Photos & avatar ──────────────────────────────────────────────────────

  async fn seed_photos(
    state: &AppState<SqliteStore>,
    candidate_id: Uuid,
    urls: &[&str],
  ) -> Vec<Uuid> {
    let photos = state
      .store
      .add_photos(
        urls
          .iter()
          .map(|u| NewPhoto {
            candidate_id,
            photo_url: (*u).to_string(),
            is_avatar: false,
          })
          .collect(),
      )
      .await
      .unwrap();
    photos.into_iter().map(|p| p.id).collect()
  }

  #[tokio::test]
  async fn set_avatar_flips_flag_and_updates_candidate() {
    let state = make_state().await;
    let token = register(&state, "alice").await;
    let cand = create_candidate(&state, &token, "A").await;
    let ids = seed_photos(&state, cand, &["/uploads/1.png", "/uploads/2.png"]).await;

    let (status, body) = send(
      &state,
      "PUT",
      &format!("/api/candidates/{cand}/avatar"),
      Some(&token),
      Some(json!({ "photo_id": ids[0] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["photo_url"], "/uploads/1.png");

    // Reassign; exactly one photo may carry the flag afterwards.
    let (status, _) = send(
      &state,
      "PUT",
      &format!("/api/candidates/{cand}/avatar"),
      Some(&token),
      Some(json!({ "photo_id": ids[1] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let photos = state.store.list_photos(cand).await.unwrap();
    let avatars: Vec<_> = photos.iter().filter(|p| p.is_avatar).collect();
    assert_eq!(avatars.len(), 1);
    assert_eq!(avatars[0].id, ids[1]);

    let (_, body) =
      send(&state, "GET", &format!("/api/candidates/{cand}"), Some(&token), None).await;
    assert_eq!(body["photo_url"], "/uploads/2.png");
  }

  #[tokio::test]
  async fn set_avatar_with_foreign_photo_is_404() {
    let state = make_state().await;
    let token = register(&state, "alice").await;
    let cand_a = create_candidate(&state, &token, "A").await;
    let cand_b = create_candidate(&state, &token, "B").await;
    let ids = seed_photos(&state, cand_b, &["/uploads/b.png"]).await;

    let (status, _) = send(
      &state,
      "PUT",
      &format!("/api/candidates/{cand_a}/avatar"),
      Some(&token),
      Some(json!({ "photo_id": ids[0] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn deleting_avatar_photo_promotes_next() {
    let state = make_state().await;
    let token = register(&state, "alice").await;
    let cand = create_candidate(&state, &token, "A").await;
    let ids = seed_photos(&state, cand, &["/uploads/1.png", "/uploads/2.png"]).await;

    let (status, _) = send(
      &state,
      "PUT",
      &format!("/api/candidates/{cand}/avatar"),
      Some(&token),
      Some(json!({ "photo_id": ids[0] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
      &state,
      "DELETE",
      &format!("/api/candidates/{cand}/photos/{}", ids[0]),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The remaining photo took over the avatar role.
    let avatar = state.store.get_avatar(cand).await.unwrap().unwrap();
    assert_eq!(avatar.id, ids[1]);
    let (_, body) =
      send(&state, "GET", &format!("/api/candidates/{cand}"), Some(&token), None).await;
    assert_eq!(body["photo_url"], "/uploads/2.png");
  }

  #[tokio::test]
  async fn deleting_last_photo_clears_candidate_photo_url() {
    let state = make_state().await;
    let token = register(&state, "alice").await;
    let cand = create_candidate(&state, &token, "A").await;
    let ids = seed_photos(&state, cand, &["/uploads/only.png"]).await;

    send(
      &state,
      "PUT",
      &format!("/api/candidates/{cand}/avatar"),
      Some(&token),
      Some(json!({ "photo_id": ids[0] })),
    )
    .await;

    let (status, _) = send(
      &state,
      "DELETE",
      &format!("/api/candidates/{cand}/photos/{}", ids[0]),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) =
      send(&state, "GET", &format!("/api/candidates/{cand}"), Some(&token), None).await;
    assert_eq!(body["photo_url"], Value::Null);
  }

  #[tokio::test]
  async fn batch_upload_stores_files_and_promotes_first_avatar() {
    let state = make_state().await;
    let token = register(&state, "alice").await;
    let cand = create_candidate(&state, &token, "A").await;

    let boundary = "drawlot-test-boundary";
    let body = format!(
      "--{boundary}\r\n\
       Content-Disposition: form-data; name=\"photos\"; filename=\"one.png\"\r\n\
       Content-Type: image/png\r\n\r\n\
       fake png bytes\r\n\
       --{boundary}\r\n\
       Content-Disposition: form-data; name=\"photos\"; filename=\"two.png\"\r\n\
       Content-Type: image/png\r\n\r\n\
       more fake bytes\r\n\
       --{boundary}--\r\n"
    );

    let req = Request::builder()
      .method("POST")
      .uri(format!("/api/candidates/{cand}/photos"))
      .header(header::AUTHORIZATION, format!("Bearer {token}"))
      .header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={boundary}"),
      )
      .body(Body::from(body))
      .unwrap();
    let resp = router(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let photos: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(photos.as_array().unwrap().len(), 2);

    // Candidate had no avatar: the first upload was promoted.
    let avatar = state.store.get_avatar(cand).await.unwrap().unwrap();
    let first_url = photos[0]["photo_url"].as_str().unwrap();
    assert_eq!(avatar.photo_url, first_url);

    // The file landed on disk under the upload dir.
    let filename = first_url.strip_prefix("/uploads/").unwrap();
    let on_disk = tokio::fs::read(state.config.upload_dir.join(filename))
      .await
      .unwrap();
    assert_eq!(on_disk, b"fake png bytes");
  }

  #[tokio::test]
  async fn batch_upload_without_files_is_400() {
    let state = make_state().await;
    let token = register(&state, "alice").await;
    let cand = create_candidate(&state, &token, "A").await;

    let boundary = "drawlot-test-boundary";
    let body = format!("--{boundary}--\r\n");
    let req = Request::builder()
      .method("POST")
      .uri(format!("/api/candidates/{cand}/photos"))
      .header(header::AUTHORIZATION, format!("Bearer {token}"))
      .header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={boundary}"),
      )
      .body(Body::from(body))
      .unwrap();
    let resp = router(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }
}
