//! Bearer-token auth: JWT issuing/verification, the `CurrentUser` extractor,
//! and handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/register` | Body: `{"username","password"}`; 400 on validation/duplicate |
//! | `POST` | `/auth/login` | 401 on bad credentials |
//! | `GET`  | `/auth/me` | Requires a valid token |
//!
//! Tokens are HS256 with the user id in `sub`. Passwords are hashed with
//! argon2; the PHC string is stored and never serialized into responses.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  Json,
  extract::{FromRequestParts, State},
  http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use drawlot_core::{
  store::RecordStore,
  user::{NewUser, User},
};

use crate::{AppState, error::ApiError};

// ─── Token handling ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
  /// The authenticated user id.
  sub: String,
  iat: i64,
  exp: i64,
}

/// HS256 key pair plus token lifetime, built once at startup from config.
pub struct AuthKeys {
  encoding: EncodingKey,
  decoding: DecodingKey,
  ttl_days: i64,
}

impl AuthKeys {
  pub fn new(secret: &str, ttl_days: i64) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      ttl_days,
    }
  }

  /// Issue a token for `user_id`.
  pub fn issue(&self, user_id: Uuid) -> Result<String, ApiError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
      sub: user_id.hyphenated().to_string(),
      iat: now,
      exp: now + self.ttl_days * 24 * 60 * 60,
    };
    jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
      .map_err(|e| ApiError::Internal(format!("token encoding failed: {e}")))
  }

  /// Verify a token and return the embedded user id. Expiry is checked by
  /// the default validation.
  pub fn verify(&self, token: &str) -> Result<Uuid, ApiError> {
    let data = jsonwebtoken::decode::<Claims>(
      token,
      &self.decoding,
      &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?;
    Uuid::parse_str(&data.claims.sub).map_err(|_| ApiError::Unauthorized)
  }
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The authenticated caller; present in a handler means the request carried
/// a valid `Authorization: Bearer <jwt>` header.
pub struct CurrentUser(pub Uuid);

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let header_val = parts
      .headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthorized)?;

    let token = header_val
      .strip_prefix("Bearer ")
      .ok_or(ApiError::Unauthorized)?;

    let user_id = state.auth.verify(token)?;
    Ok(CurrentUser(user_id))
  }
}

// ─── Password hashing ────────────────────────────────────────────────────────

fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

fn verify_password(hash: &str, password: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

// ─── Handlers ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub username: String,
  pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub username: String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
  pub token: String,
  pub user:  User,
}

/// `POST /auth/register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<Json<AuthResponse>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let username = body.username.trim().to_string();
  if username.chars().count() < 3 || username.chars().count() > 50 {
    return Err(ApiError::BadRequest(
      "username must be 3-50 characters".into(),
    ));
  }
  if body.password.chars().count() < 6 {
    return Err(ApiError::BadRequest(
      "password must be at least 6 characters".into(),
    ));
  }

  let existing = state
    .store
    .get_user_by_username(username.clone())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if existing.is_some() {
    return Err(ApiError::BadRequest("username already taken".into()));
  }

  let user = state
    .store
    .create_user(NewUser {
      username,
      password_hash: hash_password(&body.password)?,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  tracing::info!(user_id = %user.id, username = %user.username, "user registered");

  let token = state.auth.issue(user.id)?;
  Ok(Json(AuthResponse { token, user }))
}

/// `POST /auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<AuthResponse>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let user = state
    .store
    .get_user_by_username(body.username)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(ApiError::Unauthorized)?;

  if !verify_password(&user.password_hash, &body.password) {
    return Err(ApiError::Unauthorized);
  }

  let token = state.auth.issue(user.id)?;
  Ok(Json(AuthResponse { token, user }))
}

/// `GET /auth/me`
pub async fn me<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
) -> Result<Json<User>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let user = state
    .store
    .get_user(user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    // A valid token for a vanished user is treated as unauthenticated.
    .ok_or(ApiError::Unauthorized)?;
  Ok(Json(user))
}
