//! HTTP Basic-auth middleware that turns credentials into a [`Caller`].
//!
//! Requests without an `Authorization` header are guests. Requests with a
//! header must carry valid credentials; anything else is rejected with 401.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use consent_core::caller::Caller;
use rand_core::OsRng;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::Error;

/// What a set of credentials is allowed to act as.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Role {
  /// May use the admin routes; acts as a service identity elsewhere.
  Admin,
  Service,
  Member { account_id: String },
}

/// One accepted username/password pair.
#[derive(Debug, Clone, Deserialize)]
pub struct Credential {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  #[serde(flatten)]
  pub role:          Role,
}

/// Credentials accepted as valid for this server instance.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
  pub credentials: Vec<Credential>,
}

/// Hash `password` into the PHC string stored in a `[[credentials]]` entry.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Request extension marking an authenticated admin.
#[derive(Debug, Clone, Copy)]
pub struct AdminAccess;

/// Verify credentials from headers.
///
/// Returns `Ok(None)` when no `Authorization` header is present.
pub fn authenticate<'a>(
  headers: &HeaderMap,
  config: &'a AuthConfig,
) -> Result<Option<&'a Credential>, Error> {
  let Some(header_val) = headers.get(axum::http::header::AUTHORIZATION) else {
    return Ok(None);
  };
  let header_val = header_val.to_str().map_err(|_| Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  let credential = config
    .credentials
    .iter()
    .find(|c| c.username == username)
    .ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&credential.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(Some(credential))
}

/// Attach the request's [`Caller`] (and [`AdminAccess`] for admins).
pub async fn attach_caller(
  State(auth): State<Arc<AuthConfig>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error> {
  let caller = match authenticate(req.headers(), &auth)? {
    None => Caller::Guest,
    Some(credential) => match &credential.role {
      Role::Admin => {
        req.extensions_mut().insert(AdminAccess);
        Caller::Service { name: credential.username.clone() }
      }
      Role::Service => Caller::Service { name: credential.username.clone() },
      Role::Member { account_id } => {
        Caller::Member { account_id: account_id.clone() }
      }
    },
  };
  tracing::debug!(caller = %caller.kind(), "authenticated request");
  req.extensions_mut().insert(caller);
  Ok(next.run(req).await)
}

/// Reject requests that did not authenticate as an admin.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, Error> {
  if req.extensions().get::<AdminAccess>().is_some() {
    return Ok(next.run(req).await);
  }
  match req.extensions().get::<Caller>() {
    None | Some(Caller::Guest) => Err(Error::Unauthorized),
    Some(_) => Err(Error::Forbidden),
  }
}
