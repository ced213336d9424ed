//! HTTP server for the consent service.
//!
//! Wires the JSON API from `consent-api` to a concrete store, authenticates
//! requests into a [`Caller`](consent_core::caller::Caller) and guards the
//! admin routes.

pub mod auth;
pub mod error;
pub mod seed;

pub use error::Error;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Router, middleware};
use consent_api::{ApiState, admin_router, api_router};
use consent_core::{
  policy::FieldPolicy,
  service::{Capture, ConsentResolver},
  store::ConsentStore,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, Credential, attach_caller, require_admin};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:           String,
  #[serde(default = "default_port")]
  pub port:           u16,
  pub store_path:     PathBuf,
  /// Capture source and channel stamped on every recorded decision.
  #[serde(default)]
  pub capture:        Capture,
  /// `max-age` in seconds for the prompt data endpoint.
  #[serde(default = "default_prompt_max_age")]
  pub prompt_max_age: u64,
  #[serde(default)]
  pub credentials:    Vec<Credential>,
  /// Fields each caller kind may not set on new records.
  #[serde(default)]
  pub policy:         FieldPolicy,
}

impl ServerConfig {
  /// Read `path` if it exists, overridden by `CONSENT_*` environment
  /// variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    Self::from_source(config::File::from(path).required(false))
  }

  fn from_source<T>(file: T) -> Result<Self, config::ConfigError>
  where
    T: config::Source + Send + Sync + 'static,
  {
    config::Config::builder()
      .add_source(file)
      .add_source(config::Environment::with_prefix("CONSENT"))
      .build()?
      .try_deserialize()
  }
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_prompt_max_age() -> u64 { 300 }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the router.
pub struct AppState<S> {
  pub api:  ApiState<S>,
  pub auth: Arc<AuthConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { api: self.api.clone(), auth: Arc::clone(&self.auth) }
  }
}

impl<S: ConsentStore> AppState<S> {
  /// Build the resolver and auth state for `store` from `config`.
  pub fn new(store: Arc<S>, config: &ServerConfig) -> Self {
    let resolver = ConsentResolver::new(store)
      .with_policy(Arc::new(config.policy.clone()))
      .with_capture(config.capture.clone());

    Self {
      api:  ApiState {
        resolver:       Arc::new(resolver),
        prompt_max_age: config.prompt_max_age,
      },
      auth: Arc::new(AuthConfig { credentials: config.credentials.clone() }),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router, mounted under `/api`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ConsentStore + 'static,
{
  let admin = admin_router(state.api.clone())
    .route_layer(middleware::from_fn(require_admin));

  Router::new()
    .nest("/api", api_router(state.api).merge(admin))
    .layer(middleware::from_fn_with_state(state.auth, attach_caller))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
