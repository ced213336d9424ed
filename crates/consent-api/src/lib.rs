//! JSON REST API for the consent service.
//!
//! Exposes axum [`Router`]s backed by a [`ConsentResolver`] over any
//! [`ConsentStore`]. Auth, TLS, and transport concerns are the caller's
//! responsibility: the authenticating layer attaches a
//! [`Caller`](consent_core::caller::Caller) to each request, and should guard
//! [`admin_router`] however it sees fit.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", consent_api::api_router(state.clone()))
//! ```

pub mod caller;
pub mod catalog;
pub mod consent;
pub mod error;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use consent_core::{service::ConsentResolver, store::ConsentStore};

pub use caller::CurrentCaller;
pub use error::ApiError;

/// Shared state for the API handlers.
pub struct ApiState<S> {
  pub resolver:       Arc<ConsentResolver<S>>,
  /// `max-age` in seconds advertised on `/cookie-data`.
  pub prompt_max_age: u64,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      resolver:       Arc::clone(&self.resolver),
      prompt_max_age: self.prompt_max_age,
    }
  }
}

/// Build the prompt-facing router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: ConsentStore + 'static,
{
  Router::new()
    .route("/verify-browser-id", post(consent::verify::<S>))
    .route("/cookies-to-drop", get(consent::cookies_to_drop::<S>))
    .route("/cookie-data", get(consent::cookie_data::<S>))
    .route("/consent-records", post(consent::record::<S>))
    .with_state(state)
}

/// Build the administration router (catalog and ledger inspection).
pub fn admin_router<S>(state: ApiState<S>) -> Router<()>
where
  S: ConsentStore + 'static,
{
  Router::new()
    .route("/categories", get(catalog::list::<S>).post(catalog::create::<S>))
    .route("/categories/{id}/cookies", post(catalog::add_cookie::<S>))
    .route("/people/{id}/decisions", get(catalog::history::<S>))
    .with_state(state)
}
