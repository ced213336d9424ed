//! Extractor for the [`Caller`] attached to a request.
//!
//! Authentication is not this crate's concern: whatever layer authenticates
//! the request inserts a [`Caller`] into the request extensions. Requests
//! without one are treated as guests.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use consent_core::caller::Caller;

pub struct CurrentCaller(pub Caller);

impl<St: Send + Sync> FromRequestParts<St> for CurrentCaller {
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &St,
  ) -> Result<Self, Self::Rejection> {
    Ok(CurrentCaller(
      parts.extensions.get::<Caller>().cloned().unwrap_or_default(),
    ))
  }
}
