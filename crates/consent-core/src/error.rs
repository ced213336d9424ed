//! Error types for `consent-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("no person is registered for browser id {0:?}")]
  PersonNotFound(String),

  #[error("person not found: {0}")]
  UnknownPerson(Uuid),

  #[error("category not found: {0}")]
  CategoryNotFound(Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
