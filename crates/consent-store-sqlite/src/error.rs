//! Error type for `consent-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown consent status: {0:?}")]
  UnknownStatus(String),

  #[error("stored value out of range: {0}")]
  Range(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
