//! The identity of whoever invoked an operation.
//!
//! Passed explicitly into every resolver call that depends on it; the HTTP
//! layer builds it from the request's credentials.

use serde::{Deserialize, Serialize};

/// The kind of caller, without any identifying payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum CallerKind {
  Guest,
  Service,
  Member,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Caller {
  /// An unauthenticated site visitor.
  #[default]
  Guest,
  /// A generic integration identity that is not a community member.
  Service { name: String },
  /// A signed-in community member.
  Member { account_id: String },
}

impl Caller {
  pub fn kind(&self) -> CallerKind {
    match self {
      Self::Guest => CallerKind::Guest,
      Self::Service { .. } => CallerKind::Service,
      Self::Member { .. } => CallerKind::Member,
    }
  }

  /// The linked account, present only for members.
  pub fn account_id(&self) -> Option<&str> {
    match self {
      Self::Member { account_id } => Some(account_id),
      _ => None,
    }
  }
}
