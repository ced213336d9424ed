//! Consent decisions — the append-only ledger of agree/decline choices.
//!
//! A decision is never updated or deleted. Submitting a new choice for the
//! same category adds another row; nothing supersedes earlier rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The recorded outcome of a consent prompt for one category.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConsentStatus {
  Agreed,
  Declined,
}

impl ConsentStatus {
  /// Interpret the prompt's checkbox value.
  ///
  /// Only the exact strings `"true"` and `"false"` carry a status; anything
  /// else yields `None` and the decision is stored without one.
  pub fn from_prompt_value(value: &str) -> Option<Self> {
    match value {
      "true" => Some(Self::Agreed),
      "false" => Some(Self::Declined),
      _ => None,
    }
  }
}

/// A persisted consent decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentDecision {
  pub decision_id:     Uuid,
  pub person_id:       Uuid,
  pub category_id:     Uuid,
  pub status:          Option<ConsentStatus>,
  /// Where the decision was captured, e.g. the community name.
  pub capture_source:  Option<String>,
  /// How the decision was captured, e.g. `web`.
  pub capture_channel: Option<String>,
  /// Server-assigned timestamp.
  pub recorded_at:     DateTime<Utc>,
}

/// Input to [`crate::store::ConsentStore::record_decisions`].
/// `recorded_at` is always set by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDecision {
  pub person_id:       Uuid,
  pub category_id:     Uuid,
  pub status:          Option<ConsentStatus>,
  pub capture_source:  Option<String>,
  pub capture_channel: Option<String>,
}

/// One entry of a consent submission as sent by the prompt UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionInput {
  pub category_id: Uuid,
  /// `"true"` to agree, `"false"` to decline.
  pub value:       String,
}
