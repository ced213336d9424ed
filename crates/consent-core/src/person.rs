//! Person — the identity that consent decisions attach to.
//!
//! A person is either an anonymous visitor known only by a browser id, or a
//! community member linked to an account. People are never updated after
//! creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub person_id:  Uuid,
  /// The community account this person belongs to, if any.
  pub account_id: Option<String>,
  /// Opaque per-browser identifier for recognising returning visitors.
  pub browser_id: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::ConsentStore::create_person`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPerson {
  pub account_id: Option<String>,
  pub browser_id: Option<String>,
}

impl NewPerson {
  /// An anonymous visitor keyed only by browser id.
  pub fn anonymous(browser_id: impl Into<String>) -> Self {
    Self { account_id: None, browser_id: Some(browser_id.into()) }
  }

  /// A member-linked person that also carries the browser id it was first
  /// seen with.
  pub fn for_account(
    account_id: impl Into<String>,
    browser_id: impl Into<String>,
  ) -> Self {
    Self {
      account_id: Some(account_id.into()),
      browser_id: Some(browser_id.into()),
    }
  }
}
