//! The category catalog: cookie categories and the cookies they group.
//!
//! The resolver only reads the catalog. Categories and cookies are created
//! through the admin operations in [`crate::admin`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Category ────────────────────────────────────────────────────────────────

/// A group of cookies that share one consent decision, e.g. "Marketing".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub category_id:     Uuid,
  pub name:            String,
  pub description:     String,
  /// Mandatory categories cannot be declined in the prompt.
  pub mandatory:       bool,
  /// The pre-selected value shown in the prompt.
  pub default_value:   bool,
  pub additional_info: Option<String>,
  /// Zero-based catalog order.
  pub position:        u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCategory {
  pub name:            String,
  #[serde(default)]
  pub description:     String,
  #[serde(default)]
  pub mandatory:       bool,
  #[serde(default)]
  pub default_value:   bool,
  pub additional_info: Option<String>,
}

// ─── Cookie ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
  pub cookie_id:   Uuid,
  pub category_id: Uuid,
  /// The cookie name as set in the browser.
  pub name:        String,
  pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCookie {
  pub category_id: Uuid,
  pub name:        String,
  pub description: Option<String>,
}
