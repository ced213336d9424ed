//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, UUIDs as hyphenated lowercase
//! strings and consent statuses as their lowercase names.

use chrono::{DateTime, Utc};
use consent_core::{
  catalog::{Category, Cookie},
  decision::{ConsentDecision, ConsentStatus},
  person::Person,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── ConsentStatus ────────────────────────────────────────────────────────────

pub fn encode_status(status: Option<ConsentStatus>) -> Option<&'static str> {
  status.map(<&'static str>::from)
}

pub fn decode_status(s: Option<&str>) -> Result<Option<ConsentStatus>> {
  s.map(|s| {
    s.parse::<ConsentStatus>()
      .map_err(|_| Error::UnknownStatus(s.to_owned()))
  })
  .transpose()
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const PERSON_COLUMNS: &str = "person_id, account_id, browser_id, created_at";

/// Raw strings read directly from a `people` row.
pub struct RawPerson {
  pub person_id:  String,
  pub account_id: Option<String>,
  pub browser_id: Option<String>,
  pub created_at: String,
}

impl RawPerson {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:  row.get(0)?,
      account_id: row.get(1)?,
      browser_id: row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      person_id:  decode_uuid(&self.person_id)?,
      account_id: self.account_id,
      browser_id: self.browser_id,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const CATEGORY_COLUMNS: &str =
  "category_id, name, description, mandatory, default_value, additional_info, position";

/// Raw values read directly from a `categories` row.
pub struct RawCategory {
  pub category_id:     String,
  pub name:            String,
  pub description:     String,
  pub mandatory:       bool,
  pub default_value:   bool,
  pub additional_info: Option<String>,
  pub position:        i64,
}

impl RawCategory {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      category_id:     row.get(0)?,
      name:            row.get(1)?,
      description:     row.get(2)?,
      mandatory:       row.get(3)?,
      default_value:   row.get(4)?,
      additional_info: row.get(5)?,
      position:        row.get(6)?,
    })
  }

  pub fn into_category(self) -> Result<Category> {
    Ok(Category {
      category_id:     decode_uuid(&self.category_id)?,
      name:            self.name,
      description:     self.description,
      mandatory:       self.mandatory,
      default_value:   self.default_value,
      additional_info: self.additional_info,
      position:        u32::try_from(self.position)
        .map_err(|_| Error::Range(format!("category position {}", self.position)))?,
    })
  }
}

pub const COOKIE_COLUMNS: &str = "cookie_id, category_id, name, description";

/// Raw strings read directly from a `cookies` row.
pub struct RawCookie {
  pub cookie_id:   String,
  pub category_id: String,
  pub name:        String,
  pub description: Option<String>,
}

impl RawCookie {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      cookie_id:   row.get(0)?,
      category_id: row.get(1)?,
      name:        row.get(2)?,
      description: row.get(3)?,
    })
  }

  pub fn into_cookie(self) -> Result<Cookie> {
    Ok(Cookie {
      cookie_id:   decode_uuid(&self.cookie_id)?,
      category_id: decode_uuid(&self.category_id)?,
      name:        self.name,
      description: self.description,
    })
  }
}

pub const DECISION_COLUMNS: &str = "decision_id, person_id, category_id, status, \
                                    capture_source, capture_channel, recorded_at";

/// Raw strings read directly from a `decisions` row.
pub struct RawDecision {
  pub decision_id:     String,
  pub person_id:       String,
  pub category_id:     String,
  pub status:          Option<String>,
  pub capture_source:  Option<String>,
  pub capture_channel: Option<String>,
  pub recorded_at:     String,
}

impl RawDecision {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      decision_id:     row.get(0)?,
      person_id:       row.get(1)?,
      category_id:     row.get(2)?,
      status:          row.get(3)?,
      capture_source:  row.get(4)?,
      capture_channel: row.get(5)?,
      recorded_at:     row.get(6)?,
    })
  }

  pub fn into_decision(self) -> Result<ConsentDecision> {
    Ok(ConsentDecision {
      decision_id:     decode_uuid(&self.decision_id)?,
      person_id:       decode_uuid(&self.person_id)?,
      category_id:     decode_uuid(&self.category_id)?,
      status:          decode_status(self.status.as_deref())?,
      capture_source:  self.capture_source,
      capture_channel: self.capture_channel,
      recorded_at:     decode_dt(&self.recorded_at)?,
    })
  }
}

/// `?N, ?N+1, ...` placeholders for an `IN (...)` list of `count` values,
/// numbered from `first`.
pub fn placeholders(first: usize, count: usize) -> String {
  (first..first + count)
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ")
}
