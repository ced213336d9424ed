//! [`SqliteStore`] — the SQLite implementation of [`ConsentStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use consent_core::{
  catalog::{Category, Cookie, NewCategory, NewCookie},
  decision::{ConsentDecision, NewDecision},
  person::{NewPerson, Person},
  store::ConsentStore,
};

use crate::{
  encode::{
    encode_dt, encode_status, encode_uuid, placeholders, RawCategory,
    RawCookie, RawDecision, RawPerson, CATEGORY_COLUMNS, COOKIE_COLUMNS,
    DECISION_COLUMNS, PERSON_COLUMNS,
  },
  schema::SCHEMA,
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A consent store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Look up people by `column` and apply the size-one rule: anything other
  /// than exactly one match is `None`.
  async fn find_single_person(
    &self,
    column: &'static str,
    value:  String,
  ) -> Result<Option<Person>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {PERSON_COLUMNS} FROM people WHERE {column} = ?1 LIMIT 2"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![value], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    if raws.len() > 1 {
      debug!(column, "person lookup matched more than one row");
    }
    if raws.len() != 1 {
      return Ok(None);
    }
    raws.into_iter().next().map(RawPerson::into_person).transpose()
  }
}

// ─── ConsentStore impl ───────────────────────────────────────────────────────

impl ConsentStore for SqliteStore {
  type Error = crate::Error;

  // ── People ────────────────────────────────────────────────────────────────

  async fn find_person_by_browser(&self, browser_id: &str) -> Result<Option<Person>> {
    self.find_single_person("browser_id", browser_id.to_owned()).await
  }

  async fn find_person_by_account(&self, account_id: &str) -> Result<Option<Person>> {
    self.find_single_person("account_id", account_id.to_owned()).await
  }

  async fn get_person(&self, id: Uuid) -> Result<Option<Person>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PERSON_COLUMNS} FROM people WHERE person_id = ?1"),
            rusqlite::params![id_str],
            RawPerson::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn create_person(&self, input: NewPerson) -> Result<Person> {
    let person = Person {
      person_id:  Uuid::new_v4(),
      account_id: input.account_id,
      browser_id: input.browser_id,
      created_at: Utc::now(),
    };

    let id_str     = encode_uuid(person.person_id);
    let at_str     = encode_dt(person.created_at);
    let account_id = person.account_id.clone();
    let browser_id = person.browser_id.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO people (person_id, account_id, browser_id, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, account_id, browser_id, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(person)
  }

  // ── Catalog ───────────────────────────────────────────────────────────────

  async fn list_categories(&self) -> Result<Vec<Category>> {
    let raws: Vec<RawCategory> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY position, rowid"
        ))?;
        let rows = stmt
          .query_map([], RawCategory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCategory::into_category).collect()
  }

  async fn get_category(&self, id: Uuid) -> Result<Option<Category>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCategory> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE category_id = ?1"),
            rusqlite::params![id_str],
            RawCategory::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCategory::into_category).transpose()
  }

  async fn add_category(&self, input: NewCategory) -> Result<Category> {
    let category_id = Uuid::new_v4();
    let id_str      = encode_uuid(category_id);
    let row         = input.clone();

    let position: i64 = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let position: i64 = tx.query_row(
          "SELECT COALESCE(MAX(position) + 1, 0) FROM categories",
          [],
          |r| r.get(0),
        )?;
        tx.execute(
          "INSERT INTO categories (
             category_id, name, description, mandatory, default_value,
             additional_info, position
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            row.name,
            row.description,
            row.mandatory,
            row.default_value,
            row.additional_info,
            position,
          ],
        )?;
        tx.commit()?;
        Ok(position)
      })
      .await?;

    RawCategory {
      category_id:     encode_uuid(category_id),
      name:            input.name,
      description:     input.description,
      mandatory:       input.mandatory,
      default_value:   input.default_value,
      additional_info: input.additional_info,
      position,
    }
    .into_category()
  }

  async fn add_cookie(&self, input: NewCookie) -> Result<Cookie> {
    let cookie = Cookie {
      cookie_id:   Uuid::new_v4(),
      category_id: input.category_id,
      name:        input.name,
      description: input.description,
    };

    let id_str       = encode_uuid(cookie.cookie_id);
    let category_str = encode_uuid(cookie.category_id);
    let name         = cookie.name.clone();
    let description  = cookie.description.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO cookies (cookie_id, category_id, name, description)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, category_str, name, description],
        )?;
        Ok(())
      })
      .await?;

    Ok(cookie)
  }

  async fn list_cookies(&self, category_ids: Option<&[Uuid]>) -> Result<Vec<Cookie>> {
    let filter: Option<Vec<String>> =
      category_ids.map(|ids| ids.iter().copied().map(encode_uuid).collect());
    if filter.as_ref().is_some_and(Vec::is_empty) {
      return Ok(Vec::new());
    }

    let raws: Vec<RawCookie> = self
      .conn
      .call(move |conn| {
        let rows = match filter {
          Some(ids) => {
            let mut stmt = conn.prepare(&format!(
              "SELECT {COOKIE_COLUMNS} FROM cookies
               WHERE category_id IN ({})
               ORDER BY rowid",
              placeholders(1, ids.len())
            ))?;
            stmt
              .query_map(rusqlite::params_from_iter(ids.iter()), RawCookie::from_row)?
              .collect::<rusqlite::Result<Vec<_>>>()?
          }
          None => {
            let mut stmt = conn.prepare(&format!(
              "SELECT {COOKIE_COLUMNS} FROM cookies ORDER BY rowid"
            ))?;
            stmt
              .query_map([], RawCookie::from_row)?
              .collect::<rusqlite::Result<Vec<_>>>()?
          }
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCookie::into_cookie).collect()
  }

  // ── Ledger ────────────────────────────────────────────────────────────────

  async fn decisions_for_person(
    &self,
    person_id:    Uuid,
    category_ids: Option<&[Uuid]>,
  ) -> Result<Vec<ConsentDecision>> {
    let person_str = encode_uuid(person_id);
    let filter: Option<Vec<String>> =
      category_ids.map(|ids| ids.iter().copied().map(encode_uuid).collect());
    if filter.as_ref().is_some_and(Vec::is_empty) {
      return Ok(Vec::new());
    }

    let raws: Vec<RawDecision> = self
      .conn
      .call(move |conn| {
        let (sql, params) = match filter {
          Some(ids) => {
            let sql = format!(
              "SELECT {DECISION_COLUMNS} FROM decisions
               WHERE person_id = ?1 AND category_id IN ({})
               ORDER BY rowid",
              placeholders(2, ids.len())
            );
            let mut params = Vec::with_capacity(ids.len() + 1);
            params.push(person_str);
            params.extend(ids);
            (sql, params)
          }
          None => (
            format!(
              "SELECT {DECISION_COLUMNS} FROM decisions
               WHERE person_id = ?1
               ORDER BY rowid"
            ),
            vec![person_str],
          ),
        };

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawDecision::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDecision::into_decision).collect()
  }

  async fn record_decisions(&self, batch: Vec<NewDecision>) -> Result<Vec<ConsentDecision>> {
    let recorded_at = Utc::now();
    let decisions: Vec<ConsentDecision> = batch
      .into_iter()
      .map(|d| ConsentDecision {
        decision_id:     Uuid::new_v4(),
        person_id:       d.person_id,
        category_id:     d.category_id,
        status:          d.status,
        capture_source:  d.capture_source,
        capture_channel: d.capture_channel,
        recorded_at,
      })
      .collect();

    let rows: Vec<_> = decisions
      .iter()
      .map(|d| {
        (
          encode_uuid(d.decision_id),
          encode_uuid(d.person_id),
          encode_uuid(d.category_id),
          encode_status(d.status),
          d.capture_source.clone(),
          d.capture_channel.clone(),
          encode_dt(d.recorded_at),
        )
      })
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO decisions (
               decision_id, person_id, category_id, status,
               capture_source, capture_channel, recorded_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          )?;
          for (id, person, category, status, source, channel, at) in rows {
            stmt.execute(rusqlite::params![
              id, person, category, status, source, channel, at
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(decisions)
  }
}
