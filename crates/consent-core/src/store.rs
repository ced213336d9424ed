//! The `ConsentStore` trait.
//!
//! One trait covers the person directory, the category catalog and the
//! consent ledger. It is implemented by storage backends (e.g.
//! `consent-store-sqlite`); the resolver depends on this abstraction only.

use std::future::Future;

use uuid::Uuid;

use crate::{
  catalog::{Category, Cookie, NewCategory, NewCookie},
  decision::{ConsentDecision, NewDecision},
  person::{NewPerson, Person},
};

/// Abstraction over a consent store backend.
///
/// Lookups by browser id or account id follow a size-one convention: when
/// zero or several rows match, the result is `None`.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ConsentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── People ────────────────────────────────────────────────────────────

  /// The single person carrying `browser_id`.
  fn find_person_by_browser<'a>(
    &'a self,
    browser_id: &'a str,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + 'a;

  /// The single person linked to `account_id`.
  fn find_person_by_account<'a>(
    &'a self,
    account_id: &'a str,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + 'a;

  fn get_person(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Create and persist a new person. The id and timestamp are assigned by
  /// the store.
  fn create_person(
    &self,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  // ── Catalog ───────────────────────────────────────────────────────────

  /// All categories in catalog order.
  fn list_categories(
    &self,
  ) -> impl Future<Output = Result<Vec<Category>, Self::Error>> + Send + '_;

  fn get_category(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Category>, Self::Error>> + Send + '_;

  /// Append a category at the end of the catalog.
  fn add_category(
    &self,
    input: NewCategory,
  ) -> impl Future<Output = Result<Category, Self::Error>> + Send + '_;

  /// Add a cookie to an existing category.
  fn add_cookie(
    &self,
    input: NewCookie,
  ) -> impl Future<Output = Result<Cookie, Self::Error>> + Send + '_;

  /// Cookies belonging to any of `category_ids`, or every cookie when `None`.
  fn list_cookies<'a>(
    &'a self,
    category_ids: Option<&'a [Uuid]>,
  ) -> impl Future<Output = Result<Vec<Cookie>, Self::Error>> + Send + 'a;

  // ── Ledger ────────────────────────────────────────────────────────────

  /// Decisions made by `person_id`, oldest first, optionally restricted to
  /// `category_ids`.
  fn decisions_for_person<'a>(
    &'a self,
    person_id: Uuid,
    category_ids: Option<&'a [Uuid]>,
  ) -> impl Future<Output = Result<Vec<ConsentDecision>, Self::Error>> + Send + 'a;

  /// Append a batch of decisions atomically. The ids and `recorded_at`
  /// timestamps are assigned by the store.
  fn record_decisions(
    &self,
    batch: Vec<NewDecision>,
  ) -> impl Future<Output = Result<Vec<ConsentDecision>, Self::Error>> + Send + '_;
}
