//! [`ConsentResolver`] — the consent operations invoked by the prompt UI.
//!
//! Every operation is a short sequence of store reads and writes. The
//! resolver holds no state of its own beyond shared handles to the store and
//! the access policy, so one instance serves all requests.

use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  caller::Caller,
  catalog::Cookie,
  decision::{ConsentStatus, DecisionInput, NewDecision},
  error::Error,
  person::{NewPerson, Person},
  policy::{AccessPolicy, AllowAll, Redact},
  store::ConsentStore,
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// An error from a resolver operation: either a domain failure or a failure
/// of the underlying store.
#[derive(Debug, Error)]
pub enum ServiceError<E: std::error::Error + 'static> {
  #[error(transparent)]
  Domain(#[from] Error),

  #[error("store error: {0}")]
  Store(#[source] E),
}

pub type ServiceResult<T, E> = std::result::Result<T, ServiceError<E>>;

// ─── Prompt data ─────────────────────────────────────────────────────────────

/// Disclosure indicator for a prompt section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chevron {
  Down,
  Right,
}

/// Everything the consent prompt needs to render one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPrompt {
  pub category_id:     Uuid,
  pub name:            String,
  pub description:     String,
  pub mandatory:       bool,
  pub default_value:   bool,
  pub additional_info: Option<String>,
  pub cookies:         Vec<Cookie>,
  /// Only the first section starts expanded.
  pub expanded:        bool,
  pub chevron:         Chevron,
}

// ─── Capture metadata ────────────────────────────────────────────────────────

/// Stamped onto every decision the resolver records.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Capture {
  pub source:  Option<String>,
  pub channel: Option<String>,
}

impl Default for Capture {
  fn default() -> Self {
    Self { source: Some("community".to_owned()), channel: Some("web".to_owned()) }
  }
}

// ─── Resolver ────────────────────────────────────────────────────────────────

pub struct ConsentResolver<S> {
  pub(crate) store: Arc<S>,
  policy:           Arc<dyn AccessPolicy>,
  capture:          Capture,
}

impl<S: ConsentStore> ConsentResolver<S> {
  /// A resolver that permits every field and uses the default capture
  /// metadata.
  pub fn new(store: Arc<S>) -> Self {
    Self { store, policy: Arc::new(AllowAll), capture: Capture::default() }
  }

  pub fn with_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
    self.policy = policy;
    self
  }

  pub fn with_capture(mut self, capture: Capture) -> Self {
    self.capture = capture;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  /// Find the person behind `browser_id`, creating one if needed.
  ///
  /// 1. A person already carrying the browser id wins.
  /// 2. A member caller gets their account's person, created with the
  ///    browser id if the account has none yet.
  /// 3. Anyone else gets a new anonymous person keyed by the browser id.
  ///
  /// An empty browser id resolves to `None` and creates nothing.
  pub async fn resolve_person(
    &self,
    caller: &Caller,
    browser_id: &str,
  ) -> ServiceResult<Option<Person>, S::Error> {
    if browser_id.is_empty() {
      return Ok(None);
    }

    if let Some(person) = self
      .store
      .find_person_by_browser(browser_id)
      .await
      .map_err(ServiceError::Store)?
    {
      debug!(person_id = %person.person_id, "matched person by browser id");
      return Ok(Some(person));
    }

    let input = match caller.account_id() {
      Some(account_id) => {
        if let Some(person) = self
          .store
          .find_person_by_account(account_id)
          .await
          .map_err(ServiceError::Store)?
        {
          debug!(person_id = %person.person_id, "matched person by account");
          return Ok(Some(person));
        }
        NewPerson::for_account(account_id, browser_id)
      }
      None => NewPerson::anonymous(browser_id),
    };

    self.create_person(caller, input).await
  }

  /// Insert a person after applying the access policy.
  ///
  /// A person left with neither a browser id nor an account could never be
  /// found again, so nothing is inserted in that case.
  async fn create_person(
    &self,
    caller: &Caller,
    mut input: NewPerson,
  ) -> ServiceResult<Option<Person>, S::Error> {
    let dropped = input.redact(self.policy.as_ref(), caller);
    if !dropped.is_empty() {
      debug!(caller = %caller.kind(), ?dropped, "dropped person fields");
    }
    if input.account_id.is_none() && input.browser_id.is_none() {
      debug!(caller = %caller.kind(), "person would be unaddressable; not created");
      return Ok(None);
    }

    let person = self
      .store
      .create_person(input)
      .await
      .map_err(ServiceError::Store)?;
    info!(
      person_id = %person.person_id,
      caller = %caller.kind(),
      linked = person.account_id.is_some(),
      "created person"
    );
    Ok(Some(person))
  }

  /// Resolve the person for `browser_id` and report whether they have a
  /// decision on file for every category.
  ///
  /// This checks coverage only: a declined category counts the same as an
  /// agreed one.
  pub async fn verify_browser_id(
    &self,
    caller: &Caller,
    browser_id: &str,
  ) -> ServiceResult<bool, S::Error> {
    let Some(person) = self.resolve_person(caller, browser_id).await? else {
      return Ok(false);
    };

    let categories =
      self.store.list_categories().await.map_err(ServiceError::Store)?;
    let category_ids: Vec<Uuid> =
      categories.iter().map(|c| c.category_id).collect();

    let decisions = self
      .store
      .decisions_for_person(person.person_id, Some(category_ids.as_slice()))
      .await
      .map_err(ServiceError::Store)?;

    Ok(decisions.len() >= categories.len())
  }

  /// Names of every cookie in a category the visitor has declined.
  ///
  /// An unknown browser id yields an empty list.
  pub async fn cookies_to_drop(
    &self,
    browser_id: &str,
  ) -> ServiceResult<Vec<String>, S::Error> {
    if browser_id.is_empty() {
      return Ok(Vec::new());
    }
    let Some(person) = self
      .store
      .find_person_by_browser(browser_id)
      .await
      .map_err(ServiceError::Store)?
    else {
      return Ok(Vec::new());
    };

    let mut declined: Vec<Uuid> = self
      .store
      .decisions_for_person(person.person_id, None)
      .await
      .map_err(ServiceError::Store)?
      .into_iter()
      .filter(|d| d.status == Some(ConsentStatus::Declined))
      .map(|d| d.category_id)
      .collect();
    declined.sort_unstable();
    declined.dedup();

    if declined.is_empty() {
      return Ok(Vec::new());
    }

    let cookies = self
      .store
      .list_cookies(Some(declined.as_slice()))
      .await
      .map_err(ServiceError::Store)?;
    Ok(cookies.into_iter().map(|c| c.name).collect())
  }

  /// The full catalog shaped for the consent prompt, in catalog order.
  pub async fn cookie_data(&self) -> ServiceResult<Vec<CategoryPrompt>, S::Error> {
    let categories =
      self.store.list_categories().await.map_err(ServiceError::Store)?;
    let cookies = self
      .store
      .list_cookies(None)
      .await
      .map_err(ServiceError::Store)?;

    let mut by_category: HashMap<Uuid, Vec<Cookie>> = HashMap::new();
    for cookie in cookies {
      by_category.entry(cookie.category_id).or_default().push(cookie);
    }

    Ok(
      categories
        .into_iter()
        .enumerate()
        .map(|(i, c)| {
          let first = i == 0;
          CategoryPrompt {
            cookies:         by_category.remove(&c.category_id).unwrap_or_default(),
            category_id:     c.category_id,
            name:            c.name,
            description:     c.description,
            mandatory:       c.mandatory,
            default_value:   c.default_value,
            additional_info: c.additional_info,
            expanded:        first,
            chevron:         if first { Chevron::Down } else { Chevron::Right },
          }
        })
        .collect(),
    )
  }

  /// Record one decision per submitted category for an existing person.
  ///
  /// Fails with [`Error::PersonNotFound`] if no person carries `browser_id`
  /// and with [`Error::CategoryNotFound`] if any category is unknown; in both
  /// cases nothing is written.
  pub async fn record_decisions(
    &self,
    caller: &Caller,
    browser_id: &str,
    decisions: &[DecisionInput],
  ) -> ServiceResult<bool, S::Error> {
    let person = if browser_id.is_empty() {
      None
    } else {
      self
        .store
        .find_person_by_browser(browser_id)
        .await
        .map_err(ServiceError::Store)?
    };
    let Some(person) = person else {
      warn!(browser_id, "consent submitted for unknown browser id");
      return Err(Error::PersonNotFound(browser_id.to_owned()).into());
    };

    let mut batch = Vec::with_capacity(decisions.len());
    for input in decisions {
      let category = self
        .store
        .get_category(input.category_id)
        .await
        .map_err(ServiceError::Store)?;
      let Some(category) = category else {
        warn!(category_id = %input.category_id, "consent submitted for unknown category");
        return Err(Error::CategoryNotFound(input.category_id).into());
      };

      let status = ConsentStatus::from_prompt_value(&input.value);
      if status.is_none() {
        debug!(value = %input.value, category = %category.name, "unrecognised prompt value");
      }

      let mut decision = NewDecision {
        person_id: person.person_id,
        category_id: category.category_id,
        status,
        capture_source: self.capture.source.clone(),
        capture_channel: self.capture.channel.clone(),
      };
      let dropped = decision.redact(self.policy.as_ref(), caller);
      if !dropped.is_empty() {
        debug!(caller = %caller.kind(), ?dropped, "dropped decision fields");
      }
      batch.push(decision);
    }

    let recorded = self
      .store
      .record_decisions(batch)
      .await
      .map_err(ServiceError::Store)?;
    info!(
      person_id = %person.person_id,
      count = recorded.len(),
      "recorded consent decisions"
    );
    Ok(true)
  }
}
