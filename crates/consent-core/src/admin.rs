//! Catalog administration and ledger inspection.
//!
//! These operations sit beside the prompt-facing ones in
//! [`crate::service`] but are meant for operators, not visitors.

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
  catalog::{Category, Cookie, NewCategory, NewCookie},
  decision::ConsentDecision,
  error::Error,
  service::{ConsentResolver, ServiceError, ServiceResult},
  store::ConsentStore,
};

/// A category together with its cookies, as accepted by
/// [`ConsentResolver::seed_category`].
#[derive(Debug, Clone, Deserialize)]
pub struct CategorySeed {
  #[serde(flatten)]
  pub category: NewCategory,
  #[serde(default)]
  pub cookies:  Vec<CookieSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieSeed {
  pub name:        String,
  pub description: Option<String>,
}

impl<S: ConsentStore> ConsentResolver<S> {
  pub async fn categories(&self) -> ServiceResult<Vec<Category>, S::Error> {
    self.store.list_categories().await.map_err(ServiceError::Store)
  }

  pub async fn add_category(
    &self,
    input: NewCategory,
  ) -> ServiceResult<Category, S::Error> {
    let category =
      self.store.add_category(input).await.map_err(ServiceError::Store)?;
    info!(category_id = %category.category_id, name = %category.name, "added category");
    Ok(category)
  }

  pub async fn add_cookie(
    &self,
    input: NewCookie,
  ) -> ServiceResult<Cookie, S::Error> {
    self
      .store
      .get_category(input.category_id)
      .await
      .map_err(ServiceError::Store)?
      .ok_or(Error::CategoryNotFound(input.category_id))?;
    let cookie = self.store.add_cookie(input).await.map_err(ServiceError::Store)?;
    info!(cookie_id = %cookie.cookie_id, name = %cookie.name, "added cookie");
    Ok(cookie)
  }

  /// Add `seed` to the catalog unless a category with the same name exists.
  ///
  /// Returns the new category, or `None` if it was already present.
  pub async fn seed_category(
    &self,
    seed: CategorySeed,
  ) -> ServiceResult<Option<Category>, S::Error> {
    let existing = self.categories().await?;
    if existing.iter().any(|c| c.name == seed.category.name) {
      return Ok(None);
    }

    let category = self.add_category(seed.category).await?;
    for cookie in seed.cookies {
      self
        .add_cookie(NewCookie {
          category_id: category.category_id,
          name:        cookie.name,
          description: cookie.description,
        })
        .await?;
    }
    Ok(Some(category))
  }

  /// Every decision a person has made, oldest first.
  pub async fn decision_history(
    &self,
    person_id: Uuid,
  ) -> ServiceResult<Vec<ConsentDecision>, S::Error> {
    self
      .store
      .get_person(person_id)
      .await
      .map_err(ServiceError::Store)?
      .ok_or(Error::UnknownPerson(person_id))?;
    self
      .store
      .decisions_for_person(person_id, None)
      .await
      .map_err(ServiceError::Store)
  }
}
