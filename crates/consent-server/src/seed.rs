//! Catalog seeding from a TOML file.
//!
//! ```toml
//! [[categories]]
//! name = "Analytics"
//! description = "Helps us understand how the site is used"
//! default_value = false
//! cookies = [{ name = "_ga" }, { name = "_gid" }]
//! ```

use std::path::Path;

use anyhow::Context as _;
use consent_core::{
  admin::CategorySeed, service::ConsentResolver, store::ConsentStore,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct CatalogSeed {
  #[serde(default)]
  pub categories: Vec<CategorySeed>,
}

impl CatalogSeed {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path))
      .build()
      .with_context(|| format!("failed to read seed file {path:?}"))?
      .try_deserialize()
      .with_context(|| format!("failed to parse seed file {path:?}"))
  }
}

/// Add every seeded category that is not already in the catalog. Returns
/// the number of categories added.
pub async fn apply<S>(
  resolver: &ConsentResolver<S>,
  seed: CatalogSeed,
) -> anyhow::Result<usize>
where
  S: ConsentStore,
{
  let mut added = 0;
  for category in seed.categories {
    let name = category.category.name.clone();
    match resolver.seed_category(category).await? {
      Some(_) => added += 1,
      None => tracing::info!(%name, "category already present; skipping"),
    }
  }
  Ok(added)
}
