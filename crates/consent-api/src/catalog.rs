//! Handlers for catalog administration and ledger inspection.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/categories` | Catalog order |
//! | `POST` | `/categories` | Body: [`NewCategory`]; returns 201 + category |
//! | `POST` | `/categories/{id}/cookies` | Body: [`NewCookieBody`]; returns 201 + cookie |
//! | `GET`  | `/people/{id}/decisions` | Oldest first; 404 for unknown person |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use consent_core::{
  catalog::{Category, NewCategory, NewCookie},
  decision::ConsentDecision,
  store::ConsentStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// `GET /categories`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<Category>>, ApiError>
where
  S: ConsentStore + 'static,
{
  Ok(Json(state.resolver.categories().await?))
}

/// `POST /categories`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewCategory>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ConsentStore + 'static,
{
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("category name is empty".into()));
  }
  let category = state.resolver.add_category(body).await?;
  Ok((StatusCode::CREATED, Json(category)))
}

#[derive(Debug, Deserialize)]
pub struct NewCookieBody {
  pub name:        String,
  pub description: Option<String>,
}

/// `POST /categories/:id/cookies`
pub async fn add_cookie<S>(
  State(state): State<ApiState<S>>,
  Path(category_id): Path<Uuid>,
  Json(body): Json<NewCookieBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ConsentStore + 'static,
{
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("cookie name is empty".into()));
  }
  let cookie = state
    .resolver
    .add_cookie(NewCookie {
      category_id,
      name: body.name,
      description: body.description,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(cookie)))
}

/// `GET /people/:id/decisions`
pub async fn history<S>(
  State(state): State<ApiState<S>>,
  Path(person_id): Path<Uuid>,
) -> Result<Json<Vec<ConsentDecision>>, ApiError>
where
  S: ConsentStore + 'static,
{
  Ok(Json(state.resolver.decision_history(person_id).await?))
}
