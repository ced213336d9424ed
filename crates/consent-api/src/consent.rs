//! Handlers for the prompt-facing consent endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/verify-browser-id` | Body: `{"browser_id":"..."}`; resolves or creates the person |
//! | `GET`  | `/cookies-to-drop` | `?browser_id` required |
//! | `GET`  | `/cookie-data` | Cacheable; `Cache-Control` max-age from config |
//! | `POST` | `/consent-records` | Body: [`RecordBody`] |

use axum::{
  Json,
  extract::{Query, State},
  http::header,
  response::IntoResponse,
};
use consent_core::{decision::DecisionInput, store::ConsentStore};
use serde::{Deserialize, Serialize};

use crate::{ApiState, caller::CurrentCaller, error::ApiError};

// ─── Verify ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
  pub browser_id: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
  pub consent_granted: bool,
}

/// `POST /verify-browser-id`
pub async fn verify<S>(
  State(state): State<ApiState<S>>,
  CurrentCaller(caller): CurrentCaller,
  Json(body): Json<VerifyBody>,
) -> Result<Json<VerifyResponse>, ApiError>
where
  S: ConsentStore + 'static,
{
  let consent_granted = state
    .resolver
    .verify_browser_id(&caller, &body.browser_id)
    .await?;
  Ok(Json(VerifyResponse { consent_granted }))
}

// ─── Cookies to drop ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DropParams {
  pub browser_id: String,
}

/// `GET /cookies-to-drop?browser_id=<id>`
pub async fn cookies_to_drop<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<DropParams>,
) -> Result<Json<Vec<String>>, ApiError>
where
  S: ConsentStore + 'static,
{
  let names = state.resolver.cookies_to_drop(&params.browser_id).await?;
  Ok(Json(names))
}

// ─── Prompt data ──────────────────────────────────────────────────────────────

/// `GET /cookie-data` — the catalog shaped for the consent prompt.
pub async fn cookie_data<S>(
  State(state): State<ApiState<S>>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ConsentStore + 'static,
{
  let prompt = state.resolver.cookie_data().await?;
  let cache = format!("public, max-age={}", state.prompt_max_age);
  Ok(([(header::CACHE_CONTROL, cache)], Json(prompt)))
}

// ─── Record ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /consent-records`.
#[derive(Debug, Deserialize)]
pub struct RecordBody {
  pub browser_id: String,
  #[serde(default)]
  pub decisions:  Vec<DecisionInput>,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
  pub success: bool,
}

/// `POST /consent-records` — 404 if the browser id or any category is
/// unknown, in which case nothing is recorded.
pub async fn record<S>(
  State(state): State<ApiState<S>>,
  CurrentCaller(caller): CurrentCaller,
  Json(body): Json<RecordBody>,
) -> Result<Json<RecordResponse>, ApiError>
where
  S: ConsentStore + 'static,
{
  let success = state
    .resolver
    .record_decisions(&caller, &body.browser_id, &body.decisions)
    .await?;
  Ok(Json(RecordResponse { success }))
}
