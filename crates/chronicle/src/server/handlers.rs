//! Endpoint handlers
//!
//! Handlers call the search service and orchestrator directly. Dropping a handler future (client
//! disconnect) drops any in-flight analyzer calls with it.

use axum::{
  extract::{
    rejection::{JsonRejection, QueryRejection},
    Query, State,
  },
  http::StatusCode,
  response::Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::catalog::{self, FilterOptions, Statistics};
use crate::config::Config;
use crate::error::ChronicleError;
use crate::records::Category;
use crate::research::{Orchestrator, ResearchResponse};
use crate::search::{SearchQuery, SearchResults, SearchService};
use crate::server::types::{
  ApiError, BaseResponse, FilterOptionsParams, ResearchRequest, RoleSummary, RolesResponse,
  StatusResponse,
};

/// Shared, immutable server state
#[derive(Clone)]
pub struct AppState {
  pub config: Arc<Config>,
  pub search: Arc<SearchService>,
  pub orchestrator: Arc<Orchestrator>,
  pub records: usize,
  pub backend_configured: bool,
}

pub type ApiFailure = (StatusCode, Json<BaseResponse<()>>);

fn failure(error: &ChronicleError, transaction_id: Uuid) -> ApiFailure {
  let status = match error {
    ChronicleError::InvalidQuery { .. } => StatusCode::BAD_REQUEST,
    ChronicleError::StoreUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
    _ => StatusCode::INTERNAL_SERVER_ERROR,
  };

  tracing::warn!(%transaction_id, error = %error, "request failed");
  (status, Json(BaseResponse::error(vec![ApiError::from(error)], transaction_id)))
}

/// Malformed bodies and query strings are invalid queries, reported in the usual envelope
fn rejected(message: String, transaction_id: Uuid) -> ApiFailure {
  failure(&ChronicleError::invalid_query(message), transaction_id)
}

/// GET /status - Health check endpoint
pub async fn status(State(state): State<AppState>) -> Json<BaseResponse<StatusResponse>> {
  let response = StatusResponse {
    status: "healthy".to_string(),
    version: env!("CARGO_PKG_VERSION").to_string(),
    records: state.records,
    backend_configured: state.backend_configured,
  };

  Json(BaseResponse::success(response, Uuid::new_v4()))
}

/// POST /search - Ranked, paginated record search
pub async fn search(
  State(state): State<AppState>,
  body: Result<Json<SearchQuery>, JsonRejection>,
) -> Result<Json<BaseResponse<SearchResults>>, ApiFailure> {
  let transaction_id = Uuid::new_v4();
  let Json(query) = body.map_err(|rejection| rejected(rejection.body_text(), transaction_id))?;

  match state.search.search(&query) {
    Ok(results) => {
      tracing::info!(
        %transaction_id,
        category = %query.category,
        total_count = results.total_count,
        "search served"
      );
      Ok(Json(BaseResponse::success(results, transaction_id)))
    }
    Err(e) => Err(failure(&e, transaction_id)),
  }
}

/// POST /research - Multi-role narrative research
pub async fn research(
  State(state): State<AppState>,
  body: Result<Json<ResearchRequest>, JsonRejection>,
) -> Result<Json<BaseResponse<ResearchResponse>>, ApiFailure> {
  let transaction_id = Uuid::new_v4();
  let Json(request) = body.map_err(|rejection| rejected(rejection.body_text(), transaction_id))?;

  match state.orchestrator.research(&request.query, request.category).await {
    Ok(response) => {
      tracing::info!(
        %transaction_id,
        category = %response.category,
        used_fallback = response.used_fallback,
        elapsed_ms = response.elapsed_ms,
        "research served"
      );
      Ok(Json(BaseResponse::success(response, transaction_id)))
    }
    Err(e) => Err(failure(&e, transaction_id)),
  }
}

/// GET /statistics - Record counts and personnel breakdowns
pub async fn statistics(
  State(state): State<AppState>,
) -> Result<Json<BaseResponse<Statistics>>, ApiFailure> {
  let transaction_id = Uuid::new_v4();

  catalog::statistics(state.search.store())
    .map(|stats| Json(BaseResponse::success(stats, transaction_id)))
    .map_err(|e| failure(&e, transaction_id))
}

/// GET /filters/options?category= - Values and bounds for structured filters
pub async fn filter_options(
  State(state): State<AppState>,
  params: Result<Query<FilterOptionsParams>, QueryRejection>,
) -> Result<Json<BaseResponse<FilterOptions>>, ApiFailure> {
  let transaction_id = Uuid::new_v4();
  let Query(params) = params.map_err(|rejection| rejected(rejection.body_text(), transaction_id))?;
  let category = params.category.unwrap_or(Category::Personnel);

  catalog::filter_options(&state.config, state.search.store(), category)
    .map(|options| Json(BaseResponse::success(options, transaction_id)))
    .map_err(|e| failure(&e, transaction_id))
}

/// GET /roles - Configured specialist panel
pub async fn roles(State(state): State<AppState>) -> Json<BaseResponse<RolesResponse>> {
  let mut roles: Vec<RoleSummary> = state.config.roles.iter().map(RoleSummary::from).collect();
  roles.sort_by_key(|summary| summary.role);

  let response = RolesResponse { roles, default_roles: state.config.default_roles.clone() };
  Json(BaseResponse::success(response, Uuid::new_v4()))
}
