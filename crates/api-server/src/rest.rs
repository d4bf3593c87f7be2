//! REST API handlers for offer selection, reward feedback, offer statistics
//! and operational endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use offer_bandit_engine::{parse_offer_ids, BanditEngine};
use offer_core::error::BanditError;
use offer_core::types::{ClickId, FeedbackOutcome, OfferId, OfferStatsView, Selection};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};
use utoipa::{IntoParams, ToSchema};

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BanditEngine>,
    pub node_id: String,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(engine: Arc<BanditEngine>, node_id: impl Into<String>) -> Self {
        Self {
            engine,
            node_id: node_id.into(),
            start_time: Instant::now(),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(e: &BanditError) -> ApiError {
    let status = match e {
        BanditError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        BanditError::UnknownClick(_) => StatusCode::NOT_FOUND,
        BanditError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(error = %e, "Request failed");
    } else {
        warn!(error = %e, "Request rejected");
    }
    metrics::counter!("bandit.api.errors", "kind" => e.code()).increment(1);
    (
        status,
        Json(ErrorResponse {
            error: e.code().to_string(),
            message: e.to_string(),
        }),
    )
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SampleQuery {
    /// Identifier of the click being served.
    pub click_id: ClickId,
    /// Comma-separated candidate offer identifiers, e.g. `10,20,30`.
    pub offer_ids: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeedbackQuery {
    pub click_id: ClickId,
    /// Reward observed for the click; only positive values count as conversions.
    pub reward: f64,
}

/// GET /sample/ — Choose the best offer for a click with UCB.
#[utoipa::path(
    get,
    path = "/sample/",
    tag = "Bandit",
    params(SampleQuery),
    responses(
        (status = 200, description = "Offer selected", body = Selection),
        (status = 400, description = "Empty or malformed candidate list", body = ErrorResponse),
    )
)]
pub async fn handle_sample(
    State(state): State<AppState>,
    Query(query): Query<SampleQuery>,
) -> Result<Json<Selection>, ApiError> {
    let offer_ids = parse_offer_ids(&query.offer_ids).map_err(|e| error_response(&e))?;
    let selection = state
        .engine
        .select(query.click_id, &offer_ids)
        .map_err(|e| error_response(&e))?;

    metrics::counter!("bandit.api.selections").increment(1);
    Ok(Json(selection))
}

/// PUT /feedback/ — Report the reward obtained for a previously served click.
#[utoipa::path(
    put,
    path = "/feedback/",
    tag = "Bandit",
    params(FeedbackQuery),
    responses(
        (status = 200, description = "Feedback applied", body = FeedbackOutcome),
        (status = 400, description = "Reward is not a finite number", body = ErrorResponse),
        (status = 404, description = "No offer was selected for this click", body = ErrorResponse),
    )
)]
pub async fn handle_feedback(
    State(state): State<AppState>,
    Query(query): Query<FeedbackQuery>,
) -> Result<Json<FeedbackOutcome>, ApiError> {
    let outcome = state
        .engine
        .feedback(query.click_id, query.reward)
        .map_err(|e| error_response(&e))?;

    metrics::counter!("bandit.api.feedback").increment(1);
    if outcome.is_conversion {
        metrics::counter!("bandit.api.conversions").increment(1);
    }
    Ok(Json(outcome))
}

/// GET /offer_ids/{offer_id}/stats/ — Offer statistics. Unknown offers are created.
#[utoipa::path(
    get,
    path = "/offer_ids/{offer_id}/stats/",
    tag = "Bandit",
    params(("offer_id" = i64, Path, description = "Offer identifier")),
    responses(
        (status = 200, description = "Offer statistics", body = OfferStatsView),
    )
)]
pub async fn handle_stats(
    State(state): State<AppState>,
    Path(offer_id): Path<OfferId>,
) -> Json<OfferStatsView> {
    Json(state.engine.stats(offer_id))
}

/// GET /health — Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Operations",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        offers: state.engine.store().len(),
        assignments: state.engine.assignments_len(),
    })
}

/// GET /ready — Readiness probe.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Operations",
    responses((status = 200, description = "Ready to accept traffic"))
)]
pub async fn readiness() -> StatusCode {
    // State is in-memory and built before the listener binds.
    StatusCode::OK
}

/// GET /live — Liveness probe.
#[utoipa::path(
    get,
    path = "/live",
    tag = "Operations",
    responses((status = 200, description = "Process is alive"))
)]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
    pub offers: usize,
    pub assignments: usize,
}
