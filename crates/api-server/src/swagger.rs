//! OpenAPI specification for the offer bandit service.

use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Offer Bandit API",
        version = "0.1.0",
        description = "Chooses the best offer for a click with an Upper Confidence Bound bandit and learns from delayed reward feedback.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Bandit", description = "Offer selection, reward feedback and offer statistics"),
        (name = "Operations", description = "Health, readiness, and liveness probes"),
    ),
    paths(
        crate::rest::handle_sample,
        crate::rest::handle_feedback,
        crate::rest::handle_stats,
        crate::rest::health_check,
        crate::rest::readiness,
        crate::rest::liveness,
    ),
    components(schemas(
        offer_core::types::Selection,
        offer_core::types::FeedbackOutcome,
        offer_core::types::OfferStatsView,
        crate::rest::ErrorResponse,
        crate::rest::HealthResponse,
    ))
)]
pub struct ApiDoc;

/// GET /api-docs/openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
