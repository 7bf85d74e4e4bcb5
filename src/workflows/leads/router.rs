use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::distribution::DistributionError;
use super::domain::LeadId;
use super::repository::{AgentRepository, AssignmentRepository, LeadRepository};
use super::service::{
    DistributionRequest, LeadEngineService, LeadServiceError, RecordActivityRequest,
};

/// Router builder exposing the lead engine over HTTP.
pub fn lead_router<L, A, S>(service: Arc<LeadEngineService<L, A, S>>) -> Router
where
    L: LeadRepository + 'static,
    A: AgentRepository + 'static,
    S: AssignmentRepository + 'static,
{
    Router::new()
        .route("/api/v1/leads/activity", post(record_activity_handler::<L, A, S>))
        .route(
            "/api/v1/leads/:lead_id/score",
            get(score_handler::<L, A, S>),
        )
        .route(
            "/api/v1/leads/distribute",
            post(distribute_handler::<L, A, S>),
        )
        .with_state(service)
}

pub(crate) async fn record_activity_handler<L, A, S>(
    State(service): State<Arc<LeadEngineService<L, A, S>>>,
    axum::Json(request): axum::Json<RecordActivityRequest>,
) -> Response
where
    L: LeadRepository + 'static,
    A: AgentRepository + 'static,
    S: AssignmentRepository + 'static,
{
    match service.record_activity(request) {
        Ok(card) => (StatusCode::ACCEPTED, axum::Json(card)).into_response(),
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn score_handler<L, A, S>(
    State(service): State<Arc<LeadEngineService<L, A, S>>>,
    Path(lead_id): Path<String>,
) -> Response
where
    L: LeadRepository + 'static,
    A: AgentRepository + 'static,
    S: AssignmentRepository + 'static,
{
    let id = LeadId(lead_id);
    match service.get_score(&id) {
        Ok(card) => (StatusCode::OK, axum::Json(card)).into_response(),
        Err(LeadServiceError::UnknownLead(id)) => {
            let payload = json!({ "error": format!("unknown lead '{}'", id.0) });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn distribute_handler<L, A, S>(
    State(service): State<Arc<LeadEngineService<L, A, S>>>,
    axum::Json(request): axum::Json<DistributionRequest>,
) -> Response
where
    L: LeadRepository + 'static,
    A: AgentRepository + 'static,
    S: AssignmentRepository + 'static,
{
    match service.distribute(request) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(LeadServiceError::Distribution(DistributionError::InvalidPolicy(detail))) => {
            let payload = json!({ "error": format!("invalid policy: {detail}") });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(LeadServiceError::Distribution(empty_pool)) => {
            let payload = json!({ "error": empty_pool.to_string() });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
