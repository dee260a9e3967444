use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;

use super::domain::{Application, ApplicationId, TaskId};
use super::ranking::RankedApplicantView;
use super::service::{SelectionError, SelectionService};
use super::store::{MarketplaceStore, StoreError};

/// Router builder exposing HTTP endpoints for ranking and selection.
pub fn marketplace_router<S>(service: Arc<SelectionService<S>>) -> Router
where
    S: MarketplaceStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/tasks/:task_id/applicants",
            get(applicants_handler::<S>),
        )
        .route(
            "/api/v1/applications/:application_id/accept",
            post(accept_handler::<S>),
        )
        .route(
            "/api/v1/applications/:application_id/reject",
            post(reject_handler::<S>),
        )
        .with_state(service)
}

#[derive(Debug, Serialize)]
struct RankedApplicantsResponse {
    task_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cost: Option<f64>,
    applicants: Vec<RankedApplicantView>,
}

pub(crate) async fn applicants_handler<S>(
    State(service): State<Arc<SelectionService<S>>>,
    Path(task_id): Path<String>,
) -> Response
where
    S: MarketplaceStore + 'static,
{
    let id = TaskId(task_id);
    match service.ranked_applicants(&id) {
        Ok((task, ranked)) => {
            let payload = RankedApplicantsResponse {
                task_id: task.id.0,
                cost: task.cost,
                applicants: ranked.iter().map(|entry| entry.view()).collect(),
            };
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn accept_handler<S>(
    State(service): State<Arc<SelectionService<S>>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: MarketplaceStore + 'static,
{
    let id = ApplicationId(application_id);
    match service.accept(&id) {
        Ok(application) => application_response(application),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reject_handler<S>(
    State(service): State<Arc<SelectionService<S>>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: MarketplaceStore + 'static,
{
    let id = ApplicationId(application_id);
    match service.reject(&id) {
        Ok(application) => application_response(application),
        Err(error) => error_response(error),
    }
}

fn application_response(application: Application) -> Response {
    let payload = json!({
        "application_id": application.id.0,
        "task_id": application.task_id.0,
        "applicant_id": application.applicant_id.0,
        "status": application.status.label(),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

fn error_response(error: SelectionError) -> Response {
    let status = match &error {
        SelectionError::TaskNotFound(_) | SelectionError::ApplicationNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        SelectionError::InvalidState { .. } => StatusCode::CONFLICT,
        SelectionError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        SelectionError::Store(StoreError::PermissionDenied(_)) => StatusCode::FORBIDDEN,
        SelectionError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        SelectionError::AssignmentIncomplete { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
