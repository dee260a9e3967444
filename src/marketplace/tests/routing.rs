use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use super::common::*;
use crate::marketplace::router::marketplace_router;
use crate::marketplace::scoring::ScoringPolicy;
use crate::marketplace::service::SelectionService;

fn build_router() -> axum::Router {
    let (service, _) = build_service();
    marketplace_router(Arc::new(service))
}

async fn read_json_body(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[tokio::test]
async fn get_applicants_returns_the_ranked_field() {
    let router = build_router();

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/tasks/t1/applicants")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("task_id"), Some(&Value::from("t1")));
    assert_eq!(payload.get("cost").and_then(Value::as_f64), Some(100.0));

    let applicants = payload
        .get("applicants")
        .and_then(Value::as_array)
        .expect("applicants array");
    assert_eq!(applicants.len(), 3);
    assert_eq!(
        applicants[0].get("application_id"),
        Some(&Value::from("a1"))
    );
    assert_eq!(
        applicants[0].get("match_score").and_then(Value::as_f64),
        Some(100.0)
    );
    assert_eq!(applicants[0].get("status"), Some(&Value::from("pending")));
}

#[tokio::test]
async fn get_applicants_returns_not_found_for_unknown_task() {
    let router = build_router();

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/tasks/ghost/applicants")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert!(payload.get("error").is_some());
}

#[tokio::test]
async fn accept_endpoint_accepts_once_then_conflicts() {
    let router = build_router();

    let accept = |router: axum::Router| async move {
        router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/applications/a1/accept")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch")
    };

    let first = accept(router.clone()).await;
    assert_eq!(first.status(), StatusCode::OK);
    let payload = read_json_body(first).await;
    assert_eq!(payload.get("status"), Some(&Value::from("accepted")));
    assert_eq!(payload.get("applicant_id"), Some(&Value::from("u1")));

    let second = accept(router).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn reject_endpoint_marks_the_application_rejected() {
    let router = build_router();

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/applications/a2/reject")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("status"), Some(&Value::from("rejected")));
}

#[tokio::test]
async fn unknown_application_returns_not_found() {
    let router = build_router();

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/applications/ghost/accept")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unavailable_store_maps_to_service_unavailable() {
    let service = Arc::new(SelectionService::new(
        Arc::new(UnavailableStore),
        ScoringPolicy::default(),
    ));
    let router = marketplace_router(service);

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/tasks/t1/applicants")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
