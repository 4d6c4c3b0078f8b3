use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use mapleleaf_rentals::webhook::WebhookTransport;
use mapleleaf_rentals::workflows::chat::{chat_router, ChatSessionRegistry};
use mapleleaf_rentals::workflows::inquiry::{inquiry_router, InquiryIntakeService};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_workflow_routes<T>(
    intake: Arc<InquiryIntakeService<T>>,
    chats: Arc<ChatSessionRegistry>,
    body_limit: usize,
) -> axum::Router
where
    T: WebhookTransport + ?Sized + 'static,
{
    inquiry_router(intake, body_limit)
        .merge(chat_router(chats))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
