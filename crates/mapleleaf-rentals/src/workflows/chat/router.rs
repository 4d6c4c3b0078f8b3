use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::lead::LeadTransition;
use super::registry::ChatSessionRegistry;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct LeadForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageForm {
    #[serde(default)]
    pub text: String,
}

/// Router exposing the lead-gated chat widget.
pub fn chat_router(registry: Arc<ChatSessionRegistry>) -> Router {
    Router::new()
        .route("/api/v1/chat/sessions", post(create_handler))
        .route(
            "/api/v1/chat/sessions/:session_id",
            get(view_handler).delete(close_handler),
        )
        .route("/api/v1/chat/sessions/:session_id/lead", post(lead_handler))
        .route(
            "/api/v1/chat/sessions/:session_id/messages",
            post(message_handler),
        )
        .with_state(registry)
}

pub(crate) async fn create_handler(State(registry): State<Arc<ChatSessionRegistry>>) -> Response {
    let view = registry.create();
    (StatusCode::CREATED, axum::Json(view)).into_response()
}

pub(crate) async fn view_handler(
    State(registry): State<Arc<ChatSessionRegistry>>,
    Path(session_id): Path<String>,
) -> Result<Response, AppError> {
    let view = registry.view(&session_id).await?;
    Ok((StatusCode::OK, axum::Json(view)).into_response())
}

pub(crate) async fn close_handler(
    State(registry): State<Arc<ChatSessionRegistry>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    registry.close(&session_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn lead_handler(
    State(registry): State<Arc<ChatSessionRegistry>>,
    Path(session_id): Path<String>,
    axum::Json(form): axum::Json<LeadForm>,
) -> Result<Response, AppError> {
    let (transition, view) = registry
        .submit_lead(&session_id, &form.email, &form.phone)
        .await?;
    let payload = json!({
        "newly_unlocked": matches!(transition, LeadTransition::Unlocked(_)),
        "session": view,
    });
    Ok((StatusCode::OK, axum::Json(payload)).into_response())
}

pub(crate) async fn message_handler(
    State(registry): State<Arc<ChatSessionRegistry>>,
    Path(session_id): Path<String>,
    axum::Json(form): axum::Json<MessageForm>,
) -> Result<Response, AppError> {
    let exchange = registry.send(&session_id, &form.text).await?;
    Ok((StatusCode::OK, axum::Json(exchange)).into_response())
}
