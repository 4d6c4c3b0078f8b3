use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;

use super::domain::InquiryState;
use super::service::InquiryIntakeService;
use super::wizard::ResultView;
use crate::error::AppError;
use crate::webhook::WebhookTransport;

/// Router exposing the inquiry intake endpoint.
///
/// `body_limit` caps the JSON body in bytes; attached documents travel inline as base64.
pub fn inquiry_router<T>(service: Arc<InquiryIntakeService<T>>, body_limit: usize) -> Router
where
    T: WebhookTransport + ?Sized + 'static,
{
    Router::new()
        .route("/api/v1/inquiries", post(submit_handler::<T>))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(service)
}

pub(crate) async fn submit_handler<T>(
    State(service): State<Arc<InquiryIntakeService<T>>>,
    axum::Json(inquiry): axum::Json<InquiryState>,
) -> Result<Response, AppError>
where
    T: WebhookTransport + ?Sized + 'static,
{
    let view = service.submit(inquiry).await?;
    let status = match view {
        ResultView::Failed { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::OK,
    };
    let message = match &view {
        ResultView::Submitted(receipt) => Some(receipt.message()),
        _ => None,
    };
    let payload = json!({
        "headline": view.headline(),
        "message": message,
        "result": view,
    });
    Ok((status, axum::Json(payload)).into_response())
}
