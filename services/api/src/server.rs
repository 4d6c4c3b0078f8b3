use crate::cli::ServeArgs;
use crate::infra::{AppState, Workflows};
use crate::routes::with_workflow_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use mapleleaf_rentals::config::AppConfig;
use mapleleaf_rentals::error::AppError;
use mapleleaf_rentals::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    if config.chat.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; chat replies will fall back to the apology message");
    }

    let workflows = Workflows::from_config(&config);
    let app = with_workflow_routes(
        workflows.intake,
        workflows.chats,
        config.server.body_limit_bytes,
    )
    .layer(Extension(app_state))
    .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        inquiry_webhook = %config.webhooks.inquiry_url,
        delivery = config.webhooks.delivery_policy.label(),
        model = %config.chat.model,
        body_limit = config.server.body_limit_bytes,
        "mapleleaf rentals backend ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
