use chrono::Duration;
use mapleleaf_rentals::config::AppConfig;
use mapleleaf_rentals::webhook::HttpWebhookTransport;
use mapleleaf_rentals::workflows::chat::{
    ChatClient, ChatSessionRegistry, GeminiChatClient, WebhookLeadNotifier,
};
use mapleleaf_rentals::workflows::inquiry::{
    Bedrooms, DocumentKind, InquiryIntakeService, Province, RentalPropertyType, SubmissionClient,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Workflow services wired to the configured webhooks and chat backend.
pub(crate) struct Workflows {
    pub(crate) intake: Arc<InquiryIntakeService<HttpWebhookTransport>>,
    pub(crate) chats: Arc<ChatSessionRegistry>,
    pub(crate) submissions: SubmissionClient<HttpWebhookTransport>,
    pub(crate) chat_client: ChatClient,
    pub(crate) notifier: Arc<WebhookLeadNotifier<HttpWebhookTransport>>,
}

impl Workflows {
    pub(crate) fn from_config(config: &AppConfig) -> Self {
        let transport = Arc::new(HttpWebhookTransport::new());
        let submissions =
            SubmissionClient::new(Arc::clone(&transport), &config.webhooks.inquiry_url);
        let intake = Arc::new(InquiryIntakeService::new(
            submissions.clone(),
            config.webhooks.delivery_policy,
        ));

        let notifier = Arc::new(WebhookLeadNotifier::new(
            transport,
            &config.webhooks.lead_url,
        ));
        let chat_client = ChatClient::new(Arc::new(GeminiChatClient::new(&config.chat)));
        let chats = Arc::new(
            ChatSessionRegistry::new(chat_client.clone(), notifier.clone())
                .with_idle_timeout(Duration::minutes(config.chat.session_idle_minutes)),
        );

        Self {
            intake,
            chats,
            submissions,
            chat_client,
            notifier,
        }
    }
}

pub(crate) fn parse_province(raw: &str) -> Result<Province, String> {
    Province::lookup(raw).ok_or_else(|| {
        format!(
            "unknown province or territory '{raw}' \
             (use a name such as Ontario or a code such as ON)"
        )
    })
}

pub(crate) fn parse_property_type(raw: &str) -> Result<RentalPropertyType, String> {
    RentalPropertyType::lookup(raw).ok_or_else(|| {
        let known: Vec<_> = RentalPropertyType::ALL.iter().map(|kind| kind.label()).collect();
        format!("unknown property type '{raw}' (expected one of: {})", known.join(", "))
    })
}

pub(crate) fn parse_bedrooms(raw: &str) -> Result<Bedrooms, String> {
    Bedrooms::lookup(raw)
        .ok_or_else(|| format!("unknown bedroom count '{raw}' (expected Studio, 1, 2 or 3+)"))
}

/// Parses `kind=path`, e.g. `credit-report=./equifax.pdf`.
pub(crate) fn parse_document(raw: &str) -> Result<(DocumentKind, PathBuf), String> {
    let (kind, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KIND=PATH, got '{raw}'"))?;
    let kind = DocumentKind::lookup(kind).ok_or_else(|| {
        format!(
            "unknown document '{kind}' \
             (expected passport, work-permit, employment-letter or credit-report)"
        )
    })?;
    let path = path.trim();
    if path.is_empty() {
        return Err(format!("missing path for document '{}'", kind.key()));
    }
    Ok((kind, PathBuf::from(path)))
}
