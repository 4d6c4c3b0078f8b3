use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::webhook::DeliveryPolicy;

pub const DEFAULT_INQUIRY_WEBHOOK_URL: &str = "http://127.0.0.1:5678/webhook/mapleleaf-inquiry";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_CHAT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Inquiries embed base64 scans, so the request limit sits well above axum's 2 MB default.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;
pub const DEFAULT_CHAT_SESSION_IDLE_MINUTES: i64 = 30;
pub const MAX_CHAT_SESSION_IDLE_MINUTES: i64 = 7 * 24 * 60;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub webhooks: WebhookConfig,
    pub chat: ChatConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let body_limit_bytes = match env::var("APP_BODY_LIMIT_BYTES") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or(ConfigError::InvalidBodyLimit(raw))?,
            Err(_) => DEFAULT_BODY_LIMIT_BYTES,
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig {
                host,
                port,
                body_limit_bytes,
            },
            telemetry: TelemetryConfig { log_level },
            webhooks: WebhookConfig::from_env()?,
            chat: ChatConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, document uploads included.
    pub body_limit_bytes: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Outbound workflow endpoints and how strictly their delivery is reported.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub inquiry_url: String,
    pub lead_url: String,
    pub delivery_policy: DeliveryPolicy,
}

impl WebhookConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let inquiry_url = env::var("INQUIRY_WEBHOOK_URL")
            .unwrap_or_else(|_| DEFAULT_INQUIRY_WEBHOOK_URL.to_string());
        validate_url("INQUIRY_WEBHOOK_URL", &inquiry_url)?;

        let lead_url = env::var("LEAD_WEBHOOK_URL").unwrap_or_else(|_| inquiry_url.clone());
        validate_url("LEAD_WEBHOOK_URL", &lead_url)?;

        let delivery_policy = match env::var("WEBHOOK_DELIVERY_POLICY") {
            Ok(raw) => DeliveryPolicy::parse(&raw).ok_or(ConfigError::InvalidDeliveryPolicy(raw))?,
            Err(_) => DeliveryPolicy::default(),
        };

        Ok(Self {
            inquiry_url,
            lead_url,
            delivery_policy,
        })
    }
}

/// Hosted chat-completion settings for the rental assistant.
#[derive(Clone)]
pub struct ChatConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// Minutes without activity before a chat session is dropped.
    pub session_idle_minutes: i64,
}

impl ChatConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        let model = env::var("CHAT_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string());
        let base_url =
            env::var("CHAT_API_BASE_URL").unwrap_or_else(|_| DEFAULT_CHAT_API_BASE_URL.to_string());
        validate_url("CHAT_API_BASE_URL", &base_url)?;

        let session_idle_minutes = match env::var("CHAT_SESSION_IDLE_MINUTES") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|minutes| (1..=MAX_CHAT_SESSION_IDLE_MINUTES).contains(minutes))
                .ok_or(ConfigError::InvalidIdleTimeout(raw))?,
            Err(_) => DEFAULT_CHAT_SESSION_IDLE_MINUTES,
        };

        Ok(Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_idle_minutes,
        })
    }
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("session_idle_minutes", &self.session_idle_minutes)
            .finish()
    }
}

fn validate_url(variable: &'static str, value: &str) -> Result<(), ConfigError> {
    reqwest::Url::parse(value)
        .map(|_| ())
        .map_err(|err| ConfigError::InvalidUrl {
            variable,
            reason: err.to_string(),
        })
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidUrl {
        variable: &'static str,
        reason: String,
    },
    InvalidDeliveryPolicy(String),
    InvalidBodyLimit(String),
    InvalidIdleTimeout(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidUrl { variable, reason } => {
                write!(f, "{variable} must be an absolute URL ({reason})")
            }
            ConfigError::InvalidDeliveryPolicy(value) => write!(
                f,
                "WEBHOOK_DELIVERY_POLICY must be 'best-effort' or 'confirmed' (got '{value}')"
            ),
            ConfigError::InvalidBodyLimit(value) => write!(
                f,
                "APP_BODY_LIMIT_BYTES must be a positive byte count (got '{value}')"
            ),
            ConfigError::InvalidIdleTimeout(value) => write!(
                f,
                "CHAT_SESSION_IDLE_MINUTES must be between 1 and {} minutes (got '{}')",
                MAX_CHAT_SESSION_IDLE_MINUTES, value
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidUrl { .. }
            | ConfigError::InvalidDeliveryPolicy(_)
            | ConfigError::InvalidBodyLimit(_)
            | ConfigError::InvalidIdleTimeout(_) => None,
        }
    }
}
