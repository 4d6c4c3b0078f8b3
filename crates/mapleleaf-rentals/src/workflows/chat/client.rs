use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::conversation::{ChatRole, ChatTurn};
use crate::config::ChatConfig;

/// Substituted for the model's reply whenever the completion call fails.
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I'm having trouble accessing current rental data. Please try again in a moment.";

pub const SYSTEM_INSTRUCTION: &str = r#"You are a highly knowledgeable Canadian Rental Market Expert AI assistant for "MapleLeaf Rentals AI".
Your tone is professional, empathetic, and informative.
Your expertise includes:
1. Rental market trends and average monthly costs in major Canadian cities (Toronto, Vancouver, Montreal, Calgary, etc.).
2. Tenant rights and provincial regulations (e.g., Ontario's Landlord and Tenant Board rules, Quebec's Tribunal administratif du logement, etc.).
3. Lease agreements, rent control, and security deposit laws in different provinces.
4. Tips for finding rentals in competitive markets (Vancouver/Toronto).
5. Advice on credit checks, references, and what documentation Canadian landlords typically require.

Always mention that your advice is for informational purposes and that users should consult with a legal professional or local housing authority for specific disputes.
If asked about properties outside of Canada, politely redirect to Canadian rental topics.
Keep responses concise but detailed regarding tenant protections."#;

pub const TEMPERATURE: f32 = 0.7;
pub const TOP_K: u32 = 40;
pub const TOP_P: f32 = 0.95;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat API key is not configured")]
    MissingApiKey,
    #[error("chat request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("chat API responded with HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("chat API returned no text")]
    EmptyReply,
}

/// Seam over the hosted completion API.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// `history` is the conversation before `message`; `message` is the new user text.
    async fn complete(&self, history: &[ChatTurn], message: &str) -> Result<String, ChatError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    system_instruction: SystemInstruction,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content?.parts;
        let text: String = parts.into_iter().map(|part| part.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

fn role_name(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Model => "model",
    }
}

/// Builds a fresh request from the whole conversation. Contents must open with a user turn,
/// so model turns ahead of the first user message (the greeting) are skipped.
pub(crate) fn build_request(history: &[ChatTurn], message: &str) -> GenerateContentRequest {
    let contents = history
        .iter()
        .skip_while(|turn| turn.role == ChatRole::Model)
        .map(|turn| Content {
            role: role_name(turn.role),
            parts: vec![Part {
                text: turn.text.clone(),
            }],
        })
        .chain(std::iter::once(Content {
            role: role_name(ChatRole::User),
            parts: vec![Part {
                text: message.to_string(),
            }],
        }))
        .collect();

    GenerateContentRequest {
        system_instruction: SystemInstruction {
            parts: vec![Part {
                text: SYSTEM_INSTRUCTION.to_string(),
            }],
        },
        contents,
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
            top_k: TOP_K,
            top_p: TOP_P,
        },
    }
}

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiChatClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiChatClient {
    pub fn new(config: &ChatConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &ChatConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ChatCompletion for GeminiChatClient {
    async fn complete(&self, history: &[ChatTurn], message: &str) -> Result<String, ChatError> {
        let api_key = self.api_key.as_deref().ok_or(ChatError::MissingApiKey)?;
        let request = build_request(history, message);

        debug!(model = %self.model, turns = request.contents.len(), "requesting chat completion");
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        parsed.into_text().ok_or(ChatError::EmptyReply)
    }
}

/// Wraps a completion backend so the conversation always receives a reply.
#[derive(Clone)]
pub struct ChatClient {
    completion: Arc<dyn ChatCompletion>,
}

impl ChatClient {
    pub fn new(completion: Arc<dyn ChatCompletion>) -> Self {
        Self { completion }
    }

    pub async fn send(&self, history: &[ChatTurn], message: &str) -> String {
        match self.completion.complete(history, message).await {
            Ok(reply) => reply,
            Err(err) => {
                error!(error = %err, "chat completion failed");
                FALLBACK_REPLY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_carries_instruction_and_sampling() {
        let request = build_request(&[], "What is average rent in Toronto?");
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], SYSTEM_INSTRUCTION);
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert!((body["generationConfig"]["topP"].as_f64().unwrap() - 0.95).abs() < 1e-6);
        assert_eq!(
            body["contents"],
            json!([{ "role": "user", "parts": [{ "text": "What is average rent in Toronto?" }] }])
        );
    }

    #[test]
    fn greeting_is_dropped_and_order_kept() {
        let history = vec![
            ChatTurn::model("Hello!"),
            ChatTurn::user("Rent in Calgary?"),
            ChatTurn::model("About $1,800."),
        ];
        let request = build_request(&history, "And Edmonton?");
        let roles: Vec<_> = request.contents.iter().map(|c| c.role).collect();
        let texts: Vec<_> = request
            .contents
            .iter()
            .map(|c| c.parts[0].text.as_str())
            .collect();

        assert_eq!(roles, vec!["user", "model", "user"]);
        assert_eq!(texts, vec!["Rent in Calgary?", "About $1,800.", "And Edmonton?"]);
    }

    #[test]
    fn reply_text_joins_parts_of_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {
                    "content": {
                        "role": "model",
                        "parts": [{ "text": "Rent " }, { "text": "varies." }]
                    }
                },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();
        assert_eq!(response.into_text().as_deref(), Some("Rent varies."));

        let blocked: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [{ "finishReason": "SAFETY" }] }))
                .unwrap();
        assert_eq!(blocked.into_text(), None);

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.into_text(), None);
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let client = GeminiChatClient::new(&ChatConfig {
            api_key: None,
            model: "gemini-3-flash-preview".into(),
            base_url: "http://127.0.0.1:9".into(),
            session_idle_minutes: 30,
        });
        let err = client.complete(&[], "hello").await.expect_err("no key");
        assert!(matches!(err, ChatError::MissingApiKey));
    }

    struct Failing;

    #[async_trait]
    impl ChatCompletion for Failing {
        async fn complete(&self, _: &[ChatTurn], _: &str) -> Result<String, ChatError> {
            Err(ChatError::EmptyReply)
        }
    }

    #[tokio::test]
    async fn failures_become_fallback_reply() {
        let client = ChatClient::new(Arc::new(Failing));
        assert_eq!(client.send(&[], "hello").await, FALLBACK_REPLY);
    }
}
