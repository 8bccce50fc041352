use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{ChatConfig, GenParams};
use crate::error::AppError;

use super::{ChatMessage, LanguageModel, PromptRole};

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn wire_role(role: PromptRole) -> &'static str {
    match role {
        PromptRole::System => "system",
        PromptRole::Agent => "assistant",
        PromptRole::Other => "user",
    }
}

// ============================================================================
// OpenAiClient
// ============================================================================

/// Client for any OpenAI-compatible chat-completions endpoint (the
/// default config points it at Gemini's compatibility surface).
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl OpenAiClient {
    /// Build a client from config. The underlying `reqwest::Client` is
    /// configured with a 30-second timeout.
    pub fn new(config: &ChatConfig) -> Result<Self, AppError> {
        if config.api_key.is_empty() {
            return Err(AppError::Validation(
                "No API key configured; set PARLOR_API_KEY or GEMINI_API_KEY".into(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: GenParams,
    ) -> Result<String, AppError> {
        let body = CompletionBody {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: wire_role(m.role),
                    content: &m.content,
                })
                .collect(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let response: CompletionResponse = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::Transport("completion response had no choices".into()))?;

        Ok(text.trim().to_string())
    }
}
