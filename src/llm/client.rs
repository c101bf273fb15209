use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::llm::ClassificationRequest;

pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";

/// Which backend family to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderKind {
    /// OpenAI chat completions (or any compatible endpoint)
    #[value(name = "openai")]
    OpenAi,
    /// Anthropic messages API
    Anthropic,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    /// Environment variable holding the credential
    pub fn api_key_var(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_endpoint(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => OPENAI_ENDPOINT,
            ProviderKind::Anthropic => ANTHROPIC_ENDPOINT,
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4.1",
            ProviderKind::Anthropic => "claude-sonnet-4-20250514",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            other => Err(format!("unknown provider {other:?} (expected openai or anthropic)")),
        }
    }
}

/// Connection settings for a classification backend
#[derive(Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    /// Sampling temperature (0-1)
    pub temperature: f64,
    /// Maximum tokens in the completion
    pub max_tokens: u32,
    /// Upper bound for the whole backend call
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Create with the backend's default endpoint and model
    pub fn new(kind: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            kind,
            api_key: api_key.into(),
            endpoint: kind.default_endpoint().to_string(),
            model: kind.default_model().to_string(),
            temperature: 0.4,
            max_tokens: 2048,
            timeout: Duration::from_secs(60),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Something that turns a classification request into raw completion text.
///
/// Implementations make exactly one attempt per call and never interpret
/// the completion; that is the validator's job.
#[async_trait]
pub trait ClassificationProvider: Send + Sync {
    /// Short backend name used in logs and errors
    fn name(&self) -> &'static str;

    /// Model identifier requests are sent to
    fn model(&self) -> &str;

    async fn classify(&self, request: &ClassificationRequest) -> Result<String, ProviderError>;
}

/// Build the provider selected by `config.kind`
pub fn build_provider(
    config: &ProviderConfig,
) -> Result<Arc<dyn ClassificationProvider>, ProviderError> {
    let provider: Arc<dyn ClassificationProvider> = match config.kind {
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(config.clone())?),
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(config.clone())?),
    };
    Ok(provider)
}

fn http_client(provider: &'static str, timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::transport(provider, format!("failed to build HTTP client: {e}")))
}

fn map_send_error(provider: &'static str, timeout: Duration, err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::timeout(provider, timeout)
    } else {
        ProviderError::transport(provider, err.to_string())
    }
}

/// Send a JSON body and return the successful response text
async fn post_for_text(
    provider: &'static str,
    timeout: Duration,
    request: reqwest::RequestBuilder,
) -> Result<String, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| map_send_error(provider, timeout, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(provider, status = status.as_u16(), body = %body, "Backend rejected request");
        return Err(ProviderError::rejected(
            provider,
            Some(status.as_u16()),
            format!("HTTP {status}"),
            Some(body),
        ));
    }

    response
        .text()
        .await
        .map_err(|e| map_send_error(provider, timeout, e))
}

fn decode_envelope<T: for<'de> Deserialize<'de>>(
    provider: &'static str,
    body: String,
) -> Result<T, ProviderError> {
    serde_json::from_str(&body).map_err(|e| {
        ProviderError::rejected(
            provider,
            None,
            format!("undecodable response envelope: {e}"),
            Some(body),
        )
    })
}

/// OpenAI chat-completions backend
pub struct OpenAiProvider {
    client: Client,
    config: ProviderConfig,
}

impl OpenAiProvider {
    const NAME: &'static str = "openai";

    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(Self::NAME, config.timeout)?,
            config,
        })
    }
}

#[async_trait]
impl ClassificationProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn classify(&self, request: &ClassificationRequest) -> Result<String, ProviderError> {
        let body = OpenAiRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
        };

        debug!(model = %self.config.model, endpoint = %self.config.endpoint, "Sending classification request");
        let text = post_for_text(
            Self::NAME,
            self.config.timeout,
            self.client
                .post(&self.config.endpoint)
                .bearer_auth(&self.config.api_key)
                .json(&body),
        )
        .await?;

        let response: OpenAiResponse = decode_envelope(Self::NAME, text)?;
        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

/// Anthropic messages backend
pub struct AnthropicProvider {
    client: Client,
    config: ProviderConfig,
}

impl AnthropicProvider {
    const NAME: &'static str = "anthropic";

    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(Self::NAME, config.timeout)?,
            config,
        })
    }
}

#[async_trait]
impl ClassificationProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn classify(&self, request: &ClassificationRequest) -> Result<String, ProviderError> {
        let body = AnthropicRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            system: Some(&request.system),
            messages: vec![ChatMessage {
                role: "user",
                content: &request.user,
            }],
        };

        debug!(model = %self.config.model, endpoint = %self.config.endpoint, "Sending classification request");
        let text = post_for_text(
            Self::NAME,
            self.config.timeout,
            self.client
                .post(&self.config.endpoint)
                .header("x-api-key", &self.config.api_key)
                .header("anthropic-version", "2023-06-01")
                .json(&body),
        )
        .await?;

        let response: AnthropicResponse = decode_envelope(Self::NAME, text)?;
        Ok(response
            .content
            .into_iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join(""))
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    temperature: f64,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}
