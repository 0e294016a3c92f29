//! Client for OpenAI-compatible chat completion APIs.
//!
//! Works with any service exposing `POST {base_url}/chat/completions`
//! (OpenAI, DashScope compatible mode, vLLM, llama.cpp server, ...).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::{
    error::EvalError,
    generator::{GenerationRequest, SharedGenerator},
};

/// Configuration for the OpenAI-compatible client.
#[derive(Debug)]
pub struct OpenAICompatibleConfig {
    /// API key for authentication.
    pub api_key: SecretString,
    /// Base URL of the API, without the trailing endpoint.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: Option<u64>,
}

/// Client for an OpenAI-compatible API.
///
/// `reqwest::Client` pools connections internally and is safe to share
/// between concurrent evaluation workers; the configuration sits behind an
/// `Arc`, making cloning cheap.
#[derive(Debug, Clone)]
pub struct OpenAICompatible {
    /// Shared configuration wrapped in Arc for cheap cloning.
    pub config: Arc<OpenAICompatibleConfig>,
    /// HTTP client for making requests.
    pub client: Client,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatMsg,
}

#[derive(Deserialize, Debug)]
struct ChatMsg {
    content: Option<String>,
}

impl OpenAICompatible {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout_seconds: Option<u64>,
    ) -> Result<Self, EvalError> {
        let mut builder = Client::builder();
        if let Some(sec) = timeout_seconds {
            builder = builder.timeout(Duration::from_secs(sec));
        }
        let client = builder.build()?;
        Ok(Self::with_client(
            client,
            api_key,
            base_url,
            model,
            timeout_seconds,
        ))
    }

    /// Creates a new client with a custom HTTP client.
    pub fn with_client(
        client: Client,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout_seconds: Option<u64>,
    ) -> Self {
        Self {
            config: Arc::new(OpenAICompatibleConfig {
                api_key: SecretString::new(api_key.into()),
                base_url: base_url.into(),
                model: model.into(),
                timeout_seconds,
            }),
            client,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn map_transport_error(&self, err: reqwest::Error) -> EvalError {
        if err.is_timeout() {
            EvalError::Timeout {
                seconds: self.config.timeout_seconds.unwrap_or_default(),
            }
        } else {
            err.into()
        }
    }
}

fn status_error(status: StatusCode, body: String) -> EvalError {
    let message = format!("{status}: {body}");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => EvalError::AuthError(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            EvalError::ProviderError(message)
        }
        // 425 Too Early: the request may be replayed later.
        s if s.as_u16() == 425 => EvalError::ProviderError(message),
        s if s.is_server_error() => EvalError::ProviderError(message),
        _ => EvalError::InvalidRequest(message),
    }
}

#[async_trait]
impl SharedGenerator for OpenAICompatible {
    /// Sends the prompt as a single user message and returns the trimmed
    /// content of the first choice.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, EvalError> {
        if self.config.api_key.expose_secret().is_empty() {
            return Err(EvalError::AuthError("Missing API key".to_string()));
        }

        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        };

        if log::log_enabled!(log::Level::Trace) {
            if let Ok(json) = serde_json::to_string(&body) {
                log::trace!("Chat completion request payload: {}", json);
            }
        }

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = resp.status();
        log::debug!("Chat completion HTTP status: {}", status);

        let raw = resp.text().await.map_err(|e| self.map_transport_error(e))?;
        if !status.is_success() {
            return Err(status_error(status, raw));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&raw).map_err(|e| EvalError::ResponseFormatError {
                message: e.to_string(),
                raw_response: raw.clone(),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default().trim().to_string())
            .ok_or_else(|| EvalError::ResponseFormatError {
                message: "response contained no choices".to_string(),
                raw_response: raw,
            })
    }
}
