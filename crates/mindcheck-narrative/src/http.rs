//! HTTP client for an OpenAI-compatible chat-completions service.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::request::{NarrativeRequest, parse_completion};
use crate::service::NarrativeService;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.1-8b-instruct:free";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum NarrativeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response contained no choices")]
    NoChoices,
    #[error("response contained no text")]
    EmptyContent,
    #[error("no API key configured for the narrative service")]
    MissingApiKey,
}

/// Connection settings for the narrative service.
#[derive(Debug, Clone)]
pub struct NarrativeConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
    /// Sent as `HTTP-Referer`.
    pub referer: Option<String>,
    /// Sent as `X-Title`.
    pub title: Option<String>,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: None,
            model: DEFAULT_MODEL.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            referer: Some("http://localhost:3000".into()),
            title: Some("Mental Health Analysis".into()),
        }
    }
}

/// Chat-completions client. One request per call, no retries.
pub struct NarrativeClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    referer: Option<String>,
    title: Option<String>,
}

impl NarrativeClient {
    pub fn new(config: &NarrativeConfig) -> Result<Self, NarrativeError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/chat/completions",
                config.base_url.trim_end_matches('/')
            ),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            referer: config.referer.clone(),
            title: config.title.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl NarrativeService for NarrativeClient {
    async fn generate(&self, request: &NarrativeRequest) -> Result<String, NarrativeError> {
        let api_key = self.api_key.as_deref().ok_or(NarrativeError::MissingApiKey)?;

        info!(url = %self.endpoint, model = %request.model, max_tokens = request.max_tokens, "requesting narrative");
        let mut builder = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(request);
        if let Some(referer) = &self.referer {
            builder = builder.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.title {
            builder = builder.header("X-Title", title);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NarrativeError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let text = parse_completion(&body)?;
        debug!(chars = text.len(), "narrative received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> NarrativeRequest {
        NarrativeRequest {
            model: "test-model".into(),
            messages: vec![crate::request::ChatMessage::user("hello")],
            max_tokens: 10,
            temperature: None,
        }
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let client = NarrativeClient::new(&NarrativeConfig {
            base_url: "http://localhost:8080/v1/".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = NarrativeClient::new(&NarrativeConfig {
            api_key: Some("   ".into()),
            ..Default::default()
        })
        .unwrap();
        assert!(matches!(
            client.generate(&request()).await,
            Err(NarrativeError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn unreachable_service_is_http_error() {
        let client = NarrativeClient::new(&NarrativeConfig {
            base_url: "http://127.0.0.1:1".into(),
            api_key: Some("key".into()),
            timeout: Duration::from_secs(2),
            ..Default::default()
        })
        .unwrap();
        assert!(matches!(
            client.generate(&request()).await,
            Err(NarrativeError::Http(_))
        ));
    }
}
