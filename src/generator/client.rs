//! Gemini client over the OpenAI-compatible chat completions endpoint

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::TextGenerator;
use crate::config::GeminiConfig;

/// Endpoint settings for one API key
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL, e.g. "https://generativelanguage.googleapis.com/v1beta/openai"
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: Option<u32>,
}

impl ProviderConfig {
    pub fn from_config(config: &GeminiConfig, api_key: String) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Arc<Client>,
    provider: ProviderConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl GeminiClient {
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            client: Arc::new(Client::new()),
            provider,
        }
    }

    /// Build from config, resolving the API key the usual way
    pub fn from_config(config: &crate::config::Config) -> Result<Self> {
        let api_key = crate::security::resolve_api_key()?;
        Ok(Self::new(ProviderConfig::from_config(&config.gemini, api_key)))
    }

    /// Single-turn completion returning the text of the first choice
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.provider.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            max_tokens: self.provider.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.provider.base_url))
            .header("Authorization", format!("Bearer {}", self.provider.api_key))
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Gemini")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Gemini API error ({}): {}", status, crate::truncate_safe(&body, 500));
        }

        let body = response.text().await.context("Failed to read response body")?;
        debug!("Gemini response: {}", crate::truncate_safe(&body, 2000));

        let raw: Value = serde_json::from_str(&body).map_err(|e| {
            anyhow::anyhow!(
                "Failed to parse JSON response: {} (body: {})",
                e,
                crate::truncate_safe(&body, 500)
            )
        })?;

        content_text(&raw).context("Gemini response contained no message content")
    }
}

/// Content of the first choice; string or array-of-parts
fn content_text(raw: &Value) -> Option<String> {
    let content = raw
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"))?;

    match content {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => {
            let text = parts
                .iter()
                .filter(|part| part.get("type").and_then(|t| t.as_str()) == Some("text"))
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("");
            Some(text)
        }
        _ => None,
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.complete(prompt).await
    }
}
