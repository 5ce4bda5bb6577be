// HTTP client for the hosted LLM API

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use super::retry::with_retry;
use super::types::{MessageRequest, MessageResponse};

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl LlmClient {
    pub fn new(api_key: String, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            api_url: DEFAULT_API_URL.to_string(),
        })
    }

    /// Override the API endpoint (self-hosted gateways, tests)
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Send a message request with retry logic
    pub async fn send(&self, request: &MessageRequest) -> Result<MessageResponse> {
        with_retry(|| self.send_once(request)).await
    }

    /// Send a single message request (no retry)
    async fn send_once(&self, request: &MessageRequest) -> Result<MessageResponse> {
        tracing::debug!(model = %request.model, "Sending request to LLM API");

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .context("Failed to send request to LLM API")?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("LLM API request failed\n\nStatus: {}\nBody: {}", status, error_body);
        }

        let message_response: MessageResponse = response
            .json()
            .await
            .context("Failed to parse LLM API response")?;

        tracing::debug!(stop_reason = ?message_response.stop_reason, "Received LLM response");

        Ok(message_response)
    }
}
