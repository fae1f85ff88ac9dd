use crate::ai::ContentGenerator;
use crate::wire::{GenerateContentRequest, GenerateContentResponse};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini REST client for multimodal `generateContent` calls.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    /// Construct a Gemini client.
    ///
    /// `model` should be the bare model ID (for example `gemini-1.5-flash`);
    /// a `models/` prefix is stripped.
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, model, timeout, Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();

        Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Returns the configured model ID without the `models/` prefix.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_content_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate(&self, request: &GenerateContentRequest) -> Result<String> {
        let response = self
            .client
            .post(self.generate_content_url())
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Gemini: {}", e);
                e
            })?;

        let status = response.status();
        let body = response.text().await?;
        let parsed = serde_json::from_str::<GenerateContentResponse>(&body);

        if !status.is_success() || parsed.as_ref().is_ok_and(|r| r.error.is_some()) {
            tracing::error!("Gemini API error (status {}): {}", status, body);
            return Err(match parsed.as_ref().ok().and_then(|r| r.error_message()) {
                Some(message) => Error::Upstream(message.to_string()),
                None => Error::UpstreamStatus(status.as_u16()),
            });
        }

        let parsed = parsed.map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}\nBody: {}", e, body);
            Error::EmptyCompletion
        })?;

        match parsed.first_text() {
            Some(text) => Ok(text.to_string()),
            None => {
                tracing::error!("Gemini response has no usable text: {}", body);
                Err(Error::EmptyCompletion)
            }
        }
    }
}
