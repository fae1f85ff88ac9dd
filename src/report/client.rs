use super::{build_request, ReportService};
use crate::models::DEFAULT_UPSTREAM_TIMEOUT_SECS;
use crate::wire::GenerateContentResponse;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const MISSING_TEXT_MESSAGE: &str = "La respuesta de la IA no contiene texto.";

/// Slightly longer than the proxy's own upstream limit so its timeout
/// envelope arrives first.
pub const REPORT_TIMEOUT: Duration = Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS + 10);

/// HTTP client for the report proxy endpoint.
pub struct ReportClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl ReportClient {
    pub fn new(endpoint: String) -> Self {
        Self::new_with_client(endpoint, Client::new())
    }

    pub fn new_with_client(endpoint: String, client: Client) -> Self {
        Self {
            client,
            endpoint,
            timeout: REPORT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Error body as any proxy might send it; both fields may be missing.
#[derive(Deserialize)]
struct FailureBody {
    error: Option<String>,
    details: Option<String>,
}

/// Pick the user-facing message for a failed proxy call.
fn failure_message(status: reqwest::StatusCode, body: &str) -> String {
    let parsed = serde_json::from_str::<FailureBody>(body).ok();
    let non_empty = |m: Option<String>| m.filter(|m| !m.is_empty());

    parsed
        .and_then(|b| non_empty(b.details).or_else(|| non_empty(b.error)))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string())
        })
}

#[async_trait]
impl ReportService for ReportClient {
    async fn request_report(
        &self,
        image: &[u8],
        mime_type: &str,
        medical_history: &str,
    ) -> Result<String> {
        let request = build_request(image, mime_type, medical_history);

        tracing::debug!(
            "Requesting report for {} byte {} image from {}",
            image.len(),
            mime_type,
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach report proxy: {}", e);
                e
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = failure_message(status, &body);
            tracing::error!("Report proxy error (status {}): {}", status, message);
            return Err(Error::Report(message));
        }

        serde_json::from_str::<GenerateContentResponse>(&body)
            .ok()
            .as_ref()
            .and_then(|r| r.first_text())
            .map(str::to_string)
            .ok_or_else(|| {
                tracing::error!("Report proxy response has no text: {}", body);
                Error::Report(MISSING_TEXT_MESSAGE.to_string())
            })
    }
}
