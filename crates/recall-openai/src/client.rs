// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible and Azure OpenAI endpoints.
//!
//! [`OpenAiClient`] handles URL routing, authentication, and retrying
//! transient errors for both chat completions and embeddings.

use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use recall_core::RecallError;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::sse::{self, SseEvent};
use crate::types::{
    ApiErrorResponse, ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse,
};

/// Which endpoint family a request targets. Decides the error variant a
/// failure maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Chat,
    Embeddings,
}

impl ServiceKind {
    fn path(self) -> &'static str {
        match self {
            ServiceKind::Chat => "chat/completions",
            ServiceKind::Embeddings => "embeddings",
        }
    }

    fn error(self, message: String, source: Option<recall_core::error::BoxError>) -> RecallError {
        match self {
            ServiceKind::Chat => RecallError::CompletionUnavailable { message, source },
            ServiceKind::Embeddings => RecallError::RetrievalUnavailable { message, source },
        }
    }
}

/// HTTP client for OpenAI API communication.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_version: Option<String>,
    max_retries: u32,
}

impl OpenAiClient {
    /// Creates a client.
    ///
    /// A set `api_version` switches to Azure deployment routing and the
    /// `api-key` header; otherwise bearer authentication is used.
    pub fn new(
        api_key: &SecretString,
        endpoint: &str,
        api_version: Option<String>,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, RecallError> {
        let mut headers = HeaderMap::new();
        let (name, raw) = if api_version.is_some() {
            (
                HeaderName::from_static("api-key"),
                api_key.expose_secret().to_string(),
            )
        } else {
            (AUTHORIZATION, format!("Bearer {}", api_key.expose_secret()))
        };
        let mut value = HeaderValue::from_str(&raw)
            .map_err(|e| RecallError::Config(format!("invalid API key header value: {e}")))?;
        value.set_sensitive(true);
        headers.insert(name, value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| RecallError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(endpoint),
            api_version,
            max_retries,
        })
    }

    /// True when requests use Azure deployment routing.
    pub fn is_azure(&self) -> bool {
        self.api_version.is_some()
    }

    /// Full request URL for `kind` against `model` (the deployment on Azure).
    pub fn endpoint_url(&self, kind: ServiceKind, model: &str) -> String {
        match &self.api_version {
            Some(version) => format!(
                "{}/openai/deployments/{model}/{}?api-version={version}",
                self.base_url,
                kind.path()
            ),
            None if has_version_suffix(&self.base_url) => {
                format!("{}/{}", self.base_url, kind.path())
            }
            None => format!("{}/v1/{}", self.base_url, kind.path()),
        }
    }

    /// Sends a non-streaming chat completion.
    pub async fn complete_chat(&self, request: &ChatRequest) -> Result<ChatResponse, RecallError> {
        let mut req = request.clone();
        req.stream = false;
        req.stream_options = None;
        let url = self.endpoint_url(ServiceKind::Chat, &req.model);
        let response = self.send(ServiceKind::Chat, &url, &req).await?;
        read_json(ServiceKind::Chat, response).await
    }

    /// Sends a streaming chat completion and returns its SSE events.
    pub async fn stream_chat(
        &self,
        request: &ChatRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<SseEvent, RecallError>> + Send>>, RecallError>
    {
        let mut req = request.clone();
        req.stream = true;
        let url = self.endpoint_url(ServiceKind::Chat, &req.model);
        let response = self.send(ServiceKind::Chat, &url, &req).await?;
        Ok(sse::parse_sse_stream(response))
    }

    /// Requests embeddings for a batch of texts.
    pub async fn embed(
        &self,
        request: &EmbeddingRequest,
    ) -> Result<EmbeddingResponse, RecallError> {
        let url = self.endpoint_url(ServiceKind::Embeddings, &request.model);
        let response = self.send(ServiceKind::Embeddings, &url, request).await?;
        read_json(ServiceKind::Embeddings, response).await
    }

    /// POSTs `body`, retrying transient statuses after a 1-second delay.
    async fn send<B: Serialize + ?Sized>(
        &self,
        kind: ServiceKind,
        url: &str,
        body: &B,
    ) -> Result<reqwest::Response, RecallError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, ?kind, "retrying request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(url)
                .json(body)
                .send()
                .await
                .map_err(|e| kind.error(format!("HTTP request failed: {e}"), Some(Box::new(e))))?;

            let status = response.status();
            debug!(status = %status, attempt, ?kind, "response received");

            if status.is_success() {
                return Ok(response);
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(kind.error(format!("API returned {status}: {body}"), None));
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "OpenAI API error ({}): {}",
                    api_err.error.kind(),
                    api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(kind.error(message, None));
        }

        Err(last_error.unwrap_or_else(|| kind.error("request failed after retries".into(), None)))
    }
}

async fn read_json<T: DeserializeOwned>(
    kind: ServiceKind,
    response: reqwest::Response,
) -> Result<T, RecallError> {
    let body = response.text().await.map_err(|e| {
        kind.error(format!("failed to read response body: {e}"), Some(Box::new(e)))
    })?;
    serde_json::from_str(&body).map_err(|e| {
        kind.error(format!("failed to parse API response: {e}"), Some(Box::new(e)))
    })
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

fn normalize_base_url(endpoint: &str) -> String {
    endpoint.trim().trim_end_matches('/').to_string()
}

/// True when the last path segment looks like `v1`, `v2beta`, and so on.
fn has_version_suffix(base_url: &str) -> bool {
    let Some(last) = base_url.rsplit('/').next() else {
        return false;
    };
    let Some(rest) = last.strip_prefix('v') else {
        return false;
    };
    rest.chars().next().is_some_and(|c| c.is_ascii_digit())
        && rest.chars().all(|c| c.is_ascii_alphanumeric())
}
