// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI and Azure OpenAI adapters for recall.
//!
//! [`OpenAiProvider`] implements [`ProviderAdapter`] over the
//! chat-completions API, both single-shot and streamed. [`OpenAiEmbedder`]
//! implements [`EmbeddingAdapter`] over the embeddings API.

pub mod client;
pub mod embedding;
pub mod sse;
pub mod types;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use recall_config::model::OpenAiConfig;
use recall_core::{
    ContentBlock, PluginAdapter, ProviderAdapter, ProviderMessage, ProviderRequest,
    ProviderResponse, ProviderStream, ProviderStreamChunk, RecallError, StreamEventType,
    TokenUsage, ToolUseData,
};
use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::client::OpenAiClient;
use crate::sse::SseEvent;
use crate::types::{
    ApiFunction, ApiFunctionCall, ApiMessage, ApiTool, ApiToolCall, ChatChunk, ChatRequest,
    StreamOptions, Usage,
};

pub use embedding::OpenAiEmbedder;

/// Environment variable consulted when the config carries no key.
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// Chat-completions provider implementing [`ProviderAdapter`].
///
/// API key resolution order: config -> `OPENAI_API_KEY` env var -> error.
pub struct OpenAiProvider {
    client: OpenAiClient,
    model: String,
}

impl OpenAiProvider {
    /// Creates a provider from the `[openai]` config section.
    pub fn new(config: &OpenAiConfig) -> Result<Self, RecallError> {
        let client = build_client(config)?;
        info!(
            model = config.chat_model,
            azure = client.is_azure(),
            "OpenAI provider initialized"
        );
        Ok(Self {
            client,
            model: config.chat_model.clone(),
        })
    }

    #[cfg(test)]
    fn with_client(client: OpenAiClient, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }

    fn to_chat_request(&self, request: &ProviderRequest) -> ChatRequest {
        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };
        let tools = request
            .tools
            .as_ref()
            .filter(|tools| !tools.is_empty())
            .map(|tools| {
                tools
                    .iter()
                    .map(|t| ApiTool {
                        type_: "function",
                        function: ApiFunction {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: t.parameters.clone(),
                        },
                    })
                    .collect::<Vec<_>>()
            });
        let tool_choice = tools.as_ref().map(|_| "auto".to_string());

        ChatRequest {
            model,
            messages: convert_messages(&request.messages),
            max_tokens: request.max_tokens,
            stream: request.stream,
            tools,
            tool_choice,
            stream_options: request
                .stream
                .then_some(StreamOptions { include_usage: true }),
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn shutdown(&self) -> Result<(), RecallError> {
        debug!("OpenAI provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, RecallError> {
        let api_request = self.to_chat_request(&request);
        let response = self.client.complete_chat(&api_request).await?;

        let first = response.choices.into_iter().next();
        let stop_reason = first.as_ref().and_then(|c| c.finish_reason.clone());
        let content = first.and_then(|c| c.message.content);

        Ok(ProviderResponse {
            id: response.id,
            content,
            model: response.model,
            stop_reason,
            usage: response.usage.map(convert_usage),
        })
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ProviderStream, RecallError> {
        let mut api_request = self.to_chat_request(&request);
        api_request.stream = true;
        api_request.stream_options = Some(StreamOptions {
            include_usage: true,
        });
        let event_stream = self.client.stream_chat(&api_request).await?;

        let mut state = StreamState::default();
        let chunk_stream = event_stream.flat_map(move |result| {
            let chunks = match result {
                Ok(event) => state.apply(event),
                Err(e) => vec![Err(e)],
            };
            stream::iter(chunks)
        });

        Ok(Box::pin(chunk_stream))
    }
}

/// Accumulates streamed deltas into [`ProviderStreamChunk`]s.
#[derive(Default)]
struct StreamState {
    started: bool,
    /// Tool call index -> (id, name, accumulated arguments).
    tool_calls: BTreeMap<usize, (String, String, String)>,
    stop_reason: Option<String>,
    usage: Option<TokenUsage>,
}

impl StreamState {
    fn apply(&mut self, event: SseEvent) -> Vec<Result<ProviderStreamChunk, RecallError>> {
        match event {
            SseEvent::Chunk(chunk) => self.apply_chunk(chunk),
            SseEvent::Done => {
                let mut out = self.flush_tool_calls();
                out.push(Ok(ProviderStreamChunk {
                    usage: self.usage,
                    stop_reason: self.stop_reason.clone(),
                    ..ProviderStreamChunk::event(StreamEventType::MessageDelta)
                }));
                out.push(Ok(ProviderStreamChunk {
                    stop_reason: self.stop_reason.clone(),
                    ..ProviderStreamChunk::event(StreamEventType::MessageStop)
                }));
                out
            }
        }
    }

    fn apply_chunk(&mut self, chunk: ChatChunk) -> Vec<Result<ProviderStreamChunk, RecallError>> {
        let mut out = Vec::new();

        if !self.started {
            self.started = true;
            let role = chunk.choices.first().and_then(|c| c.delta.role.clone());
            out.push(Ok(ProviderStreamChunk {
                role,
                ..ProviderStreamChunk::event(StreamEventType::MessageStart)
            }));
        }

        if let Some(usage) = chunk.usage {
            self.usage = Some(convert_usage(usage));
        }

        for choice in chunk.choices {
            if let Some(text) = choice.delta.content {
                out.push(Ok(ProviderStreamChunk::text(text)));
            }
            for call in choice.delta.tool_calls.unwrap_or_default() {
                let entry = self
                    .tool_calls
                    .entry(call.index)
                    .or_insert_with(|| (String::new(), String::new(), String::new()));
                if let Some(id) = call.id {
                    entry.0 = id;
                }
                if let Some(function) = call.function {
                    if let Some(name) = function.name {
                        entry.1.push_str(&name);
                    }
                    if let Some(arguments) = function.arguments {
                        entry.2.push_str(&arguments);
                    }
                }
            }
            if let Some(reason) = choice.finish_reason {
                out.extend(self.flush_tool_calls());
                self.stop_reason = Some(reason);
            }
        }

        out
    }

    fn flush_tool_calls(&mut self) -> Vec<Result<ProviderStreamChunk, RecallError>> {
        std::mem::take(&mut self.tool_calls)
            .into_values()
            .map(|(id, name, arguments)| {
                let input = if arguments.trim().is_empty() {
                    serde_json::Value::Object(serde_json::Map::new())
                } else {
                    serde_json::from_str(&arguments).unwrap_or_else(|e| {
                        warn!(error = %e, json = %arguments, "failed to parse tool call arguments");
                        serde_json::json!({"_parse_error": e.to_string(), "_raw": arguments})
                    })
                };
                Ok(ProviderStreamChunk {
                    tool_use: Some(ToolUseData { id, name, input }),
                    ..ProviderStreamChunk::event(StreamEventType::ContentBlockStop)
                })
            })
            .collect()
    }
}

fn convert_usage(usage: Usage) -> TokenUsage {
    TokenUsage {
        input_tokens: usage.prompt_tokens,
        output_tokens: usage.completion_tokens,
    }
}

/// Converts provider messages to the chat wire format.
///
/// Tool results become separate `tool`-role messages following the message
/// that carried them.
fn convert_messages(messages: &[ProviderMessage]) -> Vec<ApiMessage> {
    let mut out = Vec::with_capacity(messages.len());
    for message in messages {
        let mut text = String::new();
        let mut tool_calls = Vec::new();
        let mut results = Vec::new();

        for block in &message.content {
            match block {
                ContentBlock::Text { text: t } => text.push_str(t),
                ContentBlock::ToolUse { id, name, input } => tool_calls.push(ApiToolCall {
                    id: id.clone(),
                    type_: "function".into(),
                    function: ApiFunctionCall {
                        name: name.clone(),
                        arguments: input.to_string(),
                    },
                }),
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    ..
                } => results.push(ApiMessage {
                    role: "tool".into(),
                    content: Some(content.clone()),
                    tool_calls: None,
                    tool_call_id: Some(tool_use_id.clone()),
                }),
            }
        }

        let only_results = text.is_empty() && tool_calls.is_empty() && !results.is_empty();
        if !only_results {
            out.push(ApiMessage {
                role: message.role.clone(),
                content: if text.is_empty() && !tool_calls.is_empty() {
                    None
                } else {
                    Some(text)
                },
                tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                tool_call_id: None,
            });
        }
        out.extend(results);
    }
    out
}

/// Resolves the API key from config or the `OPENAI_API_KEY` environment variable.
pub fn resolve_api_key(config_key: &Option<String>) -> Result<SecretString, RecallError> {
    if let Some(key) = config_key {
        if !key.is_empty() {
            return Ok(SecretString::from(key.clone()));
        }
    }

    match std::env::var(API_KEY_ENV_VAR) {
        Ok(key) if !key.is_empty() => Ok(SecretString::from(key)),
        _ => Err(RecallError::Config(format!(
            "OpenAI API key not found. Set openai.api_key in config or the {API_KEY_ENV_VAR} environment variable."
        ))),
    }
}

pub(crate) fn build_client(config: &OpenAiConfig) -> Result<OpenAiClient, RecallError> {
    let api_key = resolve_api_key(&config.api_key)?;
    OpenAiClient::new(
        &api_key,
        &config.endpoint,
        config.api_version.clone(),
        Duration::from_secs(config.timeout_secs),
        config.max_retries,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::ToolDefinition;
    use serial_test::serial;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> OpenAiClient {
        OpenAiClient::new(
            &SecretString::from("sk-test"),
            base_url,
            None,
            Duration::from_secs(5),
            0,
        )
        .unwrap()
    }

    fn request(stream: bool) -> ProviderRequest {
        ProviderRequest {
            model: String::new(),
            messages: vec![
                ProviderMessage::text("system", "You help insurance agents."),
                ProviderMessage::text("user", "Hello"),
            ],
            max_tokens: 128,
            stream,
            tools: None,
        }
    }

    async fn mount_sse(server: &MockServer, body: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body.to_string()),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn tool_round_trip_messages_convert() {
        let messages = vec![
            ProviderMessage {
                role: "assistant".into(),
                content: vec![ContentBlock::ToolUse {
                    id: "call_1".into(),
                    name: "query_database".into(),
                    input: serde_json::json!({"request": "count sessions"}),
                }],
            },
            ProviderMessage {
                role: "user".into(),
                content: vec![ContentBlock::ToolResult {
                    tool_use_id: "call_1".into(),
                    content: "[{\"n\":6}]".into(),
                    is_error: false,
                }],
            },
        ];

        let api = convert_messages(&messages);
        assert_eq!(api.len(), 2);
        assert_eq!(api[0].role, "assistant");
        assert!(api[0].content.is_none());
        let call = &api[0].tool_calls.as_ref().unwrap()[0];
        assert_eq!(call.function.name, "query_database");
        assert_eq!(call.function.arguments, r#"{"request":"count sessions"}"#);
        assert_eq!(api[1].role, "tool");
        assert_eq!(api[1].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn chat_request_uses_default_model_and_auto_tool_choice() {
        let provider = OpenAiProvider::with_client(test_client("http://localhost"), "gpt-4o");
        let mut req = request(false);
        req.tools = Some(vec![ToolDefinition {
            name: "find_similar_sessions".into(),
            description: "Find sessions".into(),
            parameters: serde_json::json!({"type": "object"}),
        }]);

        let api = provider.to_chat_request(&req);
        assert_eq!(api.model, "gpt-4o");
        assert_eq!(api.tool_choice.as_deref(), Some("auto"));
        assert_eq!(api.tools.as_ref().unwrap()[0].function.name, "find_similar_sessions");
        assert!(api.stream_options.is_none());
    }

    #[tokio::test]
    async fn complete_returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "c9",
                "model": "gpt-4o",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "SELECT 1"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 3, "completion_tokens": 2}
            })))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::with_client(test_client(&server.uri()), "gpt-4o");
        let response = provider.complete(request(false)).await.unwrap();
        assert_eq!(response.content.as_deref(), Some("SELECT 1"));
        assert_eq!(response.stop_reason.as_deref(), Some("stop"));
        assert_eq!(response.usage.unwrap().output_tokens, 2);
    }

    #[tokio::test]
    async fn complete_without_choices_has_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "c0", "choices": []})),
            )
            .mount(&server)
            .await;

        let provider = OpenAiProvider::with_client(test_client(&server.uri()), "gpt-4o");
        let response = provider.complete(request(false)).await.unwrap();
        assert!(response.content.is_none());
    }

    #[tokio::test]
    async fn stream_emits_text_in_order() {
        let server = MockServer::start().await;
        let sse = concat!(
            "data: {\"id\":\"s\",\"choices\":[],\"prompt_filter_results\":[]}\n\n",
            "data: {\"id\":\"s\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
            "data: {\"id\":\"s\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Premiums \"}}]}\n\n",
            "data: {\"id\":\"s\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"rose.\"},\"finish_reason\":\"stop\"}]}\n\n",
            "data: {\"id\":\"s\",\"choices\":[],\"usage\":{\"prompt_tokens\":7,\"completion_tokens\":3}}\n\n",
            "data: [DONE]\n\n",
        );
        mount_sse(&server, sse).await;

        let provider = OpenAiProvider::with_client(test_client(&server.uri()), "gpt-4o");
        let chunks: Vec<_> = provider
            .stream(request(true))
            .await
            .unwrap()
            .map(|c| c.unwrap())
            .collect()
            .await;

        assert_eq!(chunks[0].event_type, StreamEventType::MessageStart);
        let text: Vec<_> = chunks.iter().filter_map(|c| c.text.clone()).collect();
        assert_eq!(text, vec!["", "Premiums ", "rose."]);

        let delta = chunks
            .iter()
            .find(|c| c.event_type == StreamEventType::MessageDelta)
            .unwrap();
        assert_eq!(delta.usage.unwrap().input_tokens, 7);
        let last = chunks.last().unwrap();
        assert_eq!(last.event_type, StreamEventType::MessageStop);
        assert_eq!(last.stop_reason.as_deref(), Some("stop"));
    }

    #[tokio::test]
    async fn stream_accumulates_tool_call_fragments() {
        let server = MockServer::start().await;
        let sse = concat!(
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"tool_calls\":[{\"index\":0,\"id\":\"call_7\",\"type\":\"function\",\"function\":{\"name\":\"query_database\",\"arguments\":\"\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"{\\\"request\\\":\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"\\\"AI talks\\\"}\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"tool_calls\"}]}\n\n",
            "data: [DONE]\n\n",
        );
        mount_sse(&server, sse).await;

        let provider = OpenAiProvider::with_client(test_client(&server.uri()), "gpt-4o");
        let chunks: Vec<_> = provider
            .stream(request(true))
            .await
            .unwrap()
            .map(|c| c.unwrap())
            .collect()
            .await;

        let calls: Vec<_> = chunks.iter().filter_map(|c| c.tool_use.clone()).collect();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_7");
        assert_eq!(calls[0].name, "query_database");
        assert_eq!(calls[0].input, serde_json::json!({"request": "AI talks"}));
        assert!(chunks.iter().all(|c| c.text.is_none()));
        assert_eq!(
            chunks.last().unwrap().stop_reason.as_deref(),
            Some("tool_calls")
        );
    }

    #[tokio::test]
    async fn stream_error_status_is_completion_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::with_client(test_client(&server.uri()), "gpt-4o");
        let result = provider.stream(request(true)).await;
        assert!(matches!(
            result,
            Err(RecallError::CompletionUnavailable { .. })
        ));
    }

    #[test]
    #[serial]
    fn api_key_prefers_config() {
        let key = resolve_api_key(&Some("sk-config".into())).unwrap();
        assert_eq!(secrecy::ExposeSecret::expose_secret(&key), "sk-config");
    }

    #[test]
    #[serial]
    fn api_key_falls_back_to_env() {
        // SAFETY: test-only env mutation, serialized with #[serial].
        unsafe { std::env::set_var(API_KEY_ENV_VAR, "sk-env") };
        let key = resolve_api_key(&Some(String::new())).unwrap();
        assert_eq!(secrecy::ExposeSecret::expose_secret(&key), "sk-env");

        // SAFETY: test-only env mutation, serialized with #[serial].
        unsafe { std::env::remove_var(API_KEY_ENV_VAR) };
        let err = resolve_api_key(&None).unwrap_err();
        assert!(matches!(err, RecallError::Config(_)));
    }
}
