//! Anthropic messages backend.

use std::fmt;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, future};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{Completion, NarrativeProvider, PromptRequest, ProviderConfig, TextStream, sse};
use crate::error::{NarrativeError, NarrativeResult};

/// Value of the `anthropic-version` header.
const API_VERSION: &str = "2023-06-01";

/// A provider speaking Anthropic's messages protocol.
pub struct AnthropicProvider {
    client: Client,
    config: ProviderConfig,
    api_key: String,
}

impl AnthropicProvider {
    /// Build a provider. The API key comes from the config or
    /// `ANTHROPIC_API_KEY`.
    pub fn new(config: ProviderConfig) -> NarrativeResult<Self> {
        let api_key = config
            .resolve_api_key()?
            .ok_or_else(|| NarrativeError::MissingApiKey {
                provider: config.kind.to_string(),
                var: "ANTHROPIC_API_KEY".to_string(),
            })?;
        Ok(Self {
            client: Client::new(),
            config,
            api_key,
        })
    }

    fn body(&self, request: &PromptRequest, stream: bool) -> serde_json::Value {
        let mut body = json!({
            "model": self.config.model,
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
            "temperature": request.temperature.unwrap_or(self.config.temperature),
            "messages": [{ "role": "user", "content": request.prompt }],
        });
        // the system prompt is a top-level field, not a message
        if let Some(system) = &request.system {
            body["system"] = json!(system);
        }
        if stream {
            body["stream"] = json!(true);
        }
        body
    }

    fn post(&self, request: &PromptRequest, stream: bool) -> RequestBuilder {
        let url = self.config.endpoint("messages");
        debug!(provider = self.name(), model = %self.config.model, %url, stream, "requesting completion");
        self.client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.body(request, stream))
    }
}

impl fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl NarrativeProvider for AnthropicProvider {
    fn name(&self) -> &str {
        self.config.kind.id()
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, request: PromptRequest) -> NarrativeResult<Completion> {
        let response: MessagesResponse = self
            .post(&request, false)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        response.into_completion()
    }

    async fn complete_stream(&self, request: PromptRequest) -> NarrativeResult<TextStream> {
        let response = self.post(&request, true).send().await?.error_for_status()?;
        Ok(text_deltas(sse::data_lines(response.bytes_stream())))
    }
}

/// Text of the `content_block_delta` events in a messages event stream.
fn text_deltas(events: TextStream) -> TextStream {
    events
        .try_filter_map(|data| future::ready(delta_text(&data)))
        .boxed()
}

fn delta_text(data: &str) -> NarrativeResult<Option<String>> {
    let event: StreamEvent = serde_json::from_str(data)
        .map_err(|e| NarrativeError::MalformedResponse(format!("stream event: {e}")))?;
    match event {
        StreamEvent::ContentBlockDelta { delta } => Ok(delta.text.filter(|t| !t.is_empty())),
        StreamEvent::Error { error } => Err(NarrativeError::MalformedResponse(format!(
            "{}: {}",
            error.kind, error.message
        ))),
        StreamEvent::Other => Ok(None),
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    ContentBlockDelta { delta: TextDelta },
    Error { error: ApiError },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct TextDelta {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

impl MessagesResponse {
    fn into_completion(self) -> NarrativeResult<Completion> {
        let texts: Vec<String> = self
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();
        if texts.is_empty() {
            return Err(NarrativeError::MalformedResponse(
                "no text content".to_string(),
            ));
        }
        Ok(Completion {
            content: texts.concat(),
            model: self.model,
            input_tokens: self.usage.input_tokens,
            output_tokens: self.usage.output_tokens,
            stop_reason: self.stop_reason.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderKind;
    use futures::stream;

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new(ProviderConfig::new(ProviderKind::Anthropic).with_api_key("test-key"))
            .unwrap()
    }

    #[test]
    fn system_prompt_is_top_level() {
        let body = provider().body(
            &PromptRequest::new("hello")
                .with_system("be brief")
                .with_temperature(0.2),
            false,
        );
        assert_eq!(body["system"], "be brief");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["max_tokens"], 4000);
        assert_eq!(body["model"], "claude-sonnet-4-20250514");
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn body_without_system_omits_field() {
        let body = provider().body(&PromptRequest::new("hello"), true);
        assert!(body.get("system").is_none());
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn parses_messages_response() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"model": "claude-sonnet-4-20250514", "stop_reason": "end_turn",
                "content": [{"type": "text", "text": "The cards "}, {"type": "text", "text": "speak."}],
                "usage": {"input_tokens": 30, "output_tokens": 5}}"#,
        )
        .unwrap();
        let completion = response.into_completion().unwrap();
        assert_eq!(completion.content, "The cards speak.");
        assert_eq!(completion.total_tokens(), 35);
        assert_eq!(completion.stop_reason, "end_turn");
    }

    #[test]
    fn response_without_text_is_malformed() {
        let response: MessagesResponse =
            serde_json::from_str(r#"{"content": [{"type": "tool_use", "id": "x"}]}"#).unwrap();
        assert!(matches!(
            response.into_completion(),
            Err(NarrativeError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn stream_keeps_text_deltas() {
        let events = [
            r#"{"type": "message_start", "message": {"id": "m1"}}"#,
            r#"{"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}"#,
            r#"{"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Luck "}}"#,
            r#"{"type": "ping"}"#,
            r#"{"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "arrives."}}"#,
            r#"{"type": "message_stop"}"#,
        ];
        let events = stream::iter(events.map(|e| Ok(e.to_string()))).boxed();
        let text: Vec<String> = text_deltas(events).try_collect().await.unwrap();
        assert_eq!(text, vec!["Luck ", "arrives."]);
    }

    #[tokio::test]
    async fn stream_error_event_fails() {
        let events = [
            r#"{"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Luck"}}"#,
            r#"{"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}"#,
        ];
        let events = stream::iter(events.map(|e| Ok(e.to_string()))).boxed();
        let items: Vec<_> = text_deltas(events).collect().await;
        assert_eq!(items[0].as_deref().unwrap(), "Luck");
        let err = items[1].as_ref().unwrap_err().to_string();
        assert!(err.contains("overloaded_error: Overloaded"));
    }
}
