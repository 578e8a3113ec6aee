//! OpenAI chat-completions backend, also used for local servers.

use std::fmt;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, future};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{Completion, NarrativeProvider, PromptRequest, ProviderConfig, TextStream, sse};
use crate::error::{NarrativeError, NarrativeResult};

/// A provider speaking the OpenAI chat-completions protocol.
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: ProviderConfig,
    api_key: Option<String>,
}

impl OpenAiCompatibleProvider {
    /// Build a provider. Hosted backends need an API key, from the config or
    /// the environment.
    pub fn new(config: ProviderConfig) -> NarrativeResult<Self> {
        let api_key = config.resolve_api_key()?;
        Ok(Self {
            client: Client::new(),
            config,
            api_key,
        })
    }

    fn body(&self, request: &PromptRequest, stream: bool) -> serde_json::Value {
        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": request.prompt }));
        let mut body = json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": request.temperature.unwrap_or(self.config.temperature),
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
        });
        if stream {
            body["stream"] = json!(true);
        }
        body
    }

    fn post(&self, request: &PromptRequest, stream: bool) -> RequestBuilder {
        let url = self.config.endpoint("chat/completions");
        debug!(provider = self.name(), model = %self.config.model, %url, stream, "requesting completion");
        let http = self.client.post(&url).json(&self.body(request, stream));
        match &self.api_key {
            Some(key) => http.bearer_auth(key),
            None => http,
        }
    }
}

impl fmt::Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("kind", &self.config.kind)
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl NarrativeProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        self.config.kind.id()
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, request: PromptRequest) -> NarrativeResult<Completion> {
        let response: ChatResponse = self
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
        Ok(deltas(sse::data_lines(response.bytes_stream())))
    }
}

/// Text deltas of a chat-completions event stream, up to `[DONE]`.
fn deltas(events: TextStream) -> TextStream {
    events
        .try_take_while(|data| future::ready(Ok(data.trim() != "[DONE]")))
        .try_filter_map(|data| future::ready(delta_text(&data)))
        .boxed()
}

fn delta_text(data: &str) -> NarrativeResult<Option<String>> {
    let chunk: ChatChunk = serde_json::from_str(data)
        .map_err(|e| NarrativeError::MalformedResponse(format!("stream chunk: {e}")))?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|text| !text.is_empty()))
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChatMessage,
}

impl ChatResponse {
    fn into_completion(self) -> NarrativeResult<Completion> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| NarrativeError::MalformedResponse("no choices".to_string()))?;
        let usage = self.usage.unwrap_or_default();
        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            model: self.model,
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            stop_reason: choice.finish_reason.unwrap_or_default(),
        })
    }
}
