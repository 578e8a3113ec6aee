//! Narrative Provider capability and its HTTP backends.
//!
//! Providers are injected as handles; a pipeline without one runs in
//! deterministic-only mode. Two wire protocols are spoken: Anthropic's
//! messages API and the OpenAI chat-completions protocol, which also covers
//! local servers such as Ollama.

mod anthropic;
mod openai;
mod sse;

use std::env;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::{NarrativeError, NarrativeResult};

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiCompatibleProvider;

/// Text chunks of a streamed completion, in arrival order.
pub type TextStream = BoxStream<'static, NarrativeResult<String>>;

/// One prompt for a provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PromptRequest {
    /// System prompt.
    pub system: Option<String>,
    /// User prompt.
    pub prompt: String,
    /// Overrides the provider's temperature.
    pub temperature: Option<f32>,
    /// Overrides the provider's token limit.
    pub max_tokens: Option<u32>,
}

impl PromptRequest {
    /// A request with only a user prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A provider's answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Generated text.
    pub content: String,
    /// Model that produced it.
    pub model: String,
    /// Prompt tokens.
    pub input_tokens: u32,
    /// Completion tokens.
    pub output_tokens: u32,
    /// Why generation stopped.
    pub stop_reason: String,
}

impl Completion {
    /// Prompt plus completion tokens.
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// A narrative backend.
#[async_trait]
pub trait NarrativeProvider: Send + Sync {
    /// Provider id, e.g. `openai`.
    fn name(&self) -> &str;

    /// Model identifier.
    fn model(&self) -> &str;

    /// Complete one prompt.
    async fn complete(&self, request: PromptRequest) -> NarrativeResult<Completion>;

    /// Complete one prompt, yielding text as it is generated.
    ///
    /// Backends without native streaming yield the whole completion as a
    /// single chunk.
    async fn complete_stream(&self, request: PromptRequest) -> NarrativeResult<TextStream> {
        let completion = self.complete(request).await?;
        Ok(stream::iter([Ok(completion.content)]).boxed())
    }
}

/// Known provider backends, selected by id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// The hosted Anthropic messages API.
    #[default]
    Anthropic,
    /// The hosted OpenAI API.
    OpenAi,
    /// A local OpenAI-compatible server such as Ollama.
    Local,
}

impl ProviderKind {
    /// Parse a provider id.
    pub fn parse(id: &str) -> NarrativeResult<Self> {
        match id.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            "local" | "ollama" => Ok(Self::Local),
            other => Err(NarrativeError::UnknownProvider(other.to_string())),
        }
    }

    /// Canonical id.
    pub fn id(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Local => "local",
        }
    }

    /// Default model for this backend.
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Anthropic => "claude-sonnet-4-20250514",
            Self::OpenAi => "gpt-4o",
            Self::Local => "llama3.2",
        }
    }

    /// Default API base URL.
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Local => "http://localhost:11434/v1",
        }
    }

    /// Environment variable holding the API key, if the backend needs one.
    pub fn api_key_var(self) -> Option<&'static str> {
        match self {
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Local => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Configuration for a provider backend.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Backend.
    pub kind: ProviderKind,
    /// Model name.
    pub model: String,
    /// API base URL, without the endpoint path.
    pub base_url: String,
    /// API key; read from the environment when `None`.
    pub api_key: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Token limit per completion.
    pub max_tokens: u32,
}

impl ProviderConfig {
    /// Defaults for `kind`.
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            model: kind.default_model().to_string(),
            base_url: kind.default_base_url().to_string(),
            api_key: None,
            temperature: 0.7,
            max_tokens: 4000,
        }
    }

    /// Defaults for `kind`, with `KL_MODEL` and `KL_BASE_URL` honoured.
    pub fn from_env(kind: ProviderKind) -> Self {
        let mut config = Self::new(kind);
        if let Ok(model) = env::var("KL_MODEL") {
            config.model = model;
        }
        if let Ok(url) = env::var("KL_BASE_URL") {
            config.base_url = url;
        }
        config
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// `base_url` joined with `path`.
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }

    /// The configured key, else the backend's environment variable.
    /// Backends without a key variable resolve to `None`.
    fn resolve_api_key(&self) -> NarrativeResult<Option<String>> {
        match (&self.api_key, self.kind.api_key_var()) {
            (Some(key), _) => Ok(Some(key.clone())),
            (None, Some(var)) => env::var(var).map(Some).map_err(|_| {
                NarrativeError::MissingApiKey {
                    provider: self.kind.to_string(),
                    var: var.to_string(),
                }
            }),
            (None, None) => Ok(None),
        }
    }
}

/// Build the provider that speaks `config.kind`'s protocol.
pub fn connect(config: ProviderConfig) -> NarrativeResult<Arc<dyn NarrativeProvider>> {
    Ok(match config.kind {
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(config)?),
        ProviderKind::OpenAi | ProviderKind::Local => {
            Arc::new(OpenAiCompatibleProvider::new(config)?)
        }
    })
}
