//! Narrative synthesis over an assembled context.
//!
//! Synthesis is the only suspension point of a reading. It runs after
//! assembly, reads the context by reference, and its failure leaves the
//! context untouched.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use kl_reading::AssembledContext;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{NarrativeError, NarrativeResult};
use crate::prompt::Tradition;
use crate::provider::{NarrativeProvider, PromptRequest, TextStream};

/// Configuration for a [`Synthesizer`].
#[derive(Debug, Clone)]
pub struct SynthesizerConfig {
    /// Voice of the reading.
    pub tradition: Tradition,
    /// How long to wait for the provider.
    pub timeout: Duration,
    /// Token limit passed to the provider.
    pub max_tokens: Option<u32>,
    /// Temperature passed to the provider.
    pub temperature: Option<f32>,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            tradition: Tradition::default(),
            timeout: Duration::from_secs(60),
            max_tokens: Some(2000),
            temperature: None,
        }
    }
}

impl SynthesizerConfig {
    /// Set the tradition.
    pub fn with_tradition(mut self, tradition: Tradition) -> Self {
        self.tradition = tradition;
        self
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A finished reading: narrative plus the context it was built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesizedReading {
    /// Tradition used.
    pub tradition: Tradition,
    /// The narrative text.
    pub synthesis: String,
    /// Model that wrote it; `None` for a deterministic transcript.
    pub model: Option<String>,
    /// Tokens consumed.
    pub tokens_used: u32,
    /// When synthesis finished.
    pub generated_at: DateTime<Utc>,
    /// The assembled context.
    pub context: AssembledContext,
}

impl SynthesizedReading {
    /// Whether the narrative came from a provider.
    pub fn is_synthesized(&self) -> bool {
        self.model.is_some()
    }

    /// Markdown rendering: narrative first, then the assembled reading.
    pub fn to_markdown(&self) -> String {
        let mut out = format!("# {}\n\n", self.context.spread_name());
        if let Some(q) = self.context.question() {
            out.push_str(&format!("**Question:** {q}\n\n"));
        }
        out.push_str(&format!("## Reading ({})\n\n", self.tradition));
        out.push_str(self.synthesis.trim_end());
        out.push_str("\n\n");
        if let Some(model) = &self.model {
            out.push_str(&format!("*Generated by {model}.*\n\n"));
        }
        out.push_str("---\n\n");
        // demote the context's own headings under the narrative
        for line in self.context.to_markdown().lines() {
            if line.starts_with('#') {
                out.push('#');
            }
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Turns assembled contexts into narratives.
///
/// Without a provider handle it runs in deterministic-only mode and returns
/// the context's transcript.
#[derive(Clone, Default)]
pub struct Synthesizer {
    provider: Option<Arc<dyn NarrativeProvider>>,
    config: SynthesizerConfig,
}

impl Synthesizer {
    /// A synthesizer that never calls out.
    pub fn deterministic(config: SynthesizerConfig) -> Self {
        Self {
            provider: None,
            config,
        }
    }

    /// A synthesizer backed by `provider`.
    pub fn with_provider(provider: Arc<dyn NarrativeProvider>, config: SynthesizerConfig) -> Self {
        Self {
            provider: Some(provider),
            config,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &SynthesizerConfig {
        &self.config
    }

    /// Whether a provider is attached.
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Synthesize a narrative for `context`.
    pub async fn synthesize(&self, context: &AssembledContext) -> NarrativeResult<SynthesizedReading> {
        let Some(provider) = &self.provider else {
            return Ok(self.transcript_reading(context));
        };

        debug!(
            provider = provider.name(),
            tradition = %self.config.tradition,
            spread = context.spread_id(),
            "synthesizing"
        );
        let request = self.request(context);
        let completion = tokio::time::timeout(self.config.timeout, provider.complete(request))
            .await
            .map_err(|_| NarrativeError::Timeout(self.config.timeout))??;

        Ok(SynthesizedReading {
            tradition: self.config.tradition,
            synthesis: completion.content.clone(),
            model: Some(if completion.model.is_empty() {
                provider.model().to_string()
            } else {
                completion.model.clone()
            }),
            tokens_used: completion.total_tokens(),
            generated_at: Utc::now(),
            context: context.clone(),
        })
    }

    /// Stream the narrative for `context` as the provider writes it.
    ///
    /// The timeout covers opening the stream, not reading it. Without a
    /// provider the transcript arrives as one chunk.
    pub async fn stream(&self, context: &AssembledContext) -> NarrativeResult<TextStream> {
        let Some(provider) = &self.provider else {
            return Ok(stream::iter([Ok(context.transcript())]).boxed());
        };

        debug!(
            provider = provider.name(),
            tradition = %self.config.tradition,
            spread = context.spread_id(),
            "streaming synthesis"
        );
        let request = self.request(context);
        tokio::time::timeout(self.config.timeout, provider.complete_stream(request))
            .await
            .map_err(|_| NarrativeError::Timeout(self.config.timeout))?
    }

    fn request(&self, context: &AssembledContext) -> PromptRequest {
        let (system, user) = self.config.tradition.render(context);
        let mut request = PromptRequest::new(user).with_system(system);
        request.max_tokens = self.config.max_tokens;
        request.temperature = self.config.temperature;
        request
    }

    /// Synthesize, falling back to the transcript when the provider fails.
    pub async fn synthesize_or_transcript(&self, context: &AssembledContext) -> SynthesizedReading {
        match self.synthesize(context).await {
            Ok(reading) => reading,
            Err(e) => {
                warn!(error = %e, "synthesis failed, using transcript");
                self.transcript_reading(context)
            }
        }
    }

    fn transcript_reading(&self, context: &AssembledContext) -> SynthesizedReading {
        SynthesizedReading {
            tradition: self.config.tradition,
            synthesis: context.transcript(),
            model: None,
            tokens_used: 0,
            generated_at: Utc::now(),
            context: context.clone(),
        }
    }
}

impl std::fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synthesizer")
            .field("provider", &self.provider.as_ref().map(|p| p.name()))
            .field("config", &self.config)
            .finish()
    }
}
