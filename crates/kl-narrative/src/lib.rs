//! Narrative layer for Kartenleger.
//!
//! Everything here sits downstream of assembly. A [`Synthesizer`] reads an
//! [`kl_reading::AssembledContext`] and, when given a [`NarrativeProvider`]
//! handle, asks it for a narrative in one of several [`Tradition`]s. Without
//! a handle it returns the deterministic transcript.

/// Question classifiers.
pub mod classifier;
/// Error types for narrative synthesis.
pub mod error;
/// Traditions and prompt rendering.
pub mod prompt;
/// Narrative Provider capability and HTTP backends.
pub mod provider;
/// The synthesizer.
pub mod synthesizer;

#[cfg(test)]
mod testing;

pub use classifier::{KeywordClassifier, ProviderClassifier, QuestionClassifier};
pub use error::{NarrativeError, NarrativeResult};
pub use prompt::Tradition;
pub use provider::{
    AnthropicProvider, Completion, NarrativeProvider, OpenAiCompatibleProvider, PromptRequest,
    ProviderConfig, ProviderKind, TextStream, connect,
};
pub use synthesizer::{SynthesizedReading, Synthesizer, SynthesizerConfig};
