//! Error types for narrative synthesis.

use std::time::Duration;

use thiserror::Error;

/// Result type for narrative operations.
pub type NarrativeResult<T> = Result<T, NarrativeError>;

/// Failures of the external narrative collaborator.
///
/// None of these invalidate an assembled context; callers can always fall
/// back to its transcript.
#[derive(Debug, Error)]
pub enum NarrativeError {
    /// The provider id is not one of the known backends.
    #[error("unknown provider \"{0}\" (expected one of: anthropic, openai, local)")]
    UnknownProvider(String),

    /// The tradition name is not known.
    #[error("unknown tradition \"{0}\" (expected one of: intuitive, classical, psychological)")]
    UnknownTradition(String),

    /// A hosted provider was selected without an API key.
    #[error("{provider} needs an API key; set {var}")]
    MissingApiKey {
        /// Provider id.
        provider: String,
        /// Environment variable that holds the key.
        var: String,
    },

    /// The HTTP request failed or returned an error status.
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with something other than a completion.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// The provider did not answer in time.
    #[error("provider timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}
