//! Error types for the reading engine.

use kl_core::{CardId, DocumentError, SystemId};
use thiserror::Error;

/// Result type for reading operations.
pub type ReadingResult<T> = Result<T, ReadingError>;

/// Configuration errors that prevent a reading from being assembled.
///
/// Coverage gaps are never reported here; they degrade to fallback
/// fragments instead.
#[derive(Debug, Error)]
pub enum ReadingError {
    /// The number of drawn cards differs from the spread's position count.
    #[error("spread \"{spread}\" takes {expected} cards but {actual} were drawn")]
    CountMismatch {
        /// The spread id.
        spread: String,
        /// Position count.
        expected: usize,
        /// Drawn-card count.
        actual: usize,
    },

    /// A drawn card names a position the spread does not have.
    #[error("spread \"{spread}\" has no position \"{position}\"")]
    UnknownPosition {
        /// The spread id.
        spread: String,
        /// The unknown position name.
        position: String,
    },

    /// Two drawn cards name the same position.
    #[error("position \"{0}\" was filled twice")]
    PositionFilledTwice(String),

    /// A drawn card is not in the deck.
    #[error("card not in deck: {0}")]
    UnknownCard(CardId),

    /// The question category is not declared by the system.
    #[error("system \"{system}\" does not declare question category \"{category}\"")]
    UnknownQuestionCategory {
        /// The oracle system.
        system: SystemId,
        /// The rejected category.
        category: String,
    },

    /// The spread was written for another system.
    #[error("spread is for system \"{spread}\" but the deck is \"{deck}\"")]
    SystemMismatch {
        /// System declared by the spread.
        spread: SystemId,
        /// System of the deck.
        deck: SystemId,
    },

    /// The deck has fewer cards than the spread needs.
    #[error("cannot draw {needed} cards from a {available}-card deck")]
    DeckTooSmall {
        /// Cards needed.
        needed: usize,
        /// Cards available.
        available: usize,
    },

    /// A context could not be written or read as JSON.
    #[error("context JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A document-level error surfaced while reading.
    #[error("{0}")]
    Document(#[from] DocumentError),
}
