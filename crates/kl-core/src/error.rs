use std::path::PathBuf;

use crate::card::CardId;
use crate::system::SystemId;

/// Alias for `Result<T, DocumentError>`.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors raised while loading or validating system, card, and spread documents.
///
/// Every variant is a broken data contract. None of them depend on which
/// cards a particular reading happens to draw.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// A document file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A document file is not valid JSON for its schema.
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        /// The file that failed.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The system schema uses a segment name reserved for leaf fields.
    #[error("system \"{system}\": segment name \"{segment}\" is reserved")]
    ReservedSegment {
        /// The offending system.
        system: SystemId,
        /// The reserved name.
        segment: String,
    },

    /// A document belongs to a different oracle system than the one being loaded.
    #[error("{document} belongs to system \"{found}\", expected \"{expected}\"")]
    SystemMismatch {
        /// Human-readable document description.
        document: String,
        /// The system being loaded.
        expected: SystemId,
        /// The system the document declares.
        found: SystemId,
    },

    /// Two cards share an id.
    #[error("duplicate card id: {0}")]
    DuplicateCard(CardId),

    /// A card references a partner category the system does not declare.
    #[error("card \"{card}\": undeclared partner category \"{category}\"")]
    UndeclaredCategory {
        /// The card declaring the category.
        card: CardId,
        /// The undeclared category.
        category: String,
    },

    /// The requested card does not exist in the deck.
    #[error("card not found: {0}")]
    CardNotFound(CardId),

    /// The requested spread does not exist.
    #[error("spread not found: {id} (available: {available})")]
    SpreadNotFound {
        /// The requested id.
        id: String,
        /// Comma-separated list of known spread ids.
        available: String,
    },

    /// The requested oracle system is not in the library.
    #[error("system not found: {id} (available: {available})")]
    SystemNotFound {
        /// The requested id.
        id: String,
        /// Comma-separated list of known system ids.
        available: String,
    },

    /// Two spreads share an id.
    #[error("duplicate spread id: {0}")]
    DuplicateSpread(String),

    /// A spread declares no positions.
    #[error("spread \"{0}\" has no positions")]
    EmptySpread(String),

    /// A spread declares two positions with the same name.
    #[error("spread \"{spread}\": duplicate position \"{position}\"")]
    DuplicatePosition {
        /// The spread.
        spread: String,
        /// The repeated position name.
        position: String,
    },

    /// A spread's declared card count disagrees with its positions.
    #[error("spread \"{spread}\" declares {declared} cards but has {actual} positions")]
    CardCountMismatch {
        /// The spread.
        spread: String,
        /// The declared `card_count`.
        declared: usize,
        /// The number of positions.
        actual: usize,
    },

    /// A position locator does not parse against the system schema.
    #[error("spread \"{spread}\", position \"{position}\": {source}")]
    InvalidLocator {
        /// The spread.
        spread: String,
        /// The position carrying the locator.
        position: String,
        /// Why the locator was rejected.
        #[source]
        source: LocatorError,
    },

    /// A locator is well-formed but no card in the deck has that branch.
    #[error("spread \"{spread}\", position \"{position}\": no card covers locator \"{locator}\"")]
    UncoveredLocator {
        /// The spread.
        spread: String,
        /// The position carrying the locator.
        position: String,
        /// The locator text.
        locator: String,
    },

    /// Line or house adjacency metadata is inconsistent.
    #[error("spread \"{spread}\": {message}")]
    InvalidAdjacency {
        /// The spread.
        spread: String,
        /// What is wrong.
        message: String,
    },

    /// A spread lists an anchor card that is not in the deck.
    #[error("spread \"{spread}\": anchor card \"{card}\" is not in the deck")]
    UnknownAnchorCard {
        /// The spread.
        spread: String,
        /// The missing card.
        card: CardId,
    },
}

/// Reasons a locator string is rejected by the system schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocatorError {
    /// The locator string is empty.
    #[error("empty locator")]
    Empty,

    /// Two dots in a row, or a leading/trailing dot.
    #[error("empty segment in locator \"{0}\"")]
    EmptySegment(String),

    /// A segment is not in the vocabulary at its depth.
    #[error("unknown segment \"{segment}\" after \"{prefix}\" (expected one of: {expected})")]
    UnknownSegment {
        /// The unrecognised segment.
        segment: String,
        /// The segments already consumed, dot-joined.
        prefix: String,
        /// Comma-separated vocabulary at this depth.
        expected: String,
    },

    /// The locator stops at a branch instead of a leaf.
    #[error("locator \"{locator}\" stops at a branch (continue with one of: {expected})")]
    NotALeaf {
        /// The locator text.
        locator: String,
        /// Comma-separated vocabulary below the branch.
        expected: String,
    },
}
