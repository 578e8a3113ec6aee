//! Resolved interpretation fragments and their provenance.

use kl_core::CardId;
use serde::{Deserialize, Serialize};

/// Placeholder text for a position no card branch and no essence can answer.
pub const NO_COVERAGE_TEXT: &str = "No interpretation is authored for this card here.";

/// Where a fragment's text came from.
///
/// Coverage gaps are recorded here instead of being raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Provenance {
    /// The locator reached an authored leaf.
    Authored {
        /// The locator that was resolved.
        locator: String,
    },
    /// The branch was absent; the card's core essence stands in.
    EssenceFallback {
        /// The first absent path.
        missing: String,
    },
    /// Neither the branch nor an essence exists.
    NoCoverage {
        /// The first absent path.
        missing: String,
    },
    /// A topic-context leaf.
    Topic {
        /// The question category.
        category: String,
    },
    /// A curated combination entry on the first card of the lookup.
    Curated {
        /// Card whose table held the entry.
        owner: CardId,
    },
    /// A curated entry found on the partner's table.
    Mirrored {
        /// Card whose table held the entry.
        owner: CardId,
    },
    /// Composed from both cards' directional rules.
    Composed {
        /// The earlier card.
        left: CardId,
        /// The later card.
        right: CardId,
    },
}

/// A piece of resolved interpretation text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Interpretation text.
    pub text: String,
    /// Keywords attached to the source.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// How the text was obtained.
    pub provenance: Provenance,
}

impl Fragment {
    /// Whether the text came from somewhere other than the requested source.
    pub fn is_fallback(&self) -> bool {
        matches!(
            self.provenance,
            Provenance::EssenceFallback { .. }
                | Provenance::NoCoverage { .. }
                | Provenance::Composed { .. }
        )
    }

    /// Whether this is the no-coverage placeholder.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.provenance, Provenance::NoCoverage { .. })
    }
}
