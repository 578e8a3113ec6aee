//! Capability interfaces for card and spread providers.
//!
//! The resolvers only ever see these traits. [`crate::Deck`] and
//! [`SpreadBook`] are the in-memory implementations; a system backed by a
//! database or an embedded bundle implements the same two traits.

use std::collections::BTreeMap;

use tracing::debug;

use crate::card::{CardDocument, CardId};
use crate::error::{DocumentError, DocumentResult};
use crate::spread::{Spread, SpreadDocument};
use crate::system::OracleSystem;

/// Read-only access to the card documents of one oracle system.
pub trait CardSource {
    /// The declared system schema.
    fn system(&self) -> &OracleSystem;

    /// Look up a card by id.
    fn card(&self, id: &CardId) -> Option<&CardDocument>;

    /// All cards, in a stable order.
    fn cards(&self) -> Box<dyn Iterator<Item = &CardDocument> + '_>;
}

/// Read-only access to validated spreads.
pub trait SpreadSource {
    /// Look up a spread by id.
    fn spread(&self, id: &str) -> DocumentResult<&Spread>;

    /// All spread ids, sorted.
    fn spread_ids(&self) -> Vec<&str>;
}

/// The validated spreads of one system, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct SpreadBook {
    spreads: BTreeMap<String, Spread>,
}

impl SpreadBook {
    /// Validate every document against `cards`. The first configuration
    /// error aborts the load.
    pub fn from_documents<C: CardSource + ?Sized>(
        docs: Vec<SpreadDocument>,
        cards: &C,
    ) -> DocumentResult<Self> {
        let mut spreads = BTreeMap::new();
        for doc in docs {
            let spread = Spread::validate(doc, cards)?;
            debug!(spread = %spread.id, positions = spread.card_count(), "spread validated");
            if spreads.contains_key(&spread.id) {
                return Err(DocumentError::DuplicateSpread(spread.id));
            }
            spreads.insert(spread.id.clone(), spread);
        }
        Ok(Self { spreads })
    }

    /// All spreads in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Spread> {
        self.spreads.values()
    }

    /// Number of spreads.
    pub fn len(&self) -> usize {
        self.spreads.len()
    }

    /// Whether the book is empty.
    pub fn is_empty(&self) -> bool {
        self.spreads.is_empty()
    }
}

impl SpreadSource for SpreadBook {
    fn spread(&self, id: &str) -> DocumentResult<&Spread> {
        self.spreads
            .get(id)
            .ok_or_else(|| DocumentError::SpreadNotFound {
                id: id.to_string(),
                available: self.spread_ids().join(", "),
            })
    }

    fn spread_ids(&self) -> Vec<&str> {
        self.spreads.keys().map(String::as_str).collect()
    }
}
