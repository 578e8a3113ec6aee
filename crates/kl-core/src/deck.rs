use std::collections::HashMap;

use tracing::warn;

use crate::card::{CardDocument, CardId};
use crate::error::{DocumentError, DocumentResult};
use crate::source::CardSource;
use crate::system::OracleSystem;

/// All card documents of one oracle system, indexed by id.
///
/// Built once per process and shared read-only between readings.
#[derive(Debug, Clone)]
pub struct Deck {
    system: OracleSystem,
    cards: Vec<CardDocument>,
    by_id: HashMap<CardId, usize>,
}

impl Deck {
    /// Build a deck, checking every card against the system schema.
    ///
    /// Cards are kept in ascending `(number, id)` order regardless of the
    /// order they were supplied in.
    pub fn new(system: OracleSystem, mut cards: Vec<CardDocument>) -> DocumentResult<Self> {
        system.validate()?;
        cards.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.id.cmp(&b.id)));

        let mut by_id = HashMap::with_capacity(cards.len());
        for (i, card) in cards.iter().enumerate() {
            if card.system != system.id {
                return Err(DocumentError::SystemMismatch {
                    document: format!("card \"{}\"", card.id),
                    expected: system.id.clone(),
                    found: card.system.clone(),
                });
            }
            if !system.declares_partner_category(card.category()) {
                return Err(DocumentError::UndeclaredCategory {
                    card: card.id.clone(),
                    category: card.category().to_string(),
                });
            }
            if let Some(partition) = card
                .combinations
                .keys()
                .find(|p| !system.declares_partner_category(p))
            {
                return Err(DocumentError::UndeclaredCategory {
                    card: card.id.clone(),
                    category: partition.clone(),
                });
            }
            if by_id.insert(card.id.clone(), i).is_some() {
                return Err(DocumentError::DuplicateCard(card.id.clone()));
            }
        }

        let deck = Self {
            system,
            cards,
            by_id,
        };
        deck.warn_misfiled_combinations();
        Ok(deck)
    }

    /// The system schema.
    pub fn system(&self) -> &OracleSystem {
        &self.system
    }

    /// Look up a card by id.
    pub fn card(&self, id: &CardId) -> Option<&CardDocument> {
        self.by_id.get(id).map(|&i| &self.cards[i])
    }

    /// Look up a card by id, failing with [`DocumentError::CardNotFound`].
    pub fn get(&self, id: &CardId) -> DocumentResult<&CardDocument> {
        self.card(id)
            .ok_or_else(|| DocumentError::CardNotFound(id.clone()))
    }

    /// Find a card by id or by display name (case-insensitive).
    pub fn find(&self, query: &str) -> Option<&CardDocument> {
        self.card(&CardId::new(query)).or_else(|| {
            let lower = query.to_lowercase();
            self.cards.iter().find(|c| c.name.to_lowercase() == lower)
        })
    }

    /// All cards in deck order.
    pub fn cards(&self) -> impl Iterator<Item = &CardDocument> {
        self.cards.iter()
    }

    /// Number of cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the deck has no cards.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Curated entries filed under a partition that does not match the
    /// partner's category can never be found by the partitioned lookup.
    fn warn_misfiled_combinations(&self) {
        for card in &self.cards {
            for (partition, entries) in &card.combinations {
                for partner_id in entries.keys() {
                    match self.card(partner_id) {
                        None => warn!(
                            card = %card.id,
                            partner = %partner_id,
                            "curated combination names a card outside the deck"
                        ),
                        Some(partner) if partner.category() != partition => warn!(
                            card = %card.id,
                            partner = %partner_id,
                            filed = %partition,
                            actual = partner.category(),
                            "curated combination filed under the wrong partition"
                        ),
                        Some(_) => {}
                    }
                }
            }
        }
    }
}

impl CardSource for Deck {
    fn system(&self) -> &OracleSystem {
        Deck::system(self)
    }

    fn card(&self, id: &CardId) -> Option<&CardDocument> {
        Deck::card(self, id)
    }

    fn cards(&self) -> Box<dyn Iterator<Item = &CardDocument> + '_> {
        Box::new(self.cards.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::SystemId;
    use crate::testing::{card, sample_deck, sample_system};

    #[test]
    fn cards_sorted_by_number() {
        let deck = sample_deck();
        let numbers: Vec<u32> = deck.cards().map(|c| c.number).collect();
        let mut sorted = numbers.clone();
        sorted.sort();
        assert_eq!(numbers, sorted);
        assert_eq!(deck.len(), 4);
    }

    #[test]
    fn find_by_id_or_name() {
        let deck = sample_deck();
        assert_eq!(deck.find("rider").map(|c| c.name.as_str()), Some("Rider"));
        assert_eq!(deck.find("CLOVER").map(|c| c.id.as_str()), Some("clover"));
        assert!(deck.find("tower").is_none());
    }

    #[test]
    fn get_reports_missing_card() {
        let deck = sample_deck();
        let err = deck.get(&CardId::new("tower")).unwrap_err();
        assert!(matches!(err, DocumentError::CardNotFound(_)));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let cards = vec![card("rider", 1, "neutral"), card("rider", 2, "neutral")];
        let err = Deck::new(sample_system(), cards).unwrap_err();
        assert!(matches!(err, DocumentError::DuplicateCard(_)));
    }

    #[test]
    fn undeclared_category_rejected() {
        let cards = vec![card("rider", 1, "animal")];
        let err = Deck::new(sample_system(), cards).unwrap_err();
        assert!(matches!(err, DocumentError::UndeclaredCategory { .. }));
    }

    #[test]
    fn undeclared_partition_rejected() {
        let mut rider = card("rider", 1, "neutral");
        rider
            .combinations
            .entry("animal".to_string())
            .or_default()
            .insert(CardId::new("fox"), Default::default());
        let err = Deck::new(sample_system(), vec![rider]).unwrap_err();
        assert!(matches!(err, DocumentError::UndeclaredCategory { ref category, .. } if category == "animal"));
    }

    #[test]
    fn foreign_card_rejected() {
        let mut rider = card("rider", 1, "neutral");
        rider.system = SystemId::new("tarot");
        let err = Deck::new(sample_system(), vec![rider]).unwrap_err();
        assert!(matches!(err, DocumentError::SystemMismatch { .. }));
    }
}
