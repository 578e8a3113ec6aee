//! Shared fixtures for unit tests.

use crate::card::CardDocument;
use crate::deck::Deck;
use crate::spread::{PositionDocument, SpreadDocument};
use crate::system::{OracleSystem, SystemId};

pub(crate) fn sample_system() -> OracleSystem {
    serde_json::from_str(
        r#"{
            "id": "lenormand",
            "name": "Lenormand",
            "reversals": true,
            "meanings": {
                "line": {"opening": {}, "modifying": {}, "outcome": {}},
                "temporal": {"past": {}, "future": {}}
            },
            "question_categories": ["love", "career"],
            "partner_categories": ["person", "positive", "negative", "neutral"]
        }"#,
    )
    .unwrap()
}

pub(crate) fn card(id: &str, number: u32, category: &str) -> CardDocument {
    let mut card = CardDocument::new(id, id, SystemId::new("lenormand"), category);
    card.number = number;
    card
}

pub(crate) fn sample_deck() -> Deck {
    let cards: Vec<CardDocument> = [
        r#"{"id": "man", "number": 28, "name": "Man", "system": "lenormand",
            "core": {"category": "person", "keywords": ["querent"]},
            "meanings": {"line": {
                "opening": {"text": "he starts it"},
                "modifying": {"text": "a man is involved"},
                "outcome": {"text": "he decides"}}},
            "topic_contexts": {"love": {"text": "a partner"}, "career": {"text": "a colleague"}},
            "directional": {"as_left": "he acts", "as_right": "he receives", "summary": "the querent"}}"#,
        r#"{"id": "rider", "number": 1, "name": "Rider", "system": "lenormand",
            "core": {"category": "positive", "charge": "positive"},
            "meanings": {"line": {
                "opening": {"text": "news comes"},
                "modifying": {"text": "quickly"},
                "outcome": {"text": "a message"}}},
            "topic_contexts": {"love": {"text": "an admirer"}},
            "directional": {"as_left": "speeds up", "as_right": "brings news", "summary": "messenger"},
            "combinations": {"person": {"man": {"self_first": "news for a man", "partner_first": "a man sends news"}}}}"#,
        r#"{"id": "clover", "number": 2, "name": "Clover", "system": "lenormand",
            "core": {"category": "positive", "charge": "positive"},
            "meanings": {"line": {
                "opening": {"text": "a lucky start"},
                "outcome": {"text": "brief luck"}}},
            "directional": {"as_left": "lightens", "as_right": "ends lightly", "summary": "small luck"}}"#,
        r#"{"id": "coffin", "number": 8, "name": "Coffin", "system": "lenormand",
            "core": {"category": "negative", "charge": "negative"},
            "meanings": {"line": {
                "opening": {"text": "an ending starts"},
                "modifying": {"text": "heavily"},
                "outcome": {"text": "closure"}},
                "temporal": {"past": {"text": "a loss"}}},
            "topic_contexts": {"love": {"text": "a breakup"}, "career": {"text": "a layoff"}},
            "directional": {"as_left": "ends", "as_right": "is ended", "summary": "closure"}}"#,
    ]
    .iter()
    .map(|json| serde_json::from_str(json).unwrap())
    .collect();
    Deck::new(sample_system(), cards).unwrap()
}

pub(crate) fn spread_doc(id: &str, locators: &[&str]) -> SpreadDocument {
    SpreadDocument {
        id: id.to_string(),
        name: id.to_string(),
        system: SystemId::new("lenormand"),
        description: String::new(),
        card_count: None,
        anchor_cards: Vec::new(),
        proximity: 1,
        positions: locators
            .iter()
            .enumerate()
            .map(|(i, locator)| PositionDocument {
                name: format!("p{}", i + 1),
                locator: locator.to_string(),
                description: format!("position {}", i + 1),
                keywords: Vec::new(),
                question_adaptations: Default::default(),
                layout: None,
                adjacency: None,
            })
            .collect(),
    }
}
