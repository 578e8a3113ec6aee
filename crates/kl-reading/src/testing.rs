//! Shared fixtures for unit tests.

use kl_core::spread::{Layout, PositionDocument};
use kl_core::{
    Adjacency, CardDocument, Deck, LineRole, Locator, OracleSystem, Orientation, Spread,
    SpreadDocument, SystemId,
};

use crate::assemble::DrawnCard;

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
        r#"{"id": "rider", "number": 1, "name": "Rider", "system": "lenormand",
            "core": {"category": "positive", "charge": "positive", "keywords": ["news"]},
            "meanings": {"line": {
                "opening": {"text": "news comes"},
                "modifying": {"text": "quickly"},
                "outcome": {"text": "a message"}}},
            "topic_contexts": {"love": {"text": "an admirer"}},
            "directional": {"as_left": "speeds things up", "as_right": "brings news about it", "summary": "messenger"},
            "combinations": {"person": {"man": {
                "self_first": "news for a man",
                "partner_first": "a man sends news",
                "relation": "learning_sequence"}}}}"#,
        r#"{"id": "clover", "number": 2, "name": "Clover", "system": "lenormand",
            "core": {"category": "positive", "charge": "positive", "keywords": ["luck"],
                     "essence": {"upright": "A small stroke of luck.", "reversed": "Luck passes by."}},
            "meanings": {"line": {
                "opening": {"text": "a lucky start"},
                "outcome": {"upright": "brief luck", "reversed": "luck slips away"}}},
            "directional": {"as_left": "lightens what follows", "as_right": "ends on a lucky note", "summary": "small luck"}}"#,
        r#"{"id": "coffin", "number": 8, "name": "Coffin", "system": "lenormand",
            "core": {"category": "negative", "charge": "negative", "keywords": ["ending"]},
            "meanings": {"line": {
                "opening": {"text": "an ending starts"},
                "modifying": {"text": "heavily"},
                "outcome": {"text": "closure"}},
                "temporal": {"past": {"text": "a loss"}}},
            "topic_contexts": {"love": {"text": "a breakup"}, "career": {"text": "a layoff"}},
            "directional": {"as_left": "ends what follows", "as_right": "is brought to an end", "summary": "closure"}}"#,
        r#"{"id": "dog", "number": 18, "name": "Dog", "system": "lenormand",
            "core": {"category": "neutral", "keywords": ["loyalty", "friend"]},
            "meanings": {"line": {
                "opening": {"text": "a friend starts it"},
                "modifying": {"text": "faithfully"},
                "outcome": {"text": "support"}}},
            "topic_contexts": {"love": {"text": "a loyal partner"}, "career": {"text": "a trusted colleague"}}}"#,
        r#"{"id": "man", "number": 28, "name": "Man", "system": "lenormand",
            "core": {"category": "person", "keywords": ["querent"]},
            "meanings": {"line": {
                "opening": {"text": "he starts it"},
                "modifying": {"text": "a man is involved"},
                "outcome": {"text": "he decides"}}},
            "topic_contexts": {"love": {"text": "a partner"}, "career": {"text": "a colleague"}},
            "directional": {"as_left": "he acts on it", "as_right": "it happens to him", "summary": "the querent"}}"#,
    ]
    .iter()
    .map(|json| serde_json::from_str(json).unwrap())
    .collect();
    Deck::new(sample_system(), cards).unwrap()
}

pub(crate) fn locator(text: &str) -> Locator {
    Locator::parse(text, &sample_system().meanings).unwrap()
}

fn position(name: &str, locator: &str, adjacency: Adjacency) -> PositionDocument {
    PositionDocument {
        name: name.to_string(),
        locator: locator.to_string(),
        description: format!("the {name}"),
        keywords: Vec::new(),
        question_adaptations: Default::default(),
        layout: None,
        adjacency: Some(adjacency),
    }
}

/// Three positions in one line: opening, modifying, outcome.
pub(crate) fn line_spread(deck: &Deck) -> Spread {
    let line = |role| Adjacency::Line { line: 0, role };
    let mut positions = vec![
        position("opening", "line.opening", line(LineRole::First)),
        position("modifying", "line.modifying", line(LineRole::Middle)),
        position("outcome", "line.outcome", line(LineRole::Last)),
    ];
    positions[2]
        .question_adaptations
        .insert("love".to_string(), "where the relationship goes".to_string());
    Spread::validate(
        SpreadDocument {
            id: "three".to_string(),
            name: "Three Card Line".to_string(),
            system: SystemId::new("lenormand"),
            description: String::new(),
            card_count: Some(3),
            anchor_cards: Vec::new(),
            proximity: 1,
            positions,
        },
        deck,
    )
    .unwrap()
}

/// A 2x3 tableau with `man` as anchor card and house 5 flagged as anchor.
///
/// ```text
/// h1 h2 h3
/// h4 h5 h6
/// ```
pub(crate) fn tableau_spread(deck: &Deck) -> Spread {
    let positions = (0..6u32)
        .map(|i| {
            let mut pos = position(
                &format!("h{}", i + 1),
                "line.outcome",
                Adjacency::House {
                    house: i + 1,
                    row: i / 3,
                    column: i % 3,
                    anchor: i == 4,
                },
            );
            pos.layout = Some(Layout {
                x: f64::from(i % 3) * 30.0,
                y: f64::from(i / 3) * 40.0,
                rotation: 0.0,
                z_index: 0,
            });
            pos
        })
        .collect();
    Spread::validate(
        SpreadDocument {
            id: "mini-tableau".to_string(),
            name: "Mini Tableau".to_string(),
            system: SystemId::new("lenormand"),
            description: String::new(),
            card_count: None,
            anchor_cards: vec!["man".into()],
            proximity: 1,
            positions,
        },
        deck,
    )
    .unwrap()
}

pub(crate) fn drawn(spread: &Spread, cards: &[(&str, Orientation)]) -> Vec<DrawnCard> {
    spread
        .positions()
        .iter()
        .zip(cards)
        .enumerate()
        .map(|(sequence, (pos, (card, orientation)))| DrawnCard {
            card: (*card).into(),
            position: pos.name.clone(),
            orientation: *orientation,
            sequence,
        })
        .collect()
}
