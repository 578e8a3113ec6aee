//! Spread documents and their load-time validation.
//!
//! A [`SpreadDocument`] is the raw, deserialized form. [`Spread::validate`]
//! turns it into a [`Spread`] whose locators are parsed against the system
//! schema and known to be covered by at least one card of the deck.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::card::CardId;
use crate::error::{DocumentError, DocumentResult};
use crate::locator::{Locator, Walk};
use crate::source::CardSource;
use crate::system::SystemId;

/// Visual placement of a position (percentages of the layout area).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Horizontal position, 0-100.
    pub x: f64,
    /// Vertical position, 0-100.
    pub y: f64,
    /// Rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    /// Stacking order.
    #[serde(default, alias = "zIndex")]
    pub z_index: i32,
}

/// Where a position sits within a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineRole {
    /// Opens the line.
    First,
    /// Inside the line.
    Middle,
    /// Closes the line.
    Last,
}

/// How a position takes part in pairwise combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Adjacency {
    /// Part of a line; consecutive positions of the same line pair up.
    Line {
        /// Line number, for spreads with several lines.
        #[serde(default)]
        line: u32,
        /// Role within the line.
        role: LineRole,
    },
    /// A house in a tableau; houses pair with nearby anchors.
    House {
        /// House number.
        house: u32,
        /// Grid row.
        row: u32,
        /// Grid column.
        column: u32,
        /// Whether this house is a designated anchor.
        #[serde(default)]
        anchor: bool,
    },
    /// Read alone; never paired.
    Standalone,
}

/// A position as written in a spread file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionDocument {
    /// Position name, unique within the spread.
    pub name: String,
    /// Dot-delimited path into the card meaning tree.
    pub locator: String,
    /// Short description of what the position asks.
    #[serde(default)]
    pub description: String,
    /// Position keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Description overrides keyed by question category.
    #[serde(default)]
    pub question_adaptations: BTreeMap<String, String>,
    /// Rendering coordinates; not read by the resolvers.
    #[serde(default)]
    pub layout: Option<Layout>,
    /// Combination semantics.
    #[serde(default)]
    pub adjacency: Option<Adjacency>,
}

/// A spread as written in a spread file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadDocument {
    /// Stable id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// System this spread applies to.
    pub system: SystemId,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Declared number of cards; checked against the positions.
    #[serde(default)]
    pub card_count: Option<usize>,
    /// Cards that act as anchors wherever they land in a tableau.
    #[serde(default)]
    pub anchor_cards: Vec<CardId>,
    /// Chebyshev distance at which houses count as near an anchor.
    #[serde(default = "default_proximity")]
    pub proximity: u32,
    /// Ordered positions.
    pub positions: Vec<PositionDocument>,
}

fn default_proximity() -> u32 {
    1
}

/// A validated position.
#[derive(Debug, Clone, Serialize)]
pub struct Position {
    /// Index in declared order.
    pub index: usize,
    /// Position name.
    pub name: String,
    /// Parsed locator.
    pub locator: Locator,
    /// Description.
    pub description: String,
    /// Keywords.
    pub keywords: Vec<String>,
    /// Description overrides keyed by question category.
    pub question_adaptations: BTreeMap<String, String>,
    /// Rendering coordinates.
    pub layout: Option<Layout>,
    /// Combination semantics; `Standalone` when undeclared.
    pub adjacency: Adjacency,
}

impl Position {
    /// Description adapted to `category`, falling back to the plain description.
    pub fn description_for(&self, category: Option<&str>) -> &str {
        category
            .and_then(|c| self.question_adaptations.get(c))
            .map(String::as_str)
            .unwrap_or(&self.description)
    }
}

/// A spread whose contract with its system has been checked.
#[derive(Debug, Clone, Serialize)]
pub struct Spread {
    /// Stable id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// System id.
    pub system: SystemId,
    /// Description.
    pub description: String,
    /// Anchor cards for tableau readings.
    pub anchor_cards: Vec<CardId>,
    /// Anchor proximity.
    pub proximity: u32,
    positions: Vec<Position>,
}

impl Spread {
    /// Validate a spread document against a card source and its system schema.
    pub fn validate<C: CardSource + ?Sized>(doc: SpreadDocument, deck: &C) -> DocumentResult<Self> {
        let system = deck.system();
        if doc.system != system.id {
            return Err(DocumentError::SystemMismatch {
                document: format!("spread \"{}\"", doc.id),
                expected: system.id.clone(),
                found: doc.system,
            });
        }
        if doc.positions.is_empty() {
            return Err(DocumentError::EmptySpread(doc.id));
        }
        if let Some(declared) = doc.card_count
            && declared != doc.positions.len()
        {
            return Err(DocumentError::CardCountMismatch {
                spread: doc.id,
                declared,
                actual: doc.positions.len(),
            });
        }
        for card in &doc.anchor_cards {
            if deck.card(card).is_none() {
                return Err(DocumentError::UnknownAnchorCard {
                    spread: doc.id.clone(),
                    card: card.clone(),
                });
            }
        }

        let mut seen = HashSet::new();
        let mut positions = Vec::with_capacity(doc.positions.len());
        for (index, pos) in doc.positions.into_iter().enumerate() {
            if !seen.insert(pos.name.clone()) {
                return Err(DocumentError::DuplicatePosition {
                    spread: doc.id,
                    position: pos.name,
                });
            }
            let locator = Locator::parse(&pos.locator, &system.meanings).map_err(|source| {
                DocumentError::InvalidLocator {
                    spread: doc.id.clone(),
                    position: pos.name.clone(),
                    source,
                }
            })?;
            let covered = deck
                .cards()
                .any(|card| matches!(locator.walk(&card.meanings), Walk::Found(_)));
            if !covered {
                return Err(DocumentError::UncoveredLocator {
                    spread: doc.id,
                    position: pos.name,
                    locator: locator.to_string(),
                });
            }
            positions.push(Position {
                index,
                name: pos.name,
                locator,
                description: pos.description,
                keywords: pos.keywords,
                question_adaptations: pos.question_adaptations,
                layout: pos.layout,
                adjacency: pos.adjacency.unwrap_or(Adjacency::Standalone),
            });
        }

        check_adjacency(&doc.id, &positions)?;

        Ok(Self {
            id: doc.id,
            name: doc.name,
            system: doc.system,
            description: doc.description,
            anchor_cards: doc.anchor_cards,
            proximity: doc.proximity,
            positions,
        })
    }

    /// Positions in declared order.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Number of cards the spread takes.
    pub fn card_count(&self) -> usize {
        self.positions.len()
    }

    /// Look up a position by name.
    pub fn position(&self, name: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.name == name)
    }
}

/// Line roles must agree with line order; house grid cells must be unique.
fn check_adjacency(spread: &str, positions: &[Position]) -> DocumentResult<()> {
    let invalid = |message: String| DocumentError::InvalidAdjacency {
        spread: spread.to_string(),
        message,
    };

    let mut lines: BTreeMap<u32, Vec<(&str, LineRole)>> = BTreeMap::new();
    let mut cells = BTreeSet::new();
    let mut houses = BTreeSet::new();
    for pos in positions {
        match pos.adjacency {
            Adjacency::Line { line, role } => lines.entry(line).or_default().push((&pos.name, role)),
            Adjacency::House {
                house, row, column, ..
            } => {
                if !cells.insert((row, column)) {
                    return Err(invalid(format!(
                        "position \"{}\" reuses cell ({row}, {column})",
                        pos.name
                    )));
                }
                if !houses.insert(house) {
                    return Err(invalid(format!(
                        "position \"{}\" reuses house {house}",
                        pos.name
                    )));
                }
            }
            Adjacency::Standalone => {}
        }
    }

    for (line, members) in &lines {
        let last = members.len() - 1;
        for (i, (name, role)) in members.iter().enumerate() {
            let ok = match role {
                LineRole::First => i == 0,
                LineRole::Last => i == last,
                LineRole::Middle => i != 0 && i != last,
            };
            if !ok {
                return Err(invalid(format!(
                    "position \"{name}\" is marked {role:?} but sits at index {i} of line {line}"
                )));
            }
        }
    }

    Ok(())
}
