//! Context Assembler.
//!
//! Pure and synchronous: reads the card source, the spread, and the drawn
//! cards, and allocates a fresh [`AssembledContext`]. Nothing shared is
//! mutated, so any number of readings can be assembled in parallel against
//! one loaded deck.

use kl_core::{CardDocument, CardId, CardSource, Orientation, Spread};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::combination::{Direction, resolve_pair};
use crate::context::{AssembledContext, CombinationRecord, PairCard, PairScope, PositionRecord};
use crate::error::{ReadingError, ReadingResult};
use crate::pairs::{SlotKind, select_pairs};
use crate::path;

/// A card laid on a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawnCard {
    /// The card.
    pub card: CardId,
    /// Name of the position it lies on.
    pub position: String,
    /// How it lies.
    #[serde(default)]
    pub orientation: Orientation,
    /// Draw order. Informational only; reading order is position order.
    #[serde(default)]
    pub sequence: usize,
}

/// Options for one assembly.
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// The querent's question, carried through for synthesis.
    pub question: Option<String>,
    /// Question category selecting topic contexts and position adaptations.
    pub category: Option<String>,
    /// Whether to resolve pairwise combinations.
    pub combinations: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            question: None,
            category: None,
            combinations: true,
        }
    }
}

impl AssembleOptions {
    /// Set the question text.
    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    /// Set the question category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Skip combination resolution.
    pub fn without_combinations(mut self) -> Self {
        self.combinations = false;
        self
    }
}

/// Assemble a reading.
///
/// Fails only on configuration errors: a spread from another system, an
/// undeclared question category, a drawn-card count that differs from the
/// position count, a drawn card on an unknown or already-filled position, or
/// a card the source does not know. Coverage gaps become fallback fragments.
pub fn assemble<C: CardSource + ?Sized>(
    cards: &C,
    spread: &Spread,
    drawn: &[DrawnCard],
    options: &AssembleOptions,
) -> ReadingResult<AssembledContext> {
    let system = cards.system();
    if spread.system != system.id {
        return Err(ReadingError::SystemMismatch {
            spread: spread.system.clone(),
            deck: system.id.clone(),
        });
    }
    if let Some(category) = &options.category
        && !system.accepts_question_category(category)
    {
        return Err(ReadingError::UnknownQuestionCategory {
            system: system.id.clone(),
            category: category.clone(),
        });
    }
    if drawn.len() != spread.card_count() {
        return Err(ReadingError::CountMismatch {
            spread: spread.id.clone(),
            expected: spread.card_count(),
            actual: drawn.len(),
        });
    }

    let mut slots: Vec<Option<&DrawnCard>> = vec![None; spread.card_count()];
    for d in drawn {
        let pos = spread
            .position(&d.position)
            .ok_or_else(|| ReadingError::UnknownPosition {
                spread: spread.id.clone(),
                position: d.position.clone(),
            })?;
        if slots[pos.index].replace(d).is_some() {
            return Err(ReadingError::PositionFilledTwice(d.position.clone()));
        }
    }
    // count matches and no slot was filled twice, so every slot is filled
    let ordered: Vec<&DrawnCard> = slots.into_iter().flatten().collect();
    let placed = ordered
        .iter()
        .map(|d| {
            cards
                .card(&d.card)
                .ok_or_else(|| ReadingError::UnknownCard(d.card.clone()))
        })
        .collect::<ReadingResult<Vec<&CardDocument>>>()?;

    let category = options.category.as_deref();
    let positions: Vec<PositionRecord> = spread
        .positions()
        .iter()
        .zip(&ordered)
        .zip(&placed)
        .map(|((pos, d), card)| PositionRecord {
            index: pos.index,
            position: pos.name.clone(),
            description: pos.description_for(category).to_string(),
            position_keywords: pos.keywords.clone(),
            card: card.id.clone(),
            card_name: card.name.clone(),
            orientation: d.orientation,
            sequence: d.sequence,
            interpretation: path::resolve(card, &pos.locator, d.orientation),
            essence: card.essence(d.orientation).map(str::to_string),
            topic: category.and_then(|c| path::resolve_topic(card, c, d.orientation)),
            keywords: card.core.keywords.clone(),
            charge: card.core.charge,
            layout: pos.layout,
        })
        .collect();

    let combinations = if options.combinations {
        select_pairs(spread, &placed)
            .into_iter()
            .map(|slot| {
                let (first, second) = (placed[slot.first], placed[slot.second]);
                let (reading, scope) = match slot.kind {
                    SlotKind::Line(line) => (
                        resolve_pair(first, second, Direction::AFirst),
                        PairScope::Line { line },
                    ),
                    SlotKind::Anchor(anchor) => {
                        let (anchor_card, other, direction) = if anchor == slot.first {
                            (first, second, Direction::AFirst)
                        } else {
                            (second, first, Direction::BFirst)
                        };
                        (
                            resolve_pair(anchor_card, other, direction),
                            PairScope::Anchor {
                                anchor: spread.positions()[anchor].name.clone(),
                            },
                        )
                    }
                };
                CombinationRecord {
                    first: PairCard::new(&spread.positions()[slot.first].name, first),
                    second: PairCard::new(&spread.positions()[slot.second].name, second),
                    relation: reading.relation,
                    scope,
                    interpretation: reading.fragment,
                }
            })
            .collect()
    } else {
        Vec::new()
    };

    debug!(
        spread = %spread.id,
        positions = positions.len(),
        combinations = combinations.len(),
        "reading assembled"
    );

    Ok(AssembledContext::new(
        spread,
        system.id.clone(),
        options.question.clone(),
        options.category.clone(),
        positions,
        combinations,
    ))
}
