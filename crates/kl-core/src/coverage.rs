//! Coverage report for a loaded system.
//!
//! Gaps listed here are not errors: the resolvers fall back for every one of
//! them. The report tells authors where readings will be less specific.

use std::fmt;

use crate::card::Orientation;
use crate::locator::Walk;
use crate::source::{CardSource, SpreadSource};
use crate::system::GENERAL_CATEGORY;

/// One coverage gap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageGap {
    /// The card with the gap.
    pub card: String,
    /// What is missing.
    pub message: String,
}

impl fmt::Display for CoverageGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "warning: {}: {}", self.card, self.message)
    }
}

/// Summary of curated-combination coverage over all ordered pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CombinationCoverage {
    /// Ordered pairs in the system, `n * (n - 1)`.
    pub ordered_pairs: usize,
    /// Ordered pairs answered by a curated entry on either card.
    pub curated_pairs: usize,
    /// Cards that carry a directional rule.
    pub directional_cards: usize,
}

/// List every (card, locator) pair used by some spread that will fall back,
/// plus missing topic contexts and missing directional rules.
pub fn coverage_gaps<C, S>(cards: &C, spreads: &S) -> Vec<CoverageGap>
where
    C: CardSource + ?Sized,
    S: SpreadSource + ?Sized,
{
    let mut gaps = Vec::new();
    let system = cards.system();

    for id in spreads.spread_ids() {
        let Ok(spread) = spreads.spread(id) else {
            continue;
        };
        for pos in spread.positions() {
            for card in cards.cards() {
                match pos.locator.walk(&card.meanings) {
                    Walk::Found(leaf) => {
                        for &orientation in orientations(system.reversals) {
                            if leaf.authored_text(orientation).is_none() {
                                gaps.push(CoverageGap {
                                    card: card.id.to_string(),
                                    message: format!(
                                        "no {orientation} text at \"{}\" (spread \"{}\", position \"{}\")",
                                        pos.locator, spread.id, pos.name
                                    ),
                                });
                            }
                        }
                    }
                    Walk::Missing { missing } => gaps.push(CoverageGap {
                        card: card.id.to_string(),
                        message: format!(
                            "no branch \"{missing}\" (spread \"{}\", position \"{}\")",
                            spread.id, pos.name
                        ),
                    }),
                    Walk::Malformed { at } => gaps.push(CoverageGap {
                        card: card.id.to_string(),
                        message: format!("meaning tree has the wrong shape at \"{at}\""),
                    }),
                }
            }
        }
    }

    let any_directional = cards.cards().any(|c| c.directional.is_some());
    for card in cards.cards() {
        for category in &system.question_categories {
            if category != GENERAL_CATEGORY && !card.topic_contexts.contains_key(category) {
                gaps.push(CoverageGap {
                    card: card.id.to_string(),
                    message: format!("no topic context for \"{category}\""),
                });
            }
        }
        if any_directional && card.directional.is_none() {
            gaps.push(CoverageGap {
                card: card.id.to_string(),
                message: "no directional rule; composed combinations use core keywords"
                    .to_string(),
            });
        }
    }

    gaps
}

fn orientations(reversals: bool) -> &'static [Orientation] {
    if reversals {
        &[Orientation::Upright, Orientation::Reversed]
    } else {
        &[Orientation::Upright]
    }
}

/// Count how many ordered pairs a curated entry answers, directly or mirrored.
pub fn combination_coverage<C: CardSource + ?Sized>(cards: &C) -> CombinationCoverage {
    let all: Vec<_> = cards.cards().collect();
    let n = all.len();
    let mut curated_pairs = 0;
    for a in &all {
        for b in &all {
            if a.id == b.id {
                continue;
            }
            let direct = a.combination_with(b.category(), &b.id).is_some();
            let mirrored = b.combination_with(a.category(), &a.id).is_some();
            if direct || mirrored {
                curated_pairs += 1;
            }
        }
    }
    CombinationCoverage {
        ordered_pairs: n * n.saturating_sub(1),
        curated_pairs,
        directional_cards: all.iter().filter(|c| c.directional.is_some()).count(),
    }
}
