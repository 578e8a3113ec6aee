//! Combination Resolver: an ordered pair of cards gives a fragment.
//!
//! Priority: the first card's curated entry for the partner, the partner's
//! curated entry mirrored, then a composition of both directional rules.
//! Every ordered pair therefore resolves.

use std::fmt;

use kl_core::card::{CombinationEntry, is_authored};
use kl_core::{CardDocument, Charge};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::fragment::{Fragment, Provenance};

/// Which card of a resolver call is met first in reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// `card_a` is read first.
    AFirst,
    /// `card_b` is read first.
    BFirst,
}

impl Direction {
    /// The opposite direction.
    pub fn flip(self) -> Self {
        match self {
            Self::AFirst => Self::BFirst,
            Self::BFirst => Self::AFirst,
        }
    }
}

/// How two cards bear on each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Same charge; each strengthens the other.
    Amplifies,
    /// Opposite charges.
    Challenges,
    /// One neutral card colours the other.
    Clarifies,
    /// Two neutral cards.
    SimilarEnergy,
    /// Authored contrast.
    OppositeEnergy,
    /// Authored progression from one card to the next.
    LearningSequence,
}

impl Relation {
    /// Parse an authored label.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "amplifies" => Some(Self::Amplifies),
            "challenges" => Some(Self::Challenges),
            "clarifies" => Some(Self::Clarifies),
            "similar_energy" => Some(Self::SimilarEnergy),
            "opposite_energy" => Some(Self::OppositeEnergy),
            "learning_sequence" => Some(Self::LearningSequence),
            _ => None,
        }
    }

    /// Derive a label from two charges.
    pub fn from_charges(a: Charge, b: Charge) -> Self {
        match (a, b) {
            (Charge::Neutral, Charge::Neutral) => Self::SimilarEnergy,
            (Charge::Neutral, _) | (_, Charge::Neutral) => Self::Clarifies,
            (a, b) if a == b => Self::Amplifies,
            _ => Self::Challenges,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Amplifies => "amplifies",
            Self::Challenges => "challenges",
            Self::Clarifies => "clarifies",
            Self::SimilarEnergy => "similar energy",
            Self::OppositeEnergy => "opposite energy",
            Self::LearningSequence => "learning sequence",
        };
        f.write_str(label)
    }
}

/// A resolved pair: interpretation plus relation label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairReading {
    /// The interpretation.
    pub fragment: Fragment,
    /// The relation label.
    pub relation: Relation,
}

enum Lookup<'c> {
    Direct(&'c CombinationEntry),
    Mirrored(&'c CombinationEntry),
    Absent,
}

fn lookup<'c>(a: &'c CardDocument, b: &'c CardDocument, direction: Direction) -> Lookup<'c> {
    if let Some(entry) = a.combination_with(b.category(), &b.id)
        && is_authored(direct_text(entry, direction))
    {
        return Lookup::Direct(entry);
    }
    if let Some(entry) = b.combination_with(a.category(), &a.id)
        && is_authored(direct_text(entry, direction.flip()))
    {
        return Lookup::Mirrored(entry);
    }
    Lookup::Absent
}

/// Text of an entry read from its owner's side.
fn direct_text(entry: &CombinationEntry, owner_side: Direction) -> &str {
    match owner_side {
        Direction::AFirst => &entry.self_first,
        Direction::BFirst => &entry.partner_first,
    }
}

/// Resolve the pair `(a, b)` read in `direction`.
pub fn resolve(a: &CardDocument, b: &CardDocument, direction: Direction) -> Fragment {
    resolve_pair(a, b, direction).fragment
}

/// Resolve the pair and label the relation between the two cards.
pub fn resolve_pair(a: &CardDocument, b: &CardDocument, direction: Direction) -> PairReading {
    let derived = || Relation::from_charges(a.core.charge, b.core.charge);
    match lookup(a, b, direction) {
        Lookup::Direct(entry) => {
            debug!(a = %a.id, b = %b.id, ?direction, "curated combination");
            PairReading {
                fragment: Fragment {
                    text: direct_text(entry, direction).to_string(),
                    keywords: entry.keywords.clone(),
                    provenance: Provenance::Curated {
                        owner: a.id.clone(),
                    },
                },
                relation: entry_relation(entry).unwrap_or_else(derived),
            }
        }
        Lookup::Mirrored(entry) => {
            debug!(a = %a.id, b = %b.id, ?direction, "mirrored combination");
            PairReading {
                fragment: Fragment {
                    text: direct_text(entry, direction.flip()).to_string(),
                    keywords: entry.keywords.clone(),
                    provenance: Provenance::Mirrored {
                        owner: b.id.clone(),
                    },
                },
                relation: entry_relation(entry).unwrap_or_else(derived),
            }
        }
        Lookup::Absent => {
            let (left, right) = match direction {
                Direction::AFirst => (a, b),
                Direction::BFirst => (b, a),
            };
            debug!(left = %left.id, right = %right.id, "composed combination");
            PairReading {
                fragment: compose(left, right),
                relation: derived(),
            }
        }
    }
}

fn entry_relation(entry: &CombinationEntry) -> Option<Relation> {
    let label = entry.relation.as_deref()?;
    let relation = Relation::parse(label);
    if relation.is_none() {
        warn!(label, "unknown relation label, deriving from charges");
    }
    relation
}

/// Compose a pair reading from the earlier card's left-hand behaviour and the
/// later card's right-hand behaviour.
fn compose(left: &CardDocument, right: &CardDocument) -> Fragment {
    let left_rule = left.directional.as_ref();
    let right_rule = right.directional.as_ref();
    let left_text = left_rule
        .map(|r| r.as_left.as_str())
        .filter(|s| is_authored(s))
        .map_or_else(|| keyword_phrase(left), str::to_string);
    let right_text = right_rule
        .map(|r| r.as_right.as_str())
        .filter(|s| is_authored(s))
        .map_or_else(|| keyword_phrase(right), str::to_string);

    let mut text = format!(
        "{} leading: {}. {} following: {}.",
        left.name,
        left_text.trim_end_matches('.'),
        right.name,
        right_text.trim_end_matches('.'),
    );
    let summaries: Vec<&str> = [left_rule, right_rule]
        .into_iter()
        .flatten()
        .map(|r| r.summary.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if !summaries.is_empty() {
        text.push_str(&format!(" In short: {}.", summaries.join(", then ")));
    }

    let mut keywords = left.core.keywords.clone();
    for kw in &right.core.keywords {
        if !keywords.contains(kw) {
            keywords.push(kw.clone());
        }
    }

    Fragment {
        text,
        keywords,
        provenance: Provenance::Composed {
            left: left.id.clone(),
            right: right.id.clone(),
        },
    }
}

fn keyword_phrase(card: &CardDocument) -> String {
    if card.core.keywords.is_empty() {
        card.name.to_lowercase()
    } else {
        card.core.keywords.join(", ")
    }
}
