//! The Assembled Context and its deterministic renderings.
//!
//! The context is the only artifact handed to narrative synthesis and to the
//! renderers. Its fields are private; once assembled it is never changed.

use std::fmt;

use kl_core::spread::Layout;
use kl_core::{CardDocument, CardId, Charge, Orientation, Spread, SystemId};
use serde::{Deserialize, Serialize};

use crate::combination::Relation;
use crate::error::ReadingResult;
use crate::fragment::{Fragment, Provenance};

/// One resolved position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    /// Index in the spread's declared order.
    pub index: usize,
    /// Position name.
    pub position: String,
    /// Position description, adapted to the question category when one applies.
    pub description: String,
    /// Keywords declared on the position.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub position_keywords: Vec<String>,
    /// The card lying here.
    pub card: CardId,
    /// The card's display name.
    pub card_name: String,
    /// How it lies.
    pub orientation: Orientation,
    /// Draw order.
    pub sequence: usize,
    /// Position interpretation.
    pub interpretation: Fragment,
    /// The card's core essence for its orientation, when authored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub essence: Option<String>,
    /// Topic-context fragment for the question category, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<Fragment>,
    /// The card's core keywords.
    pub keywords: Vec<String>,
    /// The card's charge.
    pub charge: Charge,
    /// Rendering coordinates, copied from the spread.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
}

/// One side of a combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairCard {
    /// Position name.
    pub position: String,
    /// Card id.
    pub card: CardId,
    /// Card display name.
    pub card_name: String,
}

impl PairCard {
    pub(crate) fn new(position: &str, card: &CardDocument) -> Self {
        Self {
            position: position.to_string(),
            card: card.id.clone(),
            card_name: card.name.clone(),
        }
    }
}

/// Why a pair was read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PairScope {
    /// Consecutive positions of a line.
    Line {
        /// Line number.
        line: u32,
    },
    /// A house near an anchor.
    Anchor {
        /// The anchor position's name.
        anchor: String,
    },
}

/// One resolved pairwise combination. `first` precedes `second` in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinationRecord {
    /// Earlier card.
    pub first: PairCard,
    /// Later card.
    pub second: PairCard,
    /// Relation label.
    pub relation: Relation,
    /// Why the pair was read.
    pub scope: PairScope,
    /// The interpretation.
    pub interpretation: Fragment,
}

/// The complete, ordered output of one assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledContext {
    spread_id: String,
    spread_name: String,
    system: SystemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    question_category: Option<String>,
    positions: Vec<PositionRecord>,
    combinations: Vec<CombinationRecord>,
}

impl AssembledContext {
    pub(crate) fn new(
        spread: &Spread,
        system: SystemId,
        question: Option<String>,
        question_category: Option<String>,
        positions: Vec<PositionRecord>,
        combinations: Vec<CombinationRecord>,
    ) -> Self {
        Self {
            spread_id: spread.id.clone(),
            spread_name: spread.name.clone(),
            system,
            question,
            question_category,
            positions,
            combinations,
        }
    }

    /// Parse a context previously written with [`AssembledContext::to_json`].
    pub fn from_json(json: &str) -> ReadingResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The spread id.
    pub fn spread_id(&self) -> &str {
        &self.spread_id
    }

    /// The spread's display name.
    pub fn spread_name(&self) -> &str {
        &self.spread_name
    }

    /// The oracle system.
    pub fn system(&self) -> &SystemId {
        &self.system
    }

    /// The querent's question.
    pub fn question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    /// The question category.
    pub fn question_category(&self) -> Option<&str> {
        self.question_category.as_deref()
    }

    /// Position records in spread order.
    pub fn positions(&self) -> &[PositionRecord] {
        &self.positions
    }

    /// Combination records in selection order.
    pub fn combinations(&self) -> &[CombinationRecord] {
        &self.combinations
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> ReadingResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain-text transcript, complete without any synthesis step.
    pub fn transcript(&self) -> String {
        self.to_string()
    }

    /// Markdown rendering.
    pub fn to_markdown(&self) -> String {
        Markdown(self).to_string()
    }
}

fn marker(fragment: &Fragment) -> &'static str {
    match fragment.provenance {
        Provenance::EssenceFallback { .. } => " [core meaning]",
        _ => "",
    }
}

impl fmt::Display for AssembledContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.spread_name, self.system)?;
        if let Some(q) = &self.question {
            writeln!(f, "Question: {q}")?;
        }
        if let Some(c) = &self.question_category {
            writeln!(f, "Category: {c}")?;
        }

        for p in &self.positions {
            writeln!(f)?;
            writeln!(
                f,
                "{}. {}: {}, {}",
                p.index + 1,
                p.position,
                p.card_name,
                p.orientation
            )?;
            if !p.description.is_empty() {
                writeln!(f, "   {}", p.description)?;
            }
            writeln!(
                f,
                "   {}{}",
                p.interpretation.text,
                marker(&p.interpretation)
            )?;
            if let (Some(topic), Some(c)) = (&p.topic, &self.question_category) {
                writeln!(f, "   {c}: {}", topic.text)?;
            }
            if !p.keywords.is_empty() {
                writeln!(f, "   keywords: {}", p.keywords.join(", "))?;
            }
        }

        if !self.combinations.is_empty() {
            writeln!(f)?;
            writeln!(f, "Combinations")?;
            for c in &self.combinations {
                writeln!(
                    f,
                    "- {} -> {} ({}): {}",
                    c.first.card_name, c.second.card_name, c.relation, c.interpretation.text
                )?;
            }
        }
        Ok(())
    }
}

struct Markdown<'a>(&'a AssembledContext);

impl fmt::Display for Markdown<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.0;
        writeln!(f, "# {}", ctx.spread_name)?;
        writeln!(f)?;
        writeln!(f, "*System: {}*", ctx.system)?;
        if let Some(q) = &ctx.question {
            writeln!(f)?;
            writeln!(f, "**Question:** {q}")?;
        }
        if let Some(c) = &ctx.question_category {
            writeln!(f)?;
            writeln!(f, "**Category:** {c}")?;
        }

        writeln!(f)?;
        writeln!(f, "## Positions")?;
        for p in &ctx.positions {
            writeln!(f)?;
            writeln!(
                f,
                "### {}. {}: {} ({})",
                p.index + 1,
                p.position,
                p.card_name,
                p.orientation
            )?;
            if !p.description.is_empty() {
                writeln!(f)?;
                writeln!(f, "*{}*", p.description)?;
            }
            writeln!(f)?;
            writeln!(
                f,
                "{}{}",
                p.interpretation.text,
                marker(&p.interpretation)
            )?;
            if let (Some(topic), Some(c)) = (&p.topic, &ctx.question_category) {
                writeln!(f)?;
                writeln!(f, "**{c}:** {}", topic.text)?;
            }
            if !p.keywords.is_empty() {
                writeln!(f)?;
                writeln!(f, "**Keywords:** {}", p.keywords.join(", "))?;
            }
        }

        if !ctx.combinations.is_empty() {
            writeln!(f)?;
            writeln!(f, "## Combinations")?;
            writeln!(f)?;
            for c in &ctx.combinations {
                writeln!(
                    f,
                    "- **{} → {}** ({}): {}",
                    c.first.card_name, c.second.card_name, c.relation, c.interpretation.text
                )?;
            }
        }
        Ok(())
    }
}
