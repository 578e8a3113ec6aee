//! Reading traditions and the prompts they render from an assembled context.

use std::fmt;
use std::fmt::Write as _;

use kl_reading::{AssembledContext, Provenance};
use serde::{Deserialize, Serialize};

use crate::error::{NarrativeError, NarrativeResult};

/// The voice a synthesized reading is written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tradition {
    /// Warm, imagistic, reader-to-querent.
    #[default]
    Intuitive,
    /// Traditional cartomancy, card by card then as a whole.
    Classical,
    /// Archetypes and inner process, no fortune-telling.
    Psychological,
}

impl Tradition {
    /// Every tradition, in display order.
    pub const ALL: [Tradition; 3] = [Self::Intuitive, Self::Classical, Self::Psychological];

    /// Parse a tradition name.
    pub fn parse(name: &str) -> NarrativeResult<Self> {
        match name.trim().to_lowercase().as_str() {
            "intuitive" => Ok(Self::Intuitive),
            "classical" => Ok(Self::Classical),
            "psychological" => Ok(Self::Psychological),
            other => Err(NarrativeError::UnknownTradition(other.to_string())),
        }
    }

    /// One-line description.
    pub fn description(self) -> &'static str {
        match self {
            Self::Intuitive => "flowing narrative that speaks directly to the querent",
            Self::Classical => "traditional card-by-card reading with a closing synthesis",
            Self::Psychological => "archetypal reading focused on inner process",
        }
    }

    /// The system prompt.
    pub fn system_prompt(self) -> &'static str {
        match self {
            Self::Intuitive => {
                "You are an intuitive card reader. Weave the cards below into one flowing \
                 reading addressed to the querent. Use only the interpretations you are \
                 given; do not invent card meanings. Keep it under 400 words."
            }
            Self::Classical => {
                "You are a reader in the classical cartomancy tradition. Read each position \
                 in order, then the combinations, then give a short synthesis. Use only the \
                 interpretations you are given; do not invent card meanings."
            }
            Self::Psychological => {
                "You read cards as mirrors of inner process, not as predictions. Describe \
                 the patterns, tensions, and invitations the cards suggest. Use only the \
                 interpretations you are given; do not invent card meanings."
            }
        }
    }

    /// Render the user prompt for `context`.
    pub fn user_prompt(self, context: &AssembledContext) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = write_context(&mut out, self, context);
        out
    }

    /// Render `(system, user)` for `context`.
    pub fn render(self, context: &AssembledContext) -> (String, String) {
        (self.system_prompt().to_string(), self.user_prompt(context))
    }
}

fn write_context(out: &mut String, tradition: Tradition, ctx: &AssembledContext) -> fmt::Result {
    writeln!(out, "Spread: {}", ctx.spread_name())?;
    if let Some(q) = ctx.question() {
        writeln!(out, "Question: {q}")?;
    }
    if let Some(c) = ctx.question_category() {
        writeln!(out, "Question type: {c}")?;
    }

    writeln!(out)?;
    writeln!(out, "Cards:")?;
    for p in ctx.positions() {
        writeln!(
            out,
            "- {} ({}) in \"{}\": {}",
            p.card_name, p.orientation, p.position, p.description
        )?;
        writeln!(out, "  Meaning here: {}", p.interpretation.text)?;
        // a fallback interpretation already is the essence
        let fallback = matches!(p.interpretation.provenance, Provenance::EssenceFallback { .. });
        if let Some(essence) = p.essence.as_ref().filter(|_| !fallback) {
            writeln!(out, "  Essence: {essence}")?;
        }
        if let Some(topic) = &p.topic {
            writeln!(out, "  For this question: {}", topic.text)?;
        }
        if !p.keywords.is_empty() {
            writeln!(out, "  Keywords: {}", p.keywords.join(", "))?;
        }
    }

    if !ctx.combinations().is_empty() {
        writeln!(out)?;
        writeln!(out, "Combinations:")?;
        for c in ctx.combinations() {
            writeln!(
                out,
                "- {} and {} ({}): {}",
                c.first.card_name, c.second.card_name, c.relation, c.interpretation.text
            )?;
        }
    }

    writeln!(out)?;
    match tradition {
        Tradition::Intuitive => writeln!(out, "Give the reading as one narrative.")?,
        Tradition::Classical => writeln!(
            out,
            "Give the reading position by position, then combinations, then a synthesis."
        )?,
        Tradition::Psychological => writeln!(
            out,
            "Give the reading as reflections and questions for the querent."
        )?,
    }
    Ok(())
}

impl fmt::Display for Tradition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Intuitive => write!(f, "intuitive"),
            Self::Classical => write!(f, "classical"),
            Self::Psychological => write!(f, "psychological"),
        }
    }
}
