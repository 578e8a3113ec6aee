use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::system::SystemId;

/// Stable identifier of a card within its system (e.g. `the_fool`, `rider`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub String);

impl CardId {
    /// Create a card id from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// How a drawn card lies on the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Read the upright branch.
    #[default]
    Upright,
    /// Read the reversed branch.
    Reversed,
}

impl Orientation {
    /// Parse `upright`/`u` or `reversed`/`r` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "upright" | "u" => Some(Self::Upright),
            "reversed" | "r" | "rx" => Some(Self::Reversed),
            _ => None,
        }
    }

    /// Whether this is the reversed orientation.
    pub fn is_reversed(self) -> bool {
        self == Self::Reversed
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upright => write!(f, "upright"),
            Self::Reversed => write!(f, "reversed"),
        }
    }
}

/// Valence of a card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Charge {
    /// Favourable.
    Positive,
    /// Unfavourable.
    Negative,
    /// Neither; takes colour from its neighbours.
    #[default]
    Neutral,
}

impl fmt::Display for Charge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Negative => write!(f, "negative"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

/// A pair of texts, one per orientation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrientedText {
    /// Upright text.
    #[serde(default)]
    pub upright: String,
    /// Reversed text.
    #[serde(default)]
    pub reversed: String,
}

impl OrientedText {
    /// The text for `orientation`.
    pub fn select(&self, orientation: Orientation) -> &str {
        match orientation {
            Orientation::Upright => &self.upright,
            Orientation::Reversed => &self.reversed,
        }
    }
}

/// The card's core block: keywords, valence, partner category, topics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreBlock {
    /// Headline keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Valence.
    #[serde(default)]
    pub charge: Charge,
    /// Partner category used to partition other cards' combination tables.
    pub category: String,
    /// Subject areas the card speaks to.
    #[serde(default)]
    pub topics: Vec<String>,
    /// One-sentence essence per orientation, used when a locator branch is missing.
    #[serde(default)]
    pub essence: Option<OrientedText>,
}

/// Prefix of placeholder text left in unfinished card documents.
pub const PLACEHOLDER_PREFIX: &str = "[TO BE WRITTEN";

/// Whether `text` is real authored content: not blank, not a placeholder.
pub fn is_authored(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && !text.starts_with(PLACEHOLDER_PREFIX)
}

/// A terminal interpretation in a card's meaning tree.
///
/// An oriented leaf may carry only one side; the other resolves as a gap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, try_from = "RawLeaf")]
pub enum MeaningLeaf {
    /// Leaf with one text per orientation.
    Oriented {
        /// Upright text.
        #[serde(skip_serializing_if = "Option::is_none")]
        upright: Option<String>,
        /// Reversed text.
        #[serde(skip_serializing_if = "Option::is_none")]
        reversed: Option<String>,
        /// Keywords for this branch.
        #[serde(skip_serializing_if = "Vec::is_empty")]
        keywords: Vec<String>,
    },
    /// Leaf whose text does not depend on orientation.
    Invariant {
        /// The text.
        text: String,
        /// Keywords for this branch.
        #[serde(skip_serializing_if = "Vec::is_empty")]
        keywords: Vec<String>,
    },
}

/// Any object carrying at least one leaf field. Objects with none of them are
/// branches.
#[derive(Deserialize)]
struct RawLeaf {
    #[serde(default)]
    upright: Option<String>,
    #[serde(default)]
    reversed: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

impl TryFrom<RawLeaf> for MeaningLeaf {
    type Error = String;

    fn try_from(raw: RawLeaf) -> Result<Self, Self::Error> {
        match raw {
            RawLeaf {
                upright: None,
                reversed: None,
                text: Some(text),
                keywords,
            } => Ok(Self::Invariant { text, keywords }),
            RawLeaf {
                upright: None,
                reversed: None,
                text: None,
                ..
            } => Err("not a leaf: no upright, reversed, or text field".to_string()),
            RawLeaf {
                upright,
                reversed,
                keywords,
                ..
            } => Ok(Self::Oriented {
                upright,
                reversed,
                keywords,
            }),
        }
    }
}

impl MeaningLeaf {
    /// The text for `orientation`; invariant leaves ignore it. Empty when the
    /// side is not written.
    pub fn text(&self, orientation: Orientation) -> &str {
        match self {
            Self::Oriented {
                upright, reversed, ..
            } => match orientation {
                Orientation::Upright => upright.as_deref().unwrap_or_default(),
                Orientation::Reversed => reversed.as_deref().unwrap_or_default(),
            },
            Self::Invariant { text, .. } => text,
        }
    }

    /// The text for `orientation`, if it is authored content.
    pub fn authored_text(&self, orientation: Orientation) -> Option<&str> {
        Some(self.text(orientation)).filter(|text| is_authored(text))
    }

    /// Keywords attached to the leaf.
    pub fn keywords(&self) -> &[String] {
        match self {
            Self::Oriented { keywords, .. } | Self::Invariant { keywords, .. } => keywords,
        }
    }
}

/// A node in a card's meaning tree: either a leaf or a keyed branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeaningNode {
    /// Terminal interpretation.
    Leaf(MeaningLeaf),
    /// Keyed sub-tree.
    Branch(BTreeMap<String, MeaningNode>),
}

/// How a card behaves when read as the earlier or the later card of a pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionalRule {
    /// Behaviour as the left-hand (earlier) card.
    pub as_left: String,
    /// Behaviour as the right-hand (later) card.
    pub as_right: String,
    /// One-line summary of the card's directional character.
    #[serde(default)]
    pub summary: String,
}

/// A curated interpretation for this card paired with one partner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinationEntry {
    /// Reading when this card comes first and the partner second.
    pub self_first: String,
    /// Reading when the partner comes first and this card second.
    pub partner_first: String,
    /// Optional authored relation label (e.g. `amplifies`).
    #[serde(default)]
    pub relation: Option<String>,
    /// Keywords for the pairing.
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Curated combinations, partitioned by the partner's category, then keyed by partner id.
pub type CombinationTable = BTreeMap<String, BTreeMap<CardId, CombinationEntry>>;

/// An immutable per-card document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDocument {
    /// Stable id.
    pub id: CardId,
    /// Ordinal number within the deck.
    #[serde(default)]
    pub number: u32,
    /// Display name.
    pub name: String,
    /// Owning system.
    pub system: SystemId,
    /// Core block.
    pub core: CoreBlock,
    /// Position-meaning tree addressed by locators.
    #[serde(default)]
    pub meanings: BTreeMap<String, MeaningNode>,
    /// Topic-context leaves keyed by question category.
    #[serde(default)]
    pub topic_contexts: BTreeMap<String, MeaningLeaf>,
    /// Directional rule, for systems that read pairs in order.
    #[serde(default)]
    pub directional: Option<DirectionalRule>,
    /// Stratified curated combination table.
    #[serde(default)]
    pub combinations: CombinationTable,
    /// Affirmations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affirmations: Vec<String>,
    /// Journaling prompts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub journaling_prompts: Vec<String>,
}

impl CardDocument {
    /// Create a minimal card with the given partner category.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        system: SystemId,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: CardId::new(id),
            number: 0,
            name: name.into(),
            system,
            core: CoreBlock {
                category: category.into(),
                ..CoreBlock::default()
            },
            meanings: BTreeMap::new(),
            topic_contexts: BTreeMap::new(),
            directional: None,
            combinations: BTreeMap::new(),
            affirmations: Vec::new(),
            journaling_prompts: Vec::new(),
        }
    }

    /// The partner category this card is filed under in other cards' tables.
    pub fn category(&self) -> &str {
        &self.core.category
    }

    /// Curated entry for `partner`, looked up in the partition for `partner_category`.
    pub fn combination_with(
        &self,
        partner_category: &str,
        partner: &CardId,
    ) -> Option<&CombinationEntry> {
        self.combinations.get(partner_category)?.get(partner)
    }

    /// Essence text for `orientation`, if authored and non-empty.
    pub fn essence(&self, orientation: Orientation) -> Option<&str> {
        self.core
            .essence
            .as_ref()
            .map(|e| e.select(orientation))
            .filter(|s| is_authored(s))
    }

    /// Number of curated entries across all partitions.
    pub fn curated_count(&self) -> usize {
        self.combinations.values().map(BTreeMap::len).sum()
    }
}
