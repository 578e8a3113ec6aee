use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DocumentError, DocumentResult};

/// Segment names that collide with leaf field names in card documents.
pub const RESERVED_SEGMENTS: &[&str] = &["upright", "reversed", "text", "keywords"];

/// Question category that never selects a topic context.
pub const GENERAL_CATEGORY: &str = "general";

/// Identifier of an oracle system (e.g. `tarot`, `lenormand`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemId(pub String);

impl SystemId {
    /// Create a system id from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One level of the declared meaning-tree vocabulary.
///
/// An empty node is a leaf: locators must end there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaNode(pub BTreeMap<String, SchemaNode>);

impl SchemaNode {
    /// A leaf node.
    pub fn leaf() -> Self {
        Self::default()
    }

    /// Add a child segment, returning `self` for chaining.
    pub fn with(mut self, segment: impl Into<String>, child: SchemaNode) -> Self {
        self.0.insert(segment.into(), child);
        self
    }

    /// Whether this node terminates a locator.
    pub fn is_leaf(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up a child segment.
    pub fn child(&self, segment: &str) -> Option<&SchemaNode> {
        self.0.get(segment)
    }

    /// The segment vocabulary at this level, comma-separated.
    pub fn vocabulary(&self) -> String {
        self.0.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
    }

    /// Every root-to-leaf path below this node, dot-joined, in key order.
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_paths(String::new(), &mut out);
        out
    }

    fn collect_paths(&self, prefix: String, out: &mut Vec<String>) {
        for (segment, child) in &self.0 {
            let path = if prefix.is_empty() {
                segment.clone()
            } else {
                format!("{prefix}.{segment}")
            };
            if child.is_leaf() {
                out.push(path);
            } else {
                child.collect_paths(path, out);
            }
        }
    }

    fn find_reserved(&self) -> Option<&str> {
        for (segment, child) in &self.0 {
            if RESERVED_SEGMENTS.contains(&segment.as_str()) {
                return Some(segment);
            }
            if let Some(found) = child.find_reserved() {
                return Some(found);
            }
        }
        None
    }
}

/// The declared data shape of one oracle system.
///
/// Cards and spreads are checked against this at load time, so a broken
/// locator or an undeclared partner category never reaches a reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleSystem {
    /// Stable system id.
    pub id: SystemId,
    /// Display name.
    pub name: String,
    /// Whether drawn cards may appear reversed.
    #[serde(default)]
    pub reversals: bool,
    /// Segment vocabulary of the position-meaning tree.
    pub meanings: SchemaNode,
    /// Declared topic-context vocabulary.
    #[serde(default)]
    pub question_categories: Vec<String>,
    /// Declared partition vocabulary of combination tables.
    #[serde(default)]
    pub partner_categories: Vec<String>,
}

impl OracleSystem {
    /// Check the schema itself.
    pub fn validate(&self) -> DocumentResult<()> {
        if let Some(segment) = self.meanings.find_reserved() {
            return Err(DocumentError::ReservedSegment {
                system: self.id.clone(),
                segment: segment.to_string(),
            });
        }
        Ok(())
    }

    /// Whether `category` is a declared question category (or `general`).
    pub fn accepts_question_category(&self, category: &str) -> bool {
        category == GENERAL_CATEGORY || self.question_categories.iter().any(|c| c == category)
    }

    /// Whether `category` is a declared partner category.
    pub fn declares_partner_category(&self, category: &str) -> bool {
        self.partner_categories.iter().any(|c| c == category)
    }
}
