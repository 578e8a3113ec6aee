//! Locator interpreter.
//!
//! A locator is a dot-delimited path such as `temporal.past`. Parsing checks
//! each segment against the system's declared vocabulary, so a locator that
//! survives [`Locator::parse`] can only miss on a specific card, never on the
//! schema itself.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::card::{MeaningLeaf, MeaningNode};
use crate::error::LocatorError;
use crate::system::SchemaNode;

/// A schema-checked path into a card's meaning tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    segments: Vec<String>,
}

/// Where a walk over a card's meaning tree stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Walk<'c> {
    /// The locator reached a leaf.
    Found(&'c MeaningLeaf),
    /// The card has no entry for `segment` (dot-joined prefix included).
    Missing {
        /// The first absent path, e.g. `temporal.past`.
        missing: String,
    },
    /// The card's tree has the wrong shape at `at` (a leaf where a branch was
    /// declared, or the reverse).
    Malformed {
        /// The path where the shape diverged.
        at: String,
    },
}

impl Locator {
    /// Parse `text` against `schema`.
    pub fn parse(text: &str, schema: &SchemaNode) -> Result<Self, LocatorError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LocatorError::Empty);
        }

        let mut node = schema;
        let mut segments: Vec<String> = Vec::new();
        for segment in text.split('.') {
            if segment.is_empty() {
                return Err(LocatorError::EmptySegment(text.to_string()));
            }
            node = node
                .child(segment)
                .ok_or_else(|| LocatorError::UnknownSegment {
                    segment: segment.to_string(),
                    prefix: segments.join("."),
                    expected: node.vocabulary(),
                })?;
            segments.push(segment.to_string());
        }

        if !node.is_leaf() {
            return Err(LocatorError::NotALeaf {
                locator: text.to_string(),
                expected: node.vocabulary(),
            });
        }

        Ok(Self { segments })
    }

    /// The segments, root first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Follow the locator through a card's meaning tree.
    pub fn walk<'c>(&self, tree: &'c BTreeMap<String, MeaningNode>) -> Walk<'c> {
        let mut level = tree;
        let last = self.segments.len() - 1;
        for (depth, segment) in self.segments.iter().enumerate() {
            let path = || self.segments[..=depth].join(".");
            match (level.get(segment), depth == last) {
                (None, _) => return Walk::Missing { missing: path() },
                (Some(MeaningNode::Leaf(leaf)), true) => return Walk::Found(leaf),
                (Some(MeaningNode::Branch(children)), false) => level = children,
                (Some(_), _) => return Walk::Malformed { at: path() },
            }
        }
        Walk::Missing {
            missing: self.to_string(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl Serialize for Locator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
