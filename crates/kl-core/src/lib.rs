//! Core documents for Kartenleger: oracle systems, cards, spreads, and locators.
//!
//! This crate defines the read-only data the reading engine navigates. It
//! knows nothing about drawing or assembling a reading; documents are loaded
//! and validated here once, then shared by reference.

/// Card documents, orientations, and curated combination tables.
pub mod card;
/// Coverage report over a loaded system.
pub mod coverage;
/// The in-memory deck of one system.
pub mod deck;
/// Error types used throughout the crate.
pub mod error;
/// Loading systems from JSON directories.
pub mod load;
/// Locator parsing and meaning-tree walking.
pub mod locator;
/// Capability interfaces for card and spread sources.
pub mod source;
/// Spread documents and validated spreads.
pub mod spread;
/// Oracle system schemas.
pub mod system;

#[cfg(test)]
mod testing;

pub use card::{CardDocument, CardId, Charge, Orientation};
pub use deck::Deck;
pub use error::{DocumentError, DocumentResult, LocatorError};
pub use load::{Library, SystemBundle, load_system_dir};
pub use locator::Locator;
pub use source::{CardSource, SpreadBook, SpreadSource};
pub use spread::{Adjacency, LineRole, Position, Spread, SpreadDocument};
pub use system::{OracleSystem, SystemId};
