//! Reading engine for Kartenleger.
//!
//! Resolves drawn cards against a spread into an [`AssembledContext`]:
//! position interpretations through the Path Resolver, pairwise readings
//! through the Combination Resolver, and the ordered, immutable output of the
//! Context Assembler. Nothing here performs I/O.

/// Context assembly.
pub mod assemble;
/// Pairwise combination resolution.
pub mod combination;
/// The assembled context and its renderings.
pub mod context;
/// The drawing step.
pub mod draw;
/// Error types for the reading engine.
pub mod error;
/// Resolved fragments and provenance.
pub mod fragment;
/// Position path resolution.
pub mod path;

mod pairs;

#[cfg(test)]
mod testing;

pub use assemble::{AssembleOptions, DrawnCard, assemble};
pub use combination::{Direction, PairReading, Relation};
pub use context::{AssembledContext, CombinationRecord, PairCard, PairScope, PositionRecord};
pub use draw::{DrawConfig, draw};
pub use error::{ReadingError, ReadingResult};
pub use fragment::{Fragment, Provenance};
