//! The drawing step: shuffle, deal onto positions, maybe reverse.

use kl_core::{CardId, CardSource, Orientation, Spread};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::assemble::DrawnCard;
use crate::error::{ReadingError, ReadingResult};

/// Configuration for a draw.
#[derive(Debug, Clone)]
pub struct DrawConfig {
    /// Random seed. `None` seeds from the operating system.
    pub seed: Option<u64>,
    /// Whether cards may come up reversed (also requires system support).
    pub allow_reversals: bool,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            seed: None,
            allow_reversals: true,
        }
    }
}

impl DrawConfig {
    /// Use a fixed seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Keep every card upright.
    pub fn without_reversals(mut self) -> Self {
        self.allow_reversals = false;
        self
    }
}

/// Deal one card onto each position of `spread`, in declared order.
///
/// The same seed over the same deck always gives the same draw.
pub fn draw<C: CardSource + ?Sized>(
    cards: &C,
    spread: &Spread,
    config: &DrawConfig,
) -> ReadingResult<Vec<DrawnCard>> {
    let system = cards.system();
    if spread.system != system.id {
        return Err(ReadingError::SystemMismatch {
            spread: spread.system.clone(),
            deck: system.id.clone(),
        });
    }

    let mut ids: Vec<&CardId> = cards.cards().map(|c| &c.id).collect();
    if ids.len() < spread.card_count() {
        return Err(ReadingError::DeckTooSmall {
            needed: spread.card_count(),
            available: ids.len(),
        });
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    ids.shuffle(&mut rng);
    let reversals = config.allow_reversals && system.reversals;

    let drawn: Vec<DrawnCard> = spread
        .positions()
        .iter()
        .zip(ids)
        .enumerate()
        .map(|(sequence, (pos, id))| DrawnCard {
            card: id.clone(),
            position: pos.name.clone(),
            orientation: if reversals && rng.random_bool(0.5) {
                Orientation::Reversed
            } else {
                Orientation::Upright
            },
            sequence,
        })
        .collect();
    debug!(spread = %spread.id, seed = ?config.seed, cards = drawn.len(), "cards drawn");
    Ok(drawn)
}
