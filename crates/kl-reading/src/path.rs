//! Path Resolver: a card plus a locator plus an orientation gives a fragment.
//!
//! The fallback chain for an absent branch is the card's core essence, then
//! the no-coverage placeholder. Resolution never fails.

use kl_core::locator::Walk;
use kl_core::system::GENERAL_CATEGORY;
use kl_core::{CardDocument, Locator, Orientation};
use tracing::debug;

use crate::fragment::{Fragment, NO_COVERAGE_TEXT, Provenance};

/// Resolve the position interpretation of `card` at `locator`.
pub fn resolve(card: &CardDocument, locator: &Locator, orientation: Orientation) -> Fragment {
    let missing = match locator.walk(&card.meanings) {
        Walk::Found(leaf) => match leaf.authored_text(orientation) {
            Some(text) => {
                return Fragment {
                    text: text.to_string(),
                    keywords: leaf.keywords().to_vec(),
                    provenance: Provenance::Authored {
                        locator: locator.to_string(),
                    },
                };
            }
            // blank or placeholder text counts as an absent leaf
            None => locator.to_string(),
        },
        Walk::Missing { missing } => missing,
        Walk::Malformed { at } => at,
    };

    match card.essence(orientation) {
        Some(essence) => {
            debug!(card = %card.id, %locator, %missing, "branch absent, using essence");
            Fragment {
                text: essence.to_string(),
                keywords: card.core.keywords.clone(),
                provenance: Provenance::EssenceFallback { missing },
            }
        }
        None => {
            debug!(card = %card.id, %locator, %missing, "branch absent, no coverage");
            Fragment {
                text: NO_COVERAGE_TEXT.to_string(),
                keywords: card.core.keywords.clone(),
                provenance: Provenance::NoCoverage { missing },
            }
        }
    }
}

/// Resolve the topic-context fragment of `card` for `category`.
///
/// `None` when the category is `general` or the card has no context for it.
pub fn resolve_topic(
    card: &CardDocument,
    category: &str,
    orientation: Orientation,
) -> Option<Fragment> {
    if category == GENERAL_CATEGORY {
        return None;
    }
    let Some((leaf, text)) = card
        .topic_contexts
        .get(category)
        .and_then(|leaf| Some((leaf, leaf.authored_text(orientation)?)))
    else {
        debug!(card = %card.id, category, "no topic context");
        return None;
    };
    Some(Fragment {
        text: text.to_string(),
        keywords: leaf.keywords().to_vec(),
        provenance: Provenance::Topic {
            category: category.to_string(),
        },
    })
}
