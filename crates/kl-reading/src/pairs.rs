//! Pair selection from adjacency metadata.

use kl_core::{Adjacency, CardDocument, Spread};

/// Why two positions are paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotKind {
    /// Consecutive positions of one line.
    Line(u32),
    /// A house near the anchor at this position index.
    Anchor(usize),
}

/// Two position indices in reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PairSlot {
    pub first: usize,
    pub second: usize,
    pub kind: SlotKind,
}

/// Select the combination-bearing pairs of `spread`.
///
/// `placed[i]` is the card lying on position `i`. Line pairs come first, in
/// position order; anchor pairs follow, grouped by anchor. Nothing is
/// deduplicated: two neighbouring anchors each pair with the other.
pub(crate) fn select_pairs(spread: &Spread, placed: &[&CardDocument]) -> Vec<PairSlot> {
    let positions = spread.positions();
    let mut pairs = Vec::new();

    for (i, pos) in positions.iter().enumerate() {
        let Adjacency::Line { line, .. } = pos.adjacency else {
            continue;
        };
        let next = positions[i + 1..]
            .iter()
            .position(|p| matches!(p.adjacency, Adjacency::Line { line: l, .. } if l == line));
        if let Some(offset) = next {
            pairs.push(PairSlot {
                first: i,
                second: i + 1 + offset,
                kind: SlotKind::Line(line),
            });
        }
    }

    for (a, pos) in positions.iter().enumerate() {
        let Adjacency::House {
            row, column, anchor, ..
        } = pos.adjacency
        else {
            continue;
        };
        let holds_anchor_card = placed
            .get(a)
            .is_some_and(|card| spread.anchor_cards.contains(&card.id));
        if !anchor && !holds_anchor_card {
            continue;
        }
        for (b, other) in positions.iter().enumerate() {
            let Adjacency::House {
                row: r, column: c, ..
            } = other.adjacency
            else {
                continue;
            };
            if a == b {
                continue;
            }
            if row.abs_diff(r).max(column.abs_diff(c)) <= spread.proximity {
                pairs.push(PairSlot {
                    first: a.min(b),
                    second: a.max(b),
                    kind: SlotKind::Anchor(a),
                });
            }
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{line_spread, sample_deck, tableau_spread};
    use kl_core::CardId;

    fn place<'d>(deck: &'d kl_core::Deck, ids: &[&str]) -> Vec<&'d CardDocument> {
        ids.iter()
            .map(|id| deck.card(&CardId::new(*id)).unwrap())
            .collect()
    }

    #[test]
    fn line_pairs_are_consecutive() {
        let deck = sample_deck();
        let spread = line_spread(&deck);
        let placed = place(&deck, &["rider", "clover", "man"]);
        let pairs = select_pairs(&spread, &placed);
        let idx: Vec<_> = pairs.iter().map(|p| (p.first, p.second)).collect();
        assert_eq!(idx, vec![(0, 1), (1, 2)]);
        assert!(pairs.iter().all(|p| p.kind == SlotKind::Line(0)));
    }

    #[test]
    fn flagged_house_pairs_with_neighbours() {
        let deck = sample_deck();
        let spread = tableau_spread(&deck);
        // no anchor card on the table; only flagged house h5 (index 4) anchors
        let placed = place(&deck, &["rider", "clover", "coffin", "dog", "rider", "clover"]);
        let pairs = select_pairs(&spread, &placed);
        assert_eq!(pairs.len(), 5);
        assert!(pairs.iter().all(|p| p.kind == SlotKind::Anchor(4)));
        assert!(pairs.contains(&PairSlot {
            first: 4,
            second: 5,
            kind: SlotKind::Anchor(4)
        }));
        assert!(pairs.contains(&PairSlot {
            first: 0,
            second: 4,
            kind: SlotKind::Anchor(4)
        }));
    }

    #[test]
    fn anchor_card_makes_its_house_an_anchor() {
        let deck = sample_deck();
        let spread = tableau_spread(&deck);
        // man on h1 (row 0, col 0): neighbours h2, h4, h5
        let placed = place(&deck, &["man", "clover", "coffin", "dog", "rider", "clover"]);
        let pairs = select_pairs(&spread, &placed);
        let from_man: Vec<_> = pairs
            .iter()
            .filter(|p| p.kind == SlotKind::Anchor(0))
            .map(|p| p.second)
            .collect();
        assert_eq!(from_man, vec![1, 3, 4]);
        // the h1/h5 pair appears once per anchor
        let h1_h5 = pairs.iter().filter(|p| (p.first, p.second) == (0, 4)).count();
        assert_eq!(h1_h5, 2);
    }
}
