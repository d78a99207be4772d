//! Plain-value results returned by [`DeckStore`](crate::DeckStore).

use std::collections::BTreeMap;

use serde::Serialize;

/// Cards taken from the top of a deck or pile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawOutcome {
    /// Codes in the order they were drawn.
    pub cards: Vec<String>,
    /// Cards left in the list drawn from.
    pub remaining: i64,
}

impl DrawOutcome {
    /// Whether the list ran out before `requested` cards were drawn.
    pub fn is_partial(&self, requested: i64) -> bool {
        (self.cards.len() as i64) < requested
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PileInsertOutcome {
    pub pile_remaining: i64,
    pub deck_remaining: i64,
}

/// Result of moving cards back onto a deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReturnOutcome {
    pub returned: usize,
    /// Deck size after the return.
    pub remaining: i64,
}

/// Summary of a deck and its piles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeckInfo {
    pub deck_id: String,
    pub remaining: i64,
    pub shuffled: bool,
    pub piles: BTreeMap<String, i64>,
}

/// One ledger row as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub code: String,
    pub total: i32,
    pub in_deck: i32,
    pub in_pile: i32,
    pub drawn: i32,
}

/// What [`verify_integrity`](crate::DeckStore::verify_integrity) checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub deck_cards: usize,
    pub pile_cards: BTreeMap<String, usize>,
    pub ledger_codes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_draw_is_partial() {
        let outcome = DrawOutcome {
            cards: vec!["AS".into(), "KC".into()],
            remaining: 0,
        };
        assert!(outcome.is_partial(3));
        assert!(!outcome.is_partial(2));
    }
}
