//! Per-code accounting for a deck.
//!
//! Every copy of a code is in exactly one of three places: the deck list,
//! some pile list, or drawn (held by the caller, no row of its own). The
//! ledger is the authority on which moves are legal; the lists follow it.

use serde::Serialize;

use crate::error::CoreError;

/// Counters for one `(deck, code)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub total: i32,
    pub in_deck: i32,
    pub in_pile: i32,
}

impl Counts {
    /// Copies held outside the store.
    pub fn drawn(&self) -> i32 {
        self.total - self.in_deck - self.in_pile
    }

    /// `0 <= in_deck`, `0 <= in_pile`, `in_deck + in_pile <= total`.
    pub fn is_consistent(&self) -> bool {
        self.in_deck >= 0 && self.in_pile >= 0 && self.drawn() >= 0
    }

    /// Check that `n` drawn copies of `code` may move into a pile.
    pub fn ensure_drawn(&self, code: &str, n: i32) -> Result<(), CoreError> {
        if self.drawn() < n {
            return Err(CoreError::CardNotDrawn {
                code: code.to_string(),
                total: self.total,
                in_deck: self.in_deck,
                in_pile: self.in_pile,
            });
        }
        Ok(())
    }
}

/// Count occurrences of each code, keeping first-seen order.
pub fn tally<'a, I>(codes: I) -> Vec<(String, i32)>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut out: Vec<(String, i32)> = Vec::new();
    for code in codes {
        match out.iter_mut().find(|(c, _)| c == code) {
            Some((_, n)) => *n += 1,
            None => out.push((code.clone(), 1)),
        }
    }
    out
}
