//! Rows from the `deck_entries` ledger.

use deckstore_core::ledger::Counts;
use deckstore_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `deck_entries` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeckEntry {
    pub id: DbId,
    pub deck_id: DbId,
    pub code: String,
    pub total: i32,
    pub in_deck: i32,
    pub in_pile: i32,
}

impl DeckEntry {
    pub fn counts(&self) -> Counts {
        Counts {
            total: self.total,
            in_deck: self.in_deck,
            in_pile: self.in_pile,
        }
    }
}
