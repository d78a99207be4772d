//! Rows from the `decks` table.

use deckstore_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `decks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Deck {
    pub id: DbId,
    /// Opaque public identifier handed to callers.
    pub token: String,
    /// Head of the deck list, `None` once every card is drawn.
    pub top_card_id: Option<DbId>,
    pub shuffled: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
