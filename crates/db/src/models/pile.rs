//! Rows from the `piles` table.

use deckstore_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `piles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Pile {
    pub id: DbId,
    pub deck_id: DbId,
    pub name: String,
    pub top_card_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Pile name with its current card count.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PileCount {
    pub name: String,
    pub remaining: i64,
}
