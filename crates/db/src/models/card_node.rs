//! List nodes shared by `deck_cards` and `pile_cards`.

use deckstore_core::linked_list::Node;
use deckstore_core::types::DbId;
use sqlx::FromRow;

/// One node of a deck or pile list.
#[derive(Debug, Clone, FromRow)]
pub struct CardNode {
    pub id: DbId,
    pub code: String,
    pub next_id: Option<DbId>,
}

impl From<CardNode> for Node {
    fn from(row: CardNode) -> Self {
        Node {
            id: row.id,
            code: row.code,
            next_id: row.next_id,
        }
    }
}
