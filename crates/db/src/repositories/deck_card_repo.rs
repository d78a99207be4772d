//! Repository for the `deck_cards` table: the nodes of each deck list.

use deckstore_core::types::DbId;
use sqlx::PgConnection;

use crate::models::card_node::CardNode;

const COLUMNS: &str = "id, code, next_id";

pub struct DeckCardRepo;

impl DeckCardRepo {
    /// Insert one node pointing at `next_id`, returning its id.
    pub async fn insert(
        conn: &mut PgConnection,
        deck_id: DbId,
        code: &str,
        next_id: Option<DbId>,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO deck_cards (deck_id, code, next_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(deck_id)
        .bind(code)
        .bind(next_id)
        .fetch_one(&mut *conn)
        .await
    }

    /// Fetch a single node.
    pub async fn find(conn: &mut PgConnection, id: DbId) -> Result<Option<CardNode>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM deck_cards WHERE id = $1");
        sqlx::query_as::<_, CardNode>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Every node of a deck, in insertion order (not list order).
    pub async fn list_nodes(
        conn: &mut PgConnection,
        deck_id: DbId,
    ) -> Result<Vec<CardNode>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM deck_cards WHERE deck_id = $1 ORDER BY id");
        sqlx::query_as::<_, CardNode>(&query)
            .bind(deck_id)
            .fetch_all(&mut *conn)
            .await
    }

    pub async fn set_next(
        conn: &mut PgConnection,
        id: DbId,
        next_id: Option<DbId>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE deck_cards SET next_id = $2 WHERE id = $1")
            .bind(id)
            .bind(next_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM deck_cards WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Number of undrawn cards in a deck.
    pub async fn count(conn: &mut PgConnection, deck_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM deck_cards WHERE deck_id = $1")
            .bind(deck_id)
            .fetch_one(&mut *conn)
            .await
    }

    /// Per-code node counts for a deck list.
    pub async fn count_by_code(
        conn: &mut PgConnection,
        deck_id: DbId,
    ) -> Result<Vec<(String, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (String, i64)>(
            "SELECT code, COUNT(*) FROM deck_cards WHERE deck_id = $1 GROUP BY code ORDER BY code",
        )
        .bind(deck_id)
        .fetch_all(&mut *conn)
        .await
    }
}
