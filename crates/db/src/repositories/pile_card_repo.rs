//! Repository for the `pile_cards` table: the nodes of each pile list.

use deckstore_core::types::DbId;
use sqlx::PgConnection;

use crate::models::card_node::CardNode;

const COLUMNS: &str = "id, code, next_id";

pub struct PileCardRepo;

impl PileCardRepo {
    /// Insert one node pointing at `next_id`, returning its id.
    pub async fn insert(
        conn: &mut PgConnection,
        pile_id: DbId,
        code: &str,
        next_id: Option<DbId>,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO pile_cards (pile_id, code, next_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(pile_id)
        .bind(code)
        .bind(next_id)
        .fetch_one(&mut *conn)
        .await
    }

    /// Every node of a pile, in insertion order (not list order).
    pub async fn list_nodes(
        conn: &mut PgConnection,
        pile_id: DbId,
    ) -> Result<Vec<CardNode>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pile_cards WHERE pile_id = $1 ORDER BY id");
        sqlx::query_as::<_, CardNode>(&query)
            .bind(pile_id)
            .fetch_all(&mut *conn)
            .await
    }

    pub async fn set_next(
        conn: &mut PgConnection,
        id: DbId,
        next_id: Option<DbId>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE pile_cards SET next_id = $2 WHERE id = $1")
            .bind(id)
            .bind(next_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM pile_cards WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Remove every node of a pile. Returns the number removed.
    pub async fn delete_all(conn: &mut PgConnection, pile_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM pile_cards WHERE pile_id = $1")
            .bind(pile_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count(conn: &mut PgConnection, pile_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pile_cards WHERE pile_id = $1")
            .bind(pile_id)
            .fetch_one(&mut *conn)
            .await
    }

    /// Per-code node counts summed over every pile of a deck.
    pub async fn count_by_code_for_deck(
        conn: &mut PgConnection,
        deck_id: DbId,
    ) -> Result<Vec<(String, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (String, i64)>(
            "SELECT pc.code, COUNT(*) \
             FROM pile_cards pc \
             JOIN piles p ON p.id = pc.pile_id \
             WHERE p.deck_id = $1 \
             GROUP BY pc.code \
             ORDER BY pc.code",
        )
        .bind(deck_id)
        .fetch_all(&mut *conn)
        .await
    }
}
