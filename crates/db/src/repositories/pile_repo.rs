//! Repository for the `piles` table.

use deckstore_core::types::DbId;
use sqlx::PgConnection;

use crate::models::pile::{Pile, PileCount};

/// Column list for `piles` queries.
const COLUMNS: &str = "id, deck_id, name, top_card_id, created_at, updated_at";

pub struct PileRepo;

impl PileRepo {
    pub async fn find(
        conn: &mut PgConnection,
        deck_id: DbId,
        name: &str,
    ) -> Result<Option<Pile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM piles WHERE deck_id = $1 AND name = $2");
        sqlx::query_as::<_, Pile>(&query)
            .bind(deck_id)
            .bind(name)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Return the named pile, creating an empty one if it does not exist.
    pub async fn find_or_create(
        conn: &mut PgConnection,
        deck_id: DbId,
        name: &str,
    ) -> Result<Pile, sqlx::Error> {
        let query = format!(
            "INSERT INTO piles (deck_id, name) VALUES ($1, $2) \
             ON CONFLICT ON CONSTRAINT uq_piles_deck_id_name \
             DO UPDATE SET name = EXCLUDED.name \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Pile>(&query)
            .bind(deck_id)
            .bind(name)
            .fetch_one(&mut *conn)
            .await
    }

    /// All piles of a deck, ordered by name.
    pub async fn list(conn: &mut PgConnection, deck_id: DbId) -> Result<Vec<Pile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM piles WHERE deck_id = $1 ORDER BY name");
        sqlx::query_as::<_, Pile>(&query)
            .bind(deck_id)
            .fetch_all(&mut *conn)
            .await
    }

    /// Card count per pile, including empty piles.
    pub async fn list_counts(
        conn: &mut PgConnection,
        deck_id: DbId,
    ) -> Result<Vec<PileCount>, sqlx::Error> {
        sqlx::query_as::<_, PileCount>(
            "SELECT p.name, COUNT(pc.id) AS remaining \
             FROM piles p \
             LEFT JOIN pile_cards pc ON pc.pile_id = p.id \
             WHERE p.deck_id = $1 \
             GROUP BY p.id, p.name \
             ORDER BY p.name",
        )
        .bind(deck_id)
        .fetch_all(&mut *conn)
        .await
    }

    /// Move the head pointer.
    pub async fn set_top(
        conn: &mut PgConnection,
        pile_id: DbId,
        top_card_id: Option<DbId>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE piles SET top_card_id = $2 WHERE id = $1")
            .bind(pile_id)
            .bind(top_card_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
