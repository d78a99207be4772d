//! Repository for the `deck_entries` ledger.
//!
//! Counter updates are guarded in SQL so a stale caller can never push a
//! row outside `0 <= in_deck, 0 <= in_pile, in_deck + in_pile <= total`;
//! a guarded update that matches no row reports `false` instead.

use deckstore_core::types::DbId;
use sqlx::PgConnection;

use crate::models::deck_entry::DeckEntry;

const COLUMNS: &str = "id, deck_id, code, total, in_deck, in_pile";

pub struct DeckEntryRepo;

impl DeckEntryRepo {
    /// Record `total` copies of `code`, all in the deck.
    pub async fn insert(
        conn: &mut PgConnection,
        deck_id: DbId,
        code: &str,
        total: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO deck_entries (deck_id, code, total, in_deck, in_pile) \
             VALUES ($1, $2, $3, $3, 0)",
        )
        .bind(deck_id)
        .bind(code)
        .bind(total)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn find(
        conn: &mut PgConnection,
        deck_id: DbId,
        code: &str,
    ) -> Result<Option<DeckEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM deck_entries WHERE deck_id = $1 AND code = $2");
        sqlx::query_as::<_, DeckEntry>(&query)
            .bind(deck_id)
            .bind(code)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Every ledger row of a deck, in creation order.
    pub async fn list(
        conn: &mut PgConnection,
        deck_id: DbId,
    ) -> Result<Vec<DeckEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM deck_entries WHERE deck_id = $1 ORDER BY id");
        sqlx::query_as::<_, DeckEntry>(&query)
            .bind(deck_id)
            .fetch_all(&mut *conn)
            .await
    }

    /// Shift `in_deck` and `in_pile` by the given deltas.
    ///
    /// Returns `false` (and changes nothing) when the row is missing or the
    /// result would break the ledger bounds.
    pub async fn adjust(
        conn: &mut PgConnection,
        deck_id: DbId,
        code: &str,
        in_deck_delta: i32,
        in_pile_delta: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE deck_entries \
             SET in_deck = in_deck + $3, in_pile = in_pile + $4 \
             WHERE deck_id = $1 AND code = $2 \
               AND in_deck + $3 >= 0 \
               AND in_pile + $4 >= 0 \
               AND in_deck + $3 + in_pile + $4 <= total",
        )
        .bind(deck_id)
        .bind(code)
        .bind(in_deck_delta)
        .bind(in_pile_delta)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count every drawn copy back into the deck.
    pub async fn return_all_drawn(
        conn: &mut PgConnection,
        deck_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE deck_entries SET in_deck = total - in_pile \
             WHERE deck_id = $1 AND in_deck <> total - in_pile",
        )
        .bind(deck_id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }
}
