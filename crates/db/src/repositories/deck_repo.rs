//! Repository for the `decks` table.

use deckstore_core::types::DbId;
use sqlx::PgConnection;

use crate::models::deck::Deck;

/// Column list for `decks` queries.
const COLUMNS: &str = "id, token, top_card_id, shuffled, created_at, updated_at";

pub struct DeckRepo;

impl DeckRepo {
    /// Insert a deck with an empty list.
    ///
    /// Returns `None` when the token is already taken.
    pub async fn insert(conn: &mut PgConnection, token: &str) -> Result<Option<Deck>, sqlx::Error> {
        let query = format!(
            "INSERT INTO decks (token) VALUES ($1) \
             ON CONFLICT ON CONSTRAINT uq_decks_token DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Deck>(&query)
            .bind(token)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Look a deck up by its public token.
    pub async fn find_by_token(
        conn: &mut PgConnection,
        token: &str,
    ) -> Result<Option<Deck>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM decks WHERE token = $1");
        sqlx::query_as::<_, Deck>(&query)
            .bind(token)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Same as [`find_by_token`](Self::find_by_token) but row-locks the deck
    /// until the surrounding transaction ends.
    pub async fn find_by_token_for_update(
        conn: &mut PgConnection,
        token: &str,
    ) -> Result<Option<Deck>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM decks WHERE token = $1 FOR UPDATE");
        sqlx::query_as::<_, Deck>(&query)
            .bind(token)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Move the head pointer.
    pub async fn set_top(
        conn: &mut PgConnection,
        deck_id: DbId,
        top_card_id: Option<DbId>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE decks SET top_card_id = $2 WHERE id = $1")
            .bind(deck_id)
            .bind(top_card_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Move the head pointer and record that the deck has been shuffled.
    pub async fn set_top_shuffled(
        conn: &mut PgConnection,
        deck_id: DbId,
        top_card_id: Option<DbId>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE decks SET top_card_id = $2, shuffled = TRUE WHERE id = $1")
            .bind(deck_id)
            .bind(top_card_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Delete a deck. Cards, piles and ledger rows cascade.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(conn: &mut PgConnection, deck_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM decks WHERE id = $1")
            .bind(deck_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
