use sqlx::PgPool;

/// Full bootstrap test: connect, migrate, verify schema.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    deckstore_db::health_check(&pool).await.unwrap();

    let tables = ["decks", "deck_cards", "piles", "pile_cards", "deck_entries"];
    for table in tables {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}

async fn insert_deck(pool: &PgPool) -> i64 {
    sqlx::query_scalar("INSERT INTO decks (token) VALUES ('abcdefghijkl') RETURNING id")
        .fetch_one(pool)
        .await
        .unwrap()
}

/// The conservation CHECK rejects an over-committed ledger row.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_ledger_check_constraint(pool: PgPool) {
    let deck_id = insert_deck(&pool).await;

    let result = sqlx::query(
        "INSERT INTO deck_entries (deck_id, code, total, in_deck, in_pile) \
         VALUES ($1, 'AS', 1, 1, 1)",
    )
    .bind(deck_id)
    .execute(&pool)
    .await;

    let err = result.unwrap_err();
    let db_err = err.as_database_error().expect("expected a database error");
    assert_eq!(db_err.constraint(), Some("ck_deck_entries_conservation"));
}

/// Two nodes may briefly share a successor inside a transaction, but not
/// after commit.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_next_id_uniqueness_is_deferred(pool: PgPool) {
    let deck_id = insert_deck(&pool).await;

    let mut tx = pool.begin().await.unwrap();
    let tail: i64 =
        sqlx::query_scalar("INSERT INTO deck_cards (deck_id, code) VALUES ($1, 'KC') RETURNING id")
            .bind(deck_id)
            .fetch_one(&mut *tx)
            .await
            .unwrap();
    for code in ["AS", "QD"] {
        sqlx::query("INSERT INTO deck_cards (deck_id, code, next_id) VALUES ($1, $2, $3)")
            .bind(deck_id)
            .bind(code)
            .bind(tail)
            .execute(&mut *tx)
            .await
            .unwrap();
    }

    let err = tx.commit().await.unwrap_err();
    let db_err = err.as_database_error().expect("expected a database error");
    assert_eq!(db_err.constraint(), Some("uq_deck_cards_next_id"));
}

/// Deleting a deck removes everything hanging off it.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deck_delete_cascades(pool: PgPool) {
    let deck_id = insert_deck(&pool).await;
    sqlx::query("INSERT INTO deck_cards (deck_id, code) VALUES ($1, 'AS')")
        .bind(deck_id)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO piles (deck_id, name) VALUES ($1, 'discard')")
        .bind(deck_id)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO deck_entries (deck_id, code, total, in_deck) VALUES ($1, 'AS', 1, 1)")
        .bind(deck_id)
        .execute(&pool)
        .await
        .unwrap();

    sqlx::query("DELETE FROM decks WHERE id = $1")
        .bind(deck_id)
        .execute(&pool)
        .await
        .unwrap();

    for table in ["deck_cards", "piles", "deck_entries"] {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 0, "{table} rows should cascade");
    }
}
