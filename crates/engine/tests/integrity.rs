//! Integration tests for damaged lists and ledgers.
//!
//! Rows are broken with raw SQL behind the store's back; every read or
//! mutation that walks the damaged list must report a corrupted list
//! instead of looping or guessing.

use assert_matches::assert_matches;
use deckstore_core::draw_method::DrawMethod;
use deckstore_core::error::{CoreError, ErrorKind};
use deckstore_engine::{DeckStore, EngineError};
use sqlx::PgPool;

fn store(pool: PgPool) -> DeckStore {
    DeckStore::new(pool, 2, 16).unwrap()
}

/// A deck holding `JH` with `AS`, `KC`, `QD` on the "discard" pile,
/// top first `QD -> KC -> AS`.
async fn deck_with_pile(store: &DeckStore) -> String {
    let deck_id = store.create_deck(&["AS", "KC", "QD", "JH"]).await.unwrap();
    store.draw(&deck_id, 3).await.unwrap();
    store
        .insert_into_pile(&deck_id, "discard", &["AS", "KC", "QD"])
        .await
        .unwrap();

    let report = store.verify_integrity(&deck_id).await.unwrap();
    assert_eq!(report.deck_cards, 1);
    assert_eq!(report.pile_cards["discard"], 3);
    deck_id
}

async fn pile_card_id(pool: &PgPool, code: &str) -> i64 {
    sqlx::query_scalar("SELECT id FROM pile_cards WHERE code = $1")
        .bind(code)
        .fetch_one(pool)
        .await
        .unwrap()
}

fn assert_corrupted(err: EngineError) {
    assert_eq!(err.kind(), ErrorKind::StorageFailure, "{err}");
    assert_matches!(err, EngineError::Core(CoreError::CorruptedList(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_pile_cycle_is_reported(pool: PgPool) {
    let store = store(pool.clone());
    let deck_id = deck_with_pile(&store).await;

    // Close the loop: the tail now points back at the head.
    let head = pile_card_id(&pool, "QD").await;
    let tail = pile_card_id(&pool, "AS").await;
    sqlx::query("UPDATE pile_cards SET next_id = $1 WHERE id = $2")
        .bind(head)
        .bind(tail)
        .execute(&pool)
        .await
        .unwrap();

    assert_corrupted(store.get_pile_cards(&deck_id, "discard").await.unwrap_err());
    assert_corrupted(
        store
            .draw_from_pile(&deck_id, "discard", DrawMethod::Bottom)
            .await
            .unwrap_err(),
    );
    assert_corrupted(store.verify_integrity(&deck_id).await.unwrap_err());

    // The failed draw rolled back.
    let ledger = store.ledger(&deck_id).await.unwrap();
    assert!(ledger.iter().filter(|e| e.code != "JH").all(|e| e.in_pile == 1));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_stored_pile_head_must_match_structure(pool: PgPool) {
    let store = store(pool.clone());
    let deck_id = deck_with_pile(&store).await;

    let middle = pile_card_id(&pool, "KC").await;
    sqlx::query("UPDATE piles SET top_card_id = $1 WHERE name = 'discard'")
        .bind(middle)
        .execute(&pool)
        .await
        .unwrap();

    assert_corrupted(store.get_pile_cards(&deck_id, "discard").await.unwrap_err());
    assert_matches!(
        store.verify_integrity(&deck_id).await,
        Err(EngineError::Core(CoreError::CorruptedList(msg))) if msg.contains("stores head")
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_ledger_disagreeing_with_pile_is_reported(pool: PgPool) {
    let store = store(pool.clone());
    let deck_id = deck_with_pile(&store).await;

    // Still within the conservation bounds, just wrong.
    sqlx::query("UPDATE deck_entries SET in_pile = 0 WHERE code = 'AS'")
        .execute(&pool)
        .await
        .unwrap();

    // The lists themselves are intact.
    assert_eq!(
        store.get_pile_cards(&deck_id, "discard").await.unwrap(),
        ["QD", "KC", "AS"]
    );
    assert_matches!(
        store.verify_integrity(&deck_id).await,
        Err(EngineError::Core(CoreError::CorruptedList(msg))) if msg.contains("ledger for AS")
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_orphaned_deck_card_is_reported(pool: PgPool) {
    let store = store(pool.clone());
    let deck_id = deck_with_pile(&store).await;

    sqlx::query("INSERT INTO deck_cards (deck_id, code) SELECT id, 'AS' FROM decks")
        .execute(&pool)
        .await
        .unwrap();

    assert_corrupted(store.get_deck_cards(&deck_id).await.unwrap_err());
    assert_corrupted(store.shuffle_deck(&deck_id).await.unwrap_err());
    assert_corrupted(store.verify_integrity(&deck_id).await.unwrap_err());
}
