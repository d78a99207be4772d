//! Integration tests for the repository layer.
//!
//! Exercises every repository primitive against a real database:
//! - Deck insert, token collisions and head moves
//! - Deck list node insert, relink and delete
//! - Pile creation, head moves and counts
//! - Guarded ledger adjustments

use deckstore_core::ledger;
use deckstore_core::linked_list::{self, Node};
use deckstore_db::repositories::{DeckCardRepo, DeckEntryRepo, DeckRepo, PileCardRepo, PileRepo};
use sqlx::PgPool;

/// Build a deck whose list is `codes`, head first. Returns the deck id.
async fn seed_deck(pool: &PgPool, token: &str, codes: &[&str]) -> i64 {
    let mut conn = pool.acquire().await.unwrap();
    let deck = DeckRepo::insert(&mut conn, token).await.unwrap().unwrap();

    let mut next = None;
    for code in codes.iter().rev() {
        next = Some(DeckCardRepo::insert(&mut conn, deck.id, code, next).await.unwrap());
    }
    DeckRepo::set_top(&mut conn, deck.id, next).await.unwrap();
    let owned: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
    for (code, total) in ledger::tally(&owned) {
        DeckEntryRepo::insert(&mut conn, deck.id, &code, total).await.unwrap();
    }
    deck.id
}

async fn deck_order(pool: &PgPool, token: &str) -> Vec<String> {
    let mut conn = pool.acquire().await.unwrap();
    let deck = DeckRepo::find_by_token(&mut conn, token).await.unwrap().unwrap();
    let nodes: Vec<Node> = DeckCardRepo::list_nodes(&mut conn, deck.id)
        .await
        .unwrap()
        .into_iter()
        .map(Node::from)
        .collect();
    linked_list::walk(deck.top_card_id, &nodes)
        .unwrap()
        .into_iter()
        .map(|n| n.code.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Decks
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deck_insert_rejects_duplicate_token(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();

    let first = DeckRepo::insert(&mut conn, "AAAAAAAAAAAA").await.unwrap();
    assert!(first.is_some());
    assert!(!first.unwrap().shuffled);

    let second = DeckRepo::insert(&mut conn, "AAAAAAAAAAAA").await.unwrap();
    assert!(second.is_none(), "token collision must not insert");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deck_list_round_trips_in_order(pool: PgPool) {
    seed_deck(&pool, "AAAAAAAAAAAA", &["AS", "KC", "QD"]).await;
    assert_eq!(deck_order(&pool, "AAAAAAAAAAAA").await, ["AS", "KC", "QD"]);

    let mut conn = pool.acquire().await.unwrap();
    let deck = DeckRepo::find_by_token(&mut conn, "AAAAAAAAAAAA").await.unwrap().unwrap();
    assert_eq!(DeckCardRepo::count(&mut conn, deck.id).await.unwrap(), 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_pop_head_inside_transaction(pool: PgPool) {
    let deck_id = seed_deck(&pool, "AAAAAAAAAAAA", &["AS", "KC"]).await;

    let mut tx = pool.begin().await.unwrap();
    let deck = DeckRepo::find_by_token_for_update(&mut tx, "AAAAAAAAAAAA")
        .await
        .unwrap()
        .unwrap();
    let head = DeckCardRepo::find(&mut tx, deck.top_card_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(head.code, "AS");
    DeckRepo::set_top(&mut tx, deck_id, head.next_id).await.unwrap();
    DeckCardRepo::delete(&mut tx, head.id).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(deck_order(&pool, "AAAAAAAAAAAA").await, ["KC"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_relink_and_mark_shuffled(pool: PgPool) {
    let deck_id = seed_deck(&pool, "AAAAAAAAAAAA", &["AS", "KC", "QD"]).await;

    let mut tx = pool.begin().await.unwrap();
    let mut ids: Vec<i64> = DeckCardRepo::list_nodes(&mut tx, deck_id)
        .await
        .unwrap()
        .iter()
        .map(|n| n.id)
        .collect();
    ids.reverse();
    for (id, next) in linked_list::relink_plan(&ids) {
        DeckCardRepo::set_next(&mut tx, id, next).await.unwrap();
    }
    DeckRepo::set_top_shuffled(&mut tx, deck_id, ids.first().copied())
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let deck = DeckRepo::find_by_token(&mut conn, "AAAAAAAAAAAA").await.unwrap().unwrap();
    assert!(deck.shuffled);
    drop(conn);

    let mut order = deck_order(&pool, "AAAAAAAAAAAA").await;
    order.sort();
    assert_eq!(order, ["AS", "KC", "QD"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_deck(pool: PgPool) {
    let deck_id = seed_deck(&pool, "AAAAAAAAAAAA", &["AS", "KC"]).await;
    let mut conn = pool.acquire().await.unwrap();

    PileRepo::find_or_create(&mut conn, deck_id, "discard").await.unwrap();
    assert!(DeckRepo::delete(&mut conn, deck_id).await.unwrap());
    assert!(!DeckRepo::delete(&mut conn, deck_id).await.unwrap());
    assert!(DeckRepo::find_by_token(&mut conn, "AAAAAAAAAAAA")
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Piles
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_or_create_pile_is_idempotent(pool: PgPool) {
    let deck_id = seed_deck(&pool, "AAAAAAAAAAAA", &["AS"]).await;
    let mut conn = pool.acquire().await.unwrap();

    assert!(PileRepo::find(&mut conn, deck_id, "discard").await.unwrap().is_none());
    let first = PileRepo::find_or_create(&mut conn, deck_id, "discard").await.unwrap();
    let second = PileRepo::find_or_create(&mut conn, deck_id, "discard").await.unwrap();
    assert_eq!(first.id, second.id);
    assert!(first.top_card_id.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_pile_push_and_counts(pool: PgPool) {
    let deck_id = seed_deck(&pool, "AAAAAAAAAAAA", &["AS"]).await;
    let mut conn = pool.acquire().await.unwrap();

    let discard = PileRepo::find_or_create(&mut conn, deck_id, "discard").await.unwrap();
    PileRepo::find_or_create(&mut conn, deck_id, "empty").await.unwrap();

    let mut top = None;
    for code in ["2H", "3H"] {
        top = Some(PileCardRepo::insert(&mut conn, discard.id, code, top).await.unwrap());
    }
    PileRepo::set_top(&mut conn, discard.id, top).await.unwrap();

    let counts = PileRepo::list_counts(&mut conn, deck_id).await.unwrap();
    let pairs: Vec<(String, i64)> = counts.into_iter().map(|c| (c.name, c.remaining)).collect();
    assert_eq!(
        pairs,
        vec![("discard".to_string(), 2), ("empty".to_string(), 0)]
    );

    let by_code = PileCardRepo::count_by_code_for_deck(&mut conn, deck_id).await.unwrap();
    assert_eq!(by_code, vec![("2H".to_string(), 1), ("3H".to_string(), 1)]);

    let pile = PileRepo::find(&mut conn, deck_id, "discard").await.unwrap().unwrap();
    let nodes: Vec<Node> = PileCardRepo::list_nodes(&mut conn, pile.id)
        .await
        .unwrap()
        .into_iter()
        .map(Node::from)
        .collect();
    let order: Vec<&str> = linked_list::walk(pile.top_card_id, &nodes)
        .unwrap()
        .into_iter()
        .map(|n| n.code.as_str())
        .collect();
    assert_eq!(order, ["3H", "2H"]);
    assert_eq!(linked_list::structural_head(&nodes).unwrap(), pile.top_card_id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_pile_unlink_interior_node(pool: PgPool) {
    let deck_id = seed_deck(&pool, "AAAAAAAAAAAA", &["AS"]).await;
    let mut tx = pool.begin().await.unwrap();

    let pile = PileRepo::find_or_create(&mut tx, deck_id, "hand").await.unwrap();
    let bottom = PileCardRepo::insert(&mut tx, pile.id, "2H", None).await.unwrap();
    let middle = PileCardRepo::insert(&mut tx, pile.id, "3H", Some(bottom)).await.unwrap();
    let top = PileCardRepo::insert(&mut tx, pile.id, "4H", Some(middle)).await.unwrap();
    PileRepo::set_top(&mut tx, pile.id, Some(top)).await.unwrap();

    PileCardRepo::set_next(&mut tx, top, Some(bottom)).await.unwrap();
    PileCardRepo::delete(&mut tx, middle).await.unwrap();
    tx.commit().await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(PileCardRepo::count(&mut conn, pile.id).await.unwrap(), 2);
    assert_eq!(PileCardRepo::delete_all(&mut conn, pile.id).await.unwrap(), 2);
    assert_eq!(PileCardRepo::count(&mut conn, pile.id).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_ledger_adjust_is_guarded(pool: PgPool) {
    let deck_id = seed_deck(&pool, "AAAAAAAAAAAA", &["AS", "AS", "KC"]).await;
    let mut conn = pool.acquire().await.unwrap();

    let entry = DeckEntryRepo::find(&mut conn, deck_id, "AS").await.unwrap().unwrap();
    assert_eq!((entry.total, entry.in_deck, entry.in_pile), (2, 2, 0));

    // Draw one, then move it to a pile.
    assert!(DeckEntryRepo::adjust(&mut conn, deck_id, "AS", -1, 0).await.unwrap());
    assert!(DeckEntryRepo::adjust(&mut conn, deck_id, "AS", 0, 1).await.unwrap());

    // Nothing is drawn any more, so a second pile move must fail.
    assert!(!DeckEntryRepo::adjust(&mut conn, deck_id, "AS", 0, 1).await.unwrap());
    // Unknown codes match no row.
    assert!(!DeckEntryRepo::adjust(&mut conn, deck_id, "QD", -1, 0).await.unwrap());

    let entry = DeckEntryRepo::find(&mut conn, deck_id, "AS").await.unwrap().unwrap();
    assert_eq!(entry.counts().drawn(), 0);
    assert!(entry.counts().is_consistent());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_ledger_return_all_drawn(pool: PgPool) {
    let deck_id = seed_deck(&pool, "AAAAAAAAAAAA", &["AS", "KC"]).await;
    let mut conn = pool.acquire().await.unwrap();

    DeckEntryRepo::adjust(&mut conn, deck_id, "AS", -1, 0).await.unwrap();
    DeckEntryRepo::adjust(&mut conn, deck_id, "KC", -1, 1).await.unwrap();

    assert_eq!(DeckEntryRepo::return_all_drawn(&mut conn, deck_id).await.unwrap(), 1);

    let entries = DeckEntryRepo::list(&mut conn, deck_id).await.unwrap();
    let codes: Vec<&str> = entries.iter().map(|e| e.code.as_str()).collect();
    assert_eq!(codes, ["AS", "KC"]);
    assert_eq!(entries[0].in_deck, 1);
    assert_eq!((entries[1].in_deck, entries[1].in_pile), (0, 1));
}
