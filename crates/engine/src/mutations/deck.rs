//! Deck-list protocols: create, draw, shuffle, return and delete.

use deckstore_core::error::CoreError;
use deckstore_core::{ledger, linked_list};
use deckstore_db::repositories::{DeckCardRepo, DeckEntryRepo, DeckRepo};
use sqlx::PgPool;

use super::{codes_of, deck_list, lock_deck, relink_deck, settle};
use crate::error::EngineResult;
use crate::outcome::{DrawOutcome, ReturnOutcome};

/// Insert a deck whose list reads `cards` top-first, plus its ledger.
/// `shuffled` only sets the deck's flag; the caller has already ordered
/// `cards`.
///
/// Returns `false` without writing anything if `token` is already taken.
pub(crate) async fn create(
    pool: &PgPool,
    token: &str,
    cards: &[String],
    shuffled: bool,
) -> EngineResult<bool> {
    let mut tx = pool.begin().await?;

    let Some(deck) = DeckRepo::insert(&mut tx, token).await? else {
        return Ok(false);
    };

    // Build bottom-up so each node can point at the one below it.
    let mut top = None;
    for code in cards.iter().rev() {
        top = Some(DeckCardRepo::insert(&mut tx, deck.id, code, top).await?);
    }
    if shuffled {
        DeckRepo::set_top_shuffled(&mut tx, deck.id, top).await?;
    } else {
        DeckRepo::set_top(&mut tx, deck.id, top).await?;
    }

    for (code, total) in ledger::tally(cards) {
        DeckEntryRepo::insert(&mut tx, deck.id, &code, total).await?;
    }

    tx.commit().await?;
    tracing::info!(deck_id = %token, cards = cards.len(), shuffled, "Deck created");
    Ok(true)
}

/// Pop up to `count` cards off the top of the deck.
pub(crate) async fn draw(pool: &PgPool, token: &str, count: i64) -> EngineResult<DrawOutcome> {
    if count < 1 {
        return Err(
            CoreError::OutOfRange(format!("draw count must be at least 1, got {count}")).into(),
        );
    }

    let mut tx = pool.begin().await?;
    let deck = lock_deck(&mut tx, token).await?;

    let mut top = deck.top_card_id;
    if top.is_none() {
        return Err(CoreError::DeckEmpty(token.to_string()).into());
    }

    let mut cards = Vec::new();
    while (cards.len() as i64) < count {
        let Some(id) = top else {
            break;
        };
        let node = DeckCardRepo::find(&mut tx, id).await?.ok_or_else(|| {
            CoreError::CorruptedList(format!("deck {token} points at missing card {id}"))
        })?;
        settle(&mut tx, deck.id, &node.code, -1, 0).await?;
        DeckCardRepo::delete(&mut tx, node.id).await?;
        top = node.next_id;
        cards.push(node.code);
    }
    DeckRepo::set_top(&mut tx, deck.id, top).await?;

    let remaining = DeckCardRepo::count(&mut tx, deck.id).await?;
    tx.commit().await?;

    tracing::debug!(
        deck_id = %token,
        requested = count,
        drawn = cards.len(),
        remaining,
        "Drew from deck",
    );
    Ok(DrawOutcome { cards, remaining })
}

/// Uniformly permute the deck list. Returns the new order, top first.
pub(crate) async fn shuffle(pool: &PgPool, token: &str) -> EngineResult<Vec<String>> {
    let mut tx = pool.begin().await?;
    let deck = lock_deck(&mut tx, token).await?;

    let mut order = deck_list(&mut tx, &deck).await?;
    if order.is_empty() {
        return Ok(Vec::new());
    }

    linked_list::shuffle(&mut order);
    relink_deck(&mut tx, deck.id, &order).await?;
    tx.commit().await?;

    tracing::debug!(deck_id = %token, cards = order.len(), "Shuffled deck");
    Ok(codes_of(order))
}

/// Put one drawn copy of `code` back on top of the deck.
pub(crate) async fn return_specific_drawn(
    pool: &PgPool,
    token: &str,
    code: &str,
) -> EngineResult<ReturnOutcome> {
    let mut tx = pool.begin().await?;
    let deck = lock_deck(&mut tx, token).await?;

    let entry = DeckEntryRepo::find(&mut tx, deck.id, code)
        .await?
        .ok_or_else(|| CoreError::CardNotInDeck {
            deck_id: token.to_string(),
            code: code.to_string(),
        })?;
    entry.counts().ensure_drawn(code, 1)?;

    settle(&mut tx, deck.id, code, 1, 0).await?;
    let id = DeckCardRepo::insert(&mut tx, deck.id, code, deck.top_card_id).await?;
    DeckRepo::set_top(&mut tx, deck.id, Some(id)).await?;

    let remaining = DeckCardRepo::count(&mut tx, deck.id).await?;
    tx.commit().await?;

    tracing::debug!(deck_id = %token, code, remaining, "Returned drawn card");
    Ok(ReturnOutcome {
        returned: 1,
        remaining,
    })
}

/// Put every drawn copy back on top of the deck, in ledger order.
pub(crate) async fn return_all_drawn(pool: &PgPool, token: &str) -> EngineResult<ReturnOutcome> {
    let mut tx = pool.begin().await?;
    let deck = lock_deck(&mut tx, token).await?;

    let entries = DeckEntryRepo::list(&mut tx, deck.id).await?;
    let drawn: Vec<&str> = entries
        .iter()
        .flat_map(|e| std::iter::repeat(e.code.as_str()).take(e.counts().drawn().max(0) as usize))
        .collect();

    // Push in reverse so the first ledger entry ends up on top.
    let mut top = deck.top_card_id;
    for code in drawn.iter().rev() {
        top = Some(DeckCardRepo::insert(&mut tx, deck.id, code, top).await?);
    }
    DeckRepo::set_top(&mut tx, deck.id, top).await?;
    DeckEntryRepo::return_all_drawn(&mut tx, deck.id).await?;

    let remaining = DeckCardRepo::count(&mut tx, deck.id).await?;
    tx.commit().await?;

    tracing::debug!(
        deck_id = %token,
        returned = drawn.len(),
        remaining,
        "Returned all drawn cards",
    );
    Ok(ReturnOutcome {
        returned: drawn.len(),
        remaining,
    })
}

/// Delete a deck with its cards, piles and ledger.
pub(crate) async fn delete(pool: &PgPool, token: &str) -> EngineResult<()> {
    let mut tx = pool.begin().await?;
    let deck = lock_deck(&mut tx, token).await?;
    DeckRepo::delete(&mut tx, deck.id).await?;
    tx.commit().await?;

    tracing::info!(deck_id = %token, "Deck deleted");
    Ok(())
}
