//! Pile-list protocols.
//!
//! Piles only ever hold cards that were drawn first, so every move into a
//! pile is checked against the ledger's drawn count. Moves out of a pile
//! unlink the node, fix the predecessor (or the stored head) and shift the
//! ledger in the same transaction.

use std::collections::{BTreeMap, HashMap};

use deckstore_core::draw_method::DrawMethod;
use deckstore_core::error::CoreError;
use deckstore_core::ledger;
use deckstore_core::linked_list::{self, Node};
use deckstore_core::types::DbId;
use deckstore_db::models::pile::Pile;
use deckstore_db::repositories::{DeckCardRepo, DeckEntryRepo, DeckRepo, PileCardRepo, PileRepo};
use rand::Rng;
use sqlx::{PgConnection, PgPool};

use super::{codes_of, find_pile, lock_deck, pile_list, relink_pile, settle};
use crate::error::EngineResult;
use crate::outcome::{DrawOutcome, PileInsertOutcome, ReturnOutcome};

/// Move drawn cards onto a pile, creating it if needed.
///
/// Codes are pushed in order, so the last one ends up on top. Either every
/// code is inserted or none is.
pub(crate) async fn insert(
    pool: &PgPool,
    token: &str,
    name: &str,
    codes: &[String],
) -> EngineResult<PileInsertOutcome> {
    let mut tx = pool.begin().await?;
    let deck = lock_deck(&mut tx, token).await?;

    for code in codes {
        let entry = DeckEntryRepo::find(&mut tx, deck.id, code)
            .await?
            .ok_or_else(|| CoreError::CardNotInDeck {
                deck_id: token.to_string(),
                code: code.clone(),
            })?;
        entry.counts().ensure_drawn(code, 1)?;
    }
    for code in codes {
        settle(&mut tx, deck.id, code, 0, 1).await?;
    }

    let pile = PileRepo::find_or_create(&mut tx, deck.id, name).await?;
    let mut top = pile.top_card_id;
    for code in codes {
        top = Some(PileCardRepo::insert(&mut tx, pile.id, code, top).await?);
    }
    PileRepo::set_top(&mut tx, pile.id, top).await?;

    let pile_remaining = PileCardRepo::count(&mut tx, pile.id).await?;
    let deck_remaining = DeckCardRepo::count(&mut tx, deck.id).await?;
    tx.commit().await?;

    tracing::debug!(
        deck_id = %token,
        pile = %name,
        inserted = codes.len(),
        pile_remaining,
        "Inserted cards into pile",
    );
    Ok(PileInsertOutcome {
        pile_remaining,
        deck_remaining,
    })
}

/// Take up to `count` cards off a pile using `method`.
pub(crate) async fn draw(
    pool: &PgPool,
    token: &str,
    name: &str,
    method: DrawMethod,
    count: i64,
) -> EngineResult<DrawOutcome> {
    if count < 1 {
        return Err(
            CoreError::OutOfRange(format!("draw count must be at least 1, got {count}")).into(),
        );
    }

    let mut tx = pool.begin().await?;
    let deck = lock_deck(&mut tx, token).await?;
    let pile = find_pile(&mut tx, &deck, name).await?;

    let mut list = pile_list(&mut tx, &pile).await?;
    if list.is_empty() {
        return Err(CoreError::PileEmpty(name.to_string()).into());
    }

    let mut cards = Vec::new();
    while (cards.len() as i64) < count && !list.is_empty() {
        let index = pick_index(method, list.len());
        let node = unlink(&mut tx, &pile, &mut list, index).await?;
        settle(&mut tx, deck.id, &node.code, 0, -1).await?;
        cards.push(node.code);
    }
    tx.commit().await?;

    let remaining = list.len() as i64;
    tracing::debug!(
        deck_id = %token,
        pile = %name,
        %method,
        drawn = cards.len(),
        remaining,
        "Drew from pile",
    );
    Ok(DrawOutcome { cards, remaining })
}

/// Take the topmost copy of `code` off a pile.
pub(crate) async fn draw_specific(
    pool: &PgPool,
    token: &str,
    name: &str,
    code: &str,
) -> EngineResult<String> {
    let mut tx = pool.begin().await?;
    let deck = lock_deck(&mut tx, token).await?;
    let pile = find_pile(&mut tx, &deck, name).await?;

    let mut list = pile_list(&mut tx, &pile).await?;
    let index = position_of(&list, name, code)?;
    let node = unlink(&mut tx, &pile, &mut list, index).await?;
    settle(&mut tx, deck.id, &node.code, 0, -1).await?;
    tx.commit().await?;

    tracing::debug!(deck_id = %token, pile = %name, code, "Drew specific card from pile");
    Ok(node.code)
}

/// Uniformly permute one pile. Returns the new order, top first.
pub(crate) async fn shuffle(pool: &PgPool, token: &str, name: &str) -> EngineResult<Vec<String>> {
    let mut tx = pool.begin().await?;
    let deck = lock_deck(&mut tx, token).await?;
    let pile = find_pile(&mut tx, &deck, name).await?;

    let order = shuffle_in_place(&mut tx, &pile).await?;
    tx.commit().await?;

    tracing::debug!(deck_id = %token, pile = %name, cards = order.len(), "Shuffled pile");
    Ok(codes_of(order))
}

/// Shuffle every pile of a deck in one transaction.
pub(crate) async fn shuffle_all(pool: &PgPool, token: &str) -> EngineResult<BTreeMap<String, i64>> {
    let mut tx = pool.begin().await?;
    let deck = lock_deck(&mut tx, token).await?;

    let mut counts = BTreeMap::new();
    for pile in PileRepo::list(&mut tx, deck.id).await? {
        let order = shuffle_in_place(&mut tx, &pile).await?;
        counts.insert(pile.name, order.len() as i64);
    }
    tx.commit().await?;

    tracing::debug!(deck_id = %token, piles = counts.len(), "Shuffled all piles");
    Ok(counts)
}

/// Rewrite a pile to read `codes` top-first.
///
/// `codes` must be a permutation of the pile's current contents.
pub(crate) async fn reorder(
    pool: &PgPool,
    token: &str,
    name: &str,
    codes: &[String],
) -> EngineResult<Vec<String>> {
    let mut tx = pool.begin().await?;
    let deck = lock_deck(&mut tx, token).await?;
    let pile = find_pile(&mut tx, &deck, name).await?;

    let list = pile_list(&mut tx, &pile).await?;
    let current: Vec<&Node> = list.iter().collect();
    let ids = linked_list::assign_order(&current, codes)?;

    let mut by_id: HashMap<DbId, Node> = list.iter().map(|n| (n.id, n.clone())).collect();
    let order: Vec<Node> = ids.iter().filter_map(|id| by_id.remove(id)).collect();
    relink_pile(&mut tx, pile.id, &order).await?;
    tx.commit().await?;

    tracing::debug!(deck_id = %token, pile = %name, cards = order.len(), "Reordered pile");
    Ok(codes_of(order))
}

/// Move the topmost copy of `code` from a pile onto the top of the deck.
pub(crate) async fn return_specific(
    pool: &PgPool,
    token: &str,
    name: &str,
    code: &str,
) -> EngineResult<ReturnOutcome> {
    let mut tx = pool.begin().await?;
    let deck = lock_deck(&mut tx, token).await?;
    let pile = find_pile(&mut tx, &deck, name).await?;

    let mut list = pile_list(&mut tx, &pile).await?;
    let index = position_of(&list, name, code)?;
    let node = unlink(&mut tx, &pile, &mut list, index).await?;
    settle(&mut tx, deck.id, &node.code, 1, -1).await?;

    let id = DeckCardRepo::insert(&mut tx, deck.id, &node.code, deck.top_card_id).await?;
    DeckRepo::set_top(&mut tx, deck.id, Some(id)).await?;

    let remaining = DeckCardRepo::count(&mut tx, deck.id).await?;
    tx.commit().await?;

    tracing::debug!(deck_id = %token, pile = %name, code, remaining, "Returned card from pile");
    Ok(ReturnOutcome {
        returned: 1,
        remaining,
    })
}

/// Move a whole pile onto the top of the deck, keeping its order.
///
/// The pile itself survives, empty.
pub(crate) async fn return_all(
    pool: &PgPool,
    token: &str,
    name: &str,
) -> EngineResult<ReturnOutcome> {
    let mut tx = pool.begin().await?;
    let deck = lock_deck(&mut tx, token).await?;
    let pile = find_pile(&mut tx, &deck, name).await?;

    let list = pile_list(&mut tx, &pile).await?;
    if list.is_empty() {
        return Err(CoreError::PileEmpty(name.to_string()).into());
    }

    // Bottom card goes on first so the pile's top ends up on the deck's top.
    let mut top = deck.top_card_id;
    for node in list.iter().rev() {
        top = Some(DeckCardRepo::insert(&mut tx, deck.id, &node.code, top).await?);
    }
    DeckRepo::set_top(&mut tx, deck.id, top).await?;

    let codes: Vec<String> = list.iter().map(|n| n.code.clone()).collect();
    for (code, n) in ledger::tally(&codes) {
        settle(&mut tx, deck.id, &code, n, -n).await?;
    }

    PileCardRepo::delete_all(&mut tx, pile.id).await?;
    PileRepo::set_top(&mut tx, pile.id, None).await?;

    let remaining = DeckCardRepo::count(&mut tx, deck.id).await?;
    tx.commit().await?;

    tracing::debug!(
        deck_id = %token,
        pile = %name,
        returned = list.len(),
        remaining,
        "Returned pile to deck",
    );
    Ok(ReturnOutcome {
        returned: list.len(),
        remaining,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn pick_index(method: DrawMethod, len: usize) -> usize {
    match method {
        DrawMethod::Top => 0,
        DrawMethod::Bottom => len - 1,
        DrawMethod::Random => rand::rng().random_range(0..len),
    }
}

fn position_of(list: &[Node], pile: &str, code: &str) -> Result<usize, CoreError> {
    list.iter()
        .position(|n| n.code == code)
        .ok_or_else(|| CoreError::CardNotInPile {
            pile: pile.to_string(),
            code: code.to_string(),
        })
}

/// Remove `list[index]` from the stored pile and from `list`.
async fn unlink(
    conn: &mut PgConnection,
    pile: &Pile,
    list: &mut Vec<Node>,
    index: usize,
) -> EngineResult<Node> {
    let node = list.remove(index);
    if index == 0 {
        PileRepo::set_top(conn, pile.id, node.next_id).await?;
    } else {
        let pred = &mut list[index - 1];
        PileCardRepo::set_next(conn, pred.id, node.next_id).await?;
        pred.next_id = node.next_id;
    }
    PileCardRepo::delete(conn, node.id).await?;
    Ok(node)
}

async fn shuffle_in_place(conn: &mut PgConnection, pile: &Pile) -> EngineResult<Vec<Node>> {
    let mut order = pile_list(conn, pile).await?;
    if order.is_empty() {
        return Ok(order);
    }
    linked_list::shuffle(&mut order);
    relink_pile(conn, pile.id, &order).await?;
    Ok(order)
}
