//! Read-only queries, run under the deck's shared lock.

use std::collections::{BTreeMap, HashMap};

use deckstore_core::error::CoreError;
use deckstore_core::linked_list::{self, Node};
use deckstore_db::repositories::{DeckCardRepo, DeckEntryRepo, PileCardRepo, PileRepo};
use sqlx::PgPool;

use super::{codes_of, deck_list, find_deck, find_pile, pile_list};
use crate::error::EngineResult;
use crate::outcome::{DeckInfo, IntegrityReport, LedgerEntry};

/// Card count per pile, empty piles included.
pub(crate) async fn list_piles(pool: &PgPool, token: &str) -> EngineResult<BTreeMap<String, i64>> {
    let mut conn = pool.acquire().await?;
    let deck = find_deck(&mut conn, token).await?;
    let counts = PileRepo::list_counts(&mut conn, deck.id).await?;
    Ok(counts.into_iter().map(|c| (c.name, c.remaining)).collect())
}

/// A pile's codes, top first.
pub(crate) async fn pile_cards(
    pool: &PgPool,
    token: &str,
    name: &str,
) -> EngineResult<Vec<String>> {
    let mut conn = pool.acquire().await?;
    let deck = find_deck(&mut conn, token).await?;
    let pile = find_pile(&mut conn, &deck, name).await?;
    Ok(codes_of(pile_list(&mut conn, &pile).await?))
}

/// The deck's codes, top first.
pub(crate) async fn deck_cards(pool: &PgPool, token: &str) -> EngineResult<Vec<String>> {
    let mut conn = pool.acquire().await?;
    let deck = find_deck(&mut conn, token).await?;
    Ok(codes_of(deck_list(&mut conn, &deck).await?))
}

pub(crate) async fn cards_in_deck(pool: &PgPool, token: &str) -> EngineResult<i64> {
    let mut conn = pool.acquire().await?;
    let deck = find_deck(&mut conn, token).await?;
    Ok(DeckCardRepo::count(&mut conn, deck.id).await?)
}

pub(crate) async fn cards_in_pile(pool: &PgPool, token: &str, name: &str) -> EngineResult<i64> {
    let mut conn = pool.acquire().await?;
    let deck = find_deck(&mut conn, token).await?;
    let pile = find_pile(&mut conn, &deck, name).await?;
    Ok(PileCardRepo::count(&mut conn, pile.id).await?)
}

pub(crate) async fn deck_info(pool: &PgPool, token: &str) -> EngineResult<DeckInfo> {
    let mut conn = pool.acquire().await?;
    let deck = find_deck(&mut conn, token).await?;
    let remaining = DeckCardRepo::count(&mut conn, deck.id).await?;
    let piles = PileRepo::list_counts(&mut conn, deck.id)
        .await?
        .into_iter()
        .map(|c| (c.name, c.remaining))
        .collect();

    Ok(DeckInfo {
        deck_id: deck.token,
        remaining,
        shuffled: deck.shuffled,
        piles,
    })
}

pub(crate) async fn ledger(pool: &PgPool, token: &str) -> EngineResult<Vec<LedgerEntry>> {
    let mut conn = pool.acquire().await?;
    let deck = find_deck(&mut conn, token).await?;
    let entries = DeckEntryRepo::list(&mut conn, deck.id).await?;

    Ok(entries
        .into_iter()
        .map(|e| {
            let drawn = e.counts().drawn();
            LedgerEntry {
                code: e.code,
                total: e.total,
                in_deck: e.in_deck,
                in_pile: e.in_pile,
                drawn,
            }
        })
        .collect())
}

/// Check every list of a deck and the ledger against each other.
///
/// Lists must have one head, one tail, no cycles and no orphans; a pile's
/// stored head must match the one node nothing points at. Per code, the
/// ledger's `in_deck` must equal the deck-list count and `in_pile` the sum
/// over all piles. Any mismatch is reported as a corrupted list.
pub(crate) async fn verify_integrity(pool: &PgPool, token: &str) -> EngineResult<IntegrityReport> {
    let mut conn = pool.acquire().await?;
    let deck = find_deck(&mut conn, token).await?;

    let deck_nodes = deck_list(&mut conn, &deck).await?;

    let mut pile_cards = BTreeMap::new();
    for pile in PileRepo::list(&mut conn, deck.id).await? {
        let nodes: Vec<Node> = PileCardRepo::list_nodes(&mut conn, pile.id)
            .await?
            .into_iter()
            .map(Node::from)
            .collect();
        let structural = linked_list::structural_head(&nodes)?;
        if structural != pile.top_card_id {
            return Err(CoreError::CorruptedList(format!(
                "pile '{}' stores head {:?} but its unreferenced node is {:?}",
                pile.name, pile.top_card_id, structural
            ))
            .into());
        }
        let walked = linked_list::walk(pile.top_card_id, &nodes)?.len();
        pile_cards.insert(pile.name, walked);
    }

    let mut in_deck: HashMap<String, i64> = DeckCardRepo::count_by_code(&mut conn, deck.id)
        .await?
        .into_iter()
        .collect();
    let mut in_pile: HashMap<String, i64> = PileCardRepo::count_by_code_for_deck(&mut conn, deck.id)
        .await?
        .into_iter()
        .collect();

    let entries = DeckEntryRepo::list(&mut conn, deck.id).await?;
    for entry in &entries {
        let counts = entry.counts();
        if !counts.is_consistent() {
            return Err(CoreError::CorruptedList(format!(
                "ledger for {} is out of bounds: {counts:?}",
                entry.code
            ))
            .into());
        }
        let listed_deck = in_deck.remove(&entry.code).unwrap_or(0);
        let listed_pile = in_pile.remove(&entry.code).unwrap_or(0);
        if listed_deck != i64::from(counts.in_deck) || listed_pile != i64::from(counts.in_pile) {
            return Err(CoreError::CorruptedList(format!(
                "ledger for {} says in_deck={} in_pile={} \
                 but lists hold {listed_deck} and {listed_pile}",
                entry.code, counts.in_deck, counts.in_pile
            ))
            .into());
        }
    }
    if let Some(code) = in_deck.keys().chain(in_pile.keys()).next() {
        return Err(CoreError::CorruptedList(format!("card {code} has no ledger entry")).into());
    }

    tracing::debug!(
        deck_id = %token,
        deck_cards = deck_nodes.len(),
        piles = pile_cards.len(),
        "Integrity verified",
    );
    Ok(IntegrityReport {
        deck_cards: deck_nodes.len(),
        pile_cards,
        ledger_codes: entries.len(),
    })
}
