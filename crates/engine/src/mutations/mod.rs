//! Multi-statement protocols over the deck and pile lists.
//!
//! Each public function here runs one transaction that leaves the lists and
//! the ledger mutually consistent, or rolls back and changes nothing. Callers
//! hold the deck's lock for the whole call and hand in codes that are
//! already normalized.

pub(crate) mod deck;
pub(crate) mod inspect;
pub(crate) mod pile;

use deckstore_core::error::CoreError;
use deckstore_core::linked_list::{self, Node};
use deckstore_core::types::DbId;
use deckstore_db::models::card_node::CardNode;
use deckstore_db::models::deck::Deck;
use deckstore_db::models::pile::Pile;
use deckstore_db::repositories::{DeckCardRepo, DeckEntryRepo, DeckRepo, PileCardRepo, PileRepo};
use sqlx::PgConnection;

use crate::error::EngineResult;

/// Load a deck and row-lock it for the rest of the transaction.
async fn lock_deck(conn: &mut PgConnection, token: &str) -> EngineResult<Deck> {
    DeckRepo::find_by_token_for_update(conn, token)
        .await?
        .ok_or_else(|| CoreError::DeckNotFound(token.to_string()).into())
}

async fn find_deck(conn: &mut PgConnection, token: &str) -> EngineResult<Deck> {
    DeckRepo::find_by_token(conn, token)
        .await?
        .ok_or_else(|| CoreError::DeckNotFound(token.to_string()).into())
}

async fn find_pile(conn: &mut PgConnection, deck: &Deck, name: &str) -> EngineResult<Pile> {
    PileRepo::find(conn, deck.id, name).await?.ok_or_else(|| {
        CoreError::PileNotFound {
            deck_id: deck.token.clone(),
            pile: name.to_string(),
        }
        .into()
    })
}

/// The deck list, head first.
async fn deck_list(conn: &mut PgConnection, deck: &Deck) -> EngineResult<Vec<Node>> {
    let rows = DeckCardRepo::list_nodes(conn, deck.id).await?;
    ordered(deck.top_card_id, rows)
}

/// The pile list, top first.
async fn pile_list(conn: &mut PgConnection, pile: &Pile) -> EngineResult<Vec<Node>> {
    let rows = PileCardRepo::list_nodes(conn, pile.id).await?;
    ordered(pile.top_card_id, rows)
}

fn ordered(head: Option<DbId>, rows: Vec<CardNode>) -> EngineResult<Vec<Node>> {
    let nodes: Vec<Node> = rows.into_iter().map(Node::from).collect();
    let walked = linked_list::walk(head, &nodes)?;
    Ok(walked.into_iter().cloned().collect())
}

/// Apply a ledger move that earlier checks already proved legal.
///
/// A refusal here means the ledger and the lists disagree.
async fn settle(
    conn: &mut PgConnection,
    deck_id: DbId,
    code: &str,
    in_deck_delta: i32,
    in_pile_delta: i32,
) -> EngineResult<()> {
    if DeckEntryRepo::adjust(conn, deck_id, code, in_deck_delta, in_pile_delta).await? {
        Ok(())
    } else {
        Err(CoreError::CorruptedList(format!(
            "ledger for {code} refused move (in_deck {in_deck_delta:+}, in_pile {in_pile_delta:+})"
        ))
        .into())
    }
}

/// Rewrite deck pointers so the list reads `order` head-to-tail.
async fn relink_deck(conn: &mut PgConnection, deck_id: DbId, order: &[Node]) -> EngineResult<()> {
    let ids: Vec<DbId> = order.iter().map(|n| n.id).collect();
    for ((id, next), node) in linked_list::relink_plan(&ids).into_iter().zip(order) {
        if node.next_id != next {
            DeckCardRepo::set_next(conn, id, next).await?;
        }
    }
    DeckRepo::set_top_shuffled(conn, deck_id, ids.first().copied()).await?;
    Ok(())
}

/// Rewrite pile pointers so the list reads `order` top-to-bottom.
async fn relink_pile(conn: &mut PgConnection, pile_id: DbId, order: &[Node]) -> EngineResult<()> {
    let ids: Vec<DbId> = order.iter().map(|n| n.id).collect();
    for ((id, next), node) in linked_list::relink_plan(&ids).into_iter().zip(order) {
        if node.next_id != next {
            PileCardRepo::set_next(conn, id, next).await?;
        }
    }
    PileRepo::set_top(conn, pile_id, ids.first().copied()).await?;
    Ok(())
}

fn codes_of(nodes: Vec<Node>) -> Vec<String> {
    nodes.into_iter().map(|n| n.code).collect()
}
