//! The deck store call surface.
//!
//! Every method validates its inputs, queues one operation on the worker
//! pool and waits for the result. Inside the worker the operation takes
//! the deck's lock (exclusive for mutations, shared for reads) before it
//! touches the database.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use deckstore_core::card;
use deckstore_core::deck_builder;
use deckstore_core::draw_method::DrawMethod;
use deckstore_core::error::CoreError;
use deckstore_core::linked_list;
use deckstore_core::token::{self, MAX_TOKEN_ATTEMPTS};
use deckstore_db::DbPool;

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::locks::DeckLocks;
use crate::mutations::{deck, inspect, pile};
use crate::outcome::{
    DeckInfo, DrawOutcome, IntegrityReport, LedgerEntry, PileInsertOutcome, ReturnOutcome,
};
use crate::pool::WorkerPool;

/// Longest accepted pile name, in bytes.
const MAX_PILE_NAME_LEN: usize = 64;

/// Handle to the deck store. Cheap to clone; clones share one worker pool.
#[derive(Debug, Clone)]
pub struct DeckStore {
    pool: DbPool,
    locks: DeckLocks,
    workers: Arc<WorkerPool>,
}

impl DeckStore {
    /// Start a worker pool over `pool`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(pool: DbPool, workers: usize, queue_capacity: usize) -> EngineResult<Self> {
        Ok(Self {
            pool,
            locks: DeckLocks::new(),
            workers: Arc::new(WorkerPool::new(workers, queue_capacity)?),
        })
    }

    /// Connect, check and migrate the database described by `config`, then
    /// start the worker pool.
    pub async fn connect(config: &EngineConfig) -> EngineResult<Self> {
        let pool = deckstore_db::create_pool(&config.database_url, config.pool).await?;
        tracing::info!(
            max_connections = config.pool.max_connections,
            "Database connection pool created",
        );

        deckstore_db::health_check(&pool).await?;
        deckstore_db::run_migrations(&pool).await?;
        tracing::info!("Database migrations applied");

        let store = Self::new(pool, config.workers, config.queue_capacity)?;
        tracing::info!(workers = store.worker_count(), "Deck store started");
        Ok(store)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.worker_count()
    }

    pub fn db(&self) -> &DbPool {
        &self.pool
    }

    /// Finish queued operations and stop the workers.
    pub async fn shutdown(&self) {
        self.workers.shutdown().await;
    }

    // -----------------------------------------------------------------------
    // Decks
    // -----------------------------------------------------------------------

    /// Create a deck whose list reads `cards` top-first. Repeated codes are
    /// allowed. Returns the new deck id.
    pub async fn create_deck<S: AsRef<str>>(&self, cards: &[S]) -> EngineResult<String> {
        let cards = card::parse_codes(cards)?;
        self.create_with(cards, false).await
    }

    /// Create `deck_count` standard packets, optionally with two jokers each.
    ///
    /// With `shuffled` the packets are shuffled before the deck is written
    /// and the deck is flagged as shuffled from the start.
    pub async fn create_standard_deck(
        &self,
        deck_count: u32,
        jokers: bool,
        shuffled: bool,
    ) -> EngineResult<String> {
        let cards = deck_builder::standard_deck(deck_count, jokers)?;
        self.create_with(cards, shuffled).await
    }

    /// Create a deck from a caller-chosen set of distinct codes, shuffled
    /// first when `shuffled` is set.
    pub async fn create_custom_deck<S: AsRef<str>>(
        &self,
        codes: &[S],
        shuffled: bool,
    ) -> EngineResult<String> {
        let cards = deck_builder::custom_deck(codes)?;
        self.create_with(cards, shuffled).await
    }

    /// Draw up to `count` cards from the top of the deck.
    ///
    /// A deck with fewer than `count` cards yields what it has; see
    /// [`DrawOutcome::is_partial`]. An empty deck is an error.
    pub async fn draw(&self, deck_id: &str, count: i64) -> EngineResult<DrawOutcome> {
        self.mutate(deck_id, move |db, token| async move {
            deck::draw(&db, &token, count).await
        })
        .await
    }

    pub async fn shuffle_deck(&self, deck_id: &str) -> EngineResult<Vec<String>> {
        self.mutate(deck_id, |db, token| async move { deck::shuffle(&db, &token).await })
            .await
    }

    pub async fn return_all_drawn(&self, deck_id: &str) -> EngineResult<ReturnOutcome> {
        self.mutate(deck_id, |db, token| async move {
            deck::return_all_drawn(&db, &token).await
        })
        .await
    }

    pub async fn return_specific_drawn(
        &self,
        deck_id: &str,
        code: &str,
    ) -> EngineResult<ReturnOutcome> {
        let code = card::parse_code(code)?;
        self.mutate(deck_id, move |db, token| async move {
            deck::return_specific_drawn(&db, &token, &code).await
        })
        .await
    }

    pub async fn delete_deck(&self, deck_id: &str) -> EngineResult<()> {
        self.mutate(deck_id, |db, token| async move { deck::delete(&db, &token).await })
            .await
    }

    // -----------------------------------------------------------------------
    // Piles
    // -----------------------------------------------------------------------

    /// Move drawn cards onto a pile, creating the pile on first use.
    pub async fn insert_into_pile<S: AsRef<str>>(
        &self,
        deck_id: &str,
        pile_name: &str,
        codes: &[S],
    ) -> EngineResult<PileInsertOutcome> {
        let name = validate_pile_name(pile_name)?;
        let codes = card::parse_codes(codes)?;
        if codes.is_empty() {
            return Err(CoreError::InvalidParameter("no cards given".into()).into());
        }
        card::ensure_distinct(&codes)?;

        self.mutate(deck_id, move |db, token| async move {
            pile::insert(&db, &token, &name, &codes).await
        })
        .await
    }

    pub async fn draw_from_pile(
        &self,
        deck_id: &str,
        pile_name: &str,
        method: DrawMethod,
    ) -> EngineResult<String> {
        let outcome = self.draw_many_from_pile(deck_id, pile_name, method, 1).await?;
        outcome
            .cards
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::PileEmpty(pile_name.to_string()).into())
    }

    /// Draw up to `count` cards from a pile in one transaction.
    pub async fn draw_many_from_pile(
        &self,
        deck_id: &str,
        pile_name: &str,
        method: DrawMethod,
        count: i64,
    ) -> EngineResult<DrawOutcome> {
        let name = validate_pile_name(pile_name)?;
        self.mutate(deck_id, move |db, token| async move {
            pile::draw(&db, &token, &name, method, count).await
        })
        .await
    }

    /// Draw the topmost copy of `code` from a pile.
    pub async fn draw_specific_from_pile(
        &self,
        deck_id: &str,
        pile_name: &str,
        code: &str,
    ) -> EngineResult<String> {
        let name = validate_pile_name(pile_name)?;
        let code = card::parse_code(code)?;
        self.mutate(deck_id, move |db, token| async move {
            pile::draw_specific(&db, &token, &name, &code).await
        })
        .await
    }

    pub async fn shuffle_pile(&self, deck_id: &str, pile_name: &str) -> EngineResult<Vec<String>> {
        let name = validate_pile_name(pile_name)?;
        self.mutate(deck_id, move |db, token| async move {
            pile::shuffle(&db, &token, &name).await
        })
        .await
    }

    /// Shuffle every pile of a deck. Returns each pile's card count.
    pub async fn shuffle_all_piles(&self, deck_id: &str) -> EngineResult<BTreeMap<String, i64>> {
        self.mutate(deck_id, |db, token| async move { pile::shuffle_all(&db, &token).await })
            .await
    }

    /// Rewrite a pile's order. `codes` must hold exactly the pile's cards.
    pub async fn reorder_pile<S: AsRef<str>>(
        &self,
        deck_id: &str,
        pile_name: &str,
        codes: &[S],
    ) -> EngineResult<Vec<String>> {
        let name = validate_pile_name(pile_name)?;
        let codes = card::parse_codes(codes)?;
        self.mutate(deck_id, move |db, token| async move {
            pile::reorder(&db, &token, &name, &codes).await
        })
        .await
    }

    pub async fn return_all_from_pile(
        &self,
        deck_id: &str,
        pile_name: &str,
    ) -> EngineResult<ReturnOutcome> {
        let name = validate_pile_name(pile_name)?;
        self.mutate(deck_id, move |db, token| async move {
            pile::return_all(&db, &token, &name).await
        })
        .await
    }

    pub async fn return_specific_from_pile(
        &self,
        deck_id: &str,
        pile_name: &str,
        code: &str,
    ) -> EngineResult<ReturnOutcome> {
        let name = validate_pile_name(pile_name)?;
        let code = card::parse_code(code)?;
        self.mutate(deck_id, move |db, token| async move {
            pile::return_specific(&db, &token, &name, &code).await
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn list_piles(&self, deck_id: &str) -> EngineResult<BTreeMap<String, i64>> {
        self.read(deck_id, |db, token| async move { inspect::list_piles(&db, &token).await })
            .await
    }

    pub async fn get_pile_cards(
        &self,
        deck_id: &str,
        pile_name: &str,
    ) -> EngineResult<Vec<String>> {
        let name = validate_pile_name(pile_name)?;
        self.read(deck_id, move |db, token| async move {
            inspect::pile_cards(&db, &token, &name).await
        })
        .await
    }

    /// The undrawn cards of a deck, top first.
    pub async fn get_deck_cards(&self, deck_id: &str) -> EngineResult<Vec<String>> {
        self.read(deck_id, |db, token| async move { inspect::deck_cards(&db, &token).await })
            .await
    }

    pub async fn cards_in_deck(&self, deck_id: &str) -> EngineResult<i64> {
        self.read(deck_id, |db, token| async move { inspect::cards_in_deck(&db, &token).await })
            .await
    }

    pub async fn cards_in_pile(&self, deck_id: &str, pile_name: &str) -> EngineResult<i64> {
        let name = validate_pile_name(pile_name)?;
        self.read(deck_id, move |db, token| async move {
            inspect::cards_in_pile(&db, &token, &name).await
        })
        .await
    }

    pub async fn deck_info(&self, deck_id: &str) -> EngineResult<DeckInfo> {
        self.read(deck_id, |db, token| async move { inspect::deck_info(&db, &token).await })
            .await
    }

    pub async fn ledger(&self, deck_id: &str) -> EngineResult<Vec<LedgerEntry>> {
        self.read(deck_id, |db, token| async move { inspect::ledger(&db, &token).await })
            .await
    }

    /// Check list structure and ledger agreement for one deck.
    pub async fn verify_integrity(&self, deck_id: &str) -> EngineResult<IntegrityReport> {
        self.read(deck_id, |db, token| async move {
            inspect::verify_integrity(&db, &token).await
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Generate tokens until one is free, holding each candidate's lock
    /// while it is inserted.
    async fn create_with(&self, mut cards: Vec<String>, shuffled: bool) -> EngineResult<String> {
        if shuffled {
            linked_list::shuffle(&mut cards);
        }
        let db = self.pool.clone();
        let locks = self.locks.clone();
        self.workers
            .execute(async move {
                for attempt in 1..=MAX_TOKEN_ATTEMPTS {
                    let token = token::generate_deck_token();
                    let _guard = locks.write(&token).await;
                    if deck::create(&db, &token, &cards, shuffled).await? {
                        return Ok(token);
                    }
                    tracing::warn!(attempt, "Deck token already taken, retrying");
                }
                Err(CoreError::TokenSpaceExhausted {
                    attempts: MAX_TOKEN_ATTEMPTS,
                }
                .into())
            })
            .await
    }

    async fn mutate<T, F, Fut>(&self, deck_id: &str, op: F) -> EngineResult<T>
    where
        T: Send + 'static,
        F: FnOnce(DbPool, String) -> Fut + Send + 'static,
        Fut: Future<Output = EngineResult<T>> + Send + 'static,
    {
        let token = known_token(deck_id)?;
        let db = self.pool.clone();
        let locks = self.locks.clone();
        self.workers
            .execute(async move {
                let _guard = locks.write(&token).await;
                op(db, token).await
            })
            .await
    }

    async fn read<T, F, Fut>(&self, deck_id: &str, op: F) -> EngineResult<T>
    where
        T: Send + 'static,
        F: FnOnce(DbPool, String) -> Fut + Send + 'static,
        Fut: Future<Output = EngineResult<T>> + Send + 'static,
    {
        let token = known_token(deck_id)?;
        let db = self.pool.clone();
        let locks = self.locks.clone();
        self.workers
            .execute(async move {
                let _guard = locks.read(&token).await;
                op(db, token).await
            })
            .await
    }
}

/// Ids that could never have been generated are rejected without a lock
/// or a query.
fn known_token(deck_id: &str) -> Result<String, CoreError> {
    if token::is_well_formed(deck_id) {
        Ok(deck_id.to_string())
    } else {
        Err(CoreError::DeckNotFound(deck_id.to_string()))
    }
}

fn validate_pile_name(raw: &str) -> Result<String, CoreError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidParameter("pile name must not be empty".into()));
    }
    if name.len() > MAX_PILE_NAME_LEN {
        return Err(CoreError::InvalidParameter(format!(
            "pile name must not exceed {MAX_PILE_NAME_LEN} bytes"
        )));
    }
    Ok(name.to_string())
}
