//! Repository layer.
//!
//! Each repository is a zero-sized struct whose async methods take a
//! `&mut PgConnection` first, so the same primitive runs on a pooled
//! connection for reads or inside a caller-owned transaction for writes.
//! Every method is a single statement; multi-statement protocols live in
//! the engine.

pub mod deck_card_repo;
pub mod deck_entry_repo;
pub mod deck_repo;
pub mod pile_card_repo;
pub mod pile_repo;

pub use deck_card_repo::DeckCardRepo;
pub use deck_entry_repo::DeckEntryRepo;
pub use deck_repo::DeckRepo;
pub use pile_card_repo::PileCardRepo;
pub use pile_repo::PileRepo;
