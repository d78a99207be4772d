//! Concurrent deck and pile storage engine.
//!
//! [`DeckStore`] is the call surface. Every operation is queued on the
//! [`WorkerPool`], takes its deck's lock from the [`DeckLocks`] registry
//! (exclusive for mutations, shared for reads) and runs one transaction
//! against Postgres.

pub mod config;
pub mod error;
pub mod locks;
mod mutations;
pub mod outcome;
pub mod pool;
pub mod store;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use locks::DeckLocks;
pub use pool::WorkerPool;
pub use store::DeckStore;
