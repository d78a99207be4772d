//! Row structs for the deck store tables.
//!
//! Each submodule holds a `FromRow` struct matching one table (or one
//! aggregate query over it).

pub mod card_node;
pub mod deck;
pub mod deck_entry;
pub mod pile;
