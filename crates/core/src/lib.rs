pub mod card;
pub mod deck_builder;
pub mod draw_method;
pub mod error;
pub mod ledger;
pub mod linked_list;
pub mod token;
pub mod types;
