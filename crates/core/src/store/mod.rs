//! Store module - the relational store collaborator seen from the engine.
//!
//! The engine never talks to a concrete store. Hosts provide implementations
//! of [`RowReaderTrait`] and [`RowWriterTrait`]; [`InMemoryRowStore`] is the
//! bundled one.

mod memory_store;
mod rows;
mod store_model;
mod store_traits;

pub use memory_store::InMemoryRowStore;
pub use rows::{
    allocation_from_row, allocation_insert_row, allocation_update_row, transaction_from_row,
};
pub use store_model::{Filter, FilterOp, OrderBy, Row};
pub use store_traits::{RowReaderTrait, RowWriterTrait};
