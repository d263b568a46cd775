//! Budgetflow Core - budget reconciliation and spending aggregation.
//!
//! The engine (`budgets::reconcile`, `budgets::aggregate`) is pure and
//! store-agnostic. Hosts plug a relational store in through the traits in
//! `store` and drive it with `budgets::BudgetService`.

pub mod budgets;
pub mod categories;
pub mod constants;
pub mod errors;
pub mod events;
pub mod period;
pub mod settings;
pub mod store;

// Re-export the engine entry points
pub use budgets::{aggregate, reconcile};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
