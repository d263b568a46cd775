//! Budgets module - reconciliation and aggregation engine plus the host
//! service that feeds it from the store.
//!
//! [`reconcile`] and [`aggregate`] are pure functions over in-memory data and
//! are safe to call from any thread. [`BudgetService`] owns all I/O.

mod aggregator;
mod budgets_model;
mod budgets_service;
mod budgets_traits;
mod errors;
mod reconciler;

pub use aggregator::aggregate;
pub use budgets_model::*;
pub use budgets_service::BudgetService;
pub use budgets_traits::BudgetServiceTrait;
pub use errors::BudgetError;
pub use reconciler::reconcile;
