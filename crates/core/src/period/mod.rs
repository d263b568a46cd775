//! Period module - monthly budget periods and their wire keys.

mod period_model;

pub use period_model::BudgetPeriod;
