//! Domain event types.

use serde::{Deserialize, Serialize};

/// Domain events emitted by core services after successful mutations.
///
/// Hosts react to them by invalidating and refetching the affected views.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// At least one budget allocation row of a period was written.
    BudgetAllocationsChanged {
        /// Canonical `YYYY-MM-01` key of the period.
        period_start: String,
        /// Categories whose write succeeded.
        category_keys: Vec<String>,
    },
}

impl DomainEvent {
    /// Creates a BudgetAllocationsChanged event.
    pub fn budget_allocations_changed(period_start: String, category_keys: Vec<String>) -> Self {
        Self::BudgetAllocationsChanged {
            period_start,
            category_keys,
        }
    }
}
