//! Budget engine error types.
//!
//! These signal upstream data corruption. Empty input is never an error.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Invariant violations detected while aggregating or snapshotting budget rows.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BudgetError {
    /// More than one live allocation exists for a category in one period.
    #[error("Duplicate allocations for category '{category_key}' in period {period_start}: {ids:?}")]
    DuplicateAllocation {
        category_key: String,
        period_start: NaiveDate,
        ids: Vec<String>,
    },

    /// Allocations passed to a single call belong to different periods.
    #[error("Allocations span several periods: {first} and {second}")]
    MixedPeriods { first: NaiveDate, second: NaiveDate },

    /// An allocation carries a negative amount.
    #[error("Allocation for category '{category_key}' has negative amount {amount}")]
    NegativeAmount {
        category_key: String,
        amount: Decimal,
    },
}

impl BudgetError {
    /// Creates a DuplicateAllocation error.
    pub fn duplicate(
        category_key: impl Into<String>,
        period_start: NaiveDate,
        ids: Vec<String>,
    ) -> Self {
        Self::DuplicateAllocation {
            category_key: category_key.into(),
            period_start,
            ids,
        }
    }
}
