use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::budgets::budgets_model::{ApplyReport, BudgetSnapshot, LoadOutcome};
use crate::errors::Result;
use crate::period::BudgetPeriod;

/// Trait for budget service operations
#[async_trait]
pub trait BudgetServiceTrait: Send + Sync {
    /// Fetches and aggregates one period. A later call supersedes this one.
    async fn load_period(&self, period: BudgetPeriod) -> Result<LoadOutcome>;

    /// Reconciles `edits` against `snapshot` and writes the resulting ops.
    async fn apply_edits(
        &self,
        snapshot: &BudgetSnapshot,
        edits: &HashMap<String, Decimal>,
    ) -> Result<ApplyReport>;

    /// Re-runs only the failed ops of a previous report.
    async fn retry_failed(&self, report: &ApplyReport) -> Result<ApplyReport>;
}
