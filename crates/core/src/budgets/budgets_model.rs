//! Budget domain models.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::aggregator::index_allocations;
use super::errors::BudgetError;
use crate::categories::Category;
use crate::period::BudgetPeriod;

/// Planned amount for one category in one monthly period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAllocation {
    /// Store identifier; `None` until the row has been persisted.
    pub id: Option<String>,
    pub category_key: String,
    pub amount: Decimal,
    pub period_start: NaiveDate,
}

/// An expense row as read from the store. Amounts are positive magnitudes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub category_key: String,
    pub amount: Decimal,
    pub occurred_on: NaiveDate,
}

/// Spending classification of one category against its budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SummaryStatus {
    NoBudget,
    Unplanned,
    Overspent,
    OnTrack,
}

impl SummaryStatus {
    pub fn classify(budgeted: Decimal, spent: Decimal) -> Self {
        if budgeted.is_zero() {
            if spent > Decimal::ZERO {
                SummaryStatus::Unplanned
            } else {
                SummaryStatus::NoBudget
            }
        } else if spent > budgeted {
            SummaryStatus::Overspent
        } else {
            SummaryStatus::OnTrack
        }
    }

    /// Sort rank; lower ranks are listed first.
    pub fn priority(&self) -> u8 {
        match self {
            SummaryStatus::Overspent => 0,
            SummaryStatus::Unplanned => 1,
            SummaryStatus::OnTrack | SummaryStatus::NoBudget => 2,
        }
    }
}

/// Budgeted versus spent for a single category. Rebuilt on every aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category_key: String,
    pub display_name: String,
    pub budgeted: Decimal,
    pub spent: Decimal,
    /// `budgeted - spent`; negative when overspent.
    pub remaining: Decimal,
    pub status: SummaryStatus,
}

/// Aggregated view of one period.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetOverview {
    pub categories: Vec<CategorySummary>,
    /// Sum of every allocation passed in.
    pub total_budgeted: Decimal,
    /// Sum of every transaction passed in.
    pub total_spent: Decimal,
    pub total_remaining: Decimal,
}

/// One write needed to bring persisted allocations in line with an edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ReconciliationOp {
    #[serde(rename_all = "camelCase")]
    Insert {
        category_key: String,
        amount: Decimal,
        period_start: NaiveDate,
    },
    #[serde(rename_all = "camelCase")]
    Update {
        id: String,
        category_key: String,
        amount: Decimal,
    },
    #[serde(rename_all = "camelCase")]
    Delete { id: String, category_key: String },
    #[serde(rename_all = "camelCase")]
    Skip { category_key: String },
}

impl ReconciliationOp {
    pub fn category_key(&self) -> &str {
        match self {
            ReconciliationOp::Insert { category_key, .. }
            | ReconciliationOp::Update { category_key, .. }
            | ReconciliationOp::Delete { category_key, .. }
            | ReconciliationOp::Skip { category_key } => category_key,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, ReconciliationOp::Skip { .. })
    }

    /// Short label used in logs and failure summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            ReconciliationOp::Insert { .. } => "insert",
            ReconciliationOp::Update { .. } => "update",
            ReconciliationOp::Delete { .. } => "delete",
            ReconciliationOp::Skip { .. } => "skip",
        }
    }
}

/// Persisted state of a period as the Reconciler sees it.
///
/// `amounts` covers the whole taxonomy (zero where no row exists) plus any
/// off-taxonomy key that has a row; `ids` only has keys with a persisted row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSnapshot {
    pub period: BudgetPeriod,
    pub amounts: HashMap<String, Decimal>,
    pub ids: HashMap<String, String>,
}

impl BudgetSnapshot {
    /// Builds the original amount and id maps from the rows of `period`.
    pub fn from_allocations(
        period: BudgetPeriod,
        taxonomy: &[Category],
        allocations: &[BudgetAllocation],
    ) -> Result<Self, BudgetError> {
        let indexed = index_allocations(allocations)?;

        let mut amounts: HashMap<String, Decimal> = taxonomy
            .iter()
            .map(|c| (c.key.to_string(), Decimal::ZERO))
            .collect();
        let mut ids = HashMap::new();

        for (key, allocation) in indexed {
            amounts.insert(key.to_string(), allocation.amount);
            if let Some(id) = &allocation.id {
                ids.insert(key.to_string(), id.clone());
            }
        }

        Ok(Self {
            period,
            amounts,
            ids,
        })
    }

    /// The edited map: the snapshot amounts overlaid with `edits`.
    pub fn edited_with(&self, edits: &HashMap<String, Decimal>) -> HashMap<String, Decimal> {
        let mut edited = self.amounts.clone();
        for (key, amount) in edits {
            edited.insert(key.clone(), *amount);
        }
        edited
    }
}

/// An op that could not be applied, with the store's error message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedOp {
    pub op: ReconciliationOp,
    pub error: String,
}

/// Outcome of applying one reconciliation pass against the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    pub period: BudgetPeriod,
    pub succeeded: Vec<ReconciliationOp>,
    pub failed: Vec<FailedOp>,
    pub skipped: usize,
}

impl ApplyReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Category keys whose write failed, in op order.
    pub fn failed_categories(&self) -> Vec<String> {
        self.failed
            .iter()
            .map(|f| f.op.category_key().to_string())
            .collect()
    }
}

/// Result of a successful period load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedBudget {
    pub period: BudgetPeriod,
    pub overview: BudgetOverview,
    pub snapshot: BudgetSnapshot,
}

/// A load either completes or is discarded because a newer load started.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(LoadedBudget),
    Superseded,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::EXPENSE_CATEGORIES;
    use rust_decimal_macros::dec;

    fn allocation(id: &str, key: &str, amount: Decimal) -> BudgetAllocation {
        BudgetAllocation {
            id: Some(id.to_string()),
            category_key: key.to_string(),
            amount,
            period_start: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
        }
    }

    #[test]
    fn test_classify_decision_table() {
        assert_eq!(SummaryStatus::classify(dec!(0), dec!(0)), SummaryStatus::NoBudget);
        assert_eq!(SummaryStatus::classify(dec!(0), dec!(5)), SummaryStatus::Unplanned);
        assert_eq!(SummaryStatus::classify(dec!(100), dec!(100.01)), SummaryStatus::Overspent);
        assert_eq!(SummaryStatus::classify(dec!(100), dec!(100)), SummaryStatus::OnTrack);
        assert_eq!(SummaryStatus::classify(dec!(100), dec!(0)), SummaryStatus::OnTrack);
    }

    #[test]
    fn test_snapshot_fills_taxonomy_with_zero() {
        let period = BudgetPeriod::new(2026, 10).unwrap();
        let snapshot = BudgetSnapshot::from_allocations(
            period,
            EXPENSE_CATEGORIES,
            &[allocation("7", "food", dec!(1000))],
        )
        .unwrap();

        assert_eq!(snapshot.amounts.len(), EXPENSE_CATEGORIES.len());
        assert_eq!(snapshot.amounts["food"], dec!(1000));
        assert_eq!(snapshot.amounts["transport"], Decimal::ZERO);
        assert_eq!(snapshot.ids.len(), 1);
        assert_eq!(snapshot.ids["food"], "7");
    }

    #[test]
    fn test_snapshot_rejects_duplicate_rows() {
        let period = BudgetPeriod::new(2026, 10).unwrap();
        let result = BudgetSnapshot::from_allocations(
            period,
            EXPENSE_CATEGORIES,
            &[
                allocation("7", "food", dec!(1000)),
                allocation("8", "food", dec!(200)),
            ],
        );
        assert!(matches!(result, Err(BudgetError::DuplicateAllocation { .. })));
    }

    #[test]
    fn test_edited_with_overlays_edits() {
        let period = BudgetPeriod::new(2026, 10).unwrap();
        let snapshot = BudgetSnapshot::from_allocations(
            period,
            EXPENSE_CATEGORIES,
            &[allocation("7", "food", dec!(1000))],
        )
        .unwrap();
        let edits = HashMap::from([("transport".to_string(), dec!(250))]);

        let edited = snapshot.edited_with(&edits);
        assert_eq!(edited["food"], dec!(1000));
        assert_eq!(edited["transport"], dec!(250));
        assert_eq!(edited.len(), snapshot.amounts.len());
    }

    #[test]
    fn test_op_serializes_with_tag() {
        let op = ReconciliationOp::Delete {
            id: "7".to_string(),
            category_key: "food".to_string(),
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["op"], "delete");
        assert_eq!(json["categoryKey"], "food");
    }
}
