//! Spending-by-category aggregation.
//!
//! Joins the allocations and expenses of one period, classifies every
//! category that has either, and orders the list so problems surface first.

use std::collections::{HashMap, HashSet};

use log::debug;
use rust_decimal::Decimal;

use super::budgets_model::{
    BudgetAllocation, BudgetOverview, CategorySummary, SummaryStatus, TransactionRecord,
};
use super::errors::BudgetError;
use crate::categories::{display_name_for, Category};

/// Indexes allocations by category key, rejecting corrupt input.
///
/// Fails on a negative amount, on rows from more than one period, or on two
/// rows for the same category.
pub(crate) fn index_allocations(
    allocations: &[BudgetAllocation],
) -> Result<HashMap<&str, &BudgetAllocation>, BudgetError> {
    let mut indexed: HashMap<&str, &BudgetAllocation> = HashMap::with_capacity(allocations.len());

    if let Some(first) = allocations.first() {
        if let Some(other) = allocations
            .iter()
            .find(|a| a.period_start != first.period_start)
        {
            return Err(BudgetError::MixedPeriods {
                first: first.period_start,
                second: other.period_start,
            });
        }
    }

    for allocation in allocations {
        if allocation.amount < Decimal::ZERO {
            return Err(BudgetError::NegativeAmount {
                category_key: allocation.category_key.clone(),
                amount: allocation.amount,
            });
        }
        if let Some(existing) = indexed.insert(allocation.category_key.as_str(), allocation) {
            let ids = [existing, allocation]
                .iter()
                .map(|a| a.id.clone().unwrap_or_default())
                .collect();
            return Err(BudgetError::duplicate(
                allocation.category_key.clone(),
                allocation.period_start,
                ids,
            ));
        }
    }

    Ok(indexed)
}

/// Builds the classified, sorted category list and the period totals.
///
/// Categories with neither an allocation nor a transaction are left out.
/// Totals are summed over the raw input, so they always match what was
/// passed in. Keys missing from `taxonomy` keep their raw key as display name.
pub fn aggregate(
    allocations: &[BudgetAllocation],
    transactions: &[TransactionRecord],
    taxonomy: &[Category],
) -> Result<BudgetOverview, BudgetError> {
    let budget_by_category = index_allocations(allocations)?;

    let mut spent_by_category: HashMap<&str, Decimal> = HashMap::new();
    for transaction in transactions {
        *spent_by_category
            .entry(transaction.category_key.as_str())
            .or_insert(Decimal::ZERO) += transaction.amount;
    }

    // Union in first-seen order: allocations first, then transactions.
    let mut seen: HashSet<&str> = HashSet::new();
    let union: Vec<&str> = allocations
        .iter()
        .map(|a| a.category_key.as_str())
        .chain(transactions.iter().map(|t| t.category_key.as_str()))
        .filter(|key| seen.insert(*key))
        .collect();

    let mut categories: Vec<CategorySummary> = union
        .into_iter()
        .map(|key| {
            let budgeted = budget_by_category
                .get(key)
                .map(|a| a.amount)
                .unwrap_or(Decimal::ZERO);
            let spent = spent_by_category
                .get(key)
                .copied()
                .unwrap_or(Decimal::ZERO);
            CategorySummary {
                category_key: key.to_string(),
                display_name: display_name_for(taxonomy, key),
                budgeted,
                spent,
                remaining: budgeted - spent,
                status: SummaryStatus::classify(budgeted, spent),
            }
        })
        .collect();

    // `sort_by` is stable, so equal keys keep their first-seen order.
    categories.sort_by(|a, b| {
        a.status
            .priority()
            .cmp(&b.status.priority())
            .then_with(|| a.display_name.cmp(&b.display_name))
    });

    let total_budgeted: Decimal = allocations.iter().map(|a| a.amount).sum();
    let total_spent: Decimal = transactions.iter().map(|t| t.amount).sum();

    debug!(
        "Aggregated {} allocations and {} transactions into {} categories",
        allocations.len(),
        transactions.len(),
        categories.len()
    );

    Ok(BudgetOverview {
        categories,
        total_budgeted,
        total_spent,
        total_remaining: total_budgeted - total_spent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::{CategoryKind, EXPENSE_CATEGORIES};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn october() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()
    }

    fn allocation(key: &str, amount: Decimal) -> BudgetAllocation {
        BudgetAllocation {
            id: Some(format!("b-{}", key)),
            category_key: key.to_string(),
            amount,
            period_start: october(),
        }
    }

    fn transaction(id: &str, key: &str, amount: Decimal) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            category_key: key.to_string(),
            amount,
            occurred_on: NaiveDate::from_ymd_opt(2026, 10, 12).unwrap(),
        }
    }

    #[test]
    fn test_overspent_sorts_before_unplanned() {
        let overview = aggregate(
            &[allocation("food", dec!(1000))],
            &[
                transaction("1", "food", dec!(1200)),
                transaction("2", "transport", dec!(300)),
            ],
            EXPENSE_CATEGORIES,
        )
        .unwrap();

        assert_eq!(overview.categories.len(), 2);
        let food = &overview.categories[0];
        assert_eq!(food.category_key, "food");
        assert_eq!(food.budgeted, dec!(1000));
        assert_eq!(food.spent, dec!(1200));
        assert_eq!(food.remaining, dec!(-200));
        assert_eq!(food.status, SummaryStatus::Overspent);

        let transport = &overview.categories[1];
        assert_eq!(transport.category_key, "transport");
        assert_eq!(transport.budgeted, Decimal::ZERO);
        assert_eq!(transport.spent, dec!(300));
        assert_eq!(transport.status, SummaryStatus::Unplanned);

        assert_eq!(overview.total_budgeted, dec!(1000));
        assert_eq!(overview.total_spent, dec!(1500));
        assert_eq!(overview.total_remaining, dec!(-500));
    }

    #[test]
    fn test_empty_input_is_empty_overview() {
        let overview = aggregate(&[], &[], EXPENSE_CATEGORIES).unwrap();
        assert!(overview.categories.is_empty());
        assert_eq!(overview.total_budgeted, Decimal::ZERO);
        assert_eq!(overview.total_spent, Decimal::ZERO);
    }

    #[test]
    fn test_zero_allocation_without_spending_is_no_budget() {
        let overview =
            aggregate(&[allocation("travel", dec!(0))], &[], EXPENSE_CATEGORIES).unwrap();
        assert_eq!(overview.categories.len(), 1);
        assert_eq!(overview.categories[0].status, SummaryStatus::NoBudget);
    }

    #[test]
    fn test_sums_transactions_per_category() {
        let overview = aggregate(
            &[allocation("food", dec!(500))],
            &[
                transaction("1", "food", dec!(120.50)),
                transaction("2", "food", dec!(79.50)),
            ],
            EXPENSE_CATEGORIES,
        )
        .unwrap();
        assert_eq!(overview.categories[0].spent, dec!(200.00));
        assert_eq!(overview.categories[0].status, SummaryStatus::OnTrack);
        assert_eq!(overview.categories[0].remaining, dec!(300.00));
    }

    #[test]
    fn test_unknown_category_keeps_raw_key() {
        let overview = aggregate(
            &[],
            &[transaction("1", "pets", dec!(40))],
            EXPENSE_CATEGORIES,
        )
        .unwrap();
        assert_eq!(overview.categories[0].category_key, "pets");
        assert_eq!(overview.categories[0].display_name, "pets");
        assert_eq!(overview.total_spent, dec!(40));
    }

    #[test]
    fn test_ties_break_on_display_name() {
        // Display names: "Travel", "Entertainment", "Food & Dining".
        let overview = aggregate(
            &[
                allocation("travel", dec!(100)),
                allocation("entertainment", dec!(100)),
                allocation("food", dec!(100)),
            ],
            &[],
            EXPENSE_CATEGORIES,
        )
        .unwrap();
        let names: Vec<&str> = overview
            .categories
            .iter()
            .map(|c| c.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["Entertainment", "Food & Dining", "Travel"]);
    }

    #[test]
    fn test_ordinal_comparison_puts_uppercase_first() {
        let taxonomy = [
            Category {
                key: "a",
                display_name: "apple",
                icon: "",
                color: "",
                kind: CategoryKind::Expense,
            },
            Category {
                key: "b",
                display_name: "Zebra",
                icon: "",
                color: "",
                kind: CategoryKind::Expense,
            },
        ];
        let overview = aggregate(
            &[allocation("a", dec!(1)), allocation("b", dec!(1))],
            &[],
            &taxonomy,
        )
        .unwrap();
        assert_eq!(overview.categories[0].display_name, "Zebra");
        assert_eq!(overview.categories[1].display_name, "apple");
    }

    #[test]
    fn test_equal_names_keep_input_order() {
        let taxonomy = [
            Category {
                key: "x",
                display_name: "Same",
                icon: "",
                color: "",
                kind: CategoryKind::Expense,
            },
            Category {
                key: "y",
                display_name: "Same",
                icon: "",
                color: "",
                kind: CategoryKind::Expense,
            },
        ];
        let overview = aggregate(
            &[allocation("y", dec!(10)), allocation("x", dec!(10))],
            &[],
            &taxonomy,
        )
        .unwrap();
        let keys: Vec<&str> = overview
            .categories
            .iter()
            .map(|c| c.category_key.as_str())
            .collect();
        assert_eq!(keys, vec!["y", "x"]);
    }

    #[test]
    fn test_duplicate_allocation_is_an_error() {
        let result = aggregate(
            &[allocation("food", dec!(100)), allocation("food", dec!(200))],
            &[],
            EXPENSE_CATEGORIES,
        );
        match result {
            Err(BudgetError::DuplicateAllocation {
                category_key, ids, ..
            }) => {
                assert_eq!(category_key, "food");
                assert_eq!(ids.len(), 2);
            }
            other => panic!("expected duplicate error, got {:?}", other),
        }
    }

    #[test]
    fn test_mixed_periods_are_rejected() {
        let mut november = allocation("transport", dec!(50));
        november.period_start = NaiveDate::from_ymd_opt(2026, 11, 1).unwrap();
        let result = aggregate(
            &[allocation("food", dec!(100)), november],
            &[],
            EXPENSE_CATEGORIES,
        );
        assert!(matches!(result, Err(BudgetError::MixedPeriods { .. })));
    }

    #[test]
    fn test_negative_allocation_is_rejected() {
        let result = aggregate(&[allocation("food", dec!(-1))], &[], EXPENSE_CATEGORIES);
        assert!(matches!(result, Err(BudgetError::NegativeAmount { .. })));
    }
}
