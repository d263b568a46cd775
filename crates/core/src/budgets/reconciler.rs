//! Budget edit reconciliation.
//!
//! Diffs an edited category -> amount map against the persisted one and
//! emits the smallest set of row writes that makes the store match it.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use log::debug;
use rust_decimal::Decimal;

use super::budgets_model::ReconciliationOp;
use crate::categories::{taxonomy_position, Category};
use crate::period::BudgetPeriod;

/// Orders keys by taxonomy position; unknown keys follow in ordinal order.
fn ordered_keys<'a>(
    taxonomy: &[Category],
    original: &'a HashMap<String, Decimal>,
    edited: &'a HashMap<String, Decimal>,
) -> Vec<&'a str> {
    let mut keys: Vec<&str> = original
        .keys()
        .chain(edited.keys())
        .map(String::as_str)
        .collect::<HashSet<&str>>()
        .into_iter()
        .collect();

    keys.sort_by(|a, b| {
        match (taxonomy_position(taxonomy, a), taxonomy_position(taxonomy, b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    });
    keys
}

/// Computes the op for a single category.
fn reconcile_key(
    key: &str,
    period: &BudgetPeriod,
    original: &HashMap<String, Decimal>,
    original_ids: &HashMap<String, String>,
    edited: &HashMap<String, Decimal>,
) -> ReconciliationOp {
    let before = original.get(key).copied().unwrap_or(Decimal::ZERO);
    let after = edited.get(key).copied().unwrap_or(Decimal::ZERO);

    // Decimal equality is numeric, so 100 and 100.00 compare equal.
    if before == after {
        return ReconciliationOp::Skip {
            category_key: key.to_string(),
        };
    }

    match (after > Decimal::ZERO, original_ids.get(key)) {
        (true, Some(id)) => ReconciliationOp::Update {
            id: id.clone(),
            category_key: key.to_string(),
            amount: after,
        },
        (true, None) => ReconciliationOp::Insert {
            category_key: key.to_string(),
            amount: after,
            period_start: period.start(),
        },
        (false, Some(id)) => ReconciliationOp::Delete {
            id: id.clone(),
            category_key: key.to_string(),
        },
        // Nothing persisted to delete.
        (false, None) => ReconciliationOp::Skip {
            category_key: key.to_string(),
        },
    }
}

/// Diffs `edited` against `original` and returns one op per category key.
///
/// Keys are the union of both maps, in `taxonomy` order. Categories whose
/// amount did not change always get `Skip`, so the number of non-skip ops is
/// bounded by the number of changed categories. Ids in `original_ids` with no
/// matching amount key are ignored. No input is mutated.
pub fn reconcile(
    taxonomy: &[Category],
    period: BudgetPeriod,
    original: &HashMap<String, Decimal>,
    original_ids: &HashMap<String, String>,
    edited: &HashMap<String, Decimal>,
) -> Vec<ReconciliationOp> {
    let ops: Vec<ReconciliationOp> = ordered_keys(taxonomy, original, edited)
        .into_iter()
        .map(|key| reconcile_key(key, &period, original, original_ids, edited))
        .collect();

    debug!(
        "Reconciled {} categories for {}: {} writes",
        ops.len(),
        period,
        ops.iter().filter(|op| !op.is_skip()).count()
    );

    ops
}
