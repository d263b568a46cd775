//! In-memory row store.
//!
//! Implements both store traits over a map of tables. Used by tests and the
//! CLI; it can also be told to fail writes touching chosen categories.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::store_model::{Filter, FilterOp, OrderBy, Row};
use super::store_traits::{RowReaderTrait, RowWriterTrait};
use crate::constants::{COL_CATEGORY, COL_ID};
use crate::errors::{DatabaseError, Error, Result};

fn lock_error<T>(_: T) -> Error {
    Error::Database(DatabaseError::Internal("store lock poisoned".to_string()))
}

fn id_of(row: &Row) -> Option<String> {
    match row.get(COL_ID)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ if left == right => Some(Ordering::Equal),
        _ => None,
    }
}

fn row_matches(row: &Row, filter: &Filter) -> bool {
    let Some(value) = row.get(&filter.column) else {
        return false;
    };
    match (filter.op, compare_values(value, &filter.value)) {
        (FilterOp::Eq, Some(Ordering::Equal)) => true,
        (FilterOp::Gte, Some(Ordering::Equal | Ordering::Greater)) => true,
        (FilterOp::Lt, Some(Ordering::Less)) => true,
        _ => false,
    }
}

#[derive(Default)]
pub struct InMemoryRowStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    writes: AtomicUsize,
    /// Injected failures per category; `None` fails until cleared, `Some(n)`
    /// fails the next `n` writes.
    failures: RwLock<HashMap<String, Option<usize>>>,
}

impl InMemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds rows to `table` as-is. Rows without an id get a generated one.
    pub fn seed(&self, table: &str, rows: Vec<Row>) -> Result<()> {
        let mut tables = self.tables.write().map_err(lock_error)?;
        let entries = tables.entry(table.to_string()).or_default();
        for mut row in rows {
            if id_of(&row).is_none() {
                row.insert(COL_ID.to_string(), Value::from(self.generate_id()));
            }
            entries.push(row);
        }
        Ok(())
    }

    /// Snapshot of every row currently in `table`.
    pub fn rows(&self, table: &str) -> Result<Vec<Row>> {
        let tables = self.tables.read().map_err(lock_error)?;
        Ok(tables.get(table).cloned().unwrap_or_default())
    }

    /// Number of insert/update/delete calls attempted so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(AtomicOrdering::SeqCst)
    }

    /// Makes every write touching `category_key` fail until cleared.
    pub fn fail_category(&self, category_key: &str) -> Result<()> {
        self.failures
            .write()
            .map_err(lock_error)?
            .insert(category_key.to_string(), None);
        Ok(())
    }

    /// Makes only the next `times` writes touching `category_key` fail.
    pub fn fail_category_times(&self, category_key: &str, times: usize) -> Result<()> {
        self.failures
            .write()
            .map_err(lock_error)?
            .insert(category_key.to_string(), Some(times));
        Ok(())
    }

    pub fn clear_failures(&self) -> Result<()> {
        self.failures.write().map_err(lock_error)?.clear();
        Ok(())
    }

    fn generate_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    fn check_failure(&self, row: &Row) -> Result<()> {
        let Some(key) = row.get(COL_CATEGORY).and_then(Value::as_str) else {
            return Ok(());
        };
        let mut failures = self.failures.write().map_err(lock_error)?;
        let fail = match failures.get_mut(key) {
            Some(None) => true,
            Some(Some(remaining)) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        };
        if fail {
            return Err(Error::Database(DatabaseError::ConnectionFailed(format!(
                "simulated failure for '{}'",
                key
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl RowReaderTrait for InMemoryRowStore {
    async fn fetch_rows(
        &self,
        table: &str,
        filters: &[Filter],
        order_by: Option<&OrderBy>,
    ) -> Result<Vec<Row>> {
        let tables = self.tables.read().map_err(lock_error)?;
        let mut rows: Vec<Row> = tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| filters.iter().all(|f| row_matches(row, f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = order_by {
            rows.sort_by(|a, b| {
                let ordering = match (a.get(&order.column), b.get(&order.column)) {
                    (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }
        Ok(rows)
    }
}

#[async_trait]
impl RowWriterTrait for InMemoryRowStore {
    async fn insert(&self, table: &str, mut row: Row) -> Result<Row> {
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        self.check_failure(&row)?;
        let mut tables = self.tables.write().map_err(lock_error)?;
        let rows = tables.entry(table.to_string()).or_default();
        match id_of(&row) {
            Some(id) if rows.iter().any(|r| id_of(r).as_deref() == Some(id.as_str())) => {
                return Err(Error::Database(DatabaseError::UniqueViolation(format!(
                    "{} row {}",
                    table, id
                ))));
            }
            Some(_) => {}
            None => {
                row.insert(COL_ID.to_string(), Value::from(self.generate_id()));
            }
        }
        rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, row: Row, id: &str) -> Result<()> {
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        let mut tables = self.tables.write().map_err(lock_error)?;
        let existing = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| id_of(r).as_deref() == Some(id)))
            .ok_or_else(|| {
                Error::Database(DatabaseError::NotFound(format!("{} row {}", table, id)))
            })?;
        self.check_failure(existing)?;
        for (column, value) in row {
            existing.insert(column, value);
        }
        Ok(())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<()> {
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        let mut tables = self.tables.write().map_err(lock_error)?;
        let rows = tables.get_mut(table).ok_or_else(|| {
            Error::Database(DatabaseError::NotFound(format!("{} row {}", table, id)))
        })?;
        let position = rows
            .iter()
            .position(|r| id_of(r).as_deref() == Some(id))
            .ok_or_else(|| {
                Error::Database(DatabaseError::NotFound(format!("{} row {}", table, id)))
            })?;
        self.check_failure(&rows[position])?;
        rows.remove(position);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn seeded() -> InMemoryRowStore {
        let store = InMemoryRowStore::new();
        store
            .seed(
                "expenses",
                vec![
                    row(json!({"id": "1", "category": "food", "date": "2026-09-30"})),
                    row(json!({"id": "2", "category": "food", "date": "2026-10-01"})),
                    row(json!({"id": "3", "category": "travel", "date": "2026-10-31"})),
                    row(json!({"id": "4", "category": "food", "date": "2026-11-01"})),
                ],
            )
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_range_filters_are_half_open() {
        let store = seeded();
        let rows = store
            .fetch_rows(
                "expenses",
                &[
                    Filter::gte("date", "2026-10-01"),
                    Filter::lt("date", "2026-11-01"),
                ],
                Some(&OrderBy::desc("date")),
            )
            .await
            .unwrap();
        let ids: Vec<String> = rows.iter().filter_map(id_of).collect();
        assert_eq!(ids, vec!["3", "2"]);
    }

    #[tokio::test]
    async fn test_filters_are_conjunctive() {
        let store = seeded();
        let rows = store
            .fetch_rows(
                "expenses",
                &[Filter::eq("category", "food"), Filter::gte("date", "2026-10-01")],
                None,
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_write_cycle_and_failure_injection() {
        let store = InMemoryRowStore::new();
        let inserted = store
            .insert("budgets", row(json!({"category": "food", "amount": "10"})))
            .await
            .unwrap();
        let id = id_of(&inserted).unwrap();

        store
            .update("budgets", row(json!({"amount": "20"})), &id)
            .await
            .unwrap();
        assert_eq!(store.rows("budgets").unwrap()[0]["amount"], "20");

        store.fail_category("food").unwrap();
        assert!(store.delete("budgets", &id).await.is_err());
        store.clear_failures().unwrap();
        store.delete("budgets", &id).await.unwrap();

        assert!(store.rows("budgets").unwrap().is_empty());
        assert_eq!(store.write_count(), 4);
        assert!(matches!(
            store.delete("budgets", &id).await,
            Err(Error::Database(DatabaseError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_insert_with_existing_id_is_a_unique_violation() {
        let store = InMemoryRowStore::new();
        store
            .seed("budgets", vec![row(json!({"id": "7", "category": "food"}))])
            .unwrap();

        let result = store
            .insert("budgets", row(json!({"id": "7", "category": "travel"})))
            .await;

        assert!(matches!(
            result,
            Err(Error::Database(DatabaseError::UniqueViolation(_)))
        ));
        assert_eq!(store.rows("budgets").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_counted_failures_stop_after_their_budget() {
        let store = InMemoryRowStore::new();
        store.fail_category_times("food", 1).unwrap();

        let first = store
            .insert("budgets", row(json!({"category": "food", "amount": "10"})))
            .await;
        assert!(first.is_err());

        store
            .insert("budgets", row(json!({"category": "food", "amount": "10"})))
            .await
            .unwrap();
        assert_eq!(store.rows("budgets").unwrap().len(), 1);
        assert_eq!(store.write_count(), 2);
    }
}
