use crate::errors::Result;
use async_trait::async_trait;

use super::store_model::{Filter, OrderBy, Row};

/// Read side of the relational store.
#[async_trait]
pub trait RowReaderTrait: Send + Sync {
    /// Rows of `table` matching every filter, ordered by `order_by` if given.
    async fn fetch_rows(
        &self,
        table: &str,
        filters: &[Filter],
        order_by: Option<&OrderBy>,
    ) -> Result<Vec<Row>>;
}

/// Write side of the relational store. Each call is one round-trip for one row.
#[async_trait]
pub trait RowWriterTrait: Send + Sync {
    /// Inserts `row` and returns it as stored (including its generated id).
    async fn insert(&self, table: &str, row: Row) -> Result<Row>;

    /// Applies the columns in `row` to the row with `id`.
    async fn update(&self, table: &str, row: Row, id: &str) -> Result<()>;

    async fn delete(&self, table: &str, id: &str) -> Result<()>;
}
