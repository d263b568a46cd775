use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::{debug, warn};
use rust_decimal::Decimal;
use tokio::sync::watch;

use super::aggregator::aggregate;
use super::budgets_model::{
    ApplyReport, BudgetAllocation, BudgetSnapshot, FailedOp, LoadOutcome, LoadedBudget,
    ReconciliationOp, TransactionRecord,
};
use super::budgets_traits::BudgetServiceTrait;
use super::reconciler::reconcile;
use crate::categories::{Category, EXPENSE_CATEGORIES};
use crate::constants::{
    BUDGETS_TABLE, COL_CATEGORY, COL_OCCURRED_ON, COL_PERIOD_START, COL_USER_ID, EXPENSES_TABLE,
};
use crate::errors::{Error, Result, ValidationError};
use crate::events::{DomainEvent, DomainEventSink};
use crate::period::BudgetPeriod;
use crate::settings::{ApplyMode, BudgetSettings};
use crate::store::{
    allocation_from_row, allocation_insert_row, allocation_update_row, transaction_from_row,
    Filter, OrderBy, RowReaderTrait, RowWriterTrait,
};

/// Resolves once a load newer than `ticket` has been issued.
async fn wait_for_newer(rx: &mut watch::Receiver<u64>, ticket: u64) {
    loop {
        if *rx.borrow_and_update() != ticket {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender gone: nothing can supersede us any more.
            futures::future::pending::<()>().await;
        }
    }
}

fn validate_edits(edits: &HashMap<String, Decimal>) -> Result<()> {
    if let Some((key, amount)) = edits.iter().find(|(_, amount)| **amount < Decimal::ZERO) {
        return Err(Error::Validation(ValidationError::InvalidInput(format!(
            "Budget for '{}' cannot be negative ({})",
            key, amount
        ))));
    }
    Ok(())
}

/// Host-side orchestration around the pure reconcile/aggregate engine.
pub struct BudgetService {
    reader: Arc<dyn RowReaderTrait>,
    writer: Arc<dyn RowWriterTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    settings: BudgetSettings,
    taxonomy: &'static [Category],
    /// Generation of the most recent `load_period` call.
    latest_load: watch::Sender<u64>,
}

impl BudgetService {
    pub fn new(
        reader: Arc<dyn RowReaderTrait>,
        writer: Arc<dyn RowWriterTrait>,
        event_sink: Arc<dyn DomainEventSink>,
        settings: BudgetSettings,
    ) -> Self {
        let (latest_load, _) = watch::channel(0);
        BudgetService {
            reader,
            writer,
            event_sink,
            settings,
            taxonomy: EXPENSE_CATEGORIES,
            latest_load,
        }
    }

    /// Replaces the expense taxonomy used for ordering and display names.
    pub fn with_taxonomy(mut self, taxonomy: &'static [Category]) -> Self {
        self.taxonomy = taxonomy;
        self
    }

    async fn fetch_allocations(&self, period: BudgetPeriod) -> Result<Vec<BudgetAllocation>> {
        let filters = [
            Filter::eq(COL_USER_ID, self.settings.user_id.as_str()),
            Filter::eq(COL_PERIOD_START, period.start_key()),
        ];
        let rows = self
            .reader
            .fetch_rows(BUDGETS_TABLE, &filters, Some(&OrderBy::asc(COL_CATEGORY)))
            .await?;
        rows.iter().map(allocation_from_row).collect()
    }

    async fn fetch_transactions(&self, period: BudgetPeriod) -> Result<Vec<TransactionRecord>> {
        let filters = [
            Filter::eq(COL_USER_ID, self.settings.user_id.as_str()),
            Filter::gte(COL_OCCURRED_ON, period.start_key()),
            Filter::lt(COL_OCCURRED_ON, period.next_start_key()),
        ];
        let rows = self
            .reader
            .fetch_rows(
                EXPENSES_TABLE,
                &filters,
                Some(&OrderBy::desc(COL_OCCURRED_ON)),
            )
            .await?;
        rows.iter().map(transaction_from_row).collect()
    }

    fn is_current(&self, ticket: u64) -> bool {
        *self.latest_load.borrow() == ticket
    }

    /// Maps one op to exactly one store call.
    async fn execute_op(&self, op: &ReconciliationOp) -> Result<()> {
        match op {
            ReconciliationOp::Insert {
                category_key,
                amount,
                period_start,
            } => {
                let period = BudgetPeriod::from_date(*period_start)?;
                let row =
                    allocation_insert_row(&self.settings.user_id, category_key, *amount, &period);
                self.writer.insert(BUDGETS_TABLE, row).await.map(|_| ())
            }
            ReconciliationOp::Update { id, amount, .. } => {
                self.writer
                    .update(BUDGETS_TABLE, allocation_update_row(*amount), id)
                    .await
            }
            ReconciliationOp::Delete { id, .. } => self.writer.delete(BUDGETS_TABLE, id).await,
            ReconciliationOp::Skip { .. } => Ok(()),
        }
    }

    /// Runs every op; a failure is recorded and never stops its siblings.
    async fn execute_ops(
        &self,
        period: BudgetPeriod,
        ops: Vec<ReconciliationOp>,
        skipped: usize,
    ) -> ApplyReport {
        debug!(
            "Applying {} budget writes for {} ({:?})",
            ops.len(),
            period,
            self.settings.apply_mode
        );

        let results: Vec<(ReconciliationOp, Result<()>)> = match self.settings.apply_mode {
            ApplyMode::Sequential => {
                let mut results = Vec::with_capacity(ops.len());
                for op in ops {
                    let result = self.execute_op(&op).await;
                    results.push((op, result));
                }
                results
            }
            ApplyMode::Concurrent => {
                stream::iter(ops.into_iter().map(|op| async move {
                    let result = self.execute_op(&op).await;
                    (op, result)
                }))
                .buffered(self.settings.max_concurrent_writes.max(1))
                .collect()
                .await
            }
        };

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for (op, result) in results {
            match result {
                Ok(()) => succeeded.push(op),
                Err(e) => {
                    warn!(
                        "Budget {} for '{}' in {} failed: {}",
                        op.kind(),
                        op.category_key(),
                        period,
                        e
                    );
                    failed.push(FailedOp {
                        op,
                        error: e.to_string(),
                    });
                }
            }
        }

        if !succeeded.is_empty() {
            let keys = succeeded
                .iter()
                .map(|op| op.category_key().to_string())
                .collect();
            self.event_sink.emit(DomainEvent::budget_allocations_changed(
                period.start_key(),
                keys,
            ));
        }

        ApplyReport {
            period,
            succeeded,
            failed,
            skipped,
        }
    }
}

#[async_trait]
impl BudgetServiceTrait for BudgetService {
    async fn load_period(&self, period: BudgetPeriod) -> Result<LoadOutcome> {
        let mut ticket = 0;
        self.latest_load.send_modify(|generation| {
            *generation += 1;
            ticket = *generation;
        });
        let mut newer = self.latest_load.subscribe();

        // Both fetches must finish before aggregating; partial data is never used.
        let fetch = async {
            futures::try_join!(
                self.fetch_allocations(period),
                self.fetch_transactions(period)
            )
        };

        let fetched = tokio::select! {
            fetched = fetch => fetched,
            _ = wait_for_newer(&mut newer, ticket) => {
                debug!("Load of {} cancelled by a newer request", period);
                return Ok(LoadOutcome::Superseded);
            }
        };

        if !self.is_current(ticket) {
            debug!("Discarding result of superseded load of {}", period);
            return Ok(LoadOutcome::Superseded);
        }

        let (allocations, transactions) = fetched?;
        let overview = aggregate(&allocations, &transactions, self.taxonomy)?;
        let snapshot = BudgetSnapshot::from_allocations(period, self.taxonomy, &allocations)?;

        Ok(LoadOutcome::Loaded(LoadedBudget {
            period,
            overview,
            snapshot,
        }))
    }

    async fn apply_edits(
        &self,
        snapshot: &BudgetSnapshot,
        edits: &HashMap<String, Decimal>,
    ) -> Result<ApplyReport> {
        validate_edits(edits)?;

        let edited = snapshot.edited_with(edits);
        let ops = reconcile(
            self.taxonomy,
            snapshot.period,
            &snapshot.amounts,
            &snapshot.ids,
            &edited,
        );
        let (skips, writes): (Vec<_>, Vec<_>) = ops.into_iter().partition(|op| op.is_skip());

        Ok(self.execute_ops(snapshot.period, writes, skips.len()).await)
    }

    async fn retry_failed(&self, report: &ApplyReport) -> Result<ApplyReport> {
        let ops = report.failed.iter().map(|f| f.op.clone()).collect();
        Ok(self.execute_ops(report.period, ops, 0).await)
    }
}
