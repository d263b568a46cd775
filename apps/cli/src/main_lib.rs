use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use anyhow::bail;
use budgetflow_core::{
    budgets::{
        ApplyReport, BudgetOverview, BudgetService, BudgetServiceTrait, LoadOutcome, LoadedBudget,
    },
    categories::{find_category, CategoryKind},
    constants::{BUDGETS_TABLE, EXPENSES_TABLE},
    events::{ChannelDomainEventSink, DomainEvent},
    period::BudgetPeriod,
    settings::BudgetSettings,
    store::InMemoryRowStore,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::fixture::{load_edits, load_fixture};

pub fn init_tracing() {
    let log_format = std::env::var("BF_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub struct AppState {
    pub store: Arc<InMemoryRowStore>,
    pub budget_service: Arc<dyn BudgetServiceTrait>,
    pub events: UnboundedReceiver<DomainEvent>,
}

pub fn build_state(config: &Config, settings: BudgetSettings) -> anyhow::Result<AppState> {
    let fixture = load_fixture(&config.fixture_path)?;
    tracing::info!(
        "Seeding {} budget rows and {} expense rows from {}",
        fixture.budgets.len(),
        fixture.expenses.len(),
        config.fixture_path.display()
    );

    let store = Arc::new(InMemoryRowStore::new());
    store.seed(BUDGETS_TABLE, fixture.budgets)?;
    store.seed(EXPENSES_TABLE, fixture.expenses)?;

    let (sink, events) = ChannelDomainEventSink::channel();
    let budget_service = Arc::new(BudgetService::new(
        store.clone(),
        store.clone(),
        Arc::new(sink),
        settings,
    ));

    Ok(AppState {
        store,
        budget_service,
        events,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OverviewOutput<'a> {
    period: BudgetPeriod,
    overview: &'a BudgetOverview,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn load(
    service: &dyn BudgetServiceTrait,
    period: BudgetPeriod,
) -> anyhow::Result<LoadedBudget> {
    match service.load_period(period).await? {
        LoadOutcome::Loaded(loaded) => Ok(loaded),
        LoadOutcome::Superseded => bail!("load of {} was superseded", period),
    }
}

fn log_report(report: &ApplyReport) {
    if report.is_complete() {
        tracing::info!(
            "Saved {} budget changes for {} ({} unchanged)",
            report.succeeded.len(),
            report.period,
            report.skipped
        );
    } else {
        tracing::warn!(
            "{} of {} budget changes for {} failed: {}",
            report.failed.len(),
            report.failed.len() + report.succeeded.len(),
            report.period,
            report.failed_categories().join(", ")
        );
    }
}

/// Edit keys outside the expense taxonomy, sorted. They are still applied.
fn warn_unlisted_edit_keys(edits: &HashMap<String, Decimal>) -> Vec<String> {
    let mut keys: Vec<String> = edits
        .keys()
        .filter(|key| match find_category(key) {
            Some(category) if category.kind == CategoryKind::Expense => false,
            Some(_) => {
                tracing::warn!("Edit for '{}' targets an income category", key);
                true
            }
            None => {
                tracing::warn!("Edit for '{}' targets an unknown category", key);
                true
            }
        })
        .cloned()
        .collect();
    keys.sort();
    keys
}

/// Periods named by the change notifications received so far.
fn drain_changed_periods(
    events: &mut UnboundedReceiver<DomainEvent>,
) -> anyhow::Result<BTreeSet<BudgetPeriod>> {
    let mut periods = BTreeSet::new();
    while let Ok(event) = events.try_recv() {
        match event {
            DomainEvent::BudgetAllocationsChanged {
                period_start,
                category_keys,
            } => {
                tracing::debug!(
                    "Budgets changed for {}: {}",
                    period_start,
                    category_keys.join(", ")
                );
                periods.insert(BudgetPeriod::parse(&period_start)?);
            }
        }
    }
    Ok(periods)
}

/// Returns the apply report of every round run, retry included.
pub async fn run(config: &Config, state: &mut AppState) -> anyhow::Result<Vec<ApplyReport>> {
    let service = state.budget_service.as_ref();

    let loaded = load(service, config.period).await?;
    print_json(&OverviewOutput {
        period: loaded.period,
        overview: &loaded.overview,
    })?;

    let Some(edits_path) = &config.edits_path else {
        return Ok(Vec::new());
    };
    let edits = load_edits(edits_path)?;
    warn_unlisted_edit_keys(&edits);

    let report = service.apply_edits(&loaded.snapshot, &edits).await?;
    log_report(&report);
    print_json(&report)?;

    let retry = if config.retry_failed && !report.is_complete() {
        tracing::info!("Retrying {} failed budget changes", report.failed.len());
        let retry = service.retry_failed(&report).await?;
        log_report(&retry);
        print_json(&retry)?;
        Some(retry)
    } else {
        None
    };
    let rounds: Vec<ApplyReport> = std::iter::once(report).chain(retry).collect();

    // Refetch every period a change notification named.
    for period in drain_changed_periods(&mut state.events)? {
        let refreshed = load(service, period).await?;
        print_json(&OverviewOutput {
            period: refreshed.period,
            overview: &refreshed.overview,
        })?;
    }

    tracing::debug!("{} store writes issued", state.store.write_count());
    Ok(rounds)
}
