use std::path::PathBuf;

use anyhow::{anyhow, Context};
use budgetflow_core::period::BudgetPeriod;

pub const ENV_FIXTURE: &str = "BF_FIXTURE";
pub const ENV_PERIOD: &str = "BF_PERIOD";
pub const ENV_EDITS: &str = "BF_EDITS";
pub const ENV_RETRY: &str = "BF_RETRY_FAILED";

#[derive(Debug, Clone)]
pub struct Config {
    /// JSON file holding the `budgets` and `expenses` rows to seed.
    pub fixture_path: PathBuf,
    pub period: BudgetPeriod,
    /// Optional JSON map of category key to new budget amount.
    pub edits_path: Option<PathBuf>,
    pub retry_failed: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let today = chrono::Local::now().date_naive();
        Self::from_lookup(|key| std::env::var(key).ok(), BudgetPeriod::from_date(today)?)
    }

    /// `current` is used when no period is configured.
    pub fn from_lookup<F>(lookup: F, current: BudgetPeriod) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fixture_path = lookup(ENV_FIXTURE)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("{} must point to a fixture file", ENV_FIXTURE))?;

        let period = match lookup(ENV_PERIOD).filter(|v| !v.trim().is_empty()) {
            Some(raw) => BudgetPeriod::parse(raw.trim())
                .with_context(|| format!("invalid {}: {}", ENV_PERIOD, raw))?,
            None => current,
        };

        let edits_path = lookup(ENV_EDITS)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let retry_failed = lookup(ENV_RETRY)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Config {
            fixture_path,
            period,
            edits_path,
            retry_failed,
        })
    }
}
