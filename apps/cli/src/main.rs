mod config;
mod fixture;
mod main_lib;

use budgetflow_core::settings::BudgetSettings;
use config::Config;
use main_lib::{build_state, init_tracing, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();
    let settings = BudgetSettings::from_env()?;
    tracing::info!(
        "Loading budgets for {} (user {})",
        config.period,
        settings.user_id
    );
    let mut state = build_state(&config, settings)?;
    run(&config, &mut state).await?;
    Ok(())
}
