//! Budget engine settings.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_CONCURRENT_WRITES;
use crate::errors::{Error, Result};

pub const ENV_USER_ID: &str = "BF_USER_ID";
pub const ENV_APPLY_MODE: &str = "BF_APPLY_MODE";
pub const ENV_MAX_CONCURRENT_WRITES: &str = "BF_MAX_CONCURRENT_WRITES";

/// How reconciliation ops are sent to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyMode {
    /// One op at a time, in reconciler order.
    Sequential,
    /// Up to `max_concurrent_writes` ops in flight.
    Concurrent,
}

impl FromStr for ApplyMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(ApplyMode::Sequential),
            "concurrent" => Ok(ApplyMode::Concurrent),
            other => Err(Error::InvalidConfigValue(format!(
                "{}: expected 'sequential' or 'concurrent', got '{}'",
                ENV_APPLY_MODE, other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSettings {
    /// Owner of every row read or written.
    pub user_id: String,
    pub apply_mode: ApplyMode,
    pub max_concurrent_writes: usize,
}

impl BudgetSettings {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            apply_mode: ApplyMode::Sequential,
            max_concurrent_writes: DEFAULT_MAX_CONCURRENT_WRITES,
        }
    }

    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup. `BF_USER_ID` is required.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let user_id = lookup(ENV_USER_ID)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::MissingConfigKey(ENV_USER_ID.to_string()))?;

        let mut settings = Self::new(user_id.trim());

        if let Some(mode) = lookup(ENV_APPLY_MODE) {
            settings.apply_mode = mode.parse()?;
        }

        if let Some(raw) = lookup(ENV_MAX_CONCURRENT_WRITES) {
            let max = raw.trim().parse::<usize>().map_err(|_| {
                Error::InvalidConfigValue(format!(
                    "{}: expected a positive integer, got '{}'",
                    ENV_MAX_CONCURRENT_WRITES, raw
                ))
            })?;
            if max == 0 {
                return Err(Error::InvalidConfigValue(format!(
                    "{} must be at least 1",
                    ENV_MAX_CONCURRENT_WRITES
                )));
            }
            settings.max_concurrent_writes = max;
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_only_user_is_set() {
        let settings = BudgetSettings::from_lookup(lookup(&[(ENV_USER_ID, "u-1")])).unwrap();
        assert_eq!(settings, BudgetSettings::new("u-1"));
        assert_eq!(settings.apply_mode, ApplyMode::Sequential);
    }

    #[test]
    fn test_missing_user_is_an_error() {
        let err = BudgetSettings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::MissingConfigKey(ref k) if k == ENV_USER_ID));
    }

    #[test]
    fn test_parses_concurrency_settings() {
        let settings = BudgetSettings::from_lookup(lookup(&[
            (ENV_USER_ID, "u-1"),
            (ENV_APPLY_MODE, "Concurrent"),
            (ENV_MAX_CONCURRENT_WRITES, "8"),
        ]))
        .unwrap();
        assert_eq!(settings.apply_mode, ApplyMode::Concurrent);
        assert_eq!(settings.max_concurrent_writes, 8);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(BudgetSettings::from_lookup(lookup(&[
            (ENV_USER_ID, "u-1"),
            (ENV_APPLY_MODE, "parallel"),
        ]))
        .is_err());
        assert!(BudgetSettings::from_lookup(lookup(&[
            (ENV_USER_ID, "u-1"),
            (ENV_MAX_CONCURRENT_WRITES, "0"),
        ]))
        .is_err());
    }
}
