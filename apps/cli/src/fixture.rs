use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context};
use budgetflow_core::store::Row;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

/// Rows seeded into the in-memory store, keyed by table.
#[derive(Debug, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub budgets: Vec<Row>,
    #[serde(default)]
    pub expenses: Vec<Row>,
}

pub fn load_fixture(path: &Path) -> anyhow::Result<Fixture> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading fixture {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing fixture {}", path.display()))
}

pub fn load_edits(path: &Path) -> anyhow::Result<HashMap<String, Decimal>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading edits {}", path.display()))?;
    parse_edits(&text)
}

/// Accepts amounts as JSON strings or numbers.
pub fn parse_edits(text: &str) -> anyhow::Result<HashMap<String, Decimal>> {
    let raw: serde_json::Map<String, Value> =
        serde_json::from_str(text).context("edits must be a JSON object")?;

    let mut edits = HashMap::with_capacity(raw.len());
    for (key, value) in raw {
        let amount = match &value {
            Value::String(s) => Decimal::from_str(s.trim()),
            Value::Number(n) => {
                let s = n.to_string();
                Decimal::from_str(&s).or_else(|_| Decimal::from_scientific(&s))
            }
            other => bail!("edit for '{}' is not an amount: {}", key, other),
        }
        .with_context(|| format!("edit for '{}' is not a valid decimal: {}", key, value))?;
        edits.insert(key, amount);
    }
    Ok(edits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_parse_edits_accepts_strings_and_numbers() {
        let edits = parse_edits(r#"{"food": "1500.00", "travel": 250, "health": 12.5}"#).unwrap();
        assert_eq!(edits["food"], dec!(1500));
        assert_eq!(edits["travel"], dec!(250));
        assert_eq!(edits["health"], dec!(12.5));
    }

    #[test]
    fn test_parse_edits_rejects_non_amounts() {
        assert!(parse_edits(r#"{"food": true}"#).is_err());
        assert!(parse_edits(r#"{"food": "lots"}"#).is_err());
        assert!(parse_edits(r#"["food"]"#).is_err());
    }

    #[test]
    fn test_load_fixture_defaults_missing_tables() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"budgets": [{{"id": "1", "user_id": "u", "category": "food", "amount": "10", "month": "2026-10-01"}}]}}"#
        )
        .unwrap();

        let fixture = load_fixture(file.path()).unwrap();
        assert_eq!(fixture.budgets.len(), 1);
        assert!(fixture.expenses.is_empty());
    }

    #[test]
    fn test_load_fixture_reports_missing_file() {
        let err = load_fixture(Path::new("/nonexistent/fixture.json")).unwrap_err();
        assert!(err.to_string().contains("reading fixture"));
    }
}
