//! Category domain models.

use serde::{Deserialize, Serialize};

/// Whether a category classifies money going out or coming in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryKind {
    Expense,
    Income,
}

/// Static metadata for one entry of the fixed category taxonomy.
///
/// `key` is the canonical value stored in the `category` column. It never
/// changes with the display language; `display_name` may.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub key: &'static str,
    pub display_name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub kind: CategoryKind,
}

impl Category {
    pub const fn expense(
        key: &'static str,
        display_name: &'static str,
        icon: &'static str,
        color: &'static str,
    ) -> Self {
        Self {
            key,
            display_name,
            icon,
            color,
            kind: CategoryKind::Expense,
        }
    }

    pub const fn income(
        key: &'static str,
        display_name: &'static str,
        icon: &'static str,
        color: &'static str,
    ) -> Self {
        Self {
            key,
            display_name,
            icon,
            color,
            kind: CategoryKind::Income,
        }
    }
}
