//! The fixed category taxonomy and key lookups.

use super::category_model::Category;

/// Expense categories in display order. Budgets are only kept for these.
pub static EXPENSE_CATEGORIES: &[Category] = &[
    Category::expense("food", "Food & Dining", "fork.knife", "#F97316"),
    Category::expense("transport", "Transport", "car", "#3B82F6"),
    Category::expense("housing", "Housing", "house", "#8B5CF6"),
    Category::expense("utilities", "Bills & Utilities", "bolt", "#EAB308"),
    Category::expense("shopping", "Shopping", "bag", "#EC4899"),
    Category::expense("entertainment", "Entertainment", "film", "#14B8A6"),
    Category::expense("health", "Health", "heart", "#EF4444"),
    Category::expense("education", "Education", "book", "#6366F1"),
    Category::expense("travel", "Travel", "airplane", "#0EA5E9"),
    Category::expense("other", "Other", "ellipsis", "#6B7280"),
];

/// Income categories in display order.
pub static INCOME_CATEGORIES: &[Category] = &[
    Category::income("salary", "Salary", "banknote", "#22C55E"),
    Category::income("freelance", "Freelance", "laptop", "#10B981"),
    Category::income("investment", "Investments", "chart.line", "#84CC16"),
    Category::income("gift", "Gifts", "gift", "#F472B6"),
    Category::income("other_income", "Other Income", "plus.circle", "#9CA3AF"),
];

/// Looks up a category by its canonical key across both tables.
pub fn find_category(key: &str) -> Option<&'static Category> {
    EXPENSE_CATEGORIES
        .iter()
        .chain(INCOME_CATEGORIES.iter())
        .find(|c| c.key == key)
}

/// Display name for `key` in `taxonomy`, or the raw key when it is unknown.
pub fn display_name_for(taxonomy: &[Category], key: &str) -> String {
    taxonomy
        .iter()
        .find(|c| c.key == key)
        .map(|c| c.display_name.to_string())
        .unwrap_or_else(|| key.to_string())
}

/// Index of `key` in `taxonomy`, used as the canonical iteration order.
pub fn taxonomy_position(taxonomy: &[Category], key: &str) -> Option<usize> {
    taxonomy.iter().position(|c| c.key == key)
}
