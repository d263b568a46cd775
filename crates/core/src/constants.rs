/// Table holding one budget allocation per category and month.
pub const BUDGETS_TABLE: &str = "budgets";

/// Table holding expense transactions.
pub const EXPENSES_TABLE: &str = "expenses";

/// Column names shared by the budget and expense tables.
pub const COL_ID: &str = "id";
pub const COL_USER_ID: &str = "user_id";
pub const COL_CATEGORY: &str = "category";
pub const COL_AMOUNT: &str = "amount";

/// First-of-month date string on budget rows (`YYYY-MM-01`).
pub const COL_PERIOD_START: &str = "month";

/// Calendar date of an expense row (`YYYY-MM-DD`).
pub const COL_OCCURRED_ON: &str = "date";

/// Date format used on the wire for every date column.
pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Default upper bound on concurrently executing write operations.
pub const DEFAULT_MAX_CONCURRENT_WRITES: usize = 4;
