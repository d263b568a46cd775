//! Conversions between store rows and budget domain models.
//!
//! Amounts are written as decimal strings and accepted as either strings or
//! JSON numbers on read, so no float rounding sits between the store and the
//! exact comparisons done by the reconciler.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;

use super::store_model::Row;
use crate::budgets::{BudgetAllocation, TransactionRecord};
use crate::constants::{
    COL_AMOUNT, COL_CATEGORY, COL_ID, COL_OCCURRED_ON, COL_PERIOD_START, COL_USER_ID,
    WIRE_DATE_FORMAT,
};
use crate::errors::{Error, Result, ValidationError};
use crate::period::BudgetPeriod;

fn field<'a>(row: &'a Row, column: &str) -> Result<&'a Value> {
    match row.get(column) {
        Some(Value::Null) | None => Err(Error::Validation(ValidationError::MissingField(
            column.to_string(),
        ))),
        Some(value) => Ok(value),
    }
}

fn string_field(row: &Row, column: &str) -> Result<String> {
    match field(row, column)? {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(Error::Validation(ValidationError::InvalidInput(format!(
            "Column '{}' must be a string, got {}",
            column, other
        )))),
    }
}

fn decimal_field(row: &Row, column: &str) -> Result<Decimal> {
    let raw = match field(row, column)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Column '{}' must be numeric, got {}",
                column, other
            ))))
        }
    };
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(Error::from)
}

fn date_field(row: &Row, column: &str) -> Result<NaiveDate> {
    let raw = string_field(row, column)?;
    // Timestamp columns carry a time part; the calendar date is the prefix.
    let date_part = raw.get(..10).unwrap_or(&raw);
    Ok(NaiveDate::parse_from_str(date_part, WIRE_DATE_FORMAT)?)
}

pub fn allocation_from_row(row: &Row) -> Result<BudgetAllocation> {
    Ok(BudgetAllocation {
        id: Some(string_field(row, COL_ID)?),
        category_key: string_field(row, COL_CATEGORY)?,
        amount: decimal_field(row, COL_AMOUNT)?,
        period_start: date_field(row, COL_PERIOD_START)?,
    })
}

pub fn transaction_from_row(row: &Row) -> Result<TransactionRecord> {
    Ok(TransactionRecord {
        id: string_field(row, COL_ID)?,
        category_key: string_field(row, COL_CATEGORY)?,
        amount: decimal_field(row, COL_AMOUNT)?,
        occurred_on: date_field(row, COL_OCCURRED_ON)?,
    })
}

/// Row written for a new allocation. The id is left to the store.
pub fn allocation_insert_row(
    user_id: &str,
    category_key: &str,
    amount: Decimal,
    period: &BudgetPeriod,
) -> Row {
    let mut row = Row::new();
    row.insert(COL_USER_ID.to_string(), Value::from(user_id));
    row.insert(COL_CATEGORY.to_string(), Value::from(category_key));
    row.insert(COL_AMOUNT.to_string(), Value::from(amount.to_string()));
    row.insert(COL_PERIOD_START.to_string(), Value::from(period.start_key()));
    row
}

/// Partial row carrying only the new amount of an existing allocation.
pub fn allocation_update_row(amount: Decimal) -> Row {
    let mut row = Row::new();
    row.insert(COL_AMOUNT.to_string(), Value::from(amount.to_string()));
    row
}
