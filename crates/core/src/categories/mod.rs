//! Categories module - the fixed spending/income taxonomy.

mod category_model;
mod taxonomy;

pub use category_model::{Category, CategoryKind};
pub use taxonomy::{
    display_name_for, find_category, taxonomy_position, EXPENSE_CATEGORIES, INCOME_CATEGORIES,
};
