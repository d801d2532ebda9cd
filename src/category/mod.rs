//! Categories and the spending/income breakdown by category.

mod aggregation;
mod db;
mod domain;
mod page;
mod report;

pub use aggregation::{
    CategoryBreakdown, CategoryBreakdownItem, build_category_breakdown,
    calculate_budget_used_percentage, calculate_percentage_change, calculate_percentage_of_total,
};
pub use db::{create_category, create_category_table, get_categories_by_kind};
pub use domain::{Category, CategoryKind, CategoryName, NewCategory};
pub use page::{
    CategoryState, get_expense_categories_json, get_expense_categories_page,
    get_income_categories_json, get_income_categories_page,
};
pub use report::{fetch_categories_by_kind, fetch_expenses_by_category, fetch_income_by_category};
