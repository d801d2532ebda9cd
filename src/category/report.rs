//! Queries that build the category breakdown for a period.

use rusqlite::Connection;

use crate::{
    Error, Period, UserId,
    category::{
        CategoryKind,
        aggregation::{CategoryBreakdown, build_category_breakdown},
        db::{get_categories_by_kind, sum_amounts_by_category},
    },
};

/// Group the transactions of `user_id` in `period` by category of `kind`.
///
/// Percentage changes compare against the calendar month before `period`.
pub fn fetch_categories_by_kind(
    user_id: UserId,
    period: Period,
    kind: CategoryKind,
    connection: &Connection,
) -> Result<CategoryBreakdown, Error> {
    let categories = get_categories_by_kind(user_id, kind, connection)?;
    let current_sums = sum_amounts_by_category(user_id, kind, period.date_range(), connection)?;
    let previous_sums =
        sum_amounts_by_category(user_id, kind, period.previous().date_range(), connection)?;

    Ok(build_category_breakdown(
        categories,
        &current_sums,
        &previous_sums,
    ))
}

/// Spending of `user_id` by expense category for `period`.
pub fn fetch_expenses_by_category(
    user_id: UserId,
    period: Period,
    connection: &Connection,
) -> Result<CategoryBreakdown, Error> {
    fetch_categories_by_kind(user_id, period, CategoryKind::Expense, connection)
}

/// Income of `user_id` by income category for `period`.
pub fn fetch_income_by_category(
    user_id: UserId,
    period: Period,
    connection: &Connection,
) -> Result<CategoryBreakdown, Error> {
    fetch_categories_by_kind(user_id, period, CategoryKind::Income, connection)
}
