//! Pure functions that turn per-category sums into the category breakdown report.

use std::collections::HashMap;

use serde::Serialize;

use crate::{category::Category, database_id::DatabaseId};

/// One row of the category breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdownItem {
    /// The ID of the category.
    pub category_id: DatabaseId,
    /// The display name of the category.
    pub category_name: String,
    /// The icon of the category.
    pub category_icon: Option<String>,
    /// The absolute amount for the period.
    pub current_amount: f64,
    /// The share of the period total, between 0 and 100.
    pub percentage_of_total: f64,
    /// The change relative to the previous period, `None` when the previous amount was zero.
    pub percentage_change: Option<f64>,
    /// The monthly budget of the category.
    pub budget_amount: Option<f64>,
    /// How much of the budget was used, `None` without a budget.
    pub budget_used_percentage: Option<f64>,
}

/// Spending or income grouped by category for a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    /// Every category of the requested kind, largest amount first.
    pub categories: Vec<CategoryBreakdownItem>,
    /// The sum of `current_amount` over all categories.
    pub current_total: f64,
    /// The total of the previous period.
    pub previous_total: f64,
}

/// The relative change from `previous` to `current` as a percentage.
///
/// Returns `None` when `previous` is zero since there is no baseline to compare against.
pub fn calculate_percentage_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }

    Some((current - previous) / previous.abs() * 100.0)
}

/// The share of `total` that `amount` makes up, as a percentage.
pub fn calculate_percentage_of_total(amount: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }

    amount / total * 100.0
}

/// How much of `budget` has been used by `current`, as a percentage.
pub fn calculate_budget_used_percentage(current: f64, budget: Option<f64>) -> Option<f64> {
    match budget {
        Some(budget) if budget > 0.0 => Some(current / budget * 100.0),
        _ => None,
    }
}

/// Build the breakdown of `categories` from signed per-category sums.
///
/// Amounts are reported as absolute values. Categories missing from the sums
/// have an amount of zero and are still included.
pub fn build_category_breakdown(
    categories: Vec<Category>,
    current_sums: &HashMap<DatabaseId, f64>,
    previous_sums: &HashMap<DatabaseId, f64>,
) -> CategoryBreakdown {
    let amount_of = |sums: &HashMap<DatabaseId, f64>, id: DatabaseId| {
        sums.get(&id).copied().unwrap_or(0.0).abs()
    };

    let current_total: f64 = categories
        .iter()
        .map(|category| amount_of(current_sums, category.id))
        .sum();
    let previous_total: f64 = categories
        .iter()
        .map(|category| amount_of(previous_sums, category.id))
        .sum();

    let mut items: Vec<CategoryBreakdownItem> = categories
        .into_iter()
        .map(|category| {
            let current_amount = amount_of(current_sums, category.id);
            let previous_amount = amount_of(previous_sums, category.id);

            CategoryBreakdownItem {
                category_id: category.id,
                category_name: category.name,
                category_icon: category.icon,
                current_amount,
                percentage_of_total: calculate_percentage_of_total(current_amount, current_total),
                percentage_change: calculate_percentage_change(current_amount, previous_amount),
                budget_amount: category.budget_amount,
                budget_used_percentage: calculate_budget_used_percentage(
                    current_amount,
                    category.budget_amount,
                ),
            }
        })
        .collect();

    // Stable sort, categories with equal amounts keep their name order.
    items.sort_by(|a, b| b.current_amount.total_cmp(&a.current_amount));

    CategoryBreakdown {
        categories: items,
        current_total,
        previous_total,
    }
}
