//! Pages and JSON endpoints for spending and income by category.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, Period, UserId,
    category::{
        CategoryKind,
        aggregation::{CategoryBreakdown, CategoryBreakdownItem},
        report::fetch_categories_by_kind,
    },
    endpoints,
    html::{
        BADGE_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, empty_state, format_currency, format_percentage, month_navigation,
    },
    navigation::NavBar,
    period::{PeriodReport, period_from_query},
};

/// The state needed for the category pages.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for reading categories and transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display the expenses of a period grouped by category.
pub async fn get_expense_categories_page(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Response, Error> {
    let (period, breakdown) = load_breakdown(&state, user_id, &query, CategoryKind::Expense)?;

    Ok(categories_view(CategoryKind::Expense, period, &breakdown).into_response())
}

/// Display the income of a period grouped by category.
pub async fn get_income_categories_page(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Response, Error> {
    let (period, breakdown) = load_breakdown(&state, user_id, &query, CategoryKind::Income)?;

    Ok(categories_view(CategoryKind::Income, period, &breakdown).into_response())
}

/// The expenses of a period grouped by category as JSON.
pub async fn get_expense_categories_json(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<PeriodReport<CategoryBreakdown>>, Error> {
    let (period, report) = load_breakdown(&state, user_id, &query, CategoryKind::Expense)?;

    Ok(Json(PeriodReport { period, report }))
}

/// The income of a period grouped by category as JSON.
pub async fn get_income_categories_json(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<PeriodReport<CategoryBreakdown>>, Error> {
    let (period, report) = load_breakdown(&state, user_id, &query, CategoryKind::Income)?;

    Ok(Json(PeriodReport { period, report }))
}

fn load_breakdown(
    state: &CategoryState,
    user_id: UserId,
    query: &[(String, String)],
    kind: CategoryKind,
) -> Result<(Period, CategoryBreakdown), Error> {
    let period = period_from_query(query, &state.local_timezone)?.period;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let breakdown = fetch_categories_by_kind(user_id, period, kind, &connection)
        .inspect_err(|error| tracing::error!("could not get {kind} categories: {error}"))?;

    Ok((period, breakdown))
}

struct KindText {
    title: &'static str,
    endpoint: &'static str,
    empty_title: &'static str,
    empty_description: &'static str,
}

fn kind_text(kind: CategoryKind) -> KindText {
    match kind {
        CategoryKind::Expense => KindText {
            title: "Despesas por categoria",
            endpoint: endpoints::EXPENSE_CATEGORIES_VIEW,
            empty_title: "Nenhuma despesa encontrada",
            empty_description: "Quando houver despesas registradas no período, elas aparecerão aqui.",
        },
        CategoryKind::Income => KindText {
            title: "Receitas por categoria",
            endpoint: endpoints::INCOME_CATEGORIES_VIEW,
            empty_title: "Nenhuma receita encontrada",
            empty_description: "Quando houver receitas registradas no período, elas aparecerão aqui.",
        },
    }
}

fn categories_view(kind: CategoryKind, period: Period, breakdown: &CategoryBreakdown) -> Markup {
    let text = kind_text(kind);
    let nav_bar = NavBar::new(text.endpoint).into_html();
    let visible: Vec<&CategoryBreakdownItem> = breakdown
        .categories
        .iter()
        .filter(|item| item.current_amount > 0.0)
        .collect();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            (month_navigation(text.endpoint, period))

            @if visible.is_empty() {
                (empty_state(text.empty_title, text.empty_description))
            } @else {
                section class="w-full max-w-screen-md"
                {
                    p class="mb-4 text-sm"
                    {
                        "Total no período: "
                        span data-current-total class="font-semibold" { (format_currency(breakdown.current_total)) }
                    }

                    div class="overflow-x-auto rounded-lg shadow"
                    {
                        table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                        {
                            thead class=(TABLE_HEADER_STYLE)
                            {
                                tr
                                {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Categoria" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Valor" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "% do total" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Variação" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Orçamento" }
                                }
                            }

                            tbody
                            {
                                @for item in &visible {
                                    (category_row(item))
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base(text.title, &[], &content)
}

fn category_row(item: &CategoryBreakdownItem) -> Markup {
    html! {
        tr class=(TABLE_ROW_STYLE) data-category-id=(item.category_id)
        {
            th scope="row" class={(TABLE_CELL_STYLE) " font-medium text-gray-900 dark:text-white"}
            {
                @if let Some(icon) = &item.category_icon {
                    span class=(BADGE_STYLE) title=(icon) { (icon) }
                    " "
                }
                (item.category_name)
            }
            td class=(TABLE_CELL_STYLE) { (format_currency(item.current_amount)) }
            td class=(TABLE_CELL_STYLE) { (format_percentage(item.percentage_of_total)) }
            td class=(TABLE_CELL_STYLE)
            {
                @match item.percentage_change {
                    Some(change) if change > 0.0 => { "↑ " (format_percentage(change.abs())) }
                    Some(change) if change < 0.0 => { "↓ " (format_percentage(change.abs())) }
                    Some(_) => { (format_percentage(0.0)) }
                    None => { "-" }
                }
            }
            td class=(TABLE_CELL_STYLE)
            {
                @match (item.budget_amount, item.budget_used_percentage) {
                    (Some(budget), Some(used)) => {
                        (format_percentage(used)) " de " (format_currency(budget))
                    }
                    _ => { "-" }
                }
            }
        }
    }
}
