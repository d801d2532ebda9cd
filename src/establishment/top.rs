//! The establishments where the user spends most often in a period.

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    Error, Period, UserId,
    database_id::DatabaseId,
    endpoints,
    establishment::{
        EstablishmentState,
        reconcile::{compare_names, most_used_spelling, normalize_name_key},
    },
    html::{
        BADGE_STYLE, CARD_STYLE, PAGE_CONTAINER_STYLE, base, empty_state, format_currency,
        format_percentage, month_navigation,
    },
    invoice::AUTO_INVOICE_NOTE_LIKE_PATTERN,
    navigation::NavBar,
    period::{PeriodReport, period_from_query},
};

const MAX_ESTABLISHMENTS: usize = 10;
const MAX_CATEGORIES: usize = 5;
const MAX_CATEGORIES_PER_ESTABLISHMENT: usize = 2;

/// The totals shown above the rankings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopEstablishmentsSummary {
    /// The number of distinct establishments with purchases.
    pub total_establishments: u32,
    /// The number of purchases.
    pub total_transactions: u32,
    /// The absolute sum of the purchases.
    pub total_spent: f64,
    /// The average purchase, 0 without purchases.
    pub avg_per_transaction: f64,
}

/// An establishment ranked by how often the user bought there.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopEstablishment {
    /// The most used spelling of the name.
    pub name: String,
    /// The number of purchases.
    pub count: u32,
    /// The absolute sum of the purchases.
    pub total_amount: f64,
    /// The average purchase.
    pub avg_amount: f64,
    /// The names of the categories used most for this establishment.
    pub categories: Vec<String>,
}

/// An expense category ranked by how much was spent on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCategory {
    /// The ID of the category.
    pub id: DatabaseId,
    /// The name of the category.
    pub name: String,
    /// The category icon.
    pub icon: Option<String>,
    /// The absolute sum of the purchases.
    pub total_amount: f64,
    /// The number of purchases.
    pub transaction_count: u32,
}

/// The top establishments report for a period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopEstablishments {
    /// Totals over every purchase of the period.
    pub summary: TopEstablishmentsSummary,
    /// The most frequent establishments, most purchases first.
    pub establishments: Vec<TopEstablishment>,
    /// The expense categories with the highest spending.
    pub top_categories: Vec<TopCategory>,
}

/// A purchase with its category.
#[derive(Debug, Clone, PartialEq)]
struct PurchaseRow {
    name: String,
    amount: f64,
    category_id: Option<DatabaseId>,
    category_name: Option<String>,
    category_icon: Option<String>,
}

#[derive(Debug, Default)]
struct EstablishmentTally {
    spellings: HashMap<String, u32>,
    count: u32,
    total_amount: f64,
    category_counts: HashMap<String, u32>,
}

/// Rank the establishments and expense categories of the purchases of `user_id` in `period`.
///
/// Purchases are expenses (negative amounts) in the period, not counting
/// invoice payments. Establishments are grouped like
/// [crate::establishment::fetch_establishments_for_user] groups them.
pub fn fetch_top_establishments(
    user_id: UserId,
    period: Period,
    connection: &Connection,
) -> Result<TopEstablishments, Error> {
    let purchases = get_purchases(user_id, period, connection)?;

    Ok(build_top_establishments(&purchases))
}

fn build_top_establishments(purchases: &[PurchaseRow]) -> TopEstablishments {
    let mut tallies: HashMap<String, EstablishmentTally> = HashMap::new();
    let mut categories: HashMap<DatabaseId, TopCategory> = HashMap::new();
    let mut summary = TopEstablishmentsSummary::default();

    for purchase in purchases {
        let Some(key) = normalize_name_key(&purchase.name) else {
            continue;
        };
        let amount = purchase.amount.abs();

        summary.total_transactions += 1;
        summary.total_spent += amount;

        let tally = tallies.entry(key).or_default();
        tally.count += 1;
        tally.total_amount += amount;
        *tally
            .spellings
            .entry(purchase.name.trim().to_owned())
            .or_insert(0) += 1;

        if let (Some(category_id), Some(category_name)) =
            (purchase.category_id, &purchase.category_name)
        {
            *tally
                .category_counts
                .entry(category_name.clone())
                .or_insert(0) += 1;

            let category = categories.entry(category_id).or_insert_with(|| TopCategory {
                id: category_id,
                name: category_name.clone(),
                icon: purchase.category_icon.clone(),
                total_amount: 0.0,
                transaction_count: 0,
            });
            category.total_amount += amount;
            category.transaction_count += 1;
        }
    }

    summary.total_establishments = tallies.len() as u32;
    summary.avg_per_transaction = if summary.total_transactions > 0 {
        summary.total_spent / f64::from(summary.total_transactions)
    } else {
        0.0
    };

    let mut establishments: Vec<TopEstablishment> = tallies
        .into_values()
        .map(|tally| TopEstablishment {
            name: most_used_spelling(&tally.spellings),
            count: tally.count,
            total_amount: tally.total_amount,
            avg_amount: tally.total_amount / f64::from(tally.count),
            categories: most_used_categories(tally.category_counts),
        })
        .collect();

    establishments.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| b.total_amount.total_cmp(&a.total_amount))
            .then_with(|| compare_names(&a.name, &b.name))
    });
    establishments.truncate(MAX_ESTABLISHMENTS);

    let mut top_categories: Vec<TopCategory> = categories.into_values().collect();
    top_categories.sort_by(|a, b| {
        b.total_amount
            .total_cmp(&a.total_amount)
            .then_with(|| compare_names(&a.name, &b.name))
    });
    top_categories.truncate(MAX_CATEGORIES);

    TopEstablishments {
        summary,
        establishments,
        top_categories,
    }
}

fn most_used_categories(category_counts: HashMap<String, u32>) -> Vec<String> {
    let mut categories: Vec<(String, u32)> = category_counts.into_iter().collect();
    categories.sort_by(|(name_a, count_a), (name_b, count_b)| {
        count_b.cmp(count_a).then_with(|| compare_names(name_a, name_b))
    });

    categories
        .into_iter()
        .take(MAX_CATEGORIES_PER_ESTABLISHMENT)
        .map(|(name, _)| name)
        .collect()
}

fn get_purchases(
    user_id: UserId,
    period: Period,
    connection: &Connection,
) -> Result<Vec<PurchaseRow>, Error> {
    let date_range = period.date_range();

    connection
        .prepare(
            "SELECT t.name, t.amount, c.id, c.name, c.icon
             FROM \"transaction\" t
             LEFT JOIN category c ON c.id = t.category_id AND c.kind = 'despesa'
             WHERE t.user_id = :user_id
                AND t.amount < 0
                AND t.purchase_date BETWEEN :start AND :end
                AND (t.note IS NULL OR t.note NOT LIKE :marker ESCAPE '\\')
             ORDER BY t.id ASC",
        )?
        .query_map(
            rusqlite::named_params! {
                ":user_id": user_id,
                ":start": date_range.start(),
                ":end": date_range.end(),
                ":marker": AUTO_INVOICE_NOTE_LIKE_PATTERN,
            },
            |row| {
                Ok(PurchaseRow {
                    name: row.get(0)?,
                    amount: row.get(1)?,
                    category_id: row.get(2)?,
                    category_name: row.get(3)?,
                    category_icon: row.get(4)?,
                })
            },
        )?
        .map(|maybe_row| maybe_row.map_err(|error| error.into()))
        .collect()
}

/// Display the top establishments of a period.
pub async fn get_top_establishments_page(
    State(state): State<EstablishmentState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Response, Error> {
    let (period, report) = load_report(&state, user_id, &query)?;

    Ok(top_establishments_view(period, &report).into_response())
}

/// The top establishments of a period as JSON.
pub async fn get_top_establishments_json(
    State(state): State<EstablishmentState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<PeriodReport<TopEstablishments>>, Error> {
    let (period, report) = load_report(&state, user_id, &query)?;

    Ok(Json(PeriodReport { period, report }))
}

fn load_report(
    state: &EstablishmentState,
    user_id: UserId,
    query: &[(String, String)],
) -> Result<(Period, TopEstablishments), Error> {
    let period = period_from_query(query, &state.local_timezone)?.period;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let report = fetch_top_establishments(user_id, period, &connection)
        .inspect_err(|error| tracing::error!("could not get top establishments: {error}"))?;

    Ok((period, report))
}

fn top_establishments_view(period: Period, report: &TopEstablishments) -> Markup {
    let nav_bar = NavBar::new(endpoints::TOP_ESTABLISHMENTS_VIEW).into_html();
    let summary = &report.summary;
    let max_count = report
        .establishments
        .iter()
        .map(|establishment| establishment.count)
        .max()
        .unwrap_or(0);
    let categories_total: f64 = report
        .top_categories
        .iter()
        .map(|category| category.total_amount)
        .sum();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            (month_navigation(endpoints::TOP_ESTABLISHMENTS_VIEW, period))

            @if report.establishments.is_empty() {
                (empty_state(
                    "Nenhum estabelecimento encontrado",
                    "Quando houver compras registradas, elas aparecerão aqui.",
                ))
            } @else {
                section class="grid w-full max-w-screen-md gap-3 grid-cols-2 lg:grid-cols-4 mb-6"
                {
                    (summary_card("Estabelecimentos", &summary.total_establishments.to_string(), "Locais diferentes"))
                    (summary_card("Transações", &summary.total_transactions.to_string(), "Compras no período"))
                    (summary_card("Total gasto", &format_currency(summary.total_spent), "Soma de todas as compras"))
                    (summary_card("Ticket médio", &format_currency(summary.avg_per_transaction), "Média por transação"))
                }

                section class={"w-full max-w-screen-md mb-6 " (CARD_STYLE)}
                {
                    h2 class="mb-2 text-lg font-semibold" { "Top estabelecimentos por frequência" }

                    ol
                    {
                        @for establishment in &report.establishments {
                            li class="py-2 border-b border-dashed last:border-0" data-establishment
                            {
                                div class="flex justify-between gap-3"
                                {
                                    div
                                    {
                                        span class="font-medium" { (establishment.name) }

                                        @for category in &establishment.categories {
                                            " "
                                            span class=(BADGE_STYLE) { (category) }
                                        }
                                    }

                                    div class="text-right"
                                    {
                                        p { (format_currency(establishment.total_amount)) }
                                        p class="text-xs"
                                        {
                                            (establishment.count) "x • Média: "
                                            (format_currency(establishment.avg_amount))
                                        }
                                    }
                                }

                                progress
                                    class="w-full h-1.5"
                                    max=(max_count)
                                    value=(establishment.count)
                                {}
                            }
                        }
                    }
                }

                section class={"w-full max-w-screen-md " (CARD_STYLE)}
                {
                    h2 class="mb-2 text-lg font-semibold" { "Principais categorias" }

                    @if report.top_categories.is_empty() {
                        p class="text-sm" { "Nenhuma categoria encontrada" }
                    } @else {
                        ul
                        {
                            @for category in &report.top_categories {
                                li class="flex justify-between py-2" data-top-category
                                {
                                    span
                                    {
                                        (category.name) " "
                                        span class="text-xs"
                                        {
                                            (format_percentage(share(category.total_amount, categories_total)))
                                            " do total • " (category.transaction_count) "x"
                                        }
                                    }
                                    span { (format_currency(category.total_amount)) }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Top estabelecimentos", &[], &content)
}

fn share(amount: f64, total: f64) -> f64 {
    if total > 0.0 {
        amount / total * 100.0
    } else {
        0.0
    }
}

fn summary_card(title: &str, value: &str, description: &str) -> Markup {
    html! {
        div class=(CARD_STYLE) data-summary-card
        {
            p class="text-xs font-medium" { (title) }
            p class="text-xl font-semibold" { (value) }
            p class="text-xs" { (description) }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        AUTO_INVOICE_NOTE_PREFIX, Period, Transaction, UserId,
        category::{CategoryKind, CategoryName, NewCategory, create_category},
        create_transaction,
        db::initialize,
        establishment::EstablishmentState,
        test_utils::{assert_valid_html, parse_html_document, parse_json_body},
    };

    use super::{
        PurchaseRow, TopEstablishmentsSummary, build_top_establishments, fetch_top_establishments,
        get_top_establishments_json, get_top_establishments_page,
    };

    fn purchase(name: &str, amount: f64, category: Option<(i64, &str)>) -> PurchaseRow {
        PurchaseRow {
            name: name.to_owned(),
            amount,
            category_id: category.map(|(id, _)| id),
            category_name: category.map(|(_, name)| name.to_owned()),
            category_icon: None,
        }
    }

    #[test]
    fn summary_is_zero_without_purchases() {
        let got = build_top_establishments(&[]);

        assert_eq!(got.summary, TopEstablishmentsSummary::default());
        assert_eq!(got.summary.avg_per_transaction, 0.0);
        assert!(got.establishments.is_empty());
        assert!(got.top_categories.is_empty());
    }

    #[test]
    fn ranks_establishments_by_frequency() {
        let got = build_top_establishments(&[
            purchase("Posto", -200.0, Some((2, "Transporte"))),
            purchase("Padaria", -10.0, Some((1, "Alimentação"))),
            purchase("padaria ", -14.0, Some((1, "Alimentação"))),
            purchase("Padaria", -6.0, None),
        ]);

        let ranking: Vec<(&str, u32, f64)> = got
            .establishments
            .iter()
            .map(|establishment| {
                (
                    establishment.name.as_str(),
                    establishment.count,
                    establishment.total_amount,
                )
            })
            .collect();
        assert_eq!(ranking, vec![("Padaria", 3, 30.0), ("Posto", 1, 200.0)]);
        assert_eq!(got.establishments[0].avg_amount, 10.0);
        assert_eq!(got.establishments[0].categories, vec!["Alimentação"]);

        assert_eq!(
            got.summary,
            TopEstablishmentsSummary {
                total_establishments: 2,
                total_transactions: 4,
                total_spent: 230.0,
                avg_per_transaction: 57.5,
            }
        );

        let categories: Vec<(&str, f64, u32)> = got
            .top_categories
            .iter()
            .map(|category| {
                (
                    category.name.as_str(),
                    category.total_amount,
                    category.transaction_count,
                )
            })
            .collect();
        assert_eq!(
            categories,
            vec![("Transporte", 200.0, 1), ("Alimentação", 24.0, 2)]
        );
    }

    fn get_test_state() -> EstablishmentState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        EstablishmentState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "America/Sao_Paulo".to_owned(),
        }
    }

    fn seed_purchases(connection: &Connection, user_id: UserId) {
        let food = create_category(
            user_id,
            NewCategory::new(CategoryName::new("Alimentação").unwrap(), CategoryKind::Expense),
            connection,
        )
        .unwrap();
        for (name, amount, date) in [
            ("Padaria", -12.0, date!(2025 - 03 - 03)),
            ("Padaria", -8.0, date!(2025 - 03 - 04)),
            ("Mercado", -300.0, date!(2025 - 03 - 05)),
            // Outside the period.
            ("Mercado", -90.0, date!(2025 - 04 - 01)),
            // Income is not a purchase.
            ("Salário", 5000.0, date!(2025 - 03 - 05)),
        ] {
            create_transaction(
                user_id,
                Transaction::build(amount, date, name).category_id(Some(food.id)),
                connection,
            )
            .unwrap();
        }
        create_transaction(
            user_id,
            Transaction::build(-500.0, date!(2025 - 03 - 10), "Pagamento fatura")
                .note(Some(&format!("{AUTO_INVOICE_NOTE_PREFIX}1:2025-03"))),
            connection,
        )
        .unwrap();
    }

    #[test]
    fn fetch_excludes_income_invoice_payments_and_other_periods() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = UserId::new(1);
        seed_purchases(&conn, user_id);

        let got = fetch_top_establishments(user_id, Period::new(2025, 3).unwrap(), &conn).unwrap();

        assert_eq!(got.summary.total_transactions, 3);
        assert_eq!(got.summary.total_spent, 320.0);
        let names: Vec<&str> = got
            .establishments
            .iter()
            .map(|establishment| establishment.name.as_str())
            .collect();
        assert_eq!(names, vec!["Padaria", "Mercado"]);
        assert_eq!(got.top_categories[0].total_amount, 320.0);
    }

    #[tokio::test]
    async fn page_shows_summary_cards_and_ranking() {
        let state = get_test_state();
        let user_id = UserId::new(1);
        seed_purchases(&state.db_connection.lock().unwrap(), user_id);

        let response = get_top_establishments_page(
            State(state),
            Extension(user_id),
            Query(vec![("periodo".to_owned(), "2025-03".to_owned())]),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let cards = html
            .select(&Selector::parse("[data-summary-card]").unwrap())
            .count();
        assert_eq!(cards, 4);
        let establishments = html
            .select(&Selector::parse("[data-establishment]").unwrap())
            .count();
        assert_eq!(establishments, 2);
    }

    #[tokio::test]
    async fn page_shows_empty_state() {
        let state = get_test_state();

        let response = get_top_establishments_page(
            State(state),
            Extension(UserId::new(1)),
            Query(vec![("periodo".to_owned(), "2025-03".to_owned())]),
        )
        .await
        .into_response();

        let html = parse_html_document(response).await;
        let empty_state = html
            .select(&Selector::parse("[data-empty-state] h3").unwrap())
            .next()
            .expect("No empty state found");
        assert_eq!(
            empty_state.text().collect::<String>(),
            "Nenhum estabelecimento encontrado"
        );
    }

    #[tokio::test]
    async fn json_uses_camel_case() {
        let state = get_test_state();
        let user_id = UserId::new(1);
        seed_purchases(&state.db_connection.lock().unwrap(), user_id);

        let response = get_top_establishments_json(
            State(state),
            Extension(user_id),
            Query(vec![("periodo".to_owned(), "2025-03".to_owned())]),
        )
        .await
        .into_response();

        let json = parse_json_body(response).await;
        assert_eq!(json["period"], "2025-03");
        assert_eq!(json["summary"]["totalEstablishments"], 2);
        assert_eq!(json["summary"]["totalSpent"], 320.0);
        assert_eq!(json["establishments"][0]["avgAmount"], 10.0);
        assert_eq!(json["topCategories"][0]["transactionCount"], 3);
    }
}
