//! The invoices page and its JSON endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::{Date, macros::format_description};

use crate::{
    AppState, Error, Period, UserId, endpoints,
    html::{
        BADGE_STYLE, CARD_STYLE, PAGE_CONTAINER_STYLE, amount_color_class, base, empty_state,
        format_currency, month_navigation,
    },
    invoice::{
        InvoicePaymentStatus,
        snapshot::{DashboardInvoice, InvoicesSnapshot, fetch_dashboard_invoices},
    },
    navigation::NavBar,
    period::{PeriodReport, period_from_query},
};

/// The state needed for the invoices page.
#[derive(Debug, Clone)]
pub struct InvoiceState {
    /// The database connection for reading cards, invoices and transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
}

impl FromRef<AppState> for InvoiceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display the card invoices of a period.
pub async fn get_invoices_page(
    State(state): State<InvoiceState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Response, Error> {
    let (period, snapshot) = load_snapshot(&state, user_id, &query)?;

    Ok(invoices_view(period, &snapshot).into_response())
}

/// The card invoices of a period as JSON.
pub async fn get_invoices_json(
    State(state): State<InvoiceState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<PeriodReport<InvoicesSnapshot>>, Error> {
    let (period, report) = load_snapshot(&state, user_id, &query)?;

    Ok(Json(PeriodReport { period, report }))
}

fn load_snapshot(
    state: &InvoiceState,
    user_id: UserId,
    query: &[(String, String)],
) -> Result<(Period, InvoicesSnapshot), Error> {
    let period = period_from_query(query, &state.local_timezone)?.period;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let snapshot = fetch_dashboard_invoices(user_id, period, &connection)
        .inspect_err(|error| tracing::error!("could not get invoices for {period}: {error}"))?;

    Ok((period, snapshot))
}

fn format_date(date: Date) -> String {
    date.format(format_description!("[day]/[month]/[year]"))
        .unwrap_or_else(|_| date.to_string())
}

fn invoices_view(period: Period, snapshot: &InvoicesSnapshot) -> Markup {
    let nav_bar = NavBar::new(endpoints::INVOICES_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            (month_navigation(endpoints::INVOICES_VIEW, period))

            @if snapshot.invoices.is_empty() {
                (empty_state(
                    "Nenhuma fatura encontrada",
                    "Quando houver lançamentos nos cartões para o período, as faturas aparecerão aqui.",
                ))
            } @else {
                section class="w-full max-w-screen-md space-y-4"
                {
                    p class="text-sm"
                    {
                        "Total pendente: "
                        span data-total-pending class="font-semibold"
                        {
                            (format_currency(snapshot.total_pending))
                        }
                    }

                    @for invoice in &snapshot.invoices {
                        (invoice_card(invoice))
                    }
                }
            }
        }
    };

    base("Faturas", &[], &content)
}

fn invoice_card(invoice: &DashboardInvoice) -> Markup {
    let amount_style = amount_color_class(invoice.total_amount);

    html! {
        article class=(CARD_STYLE) data-invoice-id=(invoice.id)
        {
            header class="flex items-center justify-between mb-2"
            {
                h2 class="text-lg font-semibold" { (invoice.card_name) }

                span class=(BADGE_STYLE) data-payment-status=(invoice.payment_status.as_str())
                {
                    @match invoice.payment_status {
                        InvoicePaymentStatus::Paid => { "Paga" }
                        InvoicePaymentStatus::Pending => { "Pendente" }
                    }
                }
            }

            p class={"text-xl font-bold " (amount_style)} data-total-amount
            {
                (format_currency(invoice.total_amount))
            }

            @if let Some(due_day) = &invoice.due_day {
                p class="text-sm" { "Vencimento: dia " (due_day) }
            }

            @if let Some(paid_at) = invoice.paid_at {
                p class="text-sm" data-paid-at { "Paga em " (format_date(paid_at)) }
            }

            @if !invoice.payer_breakdown.is_empty() {
                ul class="mt-2 text-sm"
                {
                    @for payer in &invoice.payer_breakdown {
                        li class="flex justify-between" data-payer
                        {
                            span { (payer.payer_name) }
                            span { (format_currency(payer.amount)) }
                        }
                    }
                }
            }
        }
    }
}
