//! The invoices of every card for a period, as shown on the invoices dashboard.

use std::collections::HashMap;

use rusqlite::{Connection, Row};
use serde::{Serialize, Serializer};
use time::{Date, OffsetDateTime};

use crate::{
    Error, Period, UserId,
    database_id::DatabaseId,
    invoice::{
        InvoicePaymentStatus,
        cycle::{InvoiceWindow, clamp_closing_day, resolve_invoice_window},
        payment::{PaymentMarker, get_payment_rows, resolve_payment_dates},
    },
};

const NO_PAYER_NAME: &str = "Sem pagador";

/// How much of an invoice one payer is responsible for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayerBreakdownItem {
    /// The payer, `None` for transactions without a payer.
    #[serde(rename = "pagadorId")]
    pub payer_id: Option<DatabaseId>,
    /// The payer's name, "Sem pagador" for transactions without a payer.
    #[serde(rename = "pagadorName")]
    pub payer_name: String,
    /// The payer's avatar image URL.
    #[serde(rename = "pagadorAvatar")]
    pub payer_avatar: Option<String>,
    /// The absolute amount charged to the payer.
    pub amount: f64,
}

/// A card's invoice for a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardInvoice {
    /// The stored invoice's ID or `<card id>:<period>` when no invoice was stored.
    pub id: String,
    /// The ID of the card.
    pub card_id: DatabaseId,
    /// The name of the card.
    pub card_name: String,
    /// The card network.
    pub card_brand: Option<String>,
    /// The status of the card.
    pub card_status: Option<String>,
    /// The card's logo.
    pub logo: Option<String>,
    /// The day of the month the invoice is due, as entered by the user.
    pub due_day: Option<String>,
    /// The period the invoice closes in.
    pub period: Period,
    /// Whether the invoice was paid.
    pub payment_status: InvoicePaymentStatus,
    /// The signed sum of the card's transactions in the invoice window.
    pub total_amount: f64,
    /// When the invoice was paid. Only set for paid invoices.
    #[serde(serialize_with = "serialize_optional_date")]
    pub paid_at: Option<Date>,
    /// The invoice total split by payer, largest first.
    #[serde(rename = "pagadorBreakdown")]
    pub payer_breakdown: Vec<PayerBreakdownItem>,
}

/// All invoices of a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicesSnapshot {
    /// The invoices, largest absolute total first.
    pub invoices: Vec<DashboardInvoice>,
    /// The sum of the totals of the pending invoices.
    pub total_pending: f64,
}

/// A card joined with its stored invoice for the period, if any.
#[derive(Debug, Clone, PartialEq)]
struct CardInvoiceRow {
    card_id: DatabaseId,
    card_name: String,
    card_brand: Option<String>,
    card_status: Option<String>,
    logo: Option<String>,
    due_day: Option<String>,
    closing_day: Option<String>,
    invoice_id: Option<DatabaseId>,
    payment_status: Option<String>,
    invoice_created_at: Option<OffsetDateTime>,
}

/// The transactions charged to a card in an invoice window.
#[derive(Debug, Clone, Default, PartialEq)]
struct InvoiceTotals {
    total_amount: f64,
    transaction_count: u32,
}

/// The signed sum of a payer's transactions in an invoice window.
#[derive(Debug, Clone, PartialEq)]
struct PayerSumRow {
    payer_id: Option<DatabaseId>,
    payer_name: Option<String>,
    payer_avatar: Option<String>,
    amount: f64,
}

/// Build the invoices snapshot of `user_id` for `period`.
///
/// Every card of the user gets an invoice when it has transactions in its
/// invoice window or a stored invoice for `period`.
pub fn fetch_dashboard_invoices(
    user_id: UserId,
    period: Period,
    connection: &Connection,
) -> Result<InvoicesSnapshot, Error> {
    let payment_dates = resolve_payment_dates(get_payment_rows(user_id, connection)?);
    let card_rows = get_card_invoice_rows(user_id, period, connection)?;

    let mut invoices = Vec::with_capacity(card_rows.len());

    for card in card_rows {
        let closing_day = clamp_closing_day(card.closing_day.as_deref());
        let window = resolve_invoice_window(period, closing_day);
        let totals = get_invoice_totals(user_id, card.card_id, window, connection)?;
        let payer_sums = get_payer_sums(user_id, card.card_id, window, connection)?;

        if let Some(invoice) = build_invoice(card, period, totals, payer_sums, &payment_dates) {
            invoices.push(invoice);
        }
    }

    Ok(build_snapshot(invoices))
}

fn build_invoice(
    card: CardInvoiceRow,
    period: Period,
    totals: InvoiceTotals,
    payer_sums: Vec<PayerSumRow>,
    payment_dates: &HashMap<PaymentMarker, Date>,
) -> Option<DashboardInvoice> {
    let should_include = totals.transaction_count > 0
        || totals.total_amount.abs() > 0.0
        || card.invoice_id.is_some();

    if !should_include {
        return None;
    }

    let payment_status = InvoicePaymentStatus::from_stored(card.payment_status.as_deref());
    let paid_at = match payment_status {
        InvoicePaymentStatus::Paid => {
            let marker = PaymentMarker {
                card_id: card.card_id.to_string(),
                period: period.to_string(),
            };

            payment_dates
                .get(&marker)
                .copied()
                .or_else(|| card.invoice_created_at.map(|created_at| created_at.date()))
        }
        InvoicePaymentStatus::Pending => None,
    };

    let id = match card.invoice_id {
        Some(invoice_id) => invoice_id.to_string(),
        None => format!("{}:{}", card.card_id, period),
    };

    Some(DashboardInvoice {
        id,
        card_id: card.card_id,
        card_name: card.card_name,
        card_brand: card.card_brand,
        card_status: card.card_status,
        logo: card.logo,
        due_day: card.due_day,
        period,
        payment_status,
        total_amount: totals.total_amount,
        paid_at,
        payer_breakdown: build_payer_breakdown(payer_sums),
    })
}

fn build_payer_breakdown(payer_sums: Vec<PayerSumRow>) -> Vec<PayerBreakdownItem> {
    let mut breakdown: Vec<PayerBreakdownItem> = payer_sums
        .into_iter()
        .filter(|row| row.amount.abs() > 0.0)
        .map(|row| PayerBreakdownItem {
            payer_id: row.payer_id,
            payer_name: row
                .payer_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or(NO_PAYER_NAME)
                .to_owned(),
            payer_avatar: row.payer_avatar,
            amount: row.amount.abs(),
        })
        .collect();

    breakdown.sort_by(|a, b| b.amount.total_cmp(&a.amount));

    breakdown
}

fn build_snapshot(mut invoices: Vec<DashboardInvoice>) -> InvoicesSnapshot {
    invoices.sort_by(|a, b| b.total_amount.abs().total_cmp(&a.total_amount.abs()));

    let total_pending = invoices
        .iter()
        .filter(|invoice| invoice.payment_status == InvoicePaymentStatus::Pending)
        .map(|invoice| invoice.total_amount)
        .sum();

    InvoicesSnapshot {
        invoices,
        total_pending,
    }
}

fn get_card_invoice_rows(
    user_id: UserId,
    period: Period,
    connection: &Connection,
) -> Result<Vec<CardInvoiceRow>, Error> {
    connection
        .prepare(
            "SELECT c.id, c.name, c.brand, c.status, c.logo, c.due_day, c.closing_day,
                i.id, i.payment_status, i.created_at
             FROM card c
             LEFT JOIN invoice i
                ON i.card_id = c.id AND i.user_id = :user_id AND i.period = :period
             WHERE c.user_id = :user_id
             ORDER BY c.id ASC",
        )?
        .query_map(
            rusqlite::named_params! { ":user_id": user_id, ":period": period.to_string() },
            map_card_invoice_row,
        )?
        .map(|maybe_row| maybe_row.map_err(|error| error.into()))
        .collect()
}

fn get_invoice_totals(
    user_id: UserId,
    card_id: DatabaseId,
    window: InvoiceWindow,
    connection: &Connection,
) -> Result<InvoiceTotals, Error> {
    connection
        .prepare(
            "SELECT COALESCE(SUM(amount), 0), COUNT(id) FROM \"transaction\"
             WHERE user_id = :user_id
                AND card_id = :card_id
                AND purchase_date BETWEEN :start AND :end",
        )?
        .query_row(
            rusqlite::named_params! {
                ":user_id": user_id,
                ":card_id": card_id,
                ":start": window.start,
                ":end": window.end,
            },
            |row| {
                Ok(InvoiceTotals {
                    total_amount: row.get(0)?,
                    transaction_count: row.get(1)?,
                })
            },
        )
        .map_err(|error| error.into())
}

fn get_payer_sums(
    user_id: UserId,
    card_id: DatabaseId,
    window: InvoiceWindow,
    connection: &Connection,
) -> Result<Vec<PayerSumRow>, Error> {
    connection
        .prepare(
            "SELECT t.payer_id, p.name, p.avatar_url, COALESCE(SUM(t.amount), 0)
             FROM \"transaction\" t
             LEFT JOIN payer p ON p.id = t.payer_id
             WHERE t.user_id = :user_id
                AND t.card_id = :card_id
                AND t.purchase_date BETWEEN :start AND :end
             GROUP BY t.payer_id, p.name, p.avatar_url",
        )?
        .query_map(
            rusqlite::named_params! {
                ":user_id": user_id,
                ":card_id": card_id,
                ":start": window.start,
                ":end": window.end,
            },
            |row| {
                Ok(PayerSumRow {
                    payer_id: row.get(0)?,
                    payer_name: row.get(1)?,
                    payer_avatar: row.get(2)?,
                    amount: row.get(3)?,
                })
            },
        )?
        .map(|maybe_row| maybe_row.map_err(|error| error.into()))
        .collect()
}

fn map_card_invoice_row(row: &Row) -> Result<CardInvoiceRow, rusqlite::Error> {
    Ok(CardInvoiceRow {
        card_id: row.get(0)?,
        card_name: row.get(1)?,
        card_brand: row.get(2)?,
        card_status: row.get(3)?,
        logo: row.get(4)?,
        due_day: row.get(5)?,
        closing_day: row.get(6)?,
        invoice_id: row.get(7)?,
        payment_status: row.get(8)?,
        invoice_created_at: row.get(9)?,
    })
}

fn serialize_optional_date<S: Serializer>(
    date: &Option<Date>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match date {
        Some(date) => serializer.collect_str(date),
        None => serializer.serialize_none(),
    }
}
