//! Credit card invoices (faturas): cycles, payments and the per-period snapshot.

pub mod cycle;
mod page;
mod payment;
mod snapshot;

use std::fmt::Display;

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{Error, Period, UserId, database_id::DatabaseId};

pub use page::{InvoiceState, get_invoices_json, get_invoices_page};
pub use snapshot::{
    DashboardInvoice, InvoicesSnapshot, PayerBreakdownItem, fetch_dashboard_invoices,
};

/// The note prefix of transactions that pay a card's invoice.
///
/// The full note is `AUTO_FATURA:<card id>:<period>`, optionally followed by more `:` segments.
pub const AUTO_INVOICE_NOTE_PREFIX: &str = "AUTO_FATURA:";

/// [AUTO_INVOICE_NOTE_PREFIX] as a SQL `LIKE` pattern, for use with `ESCAPE '\'`.
pub(crate) const AUTO_INVOICE_NOTE_LIKE_PATTERN: &str = "AUTO\\_FATURA:%";

/// Whether an invoice has been paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InvoicePaymentStatus {
    /// Not paid yet. Unknown stored values are read as pending.
    #[serde(rename = "pendente")]
    Pending,
    /// Paid.
    #[serde(rename = "pago")]
    Paid,
}

impl InvoicePaymentStatus {
    /// The status as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoicePaymentStatus::Pending => "pendente",
            InvoicePaymentStatus::Paid => "pago",
        }
    }

    /// Read a stored status, treating missing or unknown values as pending.
    pub fn from_stored(raw: Option<&str>) -> Self {
        match raw {
            Some("pago") => InvoicePaymentStatus::Paid,
            _ => InvoicePaymentStatus::Pending,
        }
    }
}

impl Display for InvoicePaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for InvoicePaymentStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for InvoicePaymentStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(InvoicePaymentStatus::from_stored(value.as_str().ok()))
    }
}

/// The stored invoice of a card for a period.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    /// The ID of the invoice.
    pub id: DatabaseId,
    /// The card the invoice belongs to.
    pub card_id: DatabaseId,
    /// The period the invoice closes in.
    pub period: Period,
    /// Whether the invoice has been paid.
    pub payment_status: InvoicePaymentStatus,
    /// When the invoice was recorded.
    pub created_at: OffsetDateTime,
}

/// Record the invoice of `card_id` for `period`.
///
/// # Errors
/// Returns an [Error::SqlError] if the card does not exist or the card already
/// has an invoice for `period`.
pub fn create_invoice(
    user_id: UserId,
    card_id: DatabaseId,
    period: Period,
    payment_status: InvoicePaymentStatus,
    connection: &Connection,
) -> Result<Invoice, Error> {
    connection
        .prepare(
            "INSERT INTO invoice (user_id, card_id, period, payment_status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, card_id, period, payment_status, created_at",
        )?
        .query_row(
            (
                user_id,
                card_id,
                period.to_string(),
                payment_status,
                OffsetDateTime::now_utc(),
            ),
            map_invoice_row,
        )
        .map_err(|error| error.into())
}

/// Initialize the invoice table.
pub fn create_invoice_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS invoice (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            card_id INTEGER NOT NULL,
            period TEXT NOT NULL,
            payment_status TEXT,
            created_at TEXT NOT NULL,
            UNIQUE(user_id, card_id, period),
            FOREIGN KEY(card_id) REFERENCES card(id) ON UPDATE CASCADE ON DELETE CASCADE
        );",
    )
}

fn map_invoice_row(row: &Row) -> Result<Invoice, rusqlite::Error> {
    let raw_period: String = row.get(2)?;
    let period = raw_period.parse().map_err(|error: Error| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, error.into())
    })?;

    Ok(Invoice {
        id: row.get(0)?,
        card_id: row.get(1)?,
        period,
        payment_status: row.get(3)?,
        created_at: row.get(4)?,
    })
}
