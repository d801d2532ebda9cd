//! Transactions (lançamentos): the raw records every report is derived from.

use rusqlite::{Connection, Row};
use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::{Error, UserId, database_id::DatabaseId};

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// The free text name of the transaction, e.g. "Padaria Central".
    ///
    /// Establishments are matched against this name.
    pub name: String,
    /// The amount of money spent (negative) or earned (positive).
    pub amount: f64,
    /// When the purchase happened.
    pub purchase_date: Date,
    /// The category the transaction belongs to.
    pub category_id: Option<DatabaseId>,
    /// The credit card the transaction was charged to.
    pub card_id: Option<DatabaseId>,
    /// The person who paid for the transaction.
    pub payer_id: Option<DatabaseId>,
    /// A free text note. Invoice payments carry a machine readable marker here.
    pub note: Option<String>,
    /// When the transaction was recorded.
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(amount: f64, purchase_date: Date, name: &str) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            purchase_date,
            name: name.to_owned(),
            category_id: None,
            card_id: None,
            payer_id: None,
            note: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// ```ignore
/// let builder = Transaction::build(-45.99, date!(2025 - 01 - 15), "Padaria")
///     .category_id(Some(food.id))
///     .card_id(Some(card.id));
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// Positive values are income, negative values are expenses.
    pub amount: f64,
    /// When the purchase happened.
    pub purchase_date: Date,
    /// The free text name, see [Transaction::name].
    pub name: String,
    /// See [Transaction::category_id].
    pub category_id: Option<DatabaseId>,
    /// See [Transaction::card_id].
    pub card_id: Option<DatabaseId>,
    /// See [Transaction::payer_id].
    pub payer_id: Option<DatabaseId>,
    /// See [Transaction::note].
    pub note: Option<String>,
}

impl TransactionBuilder {
    /// Set the category ID for the transaction.
    pub fn category_id(mut self, category_id: Option<DatabaseId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Set the card ID for the transaction.
    pub fn card_id(mut self, card_id: Option<DatabaseId>) -> Self {
        self.card_id = card_id;
        self
    }

    /// Set the payer ID for the transaction.
    pub fn payer_id(mut self, payer_id: Option<DatabaseId>) -> Self {
        self.payer_id = payer_id;
        self
    }

    /// Set the note for the transaction.
    pub fn note(mut self, note: Option<&str>) -> Self {
        self.note = note.map(str::to_owned);
        self
    }
}

/// Create a new transaction for `user_id` in the database from a builder.
///
/// # Errors
/// This function will return a [Error::SqlError] if a referenced category,
/// card or payer does not exist or if there is some other SQL error.
pub fn create_transaction(
    user_id: UserId,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\"
                (user_id, name, amount, purchase_date, category_id, card_id, payer_id, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING id, name, amount, purchase_date, category_id, card_id, payer_id, note, created_at",
        )?
        .query_row(
            (
                user_id,
                builder.name,
                builder.amount,
                builder.purchase_date,
                builder.category_id,
                builder.card_id,
                builder.payer_id,
                builder.note,
                OffsetDateTime::now_utc(),
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Get the number of transactions `user_id` has.
#[cfg(test)]
pub fn count_transactions(user_id: UserId, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            amount REAL NOT NULL,
            purchase_date TEXT NOT NULL,
            category_id INTEGER,
            card_id INTEGER,
            payer_id INTEGER,
            note TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL,
            FOREIGN KEY(card_id) REFERENCES card(id) ON UPDATE CASCADE ON DELETE SET NULL,
            FOREIGN KEY(payer_id) REFERENCES payer(id) ON UPDATE CASCADE ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date
            ON \"transaction\"(user_id, purchase_date);
        CREATE INDEX IF NOT EXISTS idx_transaction_user_card
            ON \"transaction\"(user_id, card_id);",
    )
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        name: row.get(1)?,
        amount: row.get(2)?,
        purchase_date: row.get(3)?,
        category_id: row.get(4)?,
        card_id: row.get(5)?,
        payer_id: row.get(6)?,
        note: row.get(7)?,
        created_at: row.get(8)?,
    })
}
