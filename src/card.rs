//! Credit cards (cartões). Each card closes a monthly invoice on its closing day.

use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::{Error, UserId, database_id::DatabaseId};

/// A credit card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// The ID of the card.
    pub id: DatabaseId,
    /// The name of the card, e.g. "Nubank Roxinho".
    pub name: String,
    /// The card network, e.g. "Mastercard".
    pub brand: Option<String>,
    /// Whether the card is active, e.g. "ativo".
    pub status: Option<String>,
    /// The path of the card's logo image.
    pub logo: Option<String>,
    /// The day of the month the invoice closes, as entered by the user.
    ///
    /// Stored as text and clamped when read, see [crate::invoice::cycle::clamp_closing_day].
    pub closing_day: Option<String>,
    /// The day of the month the invoice is due, as entered by the user.
    pub due_day: Option<String>,
}

/// The data needed to create a [Card].
#[derive(Debug, Clone, Default, PartialEq)]
#[allow(missing_docs)]
pub struct NewCard {
    pub name: String,
    pub brand: Option<String>,
    pub status: Option<String>,
    pub logo: Option<String>,
    pub closing_day: Option<String>,
    pub due_day: Option<String>,
}

impl NewCard {
    /// A card named `name` that closes on `closing_day` and is due on `due_day`.
    pub fn new(name: &str, closing_day: &str, due_day: &str) -> Self {
        Self {
            name: name.to_owned(),
            closing_day: Some(closing_day.to_owned()),
            due_day: Some(due_day.to_owned()),
            ..Default::default()
        }
    }
}

/// Create a card for `user_id` and return it with its generated ID.
pub fn create_card(user_id: UserId, card: NewCard, connection: &Connection) -> Result<Card, Error> {
    connection
        .prepare(
            "INSERT INTO card (user_id, name, brand, status, logo, closing_day, due_day)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, name, brand, status, logo, closing_day, due_day",
        )?
        .query_row(
            (
                user_id,
                card.name,
                card.brand,
                card.status,
                card.logo,
                card.closing_day,
                card.due_day,
            ),
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve the cards of `user_id` ordered by name.
pub fn get_cards(user_id: UserId, connection: &Connection) -> Result<Vec<Card>, Error> {
    connection
        .prepare(
            "SELECT id, name, brand, status, logo, closing_day, due_day
             FROM card WHERE user_id = :user_id ORDER BY name ASC, id ASC",
        )?
        .query_map(&[(":user_id", &user_id)], map_row)?
        .map(|maybe_card| maybe_card.map_err(|error| error.into()))
        .collect()
}

/// Initialize the card table.
pub fn create_card_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS card (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            brand TEXT,
            status TEXT,
            logo TEXT,
            closing_day TEXT,
            due_day TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_card_user ON card(user_id);",
    )
}

fn map_row(row: &Row) -> Result<Card, rusqlite::Error> {
    Ok(Card {
        id: row.get(0)?,
        name: row.get(1)?,
        brand: row.get(2)?,
        status: row.get(3)?,
        logo: row.get(4)?,
        closing_day: row.get(5)?,
        due_day: row.get(6)?,
    })
}
