//! Database operations for categories.

use std::{collections::HashMap, ops::RangeInclusive};

use rusqlite::{Connection, Row};
use time::Date;

use crate::{
    Error, UserId,
    category::{Category, CategoryKind, NewCategory},
    database_id::DatabaseId,
    invoice::AUTO_INVOICE_NOTE_LIKE_PATTERN,
};

/// Create a category for `user_id` and return it with its generated ID.
pub fn create_category(
    user_id: UserId,
    category: NewCategory,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "INSERT INTO category (user_id, name, icon, kind, budget_amount)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, name, icon, kind, budget_amount",
        )?
        .query_row(
            (
                user_id,
                category.name.as_ref(),
                category.icon,
                category.kind,
                category.budget_amount,
            ),
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve the categories of `kind` that belong to `user_id`, ordered by name.
pub fn get_categories_by_kind(
    user_id: UserId,
    kind: CategoryKind,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, name, icon, kind, budget_amount FROM category
             WHERE user_id = :user_id AND kind = :kind
             ORDER BY name ASC, id ASC",
        )?
        .query_map(
            rusqlite::named_params! { ":user_id": user_id, ":kind": kind },
            map_row,
        )?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Sum the transactions of each category of `kind` over `date_range`.
///
/// Categories without transactions in the range are absent from the map.
/// Invoice payment transactions are left out, the purchases on the invoice
/// are already counted.
pub fn sum_amounts_by_category(
    user_id: UserId,
    kind: CategoryKind,
    date_range: RangeInclusive<Date>,
    connection: &Connection,
) -> Result<HashMap<DatabaseId, f64>, Error> {
    connection
        .prepare(
            "SELECT t.category_id, SUM(t.amount)
             FROM \"transaction\" t
             INNER JOIN category c ON c.id = t.category_id
             WHERE t.user_id = :user_id
                AND c.user_id = :user_id
                AND c.kind = :kind
                AND t.purchase_date BETWEEN :start AND :end
                AND (t.note IS NULL OR t.note NOT LIKE :marker ESCAPE '\\')
             GROUP BY t.category_id",
        )?
        .query_map(
            rusqlite::named_params! {
                ":user_id": user_id,
                ":kind": kind,
                ":start": date_range.start(),
                ":end": date_range.end(),
                ":marker": AUTO_INVOICE_NOTE_LIKE_PATTERN,
            },
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?
        .map(|maybe_sum| maybe_sum.map_err(|error| error.into()))
        .collect()
}

/// Initialize the category table.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            icon TEXT,
            kind TEXT NOT NULL CHECK (kind IN ('despesa', 'receita')),
            budget_amount REAL CHECK (budget_amount IS NULL OR budget_amount >= 0)
        );

        CREATE INDEX IF NOT EXISTS idx_category_user_kind ON category(user_id, kind);",
    )
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        icon: row.get(2)?,
        kind: row.get(3)?,
        budget_amount: row.get(4)?,
    })
}
