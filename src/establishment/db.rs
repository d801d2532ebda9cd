//! Database operations for establishments.

use rusqlite::{Connection, Row};

use crate::{
    Error, UserId,
    database_id::DatabaseId,
    establishment::{Establishment, EstablishmentName},
};

/// Create an establishment for `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_establishment(
    user_id: UserId,
    name: EstablishmentName,
    connection: &Connection,
) -> Result<Establishment, Error> {
    connection
        .prepare(
            "INSERT INTO establishment (user_id, name) VALUES (?1, ?2)
             RETURNING id, name",
        )?
        .query_row((user_id, name.as_ref()), map_establishment_row)
        .map_err(|error| error.into())
}

/// Retrieve one of the establishments of `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `establishment_id` does not refer to an establishment of `user_id`,
/// - [Error::SqlError] if there is some other SQL error.
pub fn get_establishment(
    user_id: UserId,
    establishment_id: DatabaseId,
    connection: &Connection,
) -> Result<Establishment, Error> {
    connection
        .prepare("SELECT id, name FROM establishment WHERE id = ?1 AND user_id = ?2")?
        .query_row((establishment_id, user_id), map_establishment_row)
        .map_err(|error| error.into())
}

/// Retrieve the establishments of `user_id`, oldest first.
pub fn get_establishments(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<Establishment>, Error> {
    connection
        .prepare("SELECT id, name FROM establishment WHERE user_id = ?1 ORDER BY id ASC")?
        .query_map([user_id], map_establishment_row)?
        .map(|maybe_establishment| maybe_establishment.map_err(|error| error.into()))
        .collect()
}

/// Delete one of the establishments of `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingEstablishment] if `establishment_id` does not refer to an establishment of `user_id`,
/// - [Error::SqlError] if there is some other SQL error.
pub fn delete_establishment(
    user_id: UserId,
    establishment_id: DatabaseId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM establishment WHERE id = ?1 AND user_id = ?2",
        (establishment_id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingEstablishment);
    }

    Ok(())
}

/// Count the transactions of `user_id` per distinct transaction name, as stored.
pub fn count_transactions_by_name(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<(String, u32)>, Error> {
    connection
        .prepare(
            "SELECT name, COUNT(id) FROM \"transaction\"
             WHERE user_id = ?1
             GROUP BY name
             ORDER BY name ASC",
        )?
        .query_map([user_id], |row| Ok((row.get(0)?, row.get(1)?)))?
        .map(|maybe_count| maybe_count.map_err(|error| error.into()))
        .collect()
}

/// Initialize the establishment table.
pub fn create_establishment_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS establishment (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_establishment_user ON establishment(user_id);",
    )
}

fn map_establishment_row(row: &Row) -> Result<Establishment, rusqlite::Error> {
    Ok(Establishment {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}
