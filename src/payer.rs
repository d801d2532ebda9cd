//! Payers (pagadores): the people a card's spending is split between.

use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::{Error, UserId, database_id::DatabaseId};

/// A person who pays for some of the transactions on a card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payer {
    /// The ID of the payer.
    pub id: DatabaseId,
    /// The payer's display name.
    pub name: String,
    /// The URL of the payer's avatar image.
    pub avatar_url: Option<String>,
}

/// Create a payer for `user_id` and return it with its generated ID.
pub fn create_payer(
    user_id: UserId,
    name: &str,
    avatar_url: Option<&str>,
    connection: &Connection,
) -> Result<Payer, Error> {
    connection
        .prepare(
            "INSERT INTO payer (user_id, name, avatar_url) VALUES (?1, ?2, ?3)
             RETURNING id, name, avatar_url",
        )?
        .query_row((user_id, name, avatar_url), map_row)
        .map_err(|error| error.into())
}

/// Initialize the payer table.
pub fn create_payer_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS payer (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            avatar_url TEXT
        );",
    )
}

fn map_row(row: &Row) -> Result<Payer, rusqlite::Error> {
    Ok(Payer {
        id: row.get(0)?,
        name: row.get(1)?,
        avatar_url: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{UserId, db::initialize};

    use super::create_payer;

    #[test]
    fn create_payer_succeeds() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let payer = create_payer(UserId::new(1), "Ana", Some("/avatars/ana.png"), &conn)
            .expect("Could not create payer");

        assert!(payer.id > 0);
        assert_eq!(payer.name, "Ana");
        assert_eq!(payer.avatar_url.as_deref(), Some("/avatars/ana.png"));
    }
}
