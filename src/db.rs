//! Database setup.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, card::create_card_table, category::create_category_table,
    establishment::create_establishment_table, invoice::create_invoice_table,
    payer::create_payer_table, transaction::create_transaction_table,
};

/// Create the tables for the domain models if they do not exist yet.
///
/// All tables are created inside a single SQL transaction and foreign key
/// enforcement is switched on for `connection`.
///
/// # Errors
/// Returns an [Error::SqlError] if any of the tables cannot be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Has no effect inside a transaction, so it must run first.
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_category_table(&transaction)?;
    create_card_table(&transaction)?;
    create_invoice_table(&transaction)?;
    create_payer_table(&transaction)?;
    create_establishment_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
