//! Creates the application's tables and seeds the lookup tables.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error,
    category::{create_category_table, seed_categories},
    ledger::create_ledger_tables,
    profile::{create_address_table, create_profile_table, create_state_table, seed_states},
    user::create_user_table,
};

/// Create all of the application's tables and insert the lookup data.
///
/// Safe to call on a database that has already been initialised.
///
/// # Errors
/// Returns an [Error::SqlError] if a table cannot be created or seeded.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Has no effect inside a transaction, so it must come first.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_state_table(&transaction)?;
    create_address_table(&transaction)?;
    create_profile_table(&transaction)?;
    create_category_table(&transaction)?;
    create_ledger_tables(&transaction)?;

    seed_states(&transaction)?;
    seed_categories(&transaction)?;

    transaction.commit()?;

    Ok(())
}
