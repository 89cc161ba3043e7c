//! Defines the ledger data model and the single-row database primitives.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::{CategoryId, TransactionId},
    ledger::period::Period,
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// The two ledgers a user keeps. Both store [Transaction]s of the same shape,
/// the ledger decides whether the amount is money going out or coming in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ledger {
    /// Bills and other money spent, keyed by due date.
    Expense,
    /// Salary and other money received, keyed by date received.
    Income,
}

impl Ledger {
    /// Both ledgers, in table creation order.
    pub const ALL: [Ledger; 2] = [Ledger::Expense, Ledger::Income];

    /// The name of the table that stores the ledger.
    pub fn table(self) -> &'static str {
        match self {
            Ledger::Expense => "expense",
            Ledger::Income => "income",
        }
    }

    /// Whether the ledger tracks categories.
    pub fn has_categories(self) -> bool {
        matches!(self, Ledger::Expense)
    }
}

/// An expense or income, either a one-off or recurring every month.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub owner_id: UserID,
    /// A text description of what the transaction is for.
    pub description: String,
    /// The amount of money, positive by convention. The ledger determines
    /// the direction.
    pub amount: f64,
    /// The due date of an expense or the date an income is received.
    ///
    /// This date establishes the first month the transaction applies to.
    pub anchor_date: Date,
    /// Whether the transaction repeats every month from its anchor date.
    pub is_recurring: bool,
    /// The last month a recurring transaction applies to. `None` means the
    /// transaction recurs forever. Always `None` for one-off transactions.
    pub recurrence_end: Option<Date>,
    /// The category of an expense. Incomes never have a category.
    pub category_id: Option<CategoryId>,
}

impl Transaction {
    /// Create a new one-off transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        owner_id: UserID,
        amount: f64,
        anchor_date: Date,
        description: &str,
    ) -> TransactionBuilder {
        TransactionBuilder {
            owner_id,
            description: description.to_owned(),
            amount,
            anchor_date,
            is_recurring: false,
            recurrence_end: None,
            category_id: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// The builder also describes the new terms of an edited transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBuilder {
    /// The user that will own the transaction.
    pub owner_id: UserID,
    /// A text description of what the transaction is for.
    pub description: String,
    /// The amount of money.
    pub amount: f64,
    /// The due or received date.
    pub anchor_date: Date,
    /// Whether the transaction repeats every month.
    pub is_recurring: bool,
    /// The last month of the recurrence, ignored for one-off transactions.
    pub recurrence_end: Option<Date>,
    /// The expense category, ignored for incomes.
    pub category_id: Option<CategoryId>,
}

impl TransactionBuilder {
    /// Make the transaction recur every month until `recurrence_end`, or
    /// forever if `recurrence_end` is `None`.
    pub fn recurring(mut self, recurrence_end: Option<Date>) -> Self {
        self.is_recurring = true;
        self.recurrence_end = recurrence_end;
        self
    }

    /// Set the category id for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Drop the fields that do not apply: the recurrence end of a one-off
    /// transaction and the category of an income.
    ///
    /// # Errors
    /// Returns [Error::InvalidRecurrenceEnd] if the recurrence ends in a month
    /// before the anchor date's month.
    fn normalize(mut self, ledger: Ledger) -> Result<Self, Error> {
        if !self.is_recurring {
            self.recurrence_end = None;
        }

        if !ledger.has_categories() {
            self.category_id = None;
        }

        validate_recurrence_end(self.anchor_date, self.recurrence_end)?;

        Ok(self)
    }
}

/// Check that `recurrence_end` does not fall in a month before `anchor_date`.
pub(crate) fn validate_recurrence_end(
    anchor_date: Date,
    recurrence_end: Option<Date>,
) -> Result<(), Error> {
    match recurrence_end {
        Some(end) if Period::containing(end) < Period::containing(anchor_date) => {
            Err(Error::InvalidRecurrenceEnd)
        }
        _ => Ok(()),
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const COLUMNS: &str =
    "id, owner_id, description, amount, anchor_date, is_recurring, recurrence_end, category_id";

/// Create the tables for both ledgers in the database.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn create_ledger_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    for ledger in Ledger::ALL {
        let table = ledger.table();

        connection.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    owner_id INTEGER NOT NULL,
                    description TEXT NOT NULL,
                    amount REAL NOT NULL,
                    anchor_date TEXT NOT NULL,
                    is_recurring INTEGER NOT NULL,
                    recurrence_end TEXT,
                    category_id INTEGER,
                    FOREIGN KEY(owner_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                    )"
            ),
            (),
        )?;

        // Every read is scoped to one owner.
        connection.execute(
            &format!("CREATE INDEX IF NOT EXISTS idx_{table}_owner ON {table}(owner_id);"),
            (),
        )?;
    }

    Ok(())
}

/// Create a new transaction in `ledger` from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidRecurrenceEnd] if the recurrence ends before it starts,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    ledger: Ledger,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let builder = builder.normalize(ledger)?;

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO {table} (owner_id, description, amount, anchor_date, is_recurring, recurrence_end, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING {COLUMNS}",
            table = ledger.table()
        ))?
        .query_row(
            (
                builder.owner_id.as_i64(),
                builder.description,
                builder.amount,
                builder.anchor_date,
                builder.is_recurring,
                builder.recurrence_end,
                builder.category_id,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction from `ledger` by its `id`.
///
/// This does not check ownership, see [crate::ledger::get_owned_transaction].
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    ledger: Ledger,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {COLUMNS} FROM {table} WHERE id = :id",
            table = ledger.table()
        ))?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve a transaction from `ledger` on behalf of `owner_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - [Error::Forbidden] if the transaction belongs to another user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_owned_transaction(
    ledger: Ledger,
    id: TransactionId,
    owner_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = get_transaction(ledger, id, connection)?;

    if transaction.owner_id != owner_id {
        tracing::warn!(
            "User {owner_id} tried to access {} {id} owned by user {}",
            ledger.table(),
            transaction.owner_id
        );
        return Err(Error::Forbidden);
    }

    Ok(transaction)
}

/// Retrieve every transaction in `ledger` owned by `owner_id`, ordered by id.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_transactions_by_owner(
    ledger: Ledger,
    owner_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {COLUMNS} FROM {table} WHERE owner_id = :owner_id ORDER BY id",
            table = ledger.table()
        ))?
        .query_map(&[(":owner_id", &owner_id.as_i64())], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Overwrite every field of the transaction `id` except its owner.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidRecurrenceEnd] if the recurrence ends before it starts,
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn overwrite_transaction(
    ledger: Ledger,
    id: TransactionId,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let builder = builder.normalize(ledger)?;

    let transaction = connection
        .prepare(&format!(
            "UPDATE {table}
             SET description = ?1, amount = ?2, anchor_date = ?3, is_recurring = ?4,
                 recurrence_end = ?5, category_id = ?6
             WHERE id = ?7
             RETURNING {COLUMNS}",
            table = ledger.table()
        ))?
        .query_row(
            (
                builder.description,
                builder.amount,
                builder.anchor_date,
                builder.is_recurring,
                builder.recurrence_end,
                builder.category_id,
                id,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Set the last date a recurring transaction applies to.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_recurrence_end(
    ledger: Ledger,
    id: TransactionId,
    recurrence_end: Option<Date>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        &format!(
            "UPDATE {table} SET recurrence_end = ?1 WHERE id = ?2",
            table = ledger.table()
        ),
        (recurrence_end, id),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

type RowsAffected = usize;

/// Delete the transaction `id` from `ledger`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_transaction_row(
    ledger: Ledger,
    id: TransactionId,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            &format!("DELETE FROM {table} WHERE id = :id", table = ledger.table()),
            &[(":id", &id)],
        )
        .map_err(|err| err.into())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let owner_id = UserID::new(row.get(1)?);
    let description = row.get(2)?;
    let amount = row.get(3)?;
    let anchor_date = row.get(4)?;
    let is_recurring = row.get(5)?;
    let recurrence_end = row.get(6)?;
    let category_id = row.get(7)?;

    Ok(Transaction {
        id,
        owner_id,
        description,
        amount,
        anchor_date,
        is_recurring,
        recurrence_end,
        category_id,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        ledger::{
            Ledger, Transaction,
            core::{
                create_transaction, delete_transaction_row, get_owned_transaction,
                get_transaction, get_transactions_by_owner, overwrite_transaction, update_recurrence_end,
            },
        },
        user::{UserID, create_test_user},
    };

    fn get_test_connection() -> (Connection, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_test_user("owner@example.com", &conn);
        (conn, user.id)
    }

    #[test]
    fn create_succeeds() {
        let (conn, owner) = get_test_connection();

        let result = create_transaction(
            Ledger::Expense,
            Transaction::build(owner, 12.3, date!(2024 - 03 - 15), "Rent").category_id(Some(1)),
            &conn,
        );

        match result {
            Ok(transaction) => {
                assert_eq!(transaction.amount, 12.3);
                assert_eq!(transaction.owner_id, owner);
                assert_eq!(transaction.category_id, Some(1));
                assert!(!transaction.is_recurring);
            }
            Err(error) => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn one_off_transactions_never_store_a_recurrence_end() {
        let (conn, owner) = get_test_connection();
        let mut builder = Transaction::build(owner, 10.0, date!(2024 - 03 - 15), "");
        builder.recurrence_end = Some(date!(2024 - 06 - 01));

        let transaction = create_transaction(Ledger::Income, builder, &conn).unwrap();

        assert_eq!(transaction.recurrence_end, None);
    }

    #[test]
    fn incomes_never_store_a_category() {
        let (conn, owner) = get_test_connection();

        let transaction = create_transaction(
            Ledger::Income,
            Transaction::build(owner, 10.0, date!(2024 - 03 - 15), "Salary").category_id(Some(2)),
            &conn,
        )
        .unwrap();

        assert_eq!(transaction.category_id, None);
    }

    #[test]
    fn create_fails_on_recurrence_end_before_anchor_month() {
        let (conn, owner) = get_test_connection();

        let result = create_transaction(
            Ledger::Expense,
            Transaction::build(owner, 10.0, date!(2024 - 03 - 15), "")
                .recurring(Some(date!(2024 - 02 - 28))),
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidRecurrenceEnd));
    }

    #[test]
    fn recurrence_end_in_anchor_month_is_allowed() {
        let (conn, owner) = get_test_connection();

        let result = create_transaction(
            Ledger::Expense,
            Transaction::build(owner, 10.0, date!(2024 - 03 - 15), "")
                .recurring(Some(date!(2024 - 03 - 01))),
            &conn,
        );

        assert!(result.is_ok());
    }

    #[test]
    fn get_fails_on_missing_id() {
        let (conn, _) = get_test_connection();

        assert_eq!(
            get_transaction(Ledger::Expense, 42, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn get_owned_distinguishes_missing_from_forbidden() {
        let (conn, owner) = get_test_connection();
        let other = create_test_user("other@example.com", &conn).id;
        let transaction = create_transaction(
            Ledger::Expense,
            Transaction::build(owner, 1.0, date!(2024 - 03 - 15), ""),
            &conn,
        )
        .unwrap();

        assert_eq!(
            get_owned_transaction(Ledger::Expense, transaction.id, owner, &conn),
            Ok(transaction.clone())
        );
        assert_eq!(
            get_owned_transaction(Ledger::Expense, transaction.id, other, &conn),
            Err(Error::Forbidden)
        );
        assert_eq!(
            get_owned_transaction(Ledger::Expense, transaction.id + 1, owner, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn ledgers_are_stored_separately() {
        let (conn, owner) = get_test_connection();
        let expense = create_transaction(
            Ledger::Expense,
            Transaction::build(owner, 1.0, date!(2024 - 03 - 15), ""),
            &conn,
        )
        .unwrap();

        let incomes = get_transactions_by_owner(Ledger::Income, owner, &conn).unwrap();

        assert!(incomes.is_empty());
        assert_eq!(
            get_transactions_by_owner(Ledger::Expense, owner, &conn).unwrap(),
            vec![expense]
        );
    }

    #[test]
    fn get_by_owner_excludes_other_owners() {
        let (conn, owner) = get_test_connection();
        let other = create_test_user("other@example.com", &conn).id;
        let mine = create_transaction(
            Ledger::Expense,
            Transaction::build(owner, 1.0, date!(2024 - 03 - 15), "mine"),
            &conn,
        )
        .unwrap();
        create_transaction(
            Ledger::Expense,
            Transaction::build(other, 2.0, date!(2024 - 03 - 15), "theirs"),
            &conn,
        )
        .unwrap();

        let got = get_transactions_by_owner(Ledger::Expense, owner, &conn).unwrap();

        assert_eq!(got, vec![mine]);
    }

    #[test]
    fn overwrite_replaces_every_field_but_the_owner() {
        let (conn, owner) = get_test_connection();
        let original = create_transaction(
            Ledger::Expense,
            Transaction::build(owner, 1.0, date!(2024 - 03 - 15), "before")
                .recurring(Some(date!(2024 - 12 - 01))),
            &conn,
        )
        .unwrap();

        let updated = overwrite_transaction(
            Ledger::Expense,
            original.id,
            Transaction::build(owner, 2.0, date!(2024 - 04 - 01), "after").category_id(Some(3)),
            &conn,
        )
        .unwrap();

        assert_eq!(
            updated,
            Transaction {
                id: original.id,
                owner_id: owner,
                description: "after".to_owned(),
                amount: 2.0,
                anchor_date: date!(2024 - 04 - 01),
                is_recurring: false,
                recurrence_end: None,
                category_id: Some(3),
            }
        );
    }

    #[test]
    fn update_recurrence_end_fails_on_missing_id() {
        let (conn, _) = get_test_connection();

        let result = update_recurrence_end(Ledger::Income, 7, Some(date!(2024 - 01 - 31)), &conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn delete_removes_row() {
        let (conn, owner) = get_test_connection();
        let transaction = create_transaction(
            Ledger::Income,
            Transaction::build(owner, 1.23, date!(2025 - 10 - 26), "Test"),
            &conn,
        )
        .unwrap();

        let rows_affected = delete_transaction_row(Ledger::Income, transaction.id, &conn).unwrap();

        assert_eq!(rows_affected, 1);
        assert_eq!(
            get_transaction(Ledger::Income, transaction.id, &conn),
            Err(Error::NotFound)
        );
    }
}
