//! The ledger operations offered to the HTTP layer.
//!
//! Every operation takes the owner explicitly and only ever sees that
//! owner's transactions. Reports load the owner's rows from storage and
//! recompute from scratch on each call.

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    category::get_category_names,
    database_id::TransactionId,
    ledger::{
        Ledger, Transaction, TransactionBuilder,
        aggregate::{
            AggregateMode, CategoryCount, DayCount, Detail, PerCategoryHistogram,
            PerDayHistogram, RecurrenceCount, RecurrenceCounts, Total, aggregate,
        },
        core::{
            self, delete_transaction_row, get_owned_transaction, get_transaction,
            get_transactions_by_owner, update_recurrence_end, validate_recurrence_end,
        },
        period::Period,
        scan::{PeriodTotal, SCAN_WINDOW, scan},
    },
    user::UserID,
};

fn aggregate_owned<M: AggregateMode>(
    ledger: Ledger,
    owner_id: UserID,
    period: Period,
    mode: &M,
    connection: &Connection,
) -> Result<M::Output, Error> {
    let transactions = get_transactions_by_owner(ledger, owner_id, connection)?;

    Ok(aggregate(&transactions, owner_id, period, mode))
}

/// The sum of the amounts in `ledger` that apply to `period`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_total(
    ledger: Ledger,
    owner_id: UserID,
    period: Period,
    connection: &Connection,
) -> Result<f64, Error> {
    aggregate_owned(ledger, owner_id, period, &Total, connection)
}

/// The transactions in `ledger` that apply to `period`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_detail(
    ledger: Ledger,
    owner_id: UserID,
    period: Period,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    aggregate_owned(ledger, owner_id, period, &Detail, connection)
}

/// How many transactions in `ledger` are due on each day of `period`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_day_histogram(
    ledger: Ledger,
    owner_id: UserID,
    period: Period,
    connection: &Connection,
) -> Result<Vec<DayCount>, Error> {
    aggregate_owned(ledger, owner_id, period, &PerDayHistogram, connection)
}

/// How many transactions in `ledger` that apply to `period` fall in each
/// category.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_category_histogram(
    ledger: Ledger,
    owner_id: UserID,
    period: Period,
    connection: &Connection,
) -> Result<Vec<CategoryCount>, Error> {
    let categories = get_category_names(connection)?;

    aggregate_owned(
        ledger,
        owner_id,
        period,
        &PerCategoryHistogram {
            categories: &categories,
        },
        connection,
    )
}

/// The totals of `ledger` for the months around `reference`, see
/// [SCAN_WINDOW].
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_multi_period_series(
    ledger: Ledger,
    owner_id: UserID,
    reference: Period,
    connection: &Connection,
) -> Result<Vec<PeriodTotal>, Error> {
    let transactions = get_transactions_by_owner(ledger, owner_id, connection)?;

    Ok(scan(&transactions, owner_id, reference, &SCAN_WINDOW))
}

/// How many recurring and one-off transactions in `ledger` apply to `period`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_recurrence_counts(
    ledger: Ledger,
    owner_id: UserID,
    period: Period,
    connection: &Connection,
) -> Result<RecurrenceCounts, Error> {
    aggregate_owned(ledger, owner_id, period, &RecurrenceCount, connection)
}

/// Add a transaction owned by `owner_id` to `ledger`.
///
/// The owner in `terms` is ignored.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidRecurrenceEnd] if the recurrence ends before it starts,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    ledger: Ledger,
    owner_id: UserID,
    mut terms: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    terms.owner_id = owner_id;

    let transaction = core::create_transaction(ledger, terms, connection)?;
    tracing::info!(
        "Created {} {} for user {owner_id}",
        ledger.table(),
        transaction.id
    );

    Ok(transaction)
}

/// Delete the transaction `id` from `ledger` on behalf of `owner_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - [Error::Forbidden] if the transaction belongs to another user, in which
///   case nothing is deleted,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    ledger: Ledger,
    id: TransactionId,
    owner_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    get_owned_transaction(ledger, id, owner_id, connection)?;

    match delete_transaction_row(ledger, id, connection)? {
        0 => Err(Error::NotFound),
        _ => {
            tracing::info!("Deleted {} {id}", ledger.table());
            Ok(())
        }
    }
}

/// End the recurring transaction `id` on `recurrence_end`, or make it recur
/// forever if `recurrence_end` is `None`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - [Error::Forbidden] if the transaction belongs to another user,
/// - [Error::InvalidRecurrenceEnd] if the transaction is not recurring or
///   `recurrence_end` is in a month before the anchor date,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn set_recurrence_end(
    ledger: Ledger,
    id: TransactionId,
    owner_id: UserID,
    recurrence_end: Option<Date>,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = get_owned_transaction(ledger, id, owner_id, connection)?;

    if !transaction.is_recurring {
        return Err(Error::InvalidRecurrenceEnd);
    }

    validate_recurrence_end(transaction.anchor_date, recurrence_end)?;
    update_recurrence_end(ledger, id, recurrence_end, connection)?;

    get_transaction(ledger, id, connection)
}
