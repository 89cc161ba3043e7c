//! Editing a recurring transaction without rewriting its history.
//!
//! Months before the current month keep reporting the terms that applied at
//! the time. The edit takes effect from the current month onwards by closing
//! the old transaction at the end of last month and starting a new one.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::TransactionId,
    ledger::{
        Ledger, TransactionBuilder,
        core::{
            create_transaction, get_owned_transaction, overwrite_transaction,
            update_recurrence_end,
        },
        period::Period,
    },
    user::UserID,
};

/// How an edit was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EditOutcome {
    /// The transaction was updated in place.
    Overwritten {
        /// The ID of the edited transaction.
        id: TransactionId,
    },
    /// The old transaction was closed and a new one carries the new terms.
    Split {
        /// The ID of the old transaction, which now ends last month.
        closed_id: TransactionId,
        /// The ID of the transaction holding the new terms.
        created_id: TransactionId,
    },
}

/// Apply `terms` to the transaction `id` owned by `owner_id`, where `today`
/// is the current date in the server's timezone.
///
/// One-off terms overwrite the transaction in place. Recurring terms never
/// start before the month of `today`: an earlier anchor date is moved into
/// that month, keeping its day of month. They split the transaction: the
/// old transaction ends on the last day of the month before `today` and a
/// new transaction with the new terms starts. A transaction that starts in
/// the current month or later has no history to keep and is overwritten
/// instead.
///
/// Both writes happen in one database transaction, so either both are
/// stored or neither is.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - [Error::Forbidden] if the transaction belongs to another user,
/// - [Error::InvalidRecurrenceEnd] if the new recurrence ends before the new
///   transaction starts,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn edit_with_history(
    ledger: Ledger,
    id: TransactionId,
    owner_id: UserID,
    mut terms: TransactionBuilder,
    today: Date,
    connection: &Connection,
) -> Result<EditOutcome, Error> {
    terms.owner_id = owner_id;

    let tx = connection.unchecked_transaction()?;

    let existing = get_owned_transaction(ledger, id, owner_id, &tx)?;
    let current_period = Period::containing(today);

    if terms.is_recurring && Period::containing(terms.anchor_date) < current_period {
        terms.anchor_date = current_period.clamped_day(terms.anchor_date.day())?;
    }

    if !terms.is_recurring || Period::containing(existing.anchor_date) >= current_period {
        overwrite_transaction(ledger, id, terms, &tx)?;
        tx.commit()?;

        tracing::info!("Overwrote {} {id}", ledger.table());
        return Ok(EditOutcome::Overwritten { id });
    }

    if existing.is_recurring {
        let last_month_end = current_period.previous()?.last_day()?;
        let recurrence_end = existing
            .recurrence_end
            .map_or(last_month_end, |end| end.min(last_month_end));

        update_recurrence_end(ledger, id, Some(recurrence_end), &tx)?;
    }

    let created = create_transaction(ledger, terms, &tx)?;
    tx.commit()?;

    tracing::info!(
        "Closed {table} {id} and continued it as {table} {}",
        created.id,
        table = ledger.table()
    );

    Ok(EditOutcome::Split {
        closed_id: id,
        created_id: created.id,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        Error,
        db::initialize,
        ledger::{
            Ledger, Transaction,
            aggregate::{Detail, Total, aggregate},
            core::{create_transaction, get_transaction, get_transactions_by_owner},
            period::Period,
        },
        user::{UserID, create_test_user},
    };

    use super::{EditOutcome, edit_with_history};

    const TODAY: Date = date!(2024 - 07 - 15);

    fn get_test_connection() -> (Connection, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_test_user("owner@example.com", &conn);
        (conn, user.id)
    }

    fn create_rent(owner: UserID, conn: &Connection) -> Transaction {
        create_transaction(
            Ledger::Expense,
            Transaction::build(owner, 50.0, date!(2024 - 01 - 10), "Rent").recurring(None),
            conn,
        )
        .unwrap()
    }

    fn period(year: i32, month: u8) -> Period {
        Period::new(year, month).unwrap()
    }

    #[test]
    fn recurring_edit_closes_old_and_creates_new() {
        let (conn, owner) = get_test_connection();
        let old = create_rent(owner, &conn);

        let outcome = edit_with_history(
            Ledger::Expense,
            old.id,
            owner,
            Transaction::build(owner, 80.0, date!(2024 - 01 - 10), "Rent").recurring(None),
            TODAY,
            &conn,
        )
        .unwrap();

        let EditOutcome::Split {
            closed_id,
            created_id,
        } = outcome
        else {
            panic!("expected a split, got {outcome:?}");
        };
        assert_eq!(closed_id, old.id);
        assert_ne!(created_id, old.id);

        let closed = get_transaction(Ledger::Expense, closed_id, &conn).unwrap();
        assert_eq!(closed.recurrence_end, Some(date!(2024 - 06 - 30)));
        assert_eq!(closed.amount, 50.0);

        let created = get_transaction(Ledger::Expense, created_id, &conn).unwrap();
        assert_eq!(created.recurrence_end, None);
        assert_eq!(created.amount, 80.0);
        assert_eq!(created.anchor_date, date!(2024 - 07 - 10));

        let transactions = get_transactions_by_owner(Ledger::Expense, owner, &conn).unwrap();
        assert_eq!(
            aggregate(&transactions, owner, period(2024, 5), &Detail),
            vec![closed]
        );
        assert_eq!(
            aggregate(&transactions, owner, period(2024, 7), &Detail),
            vec![created]
        );
    }

    #[test]
    fn history_is_preserved_across_the_closing_month() {
        let (conn, owner) = get_test_connection();
        let old = create_rent(owner, &conn);

        edit_with_history(
            Ledger::Expense,
            old.id,
            owner,
            Transaction::build(owner, 80.0, date!(2024 - 03 - 31), "Rent").recurring(None),
            TODAY,
            &conn,
        )
        .unwrap();

        let transactions = get_transactions_by_owner(Ledger::Expense, owner, &conn).unwrap();
        let closing = Period::containing(TODAY);
        for offset in -6..6 {
            let period = closing.shift(offset).unwrap();
            let expected = if period < closing { 50.0 } else { 80.0 };

            assert_eq!(
                aggregate(&transactions, owner, period, &Total),
                expected,
                "wrong total for {period}"
            );
        }
    }

    #[test]
    fn closing_in_january_ends_old_in_december() {
        let (conn, owner) = get_test_connection();
        let old = create_transaction(
            Ledger::Income,
            Transaction::build(owner, 1000.0, date!(2023 - 05 - 01), "Salary").recurring(None),
            &conn,
        )
        .unwrap();

        edit_with_history(
            Ledger::Income,
            old.id,
            owner,
            Transaction::build(owner, 1100.0, date!(2023 - 05 - 01), "Salary").recurring(None),
            date!(2024 - 01 - 20),
            &conn,
        )
        .unwrap();

        let closed = get_transaction(Ledger::Income, old.id, &conn).unwrap();
        assert_eq!(closed.recurrence_end, Some(date!(2023 - 12 - 31)));
    }

    #[test]
    fn earlier_recurrence_end_is_kept() {
        let (conn, owner) = get_test_connection();
        let old = create_transaction(
            Ledger::Expense,
            Transaction::build(owner, 50.0, date!(2024 - 01 - 10), "Gym")
                .recurring(Some(date!(2024 - 03 - 10))),
            &conn,
        )
        .unwrap();

        edit_with_history(
            Ledger::Expense,
            old.id,
            owner,
            Transaction::build(owner, 60.0, date!(2024 - 07 - 10), "Gym").recurring(None),
            TODAY,
            &conn,
        )
        .unwrap();

        let closed = get_transaction(Ledger::Expense, old.id, &conn).unwrap();
        assert_eq!(closed.recurrence_end, Some(date!(2024 - 03 - 10)));
    }

    #[test]
    fn one_off_terms_overwrite_in_place() {
        let (conn, owner) = get_test_connection();
        let old = create_transaction(
            Ledger::Expense,
            Transaction::build(owner, 50.0, date!(2024 - 01 - 10), "Rent")
                .recurring(Some(date!(2024 - 12 - 01))),
            &conn,
        )
        .unwrap();

        let outcome = edit_with_history(
            Ledger::Expense,
            old.id,
            owner,
            Transaction::build(owner, 75.0, date!(2024 - 02 - 10), "Deposit"),
            TODAY,
            &conn,
        )
        .unwrap();

        assert_eq!(outcome, EditOutcome::Overwritten { id: old.id });
        let updated = get_transaction(Ledger::Expense, old.id, &conn).unwrap();
        assert_eq!(updated.amount, 75.0);
        assert!(!updated.is_recurring);
        assert_eq!(updated.recurrence_end, None);
        assert_eq!(
            get_transactions_by_owner(Ledger::Expense, owner, &conn)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn transaction_starting_this_month_is_overwritten() {
        let (conn, owner) = get_test_connection();
        let old = create_transaction(
            Ledger::Expense,
            Transaction::build(owner, 50.0, date!(2024 - 07 - 01), "Phone").recurring(None),
            &conn,
        )
        .unwrap();

        let outcome = edit_with_history(
            Ledger::Expense,
            old.id,
            owner,
            Transaction::build(owner, 55.0, date!(2024 - 07 - 01), "Phone").recurring(None),
            TODAY,
            &conn,
        )
        .unwrap();

        assert_eq!(outcome, EditOutcome::Overwritten { id: old.id });
        assert_eq!(
            get_transaction(Ledger::Expense, old.id, &conn)
                .unwrap()
                .amount,
            55.0
        );
    }

    #[test]
    fn overwrite_does_not_move_recurring_terms_into_the_past() {
        let (conn, owner) = get_test_connection();
        let old = create_transaction(
            Ledger::Expense,
            Transaction::build(owner, 50.0, date!(2024 - 07 - 01), "Phone").recurring(None),
            &conn,
        )
        .unwrap();

        let outcome = edit_with_history(
            Ledger::Expense,
            old.id,
            owner,
            Transaction::build(owner, 55.0, date!(2024 - 03 - 31), "Phone").recurring(None),
            TODAY,
            &conn,
        )
        .unwrap();

        assert_eq!(outcome, EditOutcome::Overwritten { id: old.id });
        let edited = get_transaction(Ledger::Expense, old.id, &conn).unwrap();
        assert_eq!(edited.anchor_date, date!(2024 - 07 - 31));
        let transactions = get_transactions_by_owner(Ledger::Expense, owner, &conn).unwrap();
        assert_eq!(aggregate(&transactions, owner, period(2024, 6), &Total), 0.0);
        assert_eq!(aggregate(&transactions, owner, period(2024, 7), &Total), 55.0);
    }

    #[test]
    fn past_one_off_made_recurring_keeps_its_month() {
        let (conn, owner) = get_test_connection();
        let old = create_transaction(
            Ledger::Expense,
            Transaction::build(owner, 20.0, date!(2024 - 02 - 05), "Streaming"),
            &conn,
        )
        .unwrap();

        let outcome = edit_with_history(
            Ledger::Expense,
            old.id,
            owner,
            Transaction::build(owner, 20.0, date!(2024 - 02 - 05), "Streaming").recurring(None),
            TODAY,
            &conn,
        )
        .unwrap();

        assert!(matches!(outcome, EditOutcome::Split { .. }));
        let transactions = get_transactions_by_owner(Ledger::Expense, owner, &conn).unwrap();
        assert_eq!(aggregate(&transactions, owner, period(2024, 2), &Total), 20.0);
        assert_eq!(aggregate(&transactions, owner, period(2024, 4), &Total), 0.0);
        assert_eq!(aggregate(&transactions, owner, period(2024, 8), &Total), 20.0);
    }

    #[test]
    fn fails_for_other_owner_without_changes() {
        let (conn, owner) = get_test_connection();
        let other = create_test_user("other@example.com", &conn).id;
        let old = create_rent(owner, &conn);

        let result = edit_with_history(
            Ledger::Expense,
            old.id,
            other,
            Transaction::build(other, 1.0, date!(2024 - 07 - 01), "Mine now").recurring(None),
            TODAY,
            &conn,
        );

        assert_eq!(result, Err(Error::Forbidden));
        assert_eq!(get_transaction(Ledger::Expense, old.id, &conn), Ok(old));
    }

    #[test]
    fn fails_on_missing_id() {
        let (conn, owner) = get_test_connection();

        let result = edit_with_history(
            Ledger::Income,
            1,
            owner,
            Transaction::build(owner, 1.0, date!(2024 - 07 - 01), "").recurring(None),
            TODAY,
            &conn,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn failed_insert_rolls_back_the_close() {
        let (conn, owner) = get_test_connection();
        let old = create_rent(owner, &conn);
        conn.execute(
            "CREATE TEMP TRIGGER block_insert BEFORE INSERT ON expense
             BEGIN SELECT RAISE(ABORT, 'insert blocked'); END;",
            (),
        )
        .unwrap();

        let result = edit_with_history(
            Ledger::Expense,
            old.id,
            owner,
            Transaction::build(owner, 80.0, date!(2024 - 01 - 10), "Rent").recurring(None),
            TODAY,
            &conn,
        );

        assert!(
            matches!(result, Err(Error::SqlError(_))),
            "expected an SQL error, got {result:?}"
        );
        assert_eq!(get_transaction(Ledger::Expense, old.id, &conn), Ok(old));
    }

    #[test]
    fn invalid_new_recurrence_end_rolls_back_the_close() {
        let (conn, owner) = get_test_connection();
        let old = create_rent(owner, &conn);

        let result = edit_with_history(
            Ledger::Expense,
            old.id,
            owner,
            Transaction::build(owner, 80.0, date!(2024 - 01 - 10), "Rent")
                .recurring(Some(date!(2024 - 05 - 01))),
            TODAY,
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidRecurrenceEnd));
        assert_eq!(get_transaction(Ledger::Expense, old.id, &conn), Ok(old));
    }
}
