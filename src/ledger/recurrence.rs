//! Decides which months a transaction applies to.
//!
//! Every report goes through [matches], so one-off and recurring transactions
//! are counted the same way everywhere. Dates are compared by month only: a
//! transaction due on the 31st and a query for the 1st of the same month
//! refer to the same period.

use crate::ledger::{Transaction, period::Period};

/// Whether `transaction` applies to the month `period`.
///
/// - A one-off transaction applies only to the month of its anchor date.
/// - A recurring transaction applies to every month from its anchor month up
///   to and including the month of its recurrence end, or forever if it has
///   no end. It never applies to months before its anchor.
pub fn matches(transaction: &Transaction, period: Period) -> bool {
    let base = Period::containing(transaction.anchor_date);

    if !transaction.is_recurring {
        return period == base;
    }

    let end = transaction.recurrence_end.map(Period::containing);

    period >= base && end.is_none_or(|end| period <= end)
}
