//! Totals for a run of months around a reference month, e.g. for a chart.

use serde::Serialize;

use crate::{
    ledger::{
        Transaction,
        aggregate::{Total, aggregate},
        period::Period,
    },
    user::UserID,
};

/// The month offsets reported around the reference month: three months
/// before it up to two months after it.
pub const SCAN_WINDOW: [i32; 6] = [-3, -2, -1, 0, 1, 2];

/// The total of a ledger in one month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodTotal {
    /// The month the total is for.
    #[serde(flatten)]
    pub period: Period,
    /// The sum of the amounts that apply to the month.
    pub total: f64,
}

/// Compute the total for each month `reference` shifted by `offsets`.
///
/// Months with nothing due are reported with a total of zero. Months that
/// fall outside the supported years are left out. The result is in
/// chronological order and holds one entry per distinct month.
pub fn scan(
    transactions: &[Transaction],
    owner_id: UserID,
    reference: Period,
    offsets: &[i32],
) -> Vec<PeriodTotal> {
    let mut periods: Vec<Period> = offsets
        .iter()
        .filter_map(|&offset| reference.shift(offset).ok())
        .collect();
    periods.sort_unstable();
    periods.dedup();

    periods
        .into_iter()
        .map(|period| PeriodTotal {
            period,
            total: aggregate(transactions, owner_id, period, &Total),
        })
        .collect()
}
