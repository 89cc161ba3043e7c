//! Reduces the transactions that apply to a month into totals, listings and
//! histograms.
//!
//! [aggregate] selects the owner's transactions that apply to the month and
//! hands them to an [AggregateMode], which decides what the result looks like.
//! No mode fails on an empty selection: totals are zero and lists are empty.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    category::{CategoryNames, category_name},
    ledger::{Transaction, period::Period, recurrence::matches},
    user::UserID,
};

/// A reduction over the transactions that apply to a month.
pub trait AggregateMode {
    /// The result of the reduction.
    type Output;

    /// Reduce the matched transactions, given in storage order.
    fn reduce<'a, I>(&self, matched: I) -> Self::Output
    where
        I: Iterator<Item = &'a Transaction>;
}

/// Apply `mode` to the transactions owned by `owner_id` that apply to `period`.
///
/// Transactions belonging to other owners are skipped even if the caller
/// passes them in.
pub fn aggregate<M: AggregateMode>(
    transactions: &[Transaction],
    owner_id: UserID,
    period: Period,
    mode: &M,
) -> M::Output {
    mode.reduce(
        transactions
            .iter()
            .filter(|transaction| transaction.owner_id == owner_id)
            .filter(|transaction| matches(transaction, period)),
    )
}

/// The sum of the amounts.
#[derive(Debug, Clone, Copy)]
pub struct Total;

impl AggregateMode for Total {
    type Output = f64;

    fn reduce<'a, I>(&self, matched: I) -> f64
    where
        I: Iterator<Item = &'a Transaction>,
    {
        matched.fold(0.0, |total, transaction| total + transaction.amount)
    }
}

/// The matched transactions themselves.
///
/// One-off transactions are listed without a recurrence end, whatever is
/// stored for them.
#[derive(Debug, Clone, Copy)]
pub struct Detail;

impl AggregateMode for Detail {
    type Output = Vec<Transaction>;

    fn reduce<'a, I>(&self, matched: I) -> Vec<Transaction>
    where
        I: Iterator<Item = &'a Transaction>,
    {
        matched
            .map(|transaction| Transaction {
                recurrence_end: transaction
                    .recurrence_end
                    .filter(|_| transaction.is_recurring),
                ..transaction.clone()
            })
            .collect()
    }
}

/// The number of transactions due on a day of the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayCount {
    /// The day of the month of the transactions' anchor date.
    pub day: u8,
    /// How many transactions fall on that day.
    pub count: usize,
}

/// Count transactions by the day of month of their anchor date, in ascending
/// day order.
#[derive(Debug, Clone, Copy)]
pub struct PerDayHistogram;

impl AggregateMode for PerDayHistogram {
    type Output = Vec<DayCount>;

    fn reduce<'a, I>(&self, matched: I) -> Vec<DayCount>
    where
        I: Iterator<Item = &'a Transaction>,
    {
        let mut counts: BTreeMap<u8, usize> = BTreeMap::new();

        for transaction in matched {
            *counts.entry(transaction.anchor_date.day()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(day, count)| DayCount { day, count })
            .collect()
    }
}

/// The number of transactions in a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    /// The category name.
    pub category: String,
    /// How many transactions have that category.
    pub count: usize,
}

/// Count transactions by category name.
///
/// Unknown or missing category ids are counted under
/// [crate::category::OTHER_CATEGORY_LABEL]. Categories are listed in the
/// order they are first encountered, not sorted.
#[derive(Debug, Clone, Copy)]
pub struct PerCategoryHistogram<'c> {
    /// The category lookup used to resolve names.
    pub categories: &'c CategoryNames,
}

impl AggregateMode for PerCategoryHistogram<'_> {
    type Output = Vec<CategoryCount>;

    fn reduce<'a, I>(&self, matched: I) -> Vec<CategoryCount>
    where
        I: Iterator<Item = &'a Transaction>,
    {
        let mut counts: Vec<CategoryCount> = Vec::new();

        for transaction in matched {
            let name = category_name(self.categories, transaction.category_id);

            match counts.iter_mut().find(|count| count.category == name) {
                Some(count) => count.count += 1,
                None => counts.push(CategoryCount {
                    category: name.to_owned(),
                    count: 1,
                }),
            }
        }

        counts
    }
}

/// How many of the matched transactions are recurring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecurrenceCounts {
    /// The number of recurring transactions.
    pub recurring: usize,
    /// The number of one-off transactions.
    pub non_recurring: usize,
}

/// Count recurring and one-off transactions separately.
#[derive(Debug, Clone, Copy)]
pub struct RecurrenceCount;

impl AggregateMode for RecurrenceCount {
    type Output = RecurrenceCounts;

    fn reduce<'a, I>(&self, matched: I) -> RecurrenceCounts
    where
        I: Iterator<Item = &'a Transaction>,
    {
        matched.fold(RecurrenceCounts::default(), |mut counts, transaction| {
            if transaction.is_recurring {
                counts.recurring += 1;
            } else {
                counts.non_recurring += 1;
            }
            counts
        })
    }
}
