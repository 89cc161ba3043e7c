//! The expense and income ledgers and the monthly reports built from them.
//!
//! A transaction is either a one-off, which applies to the month of its
//! anchor date, or recurring, which applies to every month from its anchor
//! date until its recurrence end. [recurrence::matches] decides which months
//! a transaction applies to and every report goes through it.

pub mod aggregate;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod get_endpoint;
pub mod period;
pub mod recurrence;
mod report_endpoints;
pub mod scan;
pub mod service;
pub mod transition;

pub use core::{
    Ledger, Transaction, TransactionBuilder, create_ledger_tables, get_owned_transaction,
    get_transaction, get_transactions_by_owner,
};
pub use create_endpoint::{TransactionForm, create_transaction_endpoint};
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::{
    EditTransactionState, RecurrenceEndForm, edit_transaction_endpoint,
    set_recurrence_end_endpoint,
};
pub use get_endpoint::get_transaction_endpoint;
pub use report_endpoints::{
    get_category_histogram_endpoint, get_day_histogram_endpoint, get_detail_endpoint,
    get_recurrence_counts_endpoint, get_series_endpoint, get_total_endpoint,
};
