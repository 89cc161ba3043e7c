//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/expenses/{transaction_id}', use [format_endpoint].

use crate::ledger::Ledger;

/// A simple health check route.
pub const HELLO: &str = "/api/hello";
/// The route for registering a new user.
pub const USERS: &str = "/api/users";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/log_in";
/// The route for requesting a password reset email.
pub const FORGOT_PASSWORD: &str = "/api/forgot_password";
/// The route for setting a new password with a reset token.
pub const RESET_PASSWORD: &str = "/api/reset_password";
/// The client page the password reset email links to, relative to the public URL.
pub const RESET_PASSWORD_VIEW: &str = "/reset_password";
/// The route for listing the states an address can be in.
pub const STATES: &str = "/api/states";
/// The route for listing the expense categories.
pub const CATEGORIES: &str = "/api/categories";

/// The route for the logged in user's profile.
pub const ME: &str = "/api/me";
/// The route for changing the user's name.
pub const ME_NAME: &str = "/api/me/name";
/// The route for changing the user's email address.
pub const ME_EMAIL: &str = "/api/me/email";
/// The route for changing the user's birth date.
pub const ME_BIRTH_DATE: &str = "/api/me/birth_date";
/// The route for replacing the user's address.
pub const ME_ADDRESS: &str = "/api/me/address";

/// The route to create expenses.
pub const EXPENSES: &str = "/api/expenses";
/// The route to access a single expense.
pub const EXPENSE: &str = "/api/expenses/{transaction_id}";
/// The route to end or re-open a recurring expense.
pub const EXPENSE_RECURRENCE_END: &str = "/api/expenses/{transaction_id}/recurrence_end";
/// The route for the total expenses in a month.
pub const EXPENSES_TOTAL: &str = "/api/expenses/total";
/// The route for the expenses due in a month.
pub const EXPENSES_DETAIL: &str = "/api/expenses/detail";
/// The route for the expense totals around a month.
pub const EXPENSES_SERIES: &str = "/api/expenses/series";
/// The route for counting recurring and one-off expenses in a month.
pub const EXPENSES_RECURRENCE_COUNTS: &str = "/api/expenses/recurrence_counts";
/// The route for counting expenses by due day in a month.
pub const EXPENSES_DAY_HISTOGRAM: &str = "/api/expenses/day_histogram";
/// The route for counting expenses by category in a month.
pub const EXPENSES_CATEGORY_HISTOGRAM: &str = "/api/expenses/category_histogram";

/// The route to create incomes.
pub const INCOMES: &str = "/api/incomes";
/// The route to access a single income.
pub const INCOME: &str = "/api/incomes/{transaction_id}";
/// The route to end or re-open a recurring income.
pub const INCOME_RECURRENCE_END: &str = "/api/incomes/{transaction_id}/recurrence_end";
/// The route for the total income in a month.
pub const INCOMES_TOTAL: &str = "/api/incomes/total";
/// The route for the incomes received in a month.
pub const INCOMES_DETAIL: &str = "/api/incomes/detail";
/// The route for the income totals around a month.
pub const INCOMES_SERIES: &str = "/api/incomes/series";
/// The route for counting recurring and one-off incomes in a month.
pub const INCOMES_RECURRENCE_COUNTS: &str = "/api/incomes/recurrence_counts";

/// The routes shared by both ledgers.
#[derive(Debug, Clone, Copy)]
pub struct LedgerEndpoints {
    /// Create a transaction.
    pub collection: &'static str,
    /// Read, edit or delete a transaction.
    pub item: &'static str,
    /// Set the recurrence end of a transaction.
    pub recurrence_end: &'static str,
    /// The total for a month.
    pub total: &'static str,
    /// The transactions in a month.
    pub detail: &'static str,
    /// The totals around a month.
    pub series: &'static str,
    /// The recurring and one-off counts for a month.
    pub recurrence_counts: &'static str,
}

/// The routes for `ledger`.
pub fn ledger_endpoints(ledger: Ledger) -> LedgerEndpoints {
    match ledger {
        Ledger::Expense => LedgerEndpoints {
            collection: EXPENSES,
            item: EXPENSE,
            recurrence_end: EXPENSE_RECURRENCE_END,
            total: EXPENSES_TOTAL,
            detail: EXPENSES_DETAIL,
            series: EXPENSES_SERIES,
            recurrence_counts: EXPENSES_RECURRENCE_COUNTS,
        },
        Ledger::Income => LedgerEndpoints {
            collection: INCOMES,
            item: INCOME,
            recurrence_end: INCOME_RECURRENCE_END,
            total: INCOMES_TOTAL,
            detail: INCOMES_DETAIL,
            series: INCOMES_SERIES,
            recurrence_counts: INCOMES_RECURRENCE_COUNTS,
        },
    }
}

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/expenses/{transaction_id}',
/// '{transaction_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| param_start + offset + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
