use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    database_id::TransactionId,
    ledger::{
        Ledger, Transaction,
        create_endpoint::TransactionForm,
        service::set_recurrence_end,
        transition::{EditOutcome, edit_with_history},
    },
    timezone::local_today,
    user::UserID,
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler for editing a transaction.
///
/// Recurring terms take effect from the current month, earlier months keep
/// the old terms. Responds with how the edit was applied.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Extension(ledger): Extension<Ledger>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    Json(form): Json<TransactionForm>,
) -> Result<Json<EditOutcome>, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    edit_with_history(
        ledger,
        transaction_id,
        user_id,
        form.into_builder(user_id),
        today,
        &connection,
    )
    .map(Json)
}

/// The new end of a recurring transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct RecurrenceEndForm {
    /// The last month the transaction applies to, `None` to recur forever.
    pub recurrence_end: Option<Date>,
}

/// A route handler for ending, or re-opening, a recurring transaction.
pub async fn set_recurrence_end_endpoint(
    State(db_connection): State<Arc<Mutex<Connection>>>,
    Extension(ledger): Extension<Ledger>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    Json(form): Json<RecurrenceEndForm>,
) -> Result<Json<Transaction>, Error> {
    let connection = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    set_recurrence_end(
        ledger,
        transaction_id,
        user_id,
        form.recurrence_end,
        &connection,
    )
    .map(Json)
}
