use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use rusqlite::Connection;

use crate::{
    Error,
    database_id::TransactionId,
    ledger::{Ledger, Transaction, core::get_owned_transaction},
    user::UserID,
};

/// A route handler for reading a single transaction owned by the user.
pub async fn get_transaction_endpoint(
    State(db_connection): State<Arc<Mutex<Connection>>>,
    Extension(ledger): Extension<Ledger>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let connection = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_owned_transaction(ledger, transaction_id, user_id, &connection).map(Json)
}
