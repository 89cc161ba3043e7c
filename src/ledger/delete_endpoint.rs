use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    Error,
    database_id::TransactionId,
    ledger::{Ledger, service::delete_transaction},
    user::UserID,
};

/// A route handler for deleting a transaction, responds with 204 No Content.
pub async fn delete_transaction_endpoint(
    State(db_connection): State<Arc<Mutex<Connection>>>,
    Extension(ledger): Extension<Ledger>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<StatusCode, Error> {
    let connection = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_transaction(ledger, transaction_id, user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
