use std::sync::{Arc, Mutex};

use axum::{Extension, Json, extract::State, http::StatusCode};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    database_id::CategoryId,
    ledger::{Ledger, Transaction, TransactionBuilder, service::create_transaction},
    user::UserID,
};

/// The terms of a new or edited transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionForm {
    /// What the transaction is for.
    pub description: String,
    /// The amount of money.
    pub amount: f64,
    /// The due date of an expense or the date an income is received.
    pub date: Date,
    /// Whether the transaction repeats every month.
    #[serde(default)]
    pub is_recurring: bool,
    /// The last month the transaction recurs in, `None` for forever.
    #[serde(default)]
    pub recurrence_end: Option<Date>,
    /// The expense category.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

impl TransactionForm {
    /// Convert the form into the terms of a transaction owned by `owner_id`.
    pub fn into_builder(self, owner_id: UserID) -> TransactionBuilder {
        let builder = Transaction::build(owner_id, self.amount, self.date, &self.description)
            .category_id(self.category_id);

        if self.is_recurring {
            builder.recurring(self.recurrence_end)
        } else {
            builder
        }
    }
}

/// A route handler for creating a transaction in the ledger of the route.
///
/// Responds with the new transaction and 201 Created.
pub async fn create_transaction_endpoint(
    State(db_connection): State<Arc<Mutex<Connection>>>,
    Extension(ledger): Extension<Ledger>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<TransactionForm>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let connection = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = create_transaction(ledger, user_id, form.into_builder(user_id), &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}
