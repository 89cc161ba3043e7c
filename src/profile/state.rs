//! The lookup of Brazilian federative units an address can be in.

use std::sync::{Arc, Mutex};

use axum::{Json, extract::State as AxumState};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::StateId};

/// The 27 federative units as (name, code) pairs, seeded in this order.
pub const BRAZILIAN_STATES: [(&str, &str); 27] = [
    ("Acre", "AC"),
    ("Alagoas", "AL"),
    ("Amapá", "AP"),
    ("Amazonas", "AM"),
    ("Bahia", "BA"),
    ("Ceará", "CE"),
    ("Distrito Federal", "DF"),
    ("Espírito Santo", "ES"),
    ("Goiás", "GO"),
    ("Maranhão", "MA"),
    ("Mato Grosso", "MT"),
    ("Mato Grosso do Sul", "MS"),
    ("Minas Gerais", "MG"),
    ("Pará", "PA"),
    ("Paraíba", "PB"),
    ("Paraná", "PR"),
    ("Pernambuco", "PE"),
    ("Piauí", "PI"),
    ("Rio de Janeiro", "RJ"),
    ("Rio Grande do Norte", "RN"),
    ("Rio Grande do Sul", "RS"),
    ("Rondônia", "RO"),
    ("Roraima", "RR"),
    ("Santa Catarina", "SC"),
    ("São Paulo", "SP"),
    ("Sergipe", "SE"),
    ("Tocantins", "TO"),
];

/// A state an address can be in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// The id of the state.
    pub id: StateId,
    /// The full name, e.g. "São Paulo".
    pub name: String,
    /// The two letter code, e.g. "SP".
    pub code: String,
}

/// A route handler that lists the states.
pub async fn list_states_endpoint(
    AxumState(db_connection): AxumState<Arc<Mutex<Connection>>>,
) -> Result<Json<Vec<State>>, Error> {
    let connection = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    list_states(&connection).map(Json)
}

/// Create the state table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_state_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS state (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                code TEXT NOT NULL UNIQUE
                )",
        (),
    )?;

    Ok(())
}

/// Insert the [BRAZILIAN_STATES] that are not in the table yet.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn seed_states(connection: &Connection) -> Result<(), rusqlite::Error> {
    let mut statement =
        connection.prepare("INSERT OR IGNORE INTO state (name, code) VALUES (?1, ?2)")?;

    for (name, code) in BRAZILIAN_STATES {
        statement.execute((name, code))?;
    }

    Ok(())
}

/// Retrieve every state ordered by id.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_states(connection: &Connection) -> Result<Vec<State>, Error> {
    connection
        .prepare("SELECT id, name, code FROM state ORDER BY id")?
        .query_map([], map_state_row)?
        .map(|maybe_state| maybe_state.map_err(Error::from))
        .collect()
}

fn map_state_row(row: &Row) -> Result<State, rusqlite::Error> {
    Ok(State {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
    })
}
