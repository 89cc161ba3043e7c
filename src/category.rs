//! The static lookup of expense categories, e.g. 'Food' or 'Transport'.
//!
//! An expense refers to a category by id. The id is not checked against this
//! table, so reports fall back to [OTHER_CATEGORY_LABEL] for ids that do not
//! resolve.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{Json, extract::State};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::CategoryId};

/// The name reported for expenses without a known category.
pub const OTHER_CATEGORY_LABEL: &str = "Other";

/// The categories stored in a new database.
pub const DEFAULT_CATEGORIES: [&str; 6] = [
    "Housing",
    "Food",
    "Transport",
    "Health",
    "Education",
    "Leisure",
];

/// A category for expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// The id of the category.
    pub id: CategoryId,
    /// The display name of the category.
    pub name: String,
}

/// Category names keyed by category id.
pub type CategoryNames = HashMap<CategoryId, String>;

/// Resolve `category_id` to a name, defaulting to [OTHER_CATEGORY_LABEL].
pub fn category_name(categories: &CategoryNames, category_id: Option<CategoryId>) -> &str {
    category_id
        .and_then(|id| categories.get(&id))
        .map_or(OTHER_CATEGORY_LABEL, String::as_str)
}

/// A route handler that lists the categories an expense can have.
pub async fn list_categories_endpoint(
    State(db_connection): State<Arc<Mutex<Connection>>>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    list_categories(&connection).map(Json)
}

/// Create the category table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
                )",
        (),
    )?;

    Ok(())
}

/// Insert [DEFAULT_CATEGORIES] that are not in the table yet.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn seed_categories(connection: &Connection) -> Result<(), rusqlite::Error> {
    let mut statement = connection.prepare("INSERT OR IGNORE INTO category (name) VALUES (?1)")?;

    for name in DEFAULT_CATEGORIES {
        statement.execute([name])?;
    }

    Ok(())
}

/// Retrieve every category ordered by id.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name FROM category ORDER BY id")?
        .query_map([], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

/// Retrieve the category lookup used to name categories in reports.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_category_names(connection: &Connection) -> Result<CategoryNames, Error> {
    Ok(list_categories(connection)?
        .into_iter()
        .map(|category| (category.id, category.name))
        .collect())
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}
