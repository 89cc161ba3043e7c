//! Code for creating the user table and fetching users from the database.
//!
//! A user is the login identity that owns transactions. Personal details live
//! in [crate::profile].

use std::{fmt::Display, str::FromStr};

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, password::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Parse and validate an email address.
///
/// # Errors
///
/// Returns [Error::InvalidEmail] if `raw_email` is not a valid email address.
pub fn parse_email(raw_email: &str) -> Result<EmailAddress, Error> {
    EmailAddress::from_str(raw_email.trim()).map_err(|_| Error::InvalidEmail(raw_email.to_owned()))
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The email address the user logs in with.
    pub email: EmailAddress,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// This function will return a:
/// - [Error::DuplicateEmail] if `email` is already registered,
/// - or [Error::SqlError] if an SQL related error occurred.
pub fn create_user(
    email: &EmailAddress,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let user = connection
        .prepare("INSERT INTO user (email, password) VALUES (?1, ?2) RETURNING id, email, password")?
        .query_row((email.as_str(), password_hash.as_ref()), map_user_row)?;

    Ok(user)
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return a:
/// - [Error::NotFound] if `user_id` does not belong to a registered user,
/// - or [Error::SqlError] if there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`.
///
/// # Errors
///
/// This function will return a:
/// - [Error::NotFound] if no user is registered with `email`,
/// - or [Error::SqlError] if there was an error trying to access the store.
pub fn get_user_by_email(email: &EmailAddress, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, password FROM user WHERE email = :email")?
        .query_row(&[(":email", email.as_str())], map_user_row)
        .map_err(|error| error.into())
}

/// Replace the password hash of `user_id`.
///
/// # Errors
///
/// This function will return a:
/// - [Error::NotFound] if `user_id` does not belong to a registered user,
/// - or [Error::SqlError] if an SQL related error occurred.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Change the email address `user_id` logs in with.
///
/// # Errors
///
/// This function will return a:
/// - [Error::DuplicateEmail] if `email` belongs to another user,
/// - [Error::NotFound] if `user_id` does not belong to a registered user,
/// - or [Error::SqlError] if an SQL related error occurred.
pub fn update_email(
    user_id: UserID,
    email: &EmailAddress,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET email = ?1 WHERE id = ?2",
        (email.as_str(), user_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let id = UserID::new(row.get(0)?);
    let raw_email: String = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;

    let email = EmailAddress::from_str(&raw_email).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(error))
    })?;

    Ok(User {
        id,
        email,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}

/// Insert a user with a fixed password hash, skipping the slow hashing step.
///
/// The password for the hash is "okon".
#[cfg(test)]
pub fn create_test_user(email: &str, connection: &Connection) -> User {
    create_user(
        &parse_email(email).expect("test email should be valid"),
        PasswordHash::new_unchecked("$2b$12$Gwf0uvxH3L7JLfo0CC/NCOoijK2vQ/wbgP.LeNup8vj6gg31IiFkm"),
        connection,
    )
    .expect("Could not create test user")
}
