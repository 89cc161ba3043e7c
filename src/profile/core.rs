//! The personal details and address stored for each user.

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::{AddressId, StateId},
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// The address fields submitted by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressForm {
    /// The postal code (CEP).
    pub postcode: String,
    /// The id of the state, see [crate::profile::list_states].
    pub state_id: StateId,
    /// The neighbourhood (bairro).
    pub neighbourhood: String,
    /// The street name.
    pub street: String,
    /// The street number, if the address has one.
    #[serde(default)]
    pub number: Option<String>,
    /// Extra address details, e.g. an apartment number.
    #[serde(default)]
    pub complement: Option<String>,
}

/// A stored address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// The id of the address.
    pub id: AddressId,
    /// The address fields.
    #[serde(flatten)]
    pub fields: AddressForm,
}

/// A user's personal details as shown on their profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// The user the profile belongs to.
    pub user_id: UserID,
    /// The email address the user logs in with.
    pub email: EmailAddress,
    /// The user's first name.
    pub first_name: String,
    /// The user's last name.
    pub last_name: String,
    /// The user's date of birth.
    pub birth_date: Option<Date>,
    /// Where the user lives.
    pub address: Address,
}

/// The personal details collected when a user registers.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProfile {
    /// The registered user.
    pub user_id: UserID,
    /// The user's first name.
    pub first_name: String,
    /// The user's last name.
    pub last_name: String,
    /// The user's date of birth.
    pub birth_date: Option<Date>,
    /// The user's address.
    pub address: AddressForm,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the address table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_address_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS address (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                postcode TEXT NOT NULL,
                state_id INTEGER NOT NULL,
                neighbourhood TEXT NOT NULL,
                street TEXT NOT NULL,
                number TEXT,
                complement TEXT,
                FOREIGN KEY(state_id) REFERENCES state(id) ON UPDATE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Create the profile table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_profile_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS profile (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL UNIQUE,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                birth_date TEXT,
                address_id INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(address_id) REFERENCES address(id) ON UPDATE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Store the address and personal details of a newly registered user.
///
/// The caller should run this in the same SQL transaction that created the
/// user so that a user never exists without a profile.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidForeignKey] if the user or the address' state do not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_profile(new_profile: &NewProfile, connection: &Connection) -> Result<(), Error> {
    let address = &new_profile.address;
    let address_id: AddressId = connection
        .prepare(
            "INSERT INTO address (postcode, state_id, neighbourhood, street, number, complement)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id",
        )?
        .query_row(
            (
                &address.postcode,
                address.state_id,
                &address.neighbourhood,
                &address.street,
                &address.number,
                &address.complement,
            ),
            |row| row.get(0),
        )?;

    connection.execute(
        "INSERT INTO profile (user_id, first_name, last_name, birth_date, address_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            new_profile.user_id.as_i64(),
            &new_profile.first_name,
            &new_profile.last_name,
            new_profile.birth_date,
            address_id,
        ),
    )?;

    Ok(())
}

/// Retrieve the profile of `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `user_id` has no profile,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_profile(user_id: UserID, connection: &Connection) -> Result<Profile, Error> {
    connection
        .prepare(
            "SELECT user.id, user.email, profile.first_name, profile.last_name, profile.birth_date,
                    address.id, address.postcode, address.state_id, address.neighbourhood,
                    address.street, address.number, address.complement
             FROM profile
             INNER JOIN user ON user.id = profile.user_id
             INNER JOIN address ON address.id = profile.address_id
             WHERE profile.user_id = :user_id",
        )?
        .query_row(&[(":user_id", &user_id.as_i64())], map_profile_row)
        .map_err(|error| error.into())
}

/// Change the name of `user_id`, leaving out the parts that are `None`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `user_id` has no profile,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_name(
    user_id: UserID,
    first_name: Option<&str>,
    last_name: Option<&str>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE profile
         SET first_name = COALESCE(?1, first_name), last_name = COALESCE(?2, last_name)
         WHERE user_id = ?3",
        (first_name, last_name, user_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Set, or clear, the date of birth of `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `user_id` has no profile,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_birth_date(
    user_id: UserID,
    birth_date: Option<Date>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE profile SET birth_date = ?1 WHERE user_id = ?2",
        (birth_date, user_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Replace every field of the address of `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `user_id` has no profile,
/// - [Error::InvalidForeignKey] if the state does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn replace_address(
    user_id: UserID,
    address: &AddressForm,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE address
         SET postcode = ?1, state_id = ?2, neighbourhood = ?3, street = ?4, number = ?5,
             complement = ?6
         WHERE id = (SELECT address_id FROM profile WHERE user_id = ?7)",
        (
            &address.postcode,
            address.state_id,
            &address.neighbourhood,
            &address.street,
            &address.number,
            &address.complement,
            user_id.as_i64(),
        ),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

fn map_profile_row(row: &Row) -> Result<Profile, rusqlite::Error> {
    let raw_email: String = row.get(1)?;
    let email = raw_email.parse::<EmailAddress>().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(error))
    })?;

    Ok(Profile {
        user_id: UserID::new(row.get(0)?),
        email,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        birth_date: row.get(4)?,
        address: Address {
            id: row.get(5)?,
            fields: AddressForm {
                postcode: row.get(6)?,
                state_id: row.get(7)?,
                neighbourhood: row.get(8)?,
                street: row.get(9)?,
                number: row.get(10)?,
                complement: row.get(11)?,
            },
        },
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) fn test_address() -> AddressForm {
    AddressForm {
        postcode: "01310-100".to_owned(),
        state_id: 25,
        neighbourhood: "Bela Vista".to_owned(),
        street: "Avenida Paulista".to_owned(),
        number: Some("1578".to_owned()),
        complement: None,
    }
}
