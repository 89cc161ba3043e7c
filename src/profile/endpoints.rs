//! The route handlers for reading and changing the logged in user's profile.
//!
//! Every handler responds with the full, updated [Profile].

use std::sync::{Arc, Mutex};

use axum::{Extension, Json, extract::State};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    profile::core::{
        AddressForm, Profile, get_profile, replace_address, update_birth_date, update_name,
    },
    user::{UserID, parse_email, update_email},
};

/// A route handler for the logged in user's profile.
pub async fn get_profile_endpoint(
    State(db_connection): State<Arc<Mutex<Connection>>>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Profile>, Error> {
    let connection = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_profile(user_id, &connection).map(Json)
}

/// The parts of the name to change, missing parts are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct NameForm {
    /// The new first name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// The new last name.
    #[serde(default)]
    pub last_name: Option<String>,
}

/// A route handler for changing the user's name.
pub async fn update_name_endpoint(
    State(db_connection): State<Arc<Mutex<Connection>>>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<NameForm>,
) -> Result<Json<Profile>, Error> {
    let connection = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    update_name(
        user_id,
        form.first_name.as_deref(),
        form.last_name.as_deref(),
        &connection,
    )?;

    get_profile(user_id, &connection).map(Json)
}

/// The new email address to log in with.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailForm {
    /// The new email address.
    pub email: String,
}

/// A route handler for changing the email address the user logs in with.
pub async fn update_email_endpoint(
    State(db_connection): State<Arc<Mutex<Connection>>>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<EmailForm>,
) -> Result<Json<Profile>, Error> {
    let email = parse_email(&form.email)?;

    let connection = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    update_email(user_id, &email, &connection)?;
    tracing::info!("User {user_id} changed their email address");

    get_profile(user_id, &connection).map(Json)
}

/// The new date of birth.
#[derive(Debug, Clone, Deserialize)]
pub struct BirthDateForm {
    /// The date of birth, `None` to remove it.
    pub birth_date: Option<Date>,
}

/// A route handler for setting or clearing the user's date of birth.
pub async fn update_birth_date_endpoint(
    State(db_connection): State<Arc<Mutex<Connection>>>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<BirthDateForm>,
) -> Result<Json<Profile>, Error> {
    let connection = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    update_birth_date(user_id, form.birth_date, &connection)?;

    get_profile(user_id, &connection).map(Json)
}

/// A route handler for replacing the user's address.
pub async fn update_address_endpoint(
    State(db_connection): State<Arc<Mutex<Connection>>>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<AddressForm>,
) -> Result<Json<Profile>, Error> {
    let connection = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    replace_address(user_id, &form, &connection)?;

    get_profile(user_id, &connection).map(Json)
}
