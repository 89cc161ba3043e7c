//! Registering a new user together with their profile.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error, PasswordHash, ValidatedPassword,
    auth::log_in::{AccessToken, LoginState},
    profile::{AddressForm, NewProfile, create_profile},
    user::{create_user, parse_email},
};

/// The data entered by the user in the registration form.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    /// The email address to log in with.
    pub email: String,
    /// The new password.
    pub password: String,
    /// The new password again.
    pub confirm_password: String,
    /// The user's first name.
    pub first_name: String,
    /// The user's last name.
    pub last_name: String,
    /// The user's date of birth.
    #[serde(default)]
    pub birth_date: Option<Date>,
    /// Where the user lives.
    pub address: AddressForm,
}

/// Handler for registering a new user.
///
/// The user, their address and their profile are stored together or not at
/// all. Responds with 201 Created and an access token.
///
/// # Errors
///
/// This function will return a:
/// - [Error::PasswordMismatch] if the password and its confirmation differ,
/// - [Error::InvalidEmail] if the email address is malformed,
/// - [Error::TooWeak] if the password is too easy to guess,
/// - [Error::DuplicateEmail] if the email address is already registered,
/// - or [Error::InvalidForeignKey] if the address' state does not exist.
pub async fn register_user_endpoint(
    State(state): State<LoginState>,
    Json(form): Json<RegisterForm>,
) -> Result<(StatusCode, Json<AccessToken>), Error> {
    if form.password != form.confirm_password {
        return Err(Error::PasswordMismatch);
    }

    let email = parse_email(&form.email)?;
    let validated_password = ValidatedPassword::new(&form.password)?;
    let password_hash = PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let transaction = connection.unchecked_transaction()?;

    let user = create_user(&email, password_hash, &transaction)?;
    create_profile(
        &NewProfile {
            user_id: user.id,
            first_name: form.first_name,
            last_name: form.last_name,
            birth_date: form.birth_date,
            address: form.address,
        },
        &transaction,
    )?;

    transaction.commit()?;
    tracing::info!("Registered user {}", user.id);

    let token = AccessToken::issue(user.id, &state.token_keys)?;

    Ok((StatusCode::CREATED, Json(token)))
}
