//! Exchanging an email address and password for an access token.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::token::{ACCESS_TOKEN_DURATION, TokenKeys, TokenPurpose, encode_token},
    user::{User, UserID, get_user_by_email, parse_email},
};

/// The state needed to log in or register a user.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The database connection for looking up and creating users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The keys for signing access tokens.
    pub token_keys: TokenKeys,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            token_keys: state.token_keys.clone(),
        }
    }
}

/// The raw data entered by the user in the log-in form.
///
/// The password is stored as a plain string. There is no need for validation here since
/// it will be compared against the password in the database, which has been verified.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInForm {
    /// Email entered during log-in.
    pub email: String,
    /// Password entered during log-in.
    pub password: String,
}

/// The response to a successful log in or registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    /// The signed JWT to send in the `Authorization: Bearer` header.
    pub access_token: String,
    /// Always "bearer".
    pub token_type: String,
}

impl AccessToken {
    /// Issue a new access token for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [Error::TokenCreation] if the token could not be signed.
    pub fn issue(user_id: UserID, keys: &TokenKeys) -> Result<Self, Error> {
        let access_token = encode_token(
            user_id,
            TokenPurpose::Access,
            ACCESS_TOKEN_DURATION,
            None,
            keys,
        )?;

        Ok(Self {
            access_token,
            token_type: "bearer".to_owned(),
        })
    }
}

/// Handler for log-in requests.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] when the email is not registered or
/// the password is wrong, without saying which.
pub async fn log_in_endpoint(
    State(state): State<LoginState>,
    Json(form): Json<LogInForm>,
) -> Result<Json<AccessToken>, Error> {
    let email = parse_email(&form.email).map_err(|_| Error::InvalidCredentials)?;

    let user: User = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        match get_user_by_email(&email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => {
                tracing::error!("Unhandled error while verifying credentials: {error}");
                return Err(error);
            }
        }
    };

    if !user.password_hash.verify(&form.password)? {
        tracing::info!("Failed log in attempt for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    AccessToken::issue(user.id, &state.token_keys).map(Json)
}
