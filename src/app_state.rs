//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{
    Error,
    auth::{Mailer, TokenKeys},
    db::initialize,
    timezone::get_local_offset,
};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The keys for signing and verifying JSON web tokens.
    pub token_keys: TokenKeys,

    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,

    /// The base URL that links in emails point to, e.g. "https://example.com".
    pub public_url: String,

    /// Delivers password reset emails.
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "America/Sao_Paulo".
    ///
    /// # Errors
    /// Returns an error if `local_timezone` is not a valid timezone or if the
    /// database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        secret: &str,
        local_timezone: &str,
        public_url: &str,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezone(local_timezone.to_owned()));
        }

        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            token_keys: TokenKeys::from_secret(secret),
            local_timezone: local_timezone.to_owned(),
            public_url: public_url.to_owned(),
            mailer,
        })
    }
}

impl FromRef<AppState> for Arc<Mutex<Connection>> {
    fn from_ref(state: &AppState) -> Self {
        state.db_connection.clone()
    }
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(state: &AppState) -> Self {
        state.token_keys.clone()
    }
}
