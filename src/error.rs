//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email and password combination did not match a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The bearer token is missing, malformed, expired or was issued for a
    /// different purpose.
    #[error("invalid or expired token")]
    InvalidToken,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The password and its confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// The string is not a valid email address.
    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    /// The email address belongs to another registered user.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A JSON web token could not be created.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// A referenced record, e.g. the state of an address, does not exist.
    #[error("a referenced record does not exist")]
    InvalidForeignKey,

    /// A month and year pair that does not describe a calendar month.
    #[error("invalid period: month {month} of year {year}")]
    InvalidPeriod {
        /// The requested year.
        year: i32,
        /// The requested month, expected to be in 1..=12.
        month: u8,
    },

    /// The query string is missing a field or a value has the wrong type.
    #[error("invalid query string: {0}")]
    InvalidQuery(String),

    /// A recurrence end was set on a non-recurring transaction, or it lies
    /// before the month the transaction starts in.
    #[error("the recurrence end is not valid for this transaction")]
    InvalidRecurrenceEnd,

    /// A date could not be constructed.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The resource exists but belongs to another user.
    #[error("the requested resource belongs to another user")]
    Forbidden,

    /// The server was configured with a timezone that is not a canonical
    /// timezone name.
    #[error("{0} is not a valid timezone")]
    InvalidTimezone(String),

    /// The password reset email could not be delivered.
    #[error("could not send email: {0}")]
    MailDelivery(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Error::InvalidForeignKey
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidCredentials | Error::InvalidToken => StatusCode::UNAUTHORIZED,
            Error::TooWeak(_)
            | Error::PasswordMismatch
            | Error::InvalidEmail(_)
            | Error::InvalidForeignKey
            | Error::InvalidPeriod { .. }
            | Error::InvalidQuery(_)
            | Error::InvalidRecurrenceEnd
            | Error::InvalidDate(_) => StatusCode::BAD_REQUEST,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::InvalidTimezone(_)
            | Error::MailDelivery(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal details are for the server log only.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::Error;

    #[test]
    fn no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }

    #[test]
    fn ownership_errors_have_distinct_status_codes() {
        assert_eq!(
            Error::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn invalid_period_is_a_bad_request() {
        let response = Error::InvalidPeriod {
            year: 2024,
            month: 13,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_errors_are_hidden_from_the_client() {
        let response = Error::DatabaseLockError.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
