//! Resetting a forgotten password through a link sent by email.
//!
//! The link carries a short-lived token bound to a fingerprint of the
//! password hash, so it stops working once the password has been changed.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    auth::{
        mailer::Mailer,
        token::{RESET_TOKEN_DURATION, TokenKeys, TokenPurpose, decode_token, encode_token},
    },
    endpoints,
    user::{get_user_by_email, get_user_by_id, parse_email, update_password},
};

/// The reply to every password reset request, whether or not the email is
/// registered.
pub const RESET_REQUESTED_MESSAGE: &str =
    "If the email address is registered, you will receive a link to reset your password.";

/// The reply to a successful password reset.
pub const PASSWORD_RESET_MESSAGE: &str = "Your password has been reset.";

/// The state needed to reset a password.
#[derive(Clone)]
pub struct PasswordResetState {
    /// The database connection for looking up and updating users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The keys for signing reset tokens.
    pub token_keys: TokenKeys,
    /// The base URL the reset link points to, e.g. "https://example.com".
    pub public_url: String,
    /// Delivers the reset link.
    pub mailer: Arc<dyn Mailer>,
}

impl FromRef<AppState> for PasswordResetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            token_keys: state.token_keys.clone(),
            public_url: state.public_url.clone(),
            mailer: state.mailer.clone(),
        }
    }
}

/// A plain message for the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// The message.
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_owned(),
        })
    }
}

/// The email address to send the reset link to.
#[derive(Clone, Serialize, Deserialize)]
pub struct ForgotPasswordForm {
    /// The email address the user registered with.
    pub email: String,
}

/// Handler for requesting a password reset link.
///
/// Answers with [RESET_REQUESTED_MESSAGE] for any well-formed email address
/// so that clients cannot find out which addresses are registered. Delivery
/// failures are logged and not reported to the client.
pub async fn request_password_reset_endpoint(
    State(state): State<PasswordResetState>,
    Json(form): Json<ForgotPasswordForm>,
) -> Result<Json<MessageResponse>, Error> {
    let email = parse_email(&form.email)?;

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        match get_user_by_email(&email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => {
                tracing::debug!("Password reset requested for unregistered email address");
                return Ok(MessageResponse::new(RESET_REQUESTED_MESSAGE));
            }
            Err(error) => return Err(error),
        }
    };

    let token = encode_token(
        user.id,
        TokenPurpose::PasswordReset,
        RESET_TOKEN_DURATION,
        Some(user.password_hash.fingerprint()),
        &state.token_keys,
    )?;
    let reset_link = format!(
        "{}{}?token={}",
        state.public_url.trim_end_matches('/'),
        endpoints::RESET_PASSWORD_VIEW,
        token
    );
    let body = format!(
        "Hello,\n\n\
         We received a request to reset your password.\n\n\
         Follow the link below to choose a new password:\n{reset_link}\n\n\
         If you did not make this request, you can ignore this email."
    );

    match state.mailer.send(&user.email, "Password reset", &body) {
        Ok(()) => tracing::info!("Sent password reset link to user {}", user.id),
        Err(error) => tracing::error!("Could not send password reset link: {error}"),
    }

    Ok(MessageResponse::new(RESET_REQUESTED_MESSAGE))
}

/// The reset token from the emailed link and the new password.
#[derive(Clone, Serialize, Deserialize)]
pub struct ResetPasswordForm {
    /// The token from the reset link.
    pub token: String,
    /// The new password.
    pub new_password: String,
}

/// Handler for setting a new password with a reset token.
///
/// # Errors
///
/// This function will return a:
/// - [Error::InvalidToken] if the token is invalid, expired or has already been used,
/// - or [Error::TooWeak] if the new password is too easy to guess.
pub async fn reset_password_endpoint(
    State(state): State<PasswordResetState>,
    Json(form): Json<ResetPasswordForm>,
) -> Result<Json<MessageResponse>, Error> {
    let claims = decode_token(&form.token, TokenPurpose::PasswordReset, &state.token_keys)?;
    let validated_password = ValidatedPassword::new(&form.new_password)?;
    let password_hash = PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let user = match get_user_by_id(claims.sub, &connection) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::InvalidToken),
        Err(error) => return Err(error),
    };

    if claims.fingerprint.as_deref() != Some(user.password_hash.fingerprint().as_str()) {
        tracing::warn!("Rejected stale password reset token for user {}", user.id);
        return Err(Error::InvalidToken);
    }

    update_password(user.id, &password_hash, &connection)?;
    tracing::info!("Reset the password of user {}", user.id);

    Ok(MessageResponse::new(PASSWORD_RESET_MESSAGE))
}
