//! JSON web tokens for authenticating requests and resetting passwords.

use std::fmt::Debug;

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, user::UserID};

/// How long an access token is valid for after log in.
pub const ACCESS_TOKEN_DURATION: Duration = Duration::hours(1);

/// How long a password reset link is valid for.
pub const RESET_TOKEN_DURATION: Duration = Duration::minutes(30);

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    /// Authenticates requests to the protected routes.
    Access,
    /// Allows setting a new password once.
    PasswordReset,
}

/// The contents of a JSON Web Token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The user the token was issued to.
    pub sub: UserID,
    /// The time the token was issued as a unix timestamp.
    pub iat: i64,
    /// The expiry time of the token as a unix timestamp.
    pub exp: i64,
    /// What the token may be used for.
    pub purpose: TokenPurpose,
    /// The [crate::PasswordHash::fingerprint] at the time a reset token was
    /// issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// The keys for signing and verifying tokens, derived from the server secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenKeys {
    /// Create the keys for HMAC signing with `secret`.
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenKeys(********)")
    }
}

/// Issue a token for `user_id` that expires after `duration`.
///
/// # Errors
///
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(
    user_id: UserID,
    purpose: TokenPurpose,
    duration: Duration,
    fingerprint: Option<String>,
    keys: &TokenKeys,
) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id,
        iat: now.unix_timestamp(),
        exp: (now + duration).unix_timestamp(),
        purpose,
        fingerprint,
    };

    encode(&Header::default(), &claims, &keys.encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify the signature and expiry of `token` and check it was issued for
/// `purpose`.
///
/// # Errors
///
/// Returns [Error::InvalidToken] if the token is malformed, expired, signed
/// with another key or meant for another purpose.
pub fn decode_token(token: &str, purpose: TokenPurpose, keys: &TokenKeys) -> Result<Claims, Error> {
    let claims = decode::<Claims>(token, &keys.decoding_key, &Validation::default())
        .map_err(|error| {
            tracing::debug!("Rejected token: {error}");
            Error::InvalidToken
        })?
        .claims;

    if claims.purpose != purpose {
        tracing::warn!(
            "Token for user {} has purpose {:?}, expected {:?}",
            claims.sub,
            claims.purpose,
            purpose
        );
        return Err(Error::InvalidToken);
    }

    Ok(claims)
}
