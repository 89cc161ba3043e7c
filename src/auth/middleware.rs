//! Authentication middleware that validates bearer tokens.

use axum::{
    RequestPartsExt,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{
    Error,
    auth::token::{TokenKeys, TokenPurpose, decode_token},
};

/// Middleware function that checks for a valid access token in the
/// `Authorization: Bearer` header.
///
/// The user ID is placed into the request and the request is executed
/// normally if the token is valid, otherwise the request is rejected with
/// 401 Unauthorized.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(
    State(keys): State<TokenKeys>,
    request: Request,
    next: Next,
) -> Result<Response, Error> {
    let (mut parts, body) = request.into_parts();

    let TypedHeader(Authorization(bearer)) = parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|_| Error::InvalidToken)?;

    let claims = decode_token(bearer.token(), TokenPurpose::Access, &keys)?;

    parts.extensions.insert(claims.sub);
    let request = Request::from_parts(parts, body);

    Ok(next.run(request).await)
}
