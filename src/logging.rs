//! Middleware for logging requests and responses.

use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::{StatusCode, request, response},
    middleware::Next,
    response::Response,
};
use serde_json::Value;

/// Bodies longer than this many bytes are truncated in the `info` log.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// JSON fields whose values never appear in the log.
const REDACTED_FIELDS: [&str; 5] = [
    "password",
    "confirm_password",
    "new_password",
    "access_token",
    "token",
];

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// Passwords and tokens in JSON bodies are replaced with asterisks, even
/// when the request does not declare a JSON content type.
pub async fn logging_middleware(request: Request, next: Next) -> Result<Response, StatusCode> {
    let (parts, body) = request.into_parts();
    let body_bytes = to_bytes(body, usize::MAX).await.map_err(|error| {
        tracing::error!("Could not read request body: {error}");
        StatusCode::BAD_REQUEST
    })?;
    log_request(&parts, &display_body(&body_bytes));

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = to_bytes(body, usize::MAX).await.map_err(|error| {
        tracing::error!("Could not read response body: {error}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    log_response(&parts, &display_body(&body_bytes));

    Ok(Response::from_parts(parts, Body::from(body_bytes)))
}

/// Secrets are redacted from any body that parses as JSON, regardless of the
/// declared content type.
fn display_body(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(mut json) => {
            redact_secrets(&mut json);
            json.to_string()
        }
        _ => String::from_utf8_lossy(body).to_string(),
    }
}

fn redact_secrets(json: &mut Value) {
    match json {
        Value::Object(fields) => {
            for (name, value) in fields.iter_mut() {
                if REDACTED_FIELDS.contains(&name.as_str()) {
                    *value = Value::String(REDACTED.to_owned());
                } else {
                    redact_secrets(value);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_secrets),
        _ => {}
    }
}

fn truncate(body: &str) -> &str {
    let end = (0..=LOG_BODY_LENGTH_LIMIT)
        .rev()
        .find(|&index| body.is_char_boundary(index))
        .unwrap_or(0);

    &body[..end]
}

fn log_request(parts: &request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {}...",
            parts.method,
            parts.uri,
            truncate(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            parts.method,
            parts.uri
        );
    }
}

fn log_response(parts: &response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {}...",
            parts.status,
            truncate(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", parts.status);
    }
}

#[cfg(test)]
mod tests {
    use axum::{Json, Router, middleware, routing::post};
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use super::{LOG_BODY_LENGTH_LIMIT, display_body, logging_middleware, truncate};

    #[test]
    fn redacts_secrets_in_json() {
        let body = json!({
            "email": "foo@bar.baz",
            "password": "hunter2",
            "confirm_password": "hunter2",
            "nested": { "access_token": "abc.def.ghi" },
        })
        .to_string();

        let displayed = display_body(body.as_bytes());

        assert!(!displayed.contains("hunter2"));
        assert!(!displayed.contains("abc.def.ghi"));
        assert!(displayed.contains("foo@bar.baz"));
    }

    #[test]
    fn leaves_other_bodies_untouched() {
        let displayed = display_body(b"password=hunter2");

        assert_eq!(displayed, "password=hunter2");
    }

    #[test]
    fn redacts_json_sent_without_content_type() {
        let body = r#"{"email":"foo@bar.baz","password":"hunter2"}"#;

        let displayed = display_body(body.as_bytes());

        assert!(!displayed.contains("hunter2"));
        assert!(displayed.contains("foo@bar.baz"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "ã".repeat(LOG_BODY_LENGTH_LIMIT);

        let truncated = truncate(&body);

        assert!(truncated.len() <= LOG_BODY_LENGTH_LIMIT);
        assert!(body.starts_with(truncated));
    }

    #[tokio::test]
    async fn middleware_passes_body_through() {
        async fn echo(Json(body): Json<Value>) -> Json<Value> {
            Json(body)
        }

        let app = Router::new()
            .route("/echo", post(echo))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");
        let body = json!({ "password": "hunter2", "amount": 12.5 });

        let response = server.post("/echo").json(&body).await;

        response.assert_status_ok();
        response.assert_json(&body);
    }
}
