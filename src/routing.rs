//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Extension, Json, Router, middleware,
    routing::{get, post, put},
};
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    auth::{
        auth_guard, log_in_endpoint, register_user_endpoint, request_password_reset_endpoint,
        reset_password_endpoint,
    },
    category::list_categories_endpoint,
    endpoints::{self, ledger_endpoints},
    ledger::{
        Ledger, create_transaction_endpoint, delete_transaction_endpoint,
        edit_transaction_endpoint, get_category_histogram_endpoint, get_day_histogram_endpoint,
        get_detail_endpoint, get_recurrence_counts_endpoint, get_series_endpoint,
        get_total_endpoint, get_transaction_endpoint, set_recurrence_end_endpoint,
    },
    profile::{
        get_profile_endpoint, list_states_endpoint, update_address_endpoint,
        update_birth_date_endpoint, update_email_endpoint, update_name_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::HELLO, get(get_hello))
        .route(endpoints::USERS, post(register_user_endpoint))
        .route(endpoints::LOG_IN, post(log_in_endpoint))
        .route(
            endpoints::FORGOT_PASSWORD,
            post(request_password_reset_endpoint),
        )
        .route(endpoints::RESET_PASSWORD, post(reset_password_endpoint))
        .route(endpoints::STATES, get(list_states_endpoint))
        .route(endpoints::CATEGORIES, get(list_categories_endpoint));

    let profile_routes = Router::new()
        .route(endpoints::ME, get(get_profile_endpoint))
        .route(endpoints::ME_NAME, put(update_name_endpoint))
        .route(endpoints::ME_EMAIL, put(update_email_endpoint))
        .route(endpoints::ME_BIRTH_DATE, put(update_birth_date_endpoint))
        .route(endpoints::ME_ADDRESS, put(update_address_endpoint));

    let protected_routes = Ledger::ALL
        .into_iter()
        .fold(profile_routes, |router, ledger| {
            router.merge(ledger_routes(ledger))
        })
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The routes of `ledger`, with the ledger available to handlers as an
/// `Extension<Ledger>`.
fn ledger_routes(ledger: Ledger) -> Router<AppState> {
    let routes = ledger_endpoints(ledger);

    let router = Router::new()
        .route(routes.collection, post(create_transaction_endpoint))
        .route(
            routes.item,
            get(get_transaction_endpoint)
                .put(edit_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(routes.recurrence_end, put(set_recurrence_end_endpoint))
        .route(routes.total, get(get_total_endpoint))
        .route(routes.detail, get(get_detail_endpoint))
        .route(routes.series, get(get_series_endpoint))
        .route(routes.recurrence_counts, get(get_recurrence_counts_endpoint));

    let router = match ledger {
        Ledger::Expense => router
            .route(
                endpoints::EXPENSES_DAY_HISTOGRAM,
                get(get_day_histogram_endpoint),
            )
            .route(
                endpoints::EXPENSES_CATEGORY_HISTOGRAM,
                get(get_category_histogram_endpoint),
            ),
        Ledger::Income => router,
    };

    router.layer(Extension(ledger))
}

/// A simple health check.
async fn get_hello() -> Json<Value> {
    Json(json!({ "message": "Hello, MyWallet!" }))
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}

#[cfg(test)]
mod routing_tests {
    use std::sync::Arc;

    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};
    use time::{Date, OffsetDateTime};

    use crate::{
        AppState,
        auth::{AccessToken, LogMailer},
        endpoints::{self, format_endpoint},
        ledger::{Transaction, transition::EditOutcome},
        profile::{Profile, State},
    };

    use super::build_router;

    fn get_test_server() -> TestServer {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "foobar",
            "Etc/UTC",
            "http://localhost:3000",
            Arc::new(LogMailer),
        )
        .unwrap();

        TestServer::try_new(build_router(state)).expect("Could not create test server.")
    }

    async fn register(server: &TestServer, email: &str) -> String {
        let response = server
            .post(endpoints::USERS)
            .json(&json!({
                "email": email,
                "password": "turkeysgogobblegobble",
                "confirm_password": "turkeysgogobblegobble",
                "first_name": "Maria",
                "last_name": "Silva",
                "address": {
                    "postcode": "01310-100",
                    "state_id": 25,
                    "neighbourhood": "Bela Vista",
                    "street": "Avenida Paulista",
                },
            }))
            .await;
        response.assert_status_success();

        response.json::<AccessToken>().access_token
    }

    fn this_month() -> (u8, i32) {
        let today: Date = OffsetDateTime::now_utc().date();

        (u8::from(today.month()), today.year())
    }

    #[tokio::test]
    async fn hello_is_public() {
        let server = get_test_server();

        let response = server.get(endpoints::HELLO).await;

        response.assert_status_ok();
        response.assert_json(&json!({ "message": "Hello, MyWallet!" }));
    }

    #[tokio::test]
    async fn lookups_are_public() {
        let server = get_test_server();

        let states = server.get(endpoints::STATES).await.json::<Vec<State>>();
        assert_eq!(states.len(), 27);

        server
            .get(endpoints::CATEGORIES)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn protected_routes_require_token() {
        let server = get_test_server();

        server.get(endpoints::ME).await.assert_status_unauthorized();
        server
            .get(&format!("{}?month=1&year=2024", endpoints::EXPENSES_TOTAL))
            .await
            .assert_status_unauthorized();
        server
            .post(endpoints::INCOMES)
            .json(&json!({ "description": "Salary", "amount": 10.0, "date": "2024-01-05" }))
            .await
            .assert_status_unauthorized();
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let server = get_test_server();

        let response = server.get("/api/nothing_here").await;

        response.assert_status_not_found();
        assert!(response.json::<Value>().get("error").is_some());
    }

    #[tokio::test]
    async fn register_then_read_profile() {
        let server = get_test_server();
        let token = register(&server, "maria@example.com").await;

        let response = server.get(endpoints::ME).authorization_bearer(&token).await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Profile>().email.as_str(),
            "maria@example.com"
        );
    }

    #[tokio::test]
    async fn ledgers_are_kept_apart() {
        let server = get_test_server();
        let token = register(&server, "maria@example.com").await;
        let (month, year) = this_month();
        let date = OffsetDateTime::now_utc().date().to_string();

        server
            .post(endpoints::EXPENSES)
            .authorization_bearer(&token)
            .json(&json!({ "description": "Rent", "amount": 1200.0, "date": date, "is_recurring": true }))
            .await
            .assert_status_success();
        server
            .post(endpoints::INCOMES)
            .authorization_bearer(&token)
            .json(&json!({ "description": "Salary", "amount": 3000.0, "date": date }))
            .await
            .assert_status_success();

        let query = format!("?month={month}&year={year}");
        let expenses = server
            .get(&format!("{}{query}", endpoints::EXPENSES_TOTAL))
            .authorization_bearer(&token)
            .await
            .json::<Value>();
        let incomes = server
            .get(&format!("{}{query}", endpoints::INCOMES_TOTAL))
            .authorization_bearer(&token)
            .await
            .json::<Value>();

        assert_eq!(expenses["total"], json!(1200.0));
        assert_eq!(incomes["total"], json!(3000.0));
    }

    #[tokio::test]
    async fn users_cannot_touch_each_others_transactions() {
        let server = get_test_server();
        let owner_token = register(&server, "maria@example.com").await;
        let other_token = register(&server, "joao@example.com").await;

        let transaction = server
            .post(endpoints::EXPENSES)
            .authorization_bearer(&owner_token)
            .json(&json!({ "description": "Rent", "amount": 1200.0, "date": "2024-01-05" }))
            .await
            .json::<Transaction>();
        let path = format_endpoint(endpoints::EXPENSE, transaction.id);

        server
            .get(&path)
            .authorization_bearer(&other_token)
            .await
            .assert_status_forbidden();
        server
            .delete(&path)
            .authorization_bearer(&other_token)
            .await
            .assert_status_forbidden();
        server
            .get(&path)
            .authorization_bearer(&owner_token)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn expense_route_does_not_reach_incomes() {
        let server = get_test_server();
        let token = register(&server, "maria@example.com").await;

        let income = server
            .post(endpoints::INCOMES)
            .authorization_bearer(&token)
            .json(&json!({ "description": "Salary", "amount": 3000.0, "date": "2024-01-05" }))
            .await
            .json::<Transaction>();

        // Income and expense ids come from separate tables.
        let response = server
            .put(&format_endpoint(endpoints::INCOME, income.id))
            .authorization_bearer(&token)
            .json(&json!({ "description": "Salary", "amount": 3100.0, "date": "2024-01-05" }))
            .await;
        response.assert_status_ok();
        response.assert_json(&EditOutcome::Overwritten { id: income.id });

        server
            .get(&format_endpoint(endpoints::EXPENSE, income.id))
            .authorization_bearer(&token)
            .await
            .assert_status_not_found();
    }
}
