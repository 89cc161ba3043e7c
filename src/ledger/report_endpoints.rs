//! Route handlers for the monthly reports, e.g. `GET /api/expenses/total?month=3&year=2024`.

use std::sync::{Arc, Mutex};

use axum::{Extension, Json, extract::State};
use rusqlite::Connection;

use crate::{
    Error,
    ledger::{
        Ledger, Transaction,
        aggregate::{CategoryCount, DayCount, RecurrenceCounts},
        period::Period,
        scan::PeriodTotal,
        service,
    },
    user::UserID,
};

/// A route handler for the total of the ledger in a month.
pub async fn get_total_endpoint(
    State(db_connection): State<Arc<Mutex<Connection>>>,
    Extension(ledger): Extension<Ledger>,
    Extension(user_id): Extension<UserID>,
    period: Period,
) -> Result<Json<PeriodTotal>, Error> {
    let connection = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let total = service::get_total(ledger, user_id, period, &connection)?;

    Ok(Json(PeriodTotal { period, total }))
}

/// A route handler for the transactions that apply to a month.
pub async fn get_detail_endpoint(
    State(db_connection): State<Arc<Mutex<Connection>>>,
    Extension(ledger): Extension<Ledger>,
    Extension(user_id): Extension<UserID>,
    period: Period,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    service::get_detail(ledger, user_id, period, &connection).map(Json)
}

/// A route handler for the totals of the months around a month.
pub async fn get_series_endpoint(
    State(db_connection): State<Arc<Mutex<Connection>>>,
    Extension(ledger): Extension<Ledger>,
    Extension(user_id): Extension<UserID>,
    period: Period,
) -> Result<Json<Vec<PeriodTotal>>, Error> {
    let connection = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    service::get_multi_period_series(ledger, user_id, period, &connection).map(Json)
}

/// A route handler for the number of recurring and one-off transactions in a month.
pub async fn get_recurrence_counts_endpoint(
    State(db_connection): State<Arc<Mutex<Connection>>>,
    Extension(ledger): Extension<Ledger>,
    Extension(user_id): Extension<UserID>,
    period: Period,
) -> Result<Json<RecurrenceCounts>, Error> {
    let connection = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    service::get_recurrence_counts(ledger, user_id, period, &connection).map(Json)
}

/// A route handler for the number of transactions due on each day of a month.
pub async fn get_day_histogram_endpoint(
    State(db_connection): State<Arc<Mutex<Connection>>>,
    Extension(ledger): Extension<Ledger>,
    Extension(user_id): Extension<UserID>,
    period: Period,
) -> Result<Json<Vec<DayCount>>, Error> {
    let connection = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    service::get_day_histogram(ledger, user_id, period, &connection).map(Json)
}

/// A route handler for the number of transactions per category in a month.
pub async fn get_category_histogram_endpoint(
    State(db_connection): State<Arc<Mutex<Connection>>>,
    Extension(ledger): Extension<Ledger>,
    Extension(user_id): Extension<UserID>,
    period: Period,
) -> Result<Json<Vec<CategoryCount>>, Error> {
    let connection = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    service::get_category_histogram(ledger, user_id, period, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Router, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;
    use time::macros::date;

    use crate::{
        db::initialize,
        endpoints,
        ledger::{Ledger, Transaction, core::create_transaction},
        user::{UserID, create_test_user},
    };

    use super::{
        get_category_histogram_endpoint, get_day_histogram_endpoint, get_detail_endpoint,
        get_recurrence_counts_endpoint, get_series_endpoint, get_total_endpoint,
    };

    fn get_test_server() -> TestServer {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let owner = create_test_user("owner@example.com", &conn).id;
        let other = create_test_user("other@example.com", &conn).id;
        create_test_expenses(owner, other, &conn);

        let app = Router::new()
            .route(endpoints::EXPENSES_TOTAL, get(get_total_endpoint))
            .route(endpoints::EXPENSES_DETAIL, get(get_detail_endpoint))
            .route(endpoints::EXPENSES_SERIES, get(get_series_endpoint))
            .route(
                endpoints::EXPENSES_RECURRENCE_COUNTS,
                get(get_recurrence_counts_endpoint),
            )
            .route(
                endpoints::EXPENSES_DAY_HISTOGRAM,
                get(get_day_histogram_endpoint),
            )
            .route(
                endpoints::EXPENSES_CATEGORY_HISTOGRAM,
                get(get_category_histogram_endpoint),
            )
            .layer(Extension(Ledger::Expense))
            .layer(Extension(owner))
            .with_state(Arc::new(Mutex::new(conn)));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn create_test_expenses(owner: UserID, other: UserID, conn: &Connection) {
        for builder in [
            Transaction::build(owner, 100.0, date!(2024 - 03 - 15), "Groceries").category_id(Some(2)),
            Transaction::build(owner, 50.0, date!(2024 - 01 - 01), "Gym")
                .recurring(Some(date!(2024 - 06 - 01)))
                .category_id(Some(999)),
            Transaction::build(other, 1000.0, date!(2024 - 03 - 15), "Not mine"),
        ] {
            create_transaction(Ledger::Expense, builder, conn).unwrap();
        }
    }

    #[tokio::test]
    async fn total_for_month() {
        let server = get_test_server();

        let response = server
            .get(&format!("{}?month=3&year=2024", endpoints::EXPENSES_TOTAL))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "year": 2024, "month": 3, "total": 150.0 }));
    }

    #[tokio::test]
    async fn total_after_recurrence_ends_is_zero() {
        let server = get_test_server();

        let response = server
            .get(&format!("{}?month=7&year=2024", endpoints::EXPENSES_TOTAL))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "year": 2024, "month": 7, "total": 0.0 }));
    }

    #[tokio::test]
    async fn invalid_month_is_a_bad_request() {
        let server = get_test_server();

        let response = server
            .get(&format!("{}?month=13&year=2024", endpoints::EXPENSES_TOTAL))
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({ "error": "invalid period: month 13 of year 2024" }));
    }

    #[tokio::test]
    async fn malformed_period_query_is_a_json_bad_request() {
        let server = get_test_server();

        for query in [
            "month=300&year=2024",
            "month=-1&year=2024",
            "month=march&year=2024",
            "year=2024",
        ] {
            let response = server
                .get(&format!("{}?{query}", endpoints::EXPENSES_TOTAL))
                .await;

            response.assert_status_bad_request();
            let body = response.json::<serde_json::Value>();
            assert!(
                body["error"]
                    .as_str()
                    .is_some_and(|message| message.starts_with("invalid query string")),
                "unexpected body for {query}: {body}"
            );
        }
    }

    #[tokio::test]
    async fn series_near_the_last_supported_year_is_cut_short() {
        let server = get_test_server();

        let response = server
            .get(&format!("{}?month=12&year=9999", endpoints::EXPENSES_SERIES))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!([
            { "year": 9999, "month": 9, "total": 0.0 },
            { "year": 9999, "month": 10, "total": 0.0 },
            { "year": 9999, "month": 11, "total": 0.0 },
            { "year": 9999, "month": 12, "total": 0.0 },
        ]));
    }

    #[tokio::test]
    async fn detail_lists_matching_transactions() {
        let server = get_test_server();

        let response = server
            .get(&format!("{}?month=4&year=2024", endpoints::EXPENSES_DETAIL))
            .await;

        response.assert_status_ok();
        let detail = response.json::<Vec<Transaction>>();
        assert_eq!(detail.len(), 1);
        assert_eq!(detail[0].description, "Gym");
    }

    #[tokio::test]
    async fn series_has_six_months_in_order() {
        let server = get_test_server();

        let response = server
            .get(&format!("{}?month=6&year=2024", endpoints::EXPENSES_SERIES))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!([
            { "year": 2024, "month": 3, "total": 150.0 },
            { "year": 2024, "month": 4, "total": 50.0 },
            { "year": 2024, "month": 5, "total": 50.0 },
            { "year": 2024, "month": 6, "total": 50.0 },
            { "year": 2024, "month": 7, "total": 0.0 },
            { "year": 2024, "month": 8, "total": 0.0 },
        ]));
    }

    #[tokio::test]
    async fn recurrence_counts_for_month() {
        let server = get_test_server();

        let response = server
            .get(&format!(
                "{}?month=3&year=2024",
                endpoints::EXPENSES_RECURRENCE_COUNTS
            ))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "recurring": 1, "non_recurring": 1 }));
    }

    #[tokio::test]
    async fn day_histogram_for_month() {
        let server = get_test_server();

        let response = server
            .get(&format!(
                "{}?month=3&year=2024",
                endpoints::EXPENSES_DAY_HISTOGRAM
            ))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!([
            { "day": 1, "count": 1 },
            { "day": 15, "count": 1 },
        ]));
    }

    #[tokio::test]
    async fn category_histogram_for_month() {
        let server = get_test_server();

        let response = server
            .get(&format!(
                "{}?month=3&year=2024",
                endpoints::EXPENSES_CATEGORY_HISTOGRAM
            ))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!([
            { "category": "Food", "count": 1 },
            { "category": "Other", "count": 1 },
        ]));
    }
}
