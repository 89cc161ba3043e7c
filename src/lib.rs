//! MyWallet is a personal finance backend for tracking monthly expenses and income.
//!
//! This library provides a JSON REST API. Expenses and incomes are either
//! one-off or recurring every month, and every report is built by deciding
//! which transactions apply to a given month, see [ledger::recurrence].

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth;
mod category;
mod database_id;
mod db;
mod endpoints;
mod error;
pub mod ledger;
mod logging;
mod password;
mod profile;
mod routing;
mod timezone;
pub mod user;

pub use app_state::AppState;
pub use auth::{LogMailer, Mailer};
pub use category::{Category, OTHER_CATEGORY_LABEL};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::{PasswordHash, ValidatedPassword};
pub use profile::{AddressForm, NewProfile, Profile, create_profile};
pub use routing::build_router;
pub use user::{User, UserID};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Could not listen for the Ctrl+C signal: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate_signal) => {
                terminate_signal.recv().await;
            }
            Err(error) => {
                tracing::error!("Could not listen for the terminate signal: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
