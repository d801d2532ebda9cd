//! OpenMonetis is a self-hosted web app for tracking personal finances.
//!
//! This library serves the dashboard reports (spending and income by
//! category, credit card invoices, establishments) as HTML pages and as a
//! JSON API.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod action;
mod alert;
mod app_state;
mod auth;
mod card;
mod category;
mod database_id;
mod db;
mod endpoints;
mod error;
mod establishment;
mod html;
mod internal_server_error;
mod invoice;
mod logging;
mod navigation;
mod not_found;
mod payer;
mod period;
mod routing;
mod timezone;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use action::ActionResult;
pub use app_state::{AppState, create_cookie_key};
pub use auth::set_session_cookie;
pub use card::{Card, NewCard, create_card};
pub use category::{
    Category, CategoryBreakdown, CategoryBreakdownItem, CategoryKind, NewCategory,
    create_category, fetch_expenses_by_category, fetch_income_by_category,
};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use establishment::{EstablishmentRow, fetch_establishments_for_user};
pub use invoice::{
    AUTO_INVOICE_NOTE_PREFIX, InvoicePaymentStatus, InvoicesSnapshot, create_invoice,
    fetch_dashboard_invoices,
};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use payer::{Payer, create_payer};
pub use period::{Period, PeriodParam, parse_period_param};
pub use routing::build_router;
pub use transaction::{Transaction, TransactionBuilder, create_transaction};
pub use user::UserId;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
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
