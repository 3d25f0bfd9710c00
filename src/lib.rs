//! Solarledger is a web app for tracking solar energy billing.
//!
//! Cumulative grid meter readings are entered at the close of each billing
//! period and daily solar production is recorded alongside them. The app
//! derives per-period energy totals and a running billing balance, and
//! renders them as a report page with interactive charts.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod config;
mod db;
mod endpoints;
mod error;
mod html;
mod logging;
mod navigation;
mod not_found;
mod readings;
mod report;
mod routing;

pub use app_state::AppState;
pub use config::{BillingConfig, ChartType, ReportConfig};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use readings::{MeterReading, SolarReading, create_meter_reading, create_solar_reading};
pub use routing::build_router;

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
