use std::{fs::OpenOptions, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use solarledger::{
    AppState, BillingConfig, ChartType, ReportConfig, build_router, graceful_shutdown,
};

/// The server for solarledger, a solar energy billing tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the app from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The title shown at the top of the report page.
    #[arg(long, default_value = "Energy Billing Report")]
    title: String,

    /// The default chart presentation for the report page.
    #[arg(long, value_enum, default_value_t = ChartType::Mixed)]
    chart_type: ChartType,

    /// How many of the most recent billing periods to chart.
    #[arg(long, default_value_t = 12)]
    period_months: u32,

    /// The name of the solar meter whose production is being tracked.
    #[arg(long, default_value = "Solar Inverter")]
    solar_source: String,

    /// The grid consumption meter value at the start of the first period, in kWh.
    #[arg(long, default_value_t = 0.0)]
    initial_grid_consumption: f64,

    /// Grid consumption covered per period by the fixed charge, in kWh.
    #[arg(long, default_value_t = 100.0)]
    minimum_billing_kwh: f64,

    /// The grid injection meter value at the start of the first period, in kWh.
    #[arg(long, default_value_t = 0.0)]
    initial_grid_injection: f64,

    /// The billing balance carried over from before the first recorded period, in kWh.
    #[arg(long, default_value_t = 0.0)]
    initial_balance: f64,

    /// The assumed length of the first billing period, in days.
    #[arg(long, default_value_t = 30)]
    billing_period_days: u32,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let connection = Connection::open(&args.db_path).expect("Could not open database file.");

    let billing_config = BillingConfig {
        solar_source: args.solar_source,
        initial_grid_consumption: args.initial_grid_consumption,
        initial_grid_injection: args.initial_grid_injection,
        minimum_billing_kwh: args.minimum_billing_kwh,
        initial_balance: args.initial_balance,
        billing_period_days: args.billing_period_days,
    };
    let report_config = ReportConfig::new(args.chart_type, args.period_months, &args.title);

    let state = AppState::new(connection, billing_config, report_config)
        .expect("Could not create the application state.");

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .unwrap();
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they occur so the default 5xx logging is redundant.
        .on_failure(());

    router.layer(tracing_layer)
}
