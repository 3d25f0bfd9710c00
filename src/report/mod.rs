//! The energy billing report.
//!
//! Derives billing periods from raw meter readings and daily solar
//! production, then turns them into the view models for the report page:
//! a latest-period metrics summary and a windowed, multi-series chart.
//!
//! The whole pipeline is a pure function of the stored readings and the
//! report config. It is recomputed from scratch on every request, including
//! chart type switches; with at most sixty periods there is nothing to be
//! gained from incremental updates.

mod cards;
mod charts;
mod derive;
mod handlers;
mod metrics;
mod period;
mod series;

pub use handlers::get_report_page;

pub(crate) use derive::derive_periods;
pub(crate) use period::{BillingPeriod, PeriodCollection};

/// Format an energy value with exactly one decimal place.
///
/// This is the value format handed to the chart and the metric cards. The
/// presentation layer renders these strings as-is and never re-rounds.
fn one_decimal(value: f64) -> String {
    format!("{value:.1}")
}
