//! Configuration for billing calculations and report display.
//!
//! Both config structs are supplied once at startup and passed whole to the
//! report pipeline on every render. They are validated here, at the
//! host/core boundary, so the pipeline itself never has to second-guess its
//! inputs.

use clap::ValueEnum;
use serde::Deserialize;

use crate::Error;

/// The most billing periods the report will ever chart.
///
/// Period counts are small and bounded, which is why the pipeline recomputes
/// everything on each render instead of patching charts incrementally.
pub const MAX_PERIOD_MONTHS: u32 = 60;

/// The chart presentation for the report page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    /// Four column series, one per energy metric.
    Bar,
    /// A single filled series of the cumulative balance.
    Area,
    /// The four column series with the cumulative balance drawn as a line on top.
    Mixed,
}

impl std::fmt::Display for ChartType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartType::Bar => write!(f, "bar"),
            ChartType::Area => write!(f, "area"),
            ChartType::Mixed => write!(f, "mixed"),
        }
    }
}

/// Controls how the billing report page is displayed.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// The default chart presentation. Can be overridden per request.
    pub chart_type: ChartType,
    /// How many of the most recent billing periods to chart.
    pub period_months: u32,
    /// The title shown at the top of the report page.
    pub title: String,
}

impl ReportConfig {
    /// Create a report config, clamping `period_months` to
    /// `1..=`[MAX_PERIOD_MONTHS].
    pub fn new(chart_type: ChartType, period_months: u32, title: &str) -> Self {
        Self {
            chart_type,
            period_months: period_months.clamp(1, MAX_PERIOD_MONTHS),
            title: title.to_owned(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self::new(ChartType::Mixed, 12, "Energy Billing Report")
    }
}

/// Parameters for deriving billing periods from raw meter readings.
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// The name of the solar meter whose production is being tracked.
    pub solar_source: String,
    /// The grid consumption meter value at the start of the first period, in kWh.
    pub initial_grid_consumption: f64,
    /// The grid injection meter value at the start of the first period, in kWh.
    pub initial_grid_injection: f64,
    /// Grid consumption up to this amount per period is covered by the fixed
    /// charge and does not count against the billing balance, in kWh.
    pub minimum_billing_kwh: f64,
    /// The billing balance carried over from before the first recorded period, in kWh.
    pub initial_balance: f64,
    /// The assumed length of the first billing period, in days.
    ///
    /// Later periods run from the day after the previous reading, so only the
    /// first period needs an assumed length.
    pub billing_period_days: u32,
}

impl BillingConfig {
    /// Check the config for values that would make billing calculations meaningless.
    ///
    /// # Errors
    /// Returns [Error::NoSolarSource] if no solar meter is named, or
    /// [Error::InvalidBillingPeriodDays] if the period length is outside 1-365 days.
    pub fn validate(&self) -> Result<(), Error> {
        if self.solar_source.trim().is_empty() {
            return Err(Error::NoSolarSource);
        }

        if self.billing_period_days < 1 || self.billing_period_days > 365 {
            return Err(Error::InvalidBillingPeriodDays(self.billing_period_days));
        }

        Ok(())
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            solar_source: "Solar Inverter".to_owned(),
            initial_grid_consumption: 0.0,
            initial_grid_injection: 0.0,
            minimum_billing_kwh: 100.0,
            initial_balance: 0.0,
            billing_period_days: 30,
        }
    }
}
