//! Composes the windowed, multi-series chart model from billing periods.

use time::{Date, Month};

use crate::ChartType;

use super::{BillingPeriod, PeriodCollection, one_decimal};

/// How a series should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SeriesKind {
    /// A vertical column per period.
    Column,
    /// A filled line.
    Area,
    /// A plain line, drawn over any columns.
    Line,
}

/// One labeled data series.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Series {
    pub name: &'static str,
    pub kind: SeriesKind,
    /// One value per retained period, formatted to one decimal place.
    pub data: Vec<String>,
}

/// The chart view model handed to the presenter.
///
/// `categories` and every series' `data` are aligned index-for-index: the
/// i-th value of every series belongs to the i-th category label. Series
/// order is draw order; the presenter must preserve both.
#[derive(Debug, Clone, Default, PartialEq)]
pub(super) struct ChartModel {
    /// One "short month, year" label per retained period, oldest first.
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

/// Build the chart model for the given presentation mode.
///
/// Retains the trailing `period_months` periods (all of them if fewer
/// exist), oldest first. This is a right-aligned slice of the recorded
/// periods, not a filter by calendar distance. An empty collection yields an
/// empty model; deciding whether to show a placeholder instead of an empty
/// chart is the caller's job.
pub(super) fn compose(
    periods: &PeriodCollection,
    period_months: u32,
    chart_type: ChartType,
) -> ChartModel {
    let mut sorted: Vec<_> = periods.iter().collect();
    sorted.sort_by(|(id_a, a), (id_b, b)| a.end_date.cmp(&b.end_date).then_with(|| id_a.cmp(id_b)));

    let window_start = sorted.len().saturating_sub(period_months as usize);
    let window: Vec<&BillingPeriod> = sorted[window_start..]
        .iter()
        .map(|(_, period)| *period)
        .collect();

    let categories = window
        .iter()
        .map(|period| month_label(period.end_date))
        .collect();

    let mut series = Vec::new();

    if matches!(chart_type, ChartType::Bar | ChartType::Mixed) {
        series.push(column_series("Solar Generation", &window, |p| {
            p.solar_generation
        }));
        series.push(column_series("Grid Consumption", &window, |p| {
            p.grid_consumption
        }));
        series.push(column_series("Grid Injection", &window, |p| p.grid_injection));
        series.push(column_series("Solar Consumption", &window, |p| {
            p.solar_consumption
        }));
    }

    if matches!(chart_type, ChartType::Area | ChartType::Mixed) {
        // In mixed mode the balance must come last so the line draws on top
        // of the columns.
        series.push(Series {
            name: "Cumulative Balance",
            kind: if chart_type == ChartType::Mixed {
                SeriesKind::Line
            } else {
                SeriesKind::Area
            },
            data: values_of(&window, |p| p.cumulative_balance),
        });
    }

    ChartModel { categories, series }
}

fn column_series(
    name: &'static str,
    window: &[&BillingPeriod],
    value: fn(&BillingPeriod) -> f64,
) -> Series {
    Series {
        name,
        kind: SeriesKind::Column,
        data: values_of(window, value),
    }
}

fn values_of(window: &[&BillingPeriod], value: fn(&BillingPeriod) -> f64) -> Vec<String> {
    window.iter().map(|period| one_decimal(value(period))).collect()
}

/// Format a date as a "short month, numeric year" category label, e.g. "Jan 2024".
fn month_label(date: Date) -> String {
    let month = match date.month() {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    };

    format!("{} {}", month, date.year())
}
