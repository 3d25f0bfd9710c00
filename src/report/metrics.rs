//! Projects the latest billing period into the metric cards view model.

use super::{BillingPeriod, PeriodCollection, one_decimal};

/// Whether the cumulative balance is in credit or debt.
///
/// Used purely for presentation (green vs. red), never for computation.
/// A balance of exactly zero counts as positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BalanceSign {
    Positive,
    Negative,
}

/// A single named metric for the latest billing period.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Metric {
    pub label: &'static str,
    /// The value formatted to one decimal place.
    pub value: String,
    pub unit: &'static str,
}

/// The latest-period summary shown above the chart.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct MetricsView {
    /// The six metrics in display order, ending with the cumulative balance.
    pub metrics: Vec<Metric>,
    pub balance_sign: BalanceSign,
}

/// Summarise the most recent billing period.
///
/// The most recent period is the one with the maximal end date; periods
/// sharing an end date are disambiguated by the greater period id, so the
/// result is deterministic for any input.
///
/// Returns `None` for an empty collection, in which case the caller should
/// render a "no data" placeholder instead.
pub(super) fn project(periods: &PeriodCollection) -> Option<MetricsView> {
    let (_, latest) = periods
        .iter()
        .max_by(|(id_a, a), (id_b, b)| a.end_date.cmp(&b.end_date).then_with(|| id_a.cmp(id_b)))?;

    Some(MetricsView {
        metrics: metric_entries(latest),
        balance_sign: if latest.cumulative_balance < 0.0 {
            BalanceSign::Negative
        } else {
            BalanceSign::Positive
        },
    })
}

fn metric_entries(period: &BillingPeriod) -> Vec<Metric> {
    [
        ("Solar Generation", period.solar_generation),
        ("Grid Consumption", period.grid_consumption),
        ("Grid Injection", period.grid_injection),
        ("Total Consumption", period.total_consumption),
        ("Solar Consumption", period.solar_consumption),
        ("Cumulative Balance", period.cumulative_balance),
    ]
    .into_iter()
    .map(|(label, value)| Metric {
        label,
        value: one_decimal(value),
        unit: "kWh",
    })
    .collect()
}
