//! Derives billing periods from raw meter readings and daily solar production.
//!
//! Grid meters report cumulative totals, so each period's consumption and
//! injection are the difference between its reading and the previous one.
//! The first period differences against the configured initial meter values
//! and is assumed to span the configured billing period length; later
//! periods start the day after the previous reading.

use std::collections::HashMap;

use time::{Date, Duration};

use crate::{
    BillingConfig,
    readings::{MeterReading, SolarReading},
};

use super::{BillingPeriod, PeriodCollection};

/// Compute the billing periods for the given readings.
///
/// The resulting collection is keyed by the ISO 8601 period end date.
/// Returns an empty collection when there are no meter readings.
pub(crate) fn derive_periods(
    readings: &[MeterReading],
    solar_entries: &[SolarReading],
    config: &BillingConfig,
) -> PeriodCollection {
    let mut sorted_readings: Vec<&MeterReading> = readings.iter().collect();
    sorted_readings.sort_by_key(|reading| reading.end_date);

    let solar_by_day: HashMap<Date, f64> = solar_entries
        .iter()
        .map(|entry| (entry.date, entry.kwh))
        .collect();

    let mut cumulative_balance = config.initial_balance;
    let mut prev_grid_consumption = config.initial_grid_consumption;
    let mut prev_grid_injection = config.initial_grid_injection;
    let mut prev_end_date: Option<Date> = None;

    sorted_readings
        .into_iter()
        .map(|reading| {
            let start_date = match prev_end_date {
                Some(prev) => prev + Duration::days(1),
                None => {
                    reading.end_date - Duration::days(i64::from(config.billing_period_days) - 1)
                }
            };

            let grid_consumption = reading.grid_consumption_reading - prev_grid_consumption;
            let grid_injection = reading.grid_injection_reading - prev_grid_injection;
            let solar_generation = solar_for_period(&solar_by_day, start_date, reading.end_date);

            let solar_consumption = solar_generation - grid_injection;
            let total_consumption = grid_consumption + solar_consumption;

            // Consumption up to the minimum billing amount is covered by the
            // fixed charge and does not count against the balance.
            let billed_consumption = (grid_consumption - config.minimum_billing_kwh).max(0.0);
            let balance_change = grid_injection - billed_consumption;
            cumulative_balance += balance_change;

            prev_grid_consumption = reading.grid_consumption_reading;
            prev_grid_injection = reading.grid_injection_reading;
            prev_end_date = Some(reading.end_date);

            (
                reading.end_date.to_string(),
                BillingPeriod {
                    end_date: reading.end_date,
                    solar_generation,
                    grid_consumption,
                    grid_injection,
                    total_consumption,
                    solar_consumption,
                    balance_change,
                    cumulative_balance,
                },
            )
        })
        .collect()
}

/// Sum the recorded daily solar production over `start_date..=end_date`.
///
/// Days without a recorded entry contribute nothing.
fn solar_for_period(solar_by_day: &HashMap<Date, f64>, start_date: Date, end_date: Date) -> f64 {
    let mut total = 0.0;
    let mut current_date = start_date;

    while current_date <= end_date {
        if let Some(kwh) = solar_by_day.get(&current_date) {
            total += kwh;
        }

        current_date = match current_date.next_day() {
            Some(next) => next,
            None => break,
        };
    }

    total
}
