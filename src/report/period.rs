//! The billing period view model and the read-only collection holding it.

use std::collections::HashMap;

use time::Date;

/// One completed billing interval with its derived energy totals.
///
/// All fields are energy quantities in kWh. Everything except the balance
/// fields is non-negative by construction; the balance fields are signed.
#[derive(Debug, Clone, PartialEq)]
pub struct BillingPeriod {
    /// The calendar date the period closed on.
    pub end_date: Date,
    /// Solar production during the period.
    pub solar_generation: f64,
    /// Energy drawn from the grid during the period.
    pub grid_consumption: f64,
    /// Energy fed into the grid during the period.
    pub grid_injection: f64,
    /// Total energy used: grid consumption plus self-consumed solar.
    pub total_consumption: f64,
    /// Solar production consumed on-site rather than injected.
    pub solar_consumption: f64,
    /// The billing balance change for this period alone.
    pub balance_change: f64,
    /// The signed running billing balance as of this period's end.
    pub cumulative_balance: f64,
}

/// A read-only mapping of opaque period ids to billing periods.
///
/// The collection is rebuilt from the stored readings on every request and
/// never mutated afterwards. Ids are never interpreted; only `end_date`
/// drives ordering, with the id as an explicit secondary sort key so that
/// periods sharing an end date still order deterministically.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PeriodCollection(HashMap<String, BillingPeriod>);

impl PeriodCollection {
    /// All periods with their ids, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BillingPeriod)> {
        self.0.iter()
    }
}

/// Lookup conveniences for asserting on derived periods.
#[cfg(test)]
impl PeriodCollection {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&BillingPeriod> {
        self.0.get(id)
    }
}

impl FromIterator<(String, BillingPeriod)> for PeriodCollection {
    fn from_iter<T: IntoIterator<Item = (String, BillingPeriod)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
pub(super) fn test_period(end_date: Date) -> BillingPeriod {
    BillingPeriod {
        end_date,
        solar_generation: 100.0,
        grid_consumption: 50.0,
        grid_injection: 20.0,
        total_consumption: 130.0,
        solar_consumption: 80.0,
        balance_change: 20.0,
        cumulative_balance: 40.0,
    }
}
