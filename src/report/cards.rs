//! Card components for the latest-period metrics grid.
//!
//! Renders the six summary metrics above the chart as a responsive card
//! grid. The cumulative balance card is tinted green when the balance is in
//! credit and red when in debt; every other card is neutral.

use maud::{Markup, html};

use super::metrics::{BalanceSign, Metric, MetricsView};

const BALANCE_LABEL: &str = "Cumulative Balance";

/// Renders the metrics section with one card per metric.
pub(super) fn metric_cards_view(view: &MetricsView) -> Markup {
    html! {
        section class="w-full mx-auto mt-4 mb-8" {
            div class="flex justify-between items-baseline mb-4" {
                h3 class="text-xl font-semibold" {
                    "Latest Billing Period"
                }
            }

            div class="grid grid-cols-2 sm:grid-cols-3 lg:grid-cols-6 gap-4" {
                @for metric in &view.metrics {
                    (metric_card(metric, view.balance_sign))
                }
            }
        }
    }
}

/// Renders a single metric card.
fn metric_card(metric: &Metric, balance_sign: BalanceSign) -> Markup {
    let value_style = if metric.label == BALANCE_LABEL {
        match balance_sign {
            BalanceSign::Positive => "text-2xl font-bold mb-1 text-green-600 dark:text-green-400",
            BalanceSign::Negative => "text-2xl font-bold mb-1 text-red-600 dark:text-red-400",
        }
    } else {
        "text-2xl font-bold mb-1"
    };

    html! {
        div
            class="bg-white dark:bg-gray-800 border border-gray-200
                   dark:border-gray-700 rounded-lg p-4 shadow-md
                   hover:shadow-lg transition-shadow
                   flex flex-col justify-between"
            aria-label=(format!("{}: {} {}", metric.label, metric.value, metric.unit))
        {
            h4 class="text-sm font-semibold text-gray-600 dark:text-gray-400 truncate"
               title=(metric.label) {
                (metric.label)
            }

            div class=(value_style) {
                (metric.value)
                span class="text-sm font-normal text-gray-600 dark:text-gray-400 ml-1" {
                    (metric.unit)
                }
            }
        }
    }
}

/// Renders a placeholder for when no billing periods exist yet.
pub(super) fn empty_state_view() -> Markup {
    html! {
        section class="w-full mx-auto mt-8 mb-8" {
            div class="bg-white dark:bg-gray-800 border border-gray-200
                       dark:border-gray-700 rounded-lg p-8 shadow-md
                       text-center max-w-md mx-auto" {
                h3 class="text-xl font-semibold mb-3" {
                    "No Billing Data Yet"
                }
                p class="text-gray-700 dark:text-gray-300 mb-4" {
                    "Add at least one meter reading to derive your first billing period."
                }
                p class="text-sm text-gray-600 dark:text-gray-400" {
                    "Each reading closes the period that ends on its date."
                }
            }
        }
    }
}
