//! The route handler for the billing report page.
//!
//! Fetches the stored readings, derives the billing periods and assembles
//! the page: the latest-period metric cards, the chart type toolbar and the
//! chart itself. Everything is recomputed per request, so a chart type
//! switch is just a link back to this page with a query parameter.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, BillingConfig, ChartType, Error, ReportConfig, endpoints,
    html::{HeadElement, PAGE_CONTAINER_STYLE, base, link},
    navigation::NavBar,
    readings::{get_all_meter_readings, get_all_solar_readings},
};

use super::{
    cards::{empty_state_view, metric_cards_view},
    charts::{ReportChart, chart_script, chart_view},
    derive_periods,
    metrics::project,
    series::compose,
};

const ACTIVE_TOOLBAR_STYLE: &str = "px-3 py-1 rounded text-sm font-semibold \
    bg-blue-500 text-white";
const INACTIVE_TOOLBAR_STYLE: &str = "px-3 py-1 rounded text-sm font-semibold \
    text-blue-600 hover:bg-blue-100 dark:text-blue-400 dark:hover:bg-gray-700";

/// The state needed for displaying the report page.
#[derive(Debug, Clone)]
pub struct ReportState {
    /// The database connection for meter readings and solar production.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The parameters for deriving billing periods.
    pub billing_config: BillingConfig,
    /// The report title, chart type and period window.
    pub report_config: ReportConfig,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            billing_config: state.billing_config.clone(),
            report_config: state.report_config.clone(),
        }
    }
}

/// The query parameters for the report page.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// Overrides the configured chart type for this request.
    pub chart: Option<ChartType>,
}

/// Display the billing report page.
pub async fn get_report_page(
    State(state): State<ReportState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let readings = get_all_meter_readings(&connection)
        .inspect_err(|error| tracing::error!("could not retrieve meter readings: {error}"))?;
    let solar_entries = get_all_solar_readings(&connection)
        .inspect_err(|error| tracing::error!("could not retrieve solar entries: {error}"))?;

    let nav_bar = NavBar::new(endpoints::REPORT_VIEW);
    let periods = derive_periods(&readings, &solar_entries, &state.billing_config);

    let Some(metrics_view) = project(&periods) else {
        return Ok(report_no_data_view(nav_bar, &state.report_config.title).into_response());
    };

    let chart_type = query.chart.unwrap_or(state.report_config.chart_type);
    let model = compose(&periods, state.report_config.period_months, chart_type);
    let chart = ReportChart::new(&model, &state.report_config.title);

    let content = html!(
        (nav_bar.into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            header class="flex justify-between flex-wrap items-end mb-4"
            {
                h1 class="text-xl font-bold" { (state.report_config.title) }

                (chart_type_toolbar(chart_type))
            }

            (metric_cards_view(&metrics_view))

            (chart_view(&chart))
        }
    );

    let scripts = [
        HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
        chart_script(&chart),
    ];

    Ok(base(&state.report_config.title, &scripts, &content).into_response())
}

/// Renders the links for switching between the chart presentation modes.
fn chart_type_toolbar(active: ChartType) -> Markup {
    let toolbar_link = |chart_type: ChartType, label: &str| {
        let style = if chart_type == active {
            ACTIVE_TOOLBAR_STYLE
        } else {
            INACTIVE_TOOLBAR_STYLE
        };
        let url = format!("{}?chart={}", endpoints::REPORT_VIEW, chart_type);

        html!(
            a href=(url) class=(style) { (label) }
        )
    };

    html!(
        nav class="flex gap-2" aria-label="Chart type"
        {
            (toolbar_link(ChartType::Bar, "Bar"))
            (toolbar_link(ChartType::Area, "Area"))
            (toolbar_link(ChartType::Mixed, "Mixed"))
        }
    )
}

/// Renders the report page when no billing periods exist yet.
fn report_no_data_view(nav_bar: NavBar, title: &str) -> Markup {
    let new_reading_link = link(endpoints::NEW_READING_VIEW, "Add a meter reading");

    let content = html!(
        (nav_bar.into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { (title) }

            (empty_state_view())

            p class="text-center"
            {
                (new_reading_link)
                " to get started."
            }
        }
    );

    base(title, &[], &content)
}

#[cfg(test)]
mod report_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Query, State};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        BillingConfig, ChartType, ReportConfig,
        db::initialize,
        readings::{create_meter_reading, create_solar_reading},
    };

    use super::{ReportQuery, ReportState, get_report_page};

    fn get_test_state() -> ReportState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        ReportState {
            db_connection: Arc::new(Mutex::new(connection)),
            billing_config: BillingConfig::default(),
            report_config: ReportConfig::default(),
        }
    }

    fn seed_one_period(state: &ReportState) {
        let connection = state.db_connection.lock().unwrap();
        create_meter_reading(date!(2024 - 01 - 31), 150.0, 120.0, &connection).unwrap();
        create_solar_reading(date!(2024 - 01 - 15), 12.5, &connection).unwrap();
    }

    async fn render_page(state: ReportState, query: ReportQuery) -> String {
        let response = get_report_page(State(state), Query(query)).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn empty_database_shows_placeholder() {
        let markup = render_page(get_test_state(), ReportQuery::default()).await;

        assert!(markup.contains("No Billing Data Yet"));
        assert!(!markup.contains("billing-report-chart"));
    }

    #[tokio::test]
    async fn page_shows_metrics_and_chart() {
        let state = get_test_state();
        seed_one_period(&state);

        let markup = render_page(state, ReportQuery::default()).await;

        assert!(markup.contains("Solar Generation"));
        assert!(markup.contains("Cumulative Balance"));
        assert!(markup.contains("billing-report-chart"));
        assert!(markup.contains("echarts.6.0.0.min.js"));
    }

    #[tokio::test]
    async fn chart_query_overrides_configured_type() {
        let state = get_test_state();
        seed_one_period(&state);

        let bar_markup = render_page(
            state.clone(),
            ReportQuery {
                chart: Some(ChartType::Bar),
            },
        )
        .await;
        let mixed_markup = render_page(state, ReportQuery::default()).await;

        // The metric cards mention the balance on both pages, but only the
        // mixed chart carries a balance series in its options.
        let bar_mentions = bar_markup.matches("Cumulative Balance").count();
        let mixed_mentions = mixed_markup.matches("Cumulative Balance").count();
        assert!(mixed_mentions > bar_mentions);
    }

    #[tokio::test]
    async fn toolbar_marks_the_active_chart_type() {
        let state = get_test_state();
        seed_one_period(&state);

        let markup = render_page(
            state,
            ReportQuery {
                chart: Some(ChartType::Area),
            },
        )
        .await;

        assert!(markup.contains("/report?chart=bar"));
        assert!(markup.contains("/report?chart=area"));
        assert!(markup.contains("/report?chart=mixed"));
    }
}
