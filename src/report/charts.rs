//! Chart generation and rendering for the report page.
//!
//! Turns the composed [ChartModel](super::series::ChartModel) into an
//! ECharts configuration with the `charming` crate, plus the HTML container
//! and JavaScript initialization code. The chart model's series order is the
//! draw order and its values arrive pre-formatted; nothing here reorders or
//! re-rounds them.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AreaStyle, AxisPointer, AxisPointerType, AxisType, JsFunction, LineStyle, Tooltip, Trigger,
    },
    series::{Bar, Line},
};
use maud::{Markup, PreEscaped, html};

use crate::html::HeadElement;

use super::series::{ChartModel, SeriesKind};

/// The report chart with its HTML container ID and ECharts configuration.
pub(super) struct ReportChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

impl ReportChart {
    /// Build the billing report chart from the composed chart model.
    pub fn new(model: &ChartModel, title: &str) -> Self {
        Self {
            id: "billing-report-chart",
            options: billing_chart(model, title).to_string(),
        }
    }
}

/// Renders the HTML container for the report chart.
pub(super) fn chart_view(chart: &ReportChart) -> Markup {
    html!(
        section
            id="chart"
            class="w-full mx-auto mb-4"
        {
            div
                id=(chart.id)
                class="min-h-[380px] rounded dark:bg-gray-100"
            {}
        }
    )
}

/// Generates JavaScript initialization code for the report chart.
///
/// Any ECharts instance already attached to the container is disposed before
/// a new one is created, so repeated renders do not leak chart resources.
///
/// # Arguments
/// * `chart` - The chart to generate the initialization script for
///
/// # Returns
/// HeadElement containing the initialization JavaScript.
pub(super) fn chart_script(chart: &ReportChart) -> HeadElement {
    let script_content = format!(
        r#"document.addEventListener('DOMContentLoaded', function() {{
            const chartDom = document.getElementById("{}");

            const previous = echarts.getInstanceByDom(chartDom);
            if (previous) {{
                previous.dispose();
            }}

            const chart = echarts.init(chartDom);
            const option = {};
            chart.setOption(option);

            window.addEventListener('resize', chart.resize);

            const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
            const updateTheme = () => {{
                const isDarkMode = darkModeMediaQuery.matches;
                chart.setTheme(isDarkMode ? 'dark' : 'default');
            }}
            darkModeMediaQuery.addEventListener('change', updateTheme);
            updateTheme();
        }});"#,
        chart.id, chart.options
    );

    HeadElement::ScriptSource(PreEscaped(script_content))
}

fn billing_chart(model: &ChartModel, title: &str) -> Chart {
    let mut chart = Chart::new()
        .title(Title::new().text(title).subtext("Billing periods"))
        .tooltip(kwh_tooltip())
        .legend(Legend::new().top(40).left("center"))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .top(90)
                .contain_label(true),
        )
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(model.categories.clone()),
        )
        .y_axis(Axis::new().type_(AxisType::Value).name("Energy (kWh)"));

    for series in &model.series {
        chart = match series.kind {
            SeriesKind::Column => {
                chart.series(Bar::new().name(series.name).data(series.data.clone()))
            }
            SeriesKind::Area => chart.series(
                Line::new()
                    .name(series.name)
                    .area_style(AreaStyle::new().opacity(0.6))
                    .data(series.data.clone()),
            ),
            SeriesKind::Line => chart.series(
                Line::new()
                    .name(series.name)
                    .line_style(LineStyle::new().width(3))
                    .data(series.data.clone()),
            ),
        };
    }

    chart
}

/// Creates a tooltip configuration for kWh values
fn kwh_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(JsFunction::new_with_args(
            "number",
            "return number + \" kWh\";",
        ))
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
