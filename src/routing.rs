//! Application router configuration.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState, endpoints,
    logging::logging_middleware,
    not_found::get_404_not_found,
    readings::{
        create_meter_reading_endpoint, create_solar_period_endpoint, create_solar_reading_endpoint,
        delete_meter_reading_endpoint, delete_solar_reading_endpoint, get_edit_reading_page,
        get_edit_solar_page, get_new_reading_page, get_new_solar_page, get_new_solar_period_page,
        get_readings_page, get_solar_page, update_meter_reading_endpoint,
        update_solar_reading_endpoint,
    },
    report::get_report_page,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::REPORT_VIEW, get(get_report_page))
        .route(endpoints::READINGS_VIEW, get(get_readings_page))
        .route(endpoints::NEW_READING_VIEW, get(get_new_reading_page))
        .route(endpoints::EDIT_READING_VIEW, get(get_edit_reading_page))
        .route(endpoints::SOLAR_VIEW, get(get_solar_page))
        .route(endpoints::NEW_SOLAR_VIEW, get(get_new_solar_page))
        .route(endpoints::NEW_SOLAR_PERIOD_VIEW, get(get_new_solar_period_page))
        .route(endpoints::EDIT_SOLAR_VIEW, get(get_edit_solar_page))
        .route(endpoints::READINGS_API, post(create_meter_reading_endpoint))
        .route(endpoints::UPDATE_READING, post(update_meter_reading_endpoint))
        .route(
            endpoints::DELETE_READING,
            post(delete_meter_reading_endpoint),
        )
        .route(endpoints::SOLAR_API, post(create_solar_reading_endpoint))
        .route(endpoints::SOLAR_PERIOD_API, post(create_solar_period_endpoint))
        .route(endpoints::UPDATE_SOLAR, post(update_solar_reading_endpoint))
        .route(endpoints::DELETE_SOLAR, post(delete_solar_reading_endpoint))
        .layer(middleware::from_fn(logging_middleware))
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the report page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::REPORT_VIEW)
}

#[cfg(test)]
mod root_route_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{endpoints, routing::get_index_page};

    #[tokio::test]
    async fn root_redirects_to_report() {
        let response = get_index_page().await.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers().get("location").unwrap();
        assert_eq!(location, endpoints::REPORT_VIEW);
    }
}

#[cfg(test)]
mod router_tests {
    use axum_test::TestServer;
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        AppState, BillingConfig, ReportConfig, endpoints,
        readings::{create_meter_reading, create_solar_reading},
    };

    use super::build_router;

    fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        let state = AppState::new(
            connection,
            BillingConfig::default(),
            ReportConfig::default(),
        )
        .unwrap();

        TestServer::new(build_router(state))
    }

    fn get_seeded_test_server() -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        let state = AppState::new(
            connection,
            BillingConfig::default(),
            ReportConfig::default(),
        )
        .unwrap();

        {
            let connection = state.db_connection.lock().unwrap();
            create_meter_reading(date!(2024 - 01 - 31), 180.0, 50.0, &connection).unwrap();
            create_meter_reading(date!(2024 - 02 - 29), 340.0, 95.0, &connection).unwrap();
            create_solar_reading(date!(2024 - 01 - 20), 14.5, &connection).unwrap();
            create_solar_reading(date!(2024 - 02 - 10), 18.0, &connection).unwrap();
        }

        TestServer::new(build_router(state))
    }

    #[tokio::test]
    async fn report_page_renders_metric_cards() {
        let server = get_seeded_test_server();

        let response = server.get(endpoints::REPORT_VIEW).await;
        response.assert_status_ok();

        let html = Html::parse_document(&response.text());
        let headings = Selector::parse("h4").unwrap();
        let labels: Vec<String> = html
            .select(&headings)
            .map(|heading| heading.text().collect::<String>().trim().to_owned())
            .collect();

        assert!(labels.contains(&"Solar Generation".to_owned()));
        assert!(labels.contains(&"Cumulative Balance".to_owned()));
    }

    #[tokio::test]
    async fn report_page_accepts_chart_type_query() {
        let server = get_seeded_test_server();

        let response = server
            .get(endpoints::REPORT_VIEW)
            .add_query_param("chart", "area")
            .await;

        response.assert_status_ok();
        assert!(response.text().contains("areaStyle"));
    }

    #[tokio::test]
    async fn create_reading_form_round_trips_to_list_page() {
        let server = get_test_server();

        let response = server
            .post(endpoints::READINGS_API)
            .form(&[
                ("end_date", "2024-03-31"),
                ("grid_consumption_reading", "512.2"),
                ("grid_injection_reading", "120.5"),
            ])
            .await;
        response.assert_status_see_other();

        let list_page = server.get(endpoints::READINGS_VIEW).await;
        list_page.assert_status_ok();
        assert!(list_page.text().contains("2024-03-31"));
        assert!(list_page.text().contains("512.2 kWh"));
    }

    #[tokio::test]
    async fn create_solar_form_round_trips_to_list_page() {
        let server = get_test_server();

        let response = server
            .post(endpoints::SOLAR_API)
            .form(&[("date", "2024-03-15"), ("kwh", "21.5")])
            .await;
        response.assert_status_see_other();

        let list_page = server.get(endpoints::SOLAR_VIEW).await;
        list_page.assert_status_ok();
        assert!(list_page.text().contains("2024-03-15"));
        assert!(list_page.text().contains("21.5 kWh"));
    }

    #[tokio::test]
    async fn solar_period_form_round_trips_to_list_page() {
        let server = get_test_server();

        let response = server
            .post(endpoints::SOLAR_PERIOD_API)
            .form(&[
                ("start_date", "2024-03-01"),
                ("end_date", "2024-03-02"),
                ("total_kwh", "25.0"),
            ])
            .await;
        response.assert_status_see_other();

        let list_page = server.get(endpoints::SOLAR_VIEW).await;
        list_page.assert_status_ok();
        assert!(list_page.text().contains("2024-03-01"));
        assert!(list_page.text().contains("2024-03-02"));
        assert!(list_page.text().contains("12.5 kWh"));
    }

    #[tokio::test]
    async fn edit_route_updates_reading() {
        let server = get_seeded_test_server();

        let edit_page = server
            .get(&endpoints::format_endpoint(endpoints::EDIT_READING_VIEW, 1))
            .await;
        edit_page.assert_status_ok();
        assert!(edit_page.text().contains("value=\"2024-01-31\""));

        let response = server
            .post(&endpoints::format_endpoint(endpoints::UPDATE_READING, 1))
            .form(&[
                ("end_date", "2024-01-31"),
                ("grid_consumption_reading", "200.5"),
                ("grid_injection_reading", "60.0"),
            ])
            .await;
        response.assert_status_see_other();

        let list_page = server.get(endpoints::READINGS_VIEW).await;
        assert!(list_page.text().contains("200.5 kWh"));
    }

    #[tokio::test]
    async fn delete_route_removes_reading() {
        let server = get_seeded_test_server();

        let response = server
            .post(&endpoints::format_endpoint(endpoints::DELETE_READING, 1))
            .await;
        response.assert_status_see_other();

        let list_page = server.get(endpoints::READINGS_VIEW).await;
        assert!(!list_page.text().contains("2024-01-31"));
    }

    #[tokio::test]
    async fn duplicate_reading_date_returns_error_page() {
        let server = get_seeded_test_server();

        let response = server
            .post(endpoints::READINGS_API)
            .form(&[
                ("end_date", "2024-01-31"),
                ("grid_consumption_reading", "400.0"),
                ("grid_injection_reading", "100.0"),
            ])
            .await;

        response.assert_status_failure();
        assert!(response.text().contains("already exists"));
    }

    #[tokio::test]
    async fn unknown_route_renders_not_found_page() {
        let server = get_test_server();

        let response = server.get("/no-such-page").await;

        response.assert_status_not_found();
    }
}
