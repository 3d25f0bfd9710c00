//! Meter readings: the model, database operations, pages and endpoints.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};
use rusqlite::{Connection, Row, params};
use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error, endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_kwh,
    },
    navigation::NavBar,
};

/// A snapshot of the grid meter's cumulative totals on a given day.
///
/// The reading closes the billing period that ends on `end_date`. Both
/// totals are cumulative kWh as shown on the meter, not per-period amounts.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterReading {
    /// The id of the reading in the database.
    pub id: i64,
    /// The day the reading was taken, which is the billing period's last day.
    pub end_date: Date,
    /// The meter's cumulative grid consumption total in kWh.
    pub grid_consumption_reading: f64,
    /// The meter's cumulative grid injection total in kWh.
    pub grid_injection_reading: f64,
}

/// Initialize the meter reading table.
///
/// The unique constraint on `end_date` guarantees at most one reading, and
/// therefore at most one billing period, per day.
pub fn create_meter_reading_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS meter_reading (
            id INTEGER PRIMARY KEY,
            end_date TEXT NOT NULL UNIQUE,
            grid_consumption_reading REAL NOT NULL,
            grid_injection_reading REAL NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Create a meter reading and return it with its generated ID.
///
/// # Errors
/// Returns [Error::FutureDate] if `end_date` is after today, or
/// [Error::DuplicateReadingDate] if a reading already exists for that date.
pub fn create_meter_reading(
    end_date: Date,
    grid_consumption_reading: f64,
    grid_injection_reading: f64,
    connection: &Connection,
) -> Result<MeterReading, Error> {
    if end_date > OffsetDateTime::now_utc().date() {
        return Err(Error::FutureDate(end_date));
    }

    connection.execute(
        "INSERT INTO meter_reading (end_date, grid_consumption_reading, grid_injection_reading)
        VALUES (?1, ?2, ?3)",
        params![end_date, grid_consumption_reading, grid_injection_reading],
    )?;

    let id = connection.last_insert_rowid();

    Ok(MeterReading {
        id,
        end_date,
        grid_consumption_reading,
        grid_injection_reading,
    })
}

/// Retrieve a single meter reading by ID.
pub fn get_meter_reading(reading_id: i64, connection: &Connection) -> Result<MeterReading, Error> {
    connection
        .prepare(
            "SELECT id, end_date, grid_consumption_reading, grid_injection_reading
            FROM meter_reading WHERE id = ?1",
        )?
        .query_row([reading_id], map_row)
        .map_err(|error| error.into())
}

/// Update a meter reading's date and totals.
///
/// # Errors
/// Returns [Error::NotFound] if no reading has the given ID,
/// [Error::FutureDate] if `end_date` is after today, or
/// [Error::DuplicateReadingDate] if another reading already has that date.
pub fn update_meter_reading(
    reading_id: i64,
    end_date: Date,
    grid_consumption_reading: f64,
    grid_injection_reading: f64,
    connection: &Connection,
) -> Result<(), Error> {
    if end_date > OffsetDateTime::now_utc().date() {
        return Err(Error::FutureDate(end_date));
    }

    let rows_affected = connection.execute(
        "UPDATE meter_reading
        SET end_date = ?1, grid_consumption_reading = ?2, grid_injection_reading = ?3
        WHERE id = ?4",
        params![
            end_date,
            grid_consumption_reading,
            grid_injection_reading,
            reading_id
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Retrieve all meter readings ordered by date, oldest first.
pub fn get_all_meter_readings(connection: &Connection) -> Result<Vec<MeterReading>, Error> {
    connection
        .prepare(
            "SELECT id, end_date, grid_consumption_reading, grid_injection_reading
            FROM meter_reading ORDER BY end_date ASC",
        )?
        .query_map([], map_row)?
        .map(|maybe_reading| maybe_reading.map_err(|error| error.into()))
        .collect()
}

/// Delete a meter reading by ID. Returns an error if the reading doesn't exist.
pub fn delete_meter_reading(reading_id: i64, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM meter_reading WHERE id = ?1", [reading_id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingReading);
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<MeterReading, rusqlite::Error> {
    Ok(MeterReading {
        id: row.get(0)?,
        end_date: row.get(1)?,
        grid_consumption_reading: row.get(2)?,
        grid_injection_reading: row.get(3)?,
    })
}

/// The state needed for the meter reading pages and endpoints.
#[derive(Debug, Clone)]
pub struct ReadingsState {
    /// The database connection for meter readings.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReadingsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a meter reading.
#[derive(Debug, Deserialize)]
pub struct MeterReadingForm {
    /// The day the reading was taken.
    pub end_date: Date,
    /// The meter's cumulative grid consumption total in kWh.
    pub grid_consumption_reading: f64,
    /// The meter's cumulative grid injection total in kWh.
    pub grid_injection_reading: f64,
}

/// Render the page listing the recorded meter readings.
pub async fn get_readings_page(State(state): State<ReadingsState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let readings = get_all_meter_readings(&connection)
        .inspect_err(|error| tracing::error!("could not retrieve meter readings: {error}"))?;

    Ok(readings_view(&readings).into_response())
}

/// Render the page for entering a new meter reading.
pub async fn get_new_reading_page() -> Response {
    new_reading_view().into_response()
}

/// Handle meter reading form submission, redirects to the readings list on success.
pub async fn create_meter_reading_endpoint(
    State(state): State<ReadingsState>,
    Form(form): Form<MeterReadingForm>,
) -> Result<Redirect, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    create_meter_reading(
        form.end_date,
        form.grid_consumption_reading,
        form.grid_injection_reading,
        &connection,
    )
    .inspect_err(|error| tracing::error!("could not create meter reading with {form:?}: {error}"))?;

    Ok(Redirect::to(endpoints::READINGS_VIEW))
}

/// Render the page for editing an existing meter reading.
pub async fn get_edit_reading_page(
    Path(reading_id): Path<i64>,
    State(state): State<ReadingsState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let reading = get_meter_reading(reading_id, &connection)
        .inspect_err(|error| tracing::error!("could not retrieve meter reading {reading_id}: {error}"))?;

    Ok(edit_reading_view(&reading).into_response())
}

/// Handle the edit form submission, redirects to the readings list on success.
pub async fn update_meter_reading_endpoint(
    Path(reading_id): Path<i64>,
    State(state): State<ReadingsState>,
    Form(form): Form<MeterReadingForm>,
) -> Result<Redirect, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    update_meter_reading(
        reading_id,
        form.end_date,
        form.grid_consumption_reading,
        form.grid_injection_reading,
        &connection,
    )
    .inspect_err(|error| {
        tracing::error!("could not update meter reading {reading_id} with {form:?}: {error}")
    })?;

    Ok(Redirect::to(endpoints::READINGS_VIEW))
}

/// Handle meter reading deletion, redirects to the readings list on success.
pub async fn delete_meter_reading_endpoint(
    Path(reading_id): Path<i64>,
    State(state): State<ReadingsState>,
) -> Result<Redirect, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_meter_reading(reading_id, &connection)
        .inspect_err(|error| tracing::error!("could not delete meter reading {reading_id}: {error}"))?;

    Ok(Redirect::to(endpoints::READINGS_VIEW))
}

fn readings_view(readings: &[MeterReading]) -> Markup {
    let nav_bar = NavBar::new(endpoints::READINGS_VIEW).into_html();
    let new_reading_route = endpoints::NEW_READING_VIEW;

    let table_row = |reading: &MeterReading| {
        let edit_url = endpoints::format_endpoint(endpoints::EDIT_READING_VIEW, reading.id);
        let delete_url = endpoints::format_endpoint(endpoints::DELETE_READING, reading.id);

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (reading.end_date) }
                td class=(TABLE_CELL_STYLE) { (format_kwh(reading.grid_consumption_reading)) }
                td class=(TABLE_CELL_STYLE) { (format_kwh(reading.grid_injection_reading)) }
                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex items-center gap-4"
                    {
                        a href=(edit_url) class=(LINK_STYLE) { "Edit" }

                        form
                            method="post"
                            action=(delete_url)
                            onsubmit=(format!(
                                "return confirm('Delete the reading for {}? The billing period \
                                ending on that day will disappear from the report.');",
                                reading.end_date
                            ))
                        {
                            button type="submit" class=(BUTTON_DELETE_STYLE) { "Delete" }
                        }
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Meter Readings" }

                    a href=(new_reading_route) class=(LINK_STYLE) { "Add Reading" }
                }

                section class="dark:bg-gray-800 lg:max-w-5xl lg:w-full lg:mx-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Grid Consumption" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Grid Injection" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for reading in readings {
                                (table_row(reading))
                            }

                            @if readings.is_empty() {
                                tr
                                {
                                    td
                                        colspan="4"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No meter readings recorded yet. "
                                        a href=(new_reading_route) class=(LINK_STYLE)
                                        {
                                            "Add your first reading"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Meter Readings", &[], &content)
}

fn new_reading_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_READING_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            (reading_form(endpoints::READINGS_API, "Save Reading", None))
        }
    );

    base("New Meter Reading", &[], &content)
}

fn edit_reading_view(reading: &MeterReading) -> Markup {
    let nav_bar = NavBar::new(endpoints::READINGS_VIEW).into_html();
    let update_url = endpoints::format_endpoint(endpoints::UPDATE_READING, reading.id);

    let content = html!(
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            (reading_form(&update_url, "Update Reading", Some(reading)))
        }
    );

    base("Edit Meter Reading", &[], &content)
}

fn reading_form(action: &str, submit_label: &str, prefill: Option<&MeterReading>) -> Markup {
    let max_date = OffsetDateTime::now_utc().date();
    let date_value = prefill.map_or(max_date, |reading| reading.end_date);

    html!(
        form
            method="post"
            action=(action)
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="end_date" class=(FORM_LABEL_STYLE) { "Reading date" }
                input
                    type="date"
                    name="end_date"
                    id="end_date"
                    value=(date_value)
                    max=(max_date)
                    class=(FORM_TEXT_INPUT_STYLE)
                    required;
            }

            div
            {
                label for="grid_consumption_reading" class=(FORM_LABEL_STYLE)
                {
                    "Grid consumption meter total (kWh)"
                }
                input
                    type="number"
                    name="grid_consumption_reading"
                    id="grid_consumption_reading"
                    step="0.01"
                    min="0"
                    value=[prefill.map(|reading| reading.grid_consumption_reading)]
                    class=(FORM_TEXT_INPUT_STYLE)
                    required;
            }

            div
            {
                label for="grid_injection_reading" class=(FORM_LABEL_STYLE)
                {
                    "Grid injection meter total (kWh)"
                }
                input
                    type="number"
                    name="grid_injection_reading"
                    id="grid_injection_reading"
                    step="0.01"
                    min="0"
                    value=[prefill.map(|reading| reading.grid_injection_reading)]
                    class=(FORM_TEXT_INPUT_STYLE)
                    required;
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_label) }
        }
    )
}


#[cfg(test)]
mod meter_reading_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        extract::{Path, State},
        http::{StatusCode, header::LOCATION},
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{Error, endpoints};

    use super::{
        MeterReadingForm, ReadingsState, create_meter_reading, create_meter_reading_endpoint,
        create_meter_reading_table, delete_meter_reading_endpoint, get_all_meter_readings,
        get_meter_reading, update_meter_reading_endpoint,
    };

    fn get_test_state() -> ReadingsState {
        let connection = Connection::open_in_memory().unwrap();
        create_meter_reading_table(&connection).unwrap();

        ReadingsState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn create_endpoint_saves_reading_and_redirects() {
        let state = get_test_state();
        let form = MeterReadingForm {
            end_date: date!(2024 - 01 - 31),
            grid_consumption_reading: 1_000.0,
            grid_injection_reading: 200.0,
        };

        let response = create_meter_reading_endpoint(State(state.clone()), Form(form))
            .await
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            endpoints::READINGS_VIEW
        );

        let connection = state.db_connection.lock().unwrap();
        let readings = get_all_meter_readings(&connection).unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].grid_consumption_reading, 1_000.0);
    }

    #[tokio::test]
    async fn create_endpoint_rejects_duplicate_date() {
        let state = get_test_state();
        create_meter_reading(
            date!(2024 - 01 - 31),
            1_000.0,
            200.0,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let form = MeterReadingForm {
            end_date: date!(2024 - 01 - 31),
            grid_consumption_reading: 1_050.0,
            grid_injection_reading: 220.0,
        };

        let result = create_meter_reading_endpoint(State(state), Form(form)).await;

        assert_eq!(result.unwrap_err(), Error::DuplicateReadingDate);
    }

    #[tokio::test]
    async fn update_endpoint_saves_changes_and_redirects() {
        let state = get_test_state();
        let reading = create_meter_reading(
            date!(2024 - 01 - 31),
            1_000.0,
            200.0,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let form = MeterReadingForm {
            end_date: date!(2024 - 02 - 01),
            grid_consumption_reading: 1_010.0,
            grid_injection_reading: 205.0,
        };

        let response =
            update_meter_reading_endpoint(Path(reading.id), State(state.clone()), Form(form))
                .await
                .unwrap()
                .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            endpoints::READINGS_VIEW
        );

        let connection = state.db_connection.lock().unwrap();
        let updated = get_meter_reading(reading.id, &connection).unwrap();
        assert_eq!(updated.end_date, date!(2024 - 02 - 01));
        assert_eq!(updated.grid_consumption_reading, 1_010.0);
    }

    #[tokio::test]
    async fn update_endpoint_with_missing_id_returns_error() {
        let state = get_test_state();
        let form = MeterReadingForm {
            end_date: date!(2024 - 02 - 01),
            grid_consumption_reading: 1_010.0,
            grid_injection_reading: 205.0,
        };

        let result = update_meter_reading_endpoint(Path(999), State(state), Form(form)).await;

        assert_eq!(result.unwrap_err(), Error::NotFound);
    }

    #[tokio::test]
    async fn delete_endpoint_removes_reading_and_redirects() {
        let state = get_test_state();
        let reading = create_meter_reading(
            date!(2024 - 01 - 31),
            1_000.0,
            200.0,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = delete_meter_reading_endpoint(Path(reading.id), State(state.clone()))
            .await
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let connection = state.db_connection.lock().unwrap();
        assert!(get_all_meter_readings(&connection).unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_endpoint_with_missing_id_returns_error() {
        let state = get_test_state();

        let result = delete_meter_reading_endpoint(Path(999), State(state)).await;

        assert_eq!(result.unwrap_err(), Error::DeleteMissingReading);
    }
}

#[cfg(test)]
mod readings_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::endpoints;

    use super::{
        ReadingsState, create_meter_reading, create_meter_reading_table, get_edit_reading_page,
        get_new_reading_page, get_readings_page,
    };

    async fn render_page(state: ReadingsState) -> String {
        let response = get_readings_page(State(state)).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        String::from_utf8(body.to_vec()).unwrap()
    }

    fn get_test_state() -> ReadingsState {
        let connection = Connection::open_in_memory().unwrap();
        create_meter_reading_table(&connection).unwrap();

        ReadingsState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn page_lists_readings_with_formatted_totals() {
        let state = get_test_state();
        create_meter_reading(
            date!(2024 - 01 - 31),
            1_000.5,
            200.0,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let markup = render_page(state).await;

        assert!(markup.contains("2024-01-31"));
        assert!(markup.contains("1,000.5 kWh"));
        assert!(markup.contains("200.0 kWh"));
    }

    #[tokio::test]
    async fn empty_page_links_to_new_reading_form() {
        let markup = render_page(get_test_state()).await;

        assert!(markup.contains("No meter readings recorded yet."));
        assert!(markup.contains(endpoints::NEW_READING_VIEW));
    }

    #[tokio::test]
    async fn page_links_each_reading_to_its_edit_page() {
        let state = get_test_state();
        let reading = create_meter_reading(
            date!(2024 - 01 - 31),
            1_000.5,
            200.0,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let markup = render_page(state).await;

        let edit_url = endpoints::format_endpoint(endpoints::EDIT_READING_VIEW, reading.id);
        assert!(markup.contains(&format!("href=\"{edit_url}\"")));
    }

    #[tokio::test]
    async fn edit_form_prefills_reading_and_posts_to_update_endpoint() {
        let state = get_test_state();
        let reading = create_meter_reading(
            date!(2024 - 01 - 31),
            1_000.5,
            200.0,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = get_edit_reading_page(Path(reading.id), State(state))
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let markup = String::from_utf8(body.to_vec()).unwrap();

        let update_url = endpoints::format_endpoint(endpoints::UPDATE_READING, reading.id);
        assert!(markup.contains(&format!("action=\"{update_url}\"")));
        assert!(markup.contains("value=\"2024-01-31\""));
        assert!(markup.contains("value=\"1000.5\""));
        assert!(markup.contains("value=\"200\""));
    }

    #[tokio::test]
    async fn new_reading_form_posts_to_create_endpoint() {
        let response = get_new_reading_page().await;
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let markup = String::from_utf8(body.to_vec()).unwrap();

        assert!(markup.contains(&format!("action=\"{}\"", endpoints::READINGS_API)));
        assert!(markup.contains("name=\"end_date\""));
        assert!(markup.contains("name=\"grid_consumption_reading\""));
        assert!(markup.contains("name=\"grid_injection_reading\""));
    }
}
