//! Daily solar production: the model, database operations, pages and endpoints.

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

/// The energy produced by the solar source on a single day, in kWh.
///
/// Unlike meter readings these are per-day amounts, not cumulative totals.
#[derive(Debug, Clone, PartialEq)]
pub struct SolarReading {
    /// The id of the entry in the database.
    pub id: i64,
    /// The day the energy was produced.
    pub date: Date,
    /// The energy produced that day in kWh.
    pub kwh: f64,
}

/// Initialize the solar reading table.
pub fn create_solar_reading_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS solar_reading (
            id INTEGER PRIMARY KEY,
            date TEXT NOT NULL UNIQUE,
            kwh REAL NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Create a solar production entry and return it with its generated ID.
///
/// # Errors
/// Returns [Error::FutureDate] if `date` is after today, or
/// [Error::DuplicateSolarDate] if an entry already exists for that date.
pub fn create_solar_reading(
    date: Date,
    kwh: f64,
    connection: &Connection,
) -> Result<SolarReading, Error> {
    if date > OffsetDateTime::now_utc().date() {
        return Err(Error::FutureDate(date));
    }

    connection.execute(
        "INSERT INTO solar_reading (date, kwh) VALUES (?1, ?2)",
        params![date, kwh],
    )?;

    let id = connection.last_insert_rowid();

    Ok(SolarReading { id, date, kwh })
}

/// Record a period's production total as one entry per day.
///
/// The total is spread evenly across `[start_date, end_date]`. Days that
/// already have an entry are overwritten, so re-entering a corrected total
/// for the same period just works.
///
/// # Errors
/// Returns [Error::InvalidSolarPeriod] if `start_date` is after `end_date`,
/// or [Error::FutureDate] if `end_date` is after today.
pub fn create_solar_period(
    start_date: Date,
    end_date: Date,
    total_kwh: f64,
    connection: &Connection,
) -> Result<(), Error> {
    if start_date > end_date {
        return Err(Error::InvalidSolarPeriod(start_date, end_date));
    }

    if end_date > OffsetDateTime::now_utc().date() {
        return Err(Error::FutureDate(end_date));
    }

    let day_count = (end_date - start_date).whole_days() + 1;
    let daily_kwh = total_kwh / day_count as f64;

    let mut statement = connection.prepare(
        "INSERT INTO solar_reading (date, kwh) VALUES (?1, ?2)
        ON CONFLICT (date) DO UPDATE SET kwh = excluded.kwh",
    )?;

    let mut date = start_date;

    while date <= end_date {
        statement.execute(params![date, daily_kwh])?;

        date = match date.next_day() {
            Some(next) => next,
            None => break,
        };
    }

    Ok(())
}

/// Retrieve a single solar production entry by ID.
pub fn get_solar_reading(entry_id: i64, connection: &Connection) -> Result<SolarReading, Error> {
    connection
        .prepare("SELECT id, date, kwh FROM solar_reading WHERE id = ?1")?
        .query_row([entry_id], map_row)
        .map_err(|error| error.into())
}

/// Update a solar production entry's date and amount.
///
/// # Errors
/// Returns [Error::NotFound] if no entry has the given ID,
/// [Error::FutureDate] if `date` is after today, or
/// [Error::DuplicateSolarDate] if another entry already has that date.
pub fn update_solar_reading(
    entry_id: i64,
    date: Date,
    kwh: f64,
    connection: &Connection,
) -> Result<(), Error> {
    if date > OffsetDateTime::now_utc().date() {
        return Err(Error::FutureDate(date));
    }

    let rows_affected = connection.execute(
        "UPDATE solar_reading SET date = ?1, kwh = ?2 WHERE id = ?3",
        params![date, kwh, entry_id],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Retrieve all solar production entries ordered by date, oldest first.
pub fn get_all_solar_readings(connection: &Connection) -> Result<Vec<SolarReading>, Error> {
    connection
        .prepare("SELECT id, date, kwh FROM solar_reading ORDER BY date ASC")?
        .query_map([], map_row)?
        .map(|maybe_entry| maybe_entry.map_err(|error| error.into()))
        .collect()
}

/// Delete a solar production entry by ID. Returns an error if it doesn't exist.
pub fn delete_solar_reading(entry_id: i64, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM solar_reading WHERE id = ?1", [entry_id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingSolarEntry);
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<SolarReading, rusqlite::Error> {
    Ok(SolarReading {
        id: row.get(0)?,
        date: row.get(1)?,
        kwh: row.get(2)?,
    })
}

/// The state needed for the solar production pages and endpoints.
#[derive(Debug, Clone)]
pub struct SolarState {
    /// The database connection for solar production entries.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The display name of the monitored solar source.
    pub solar_source: String,
}

impl FromRef<AppState> for SolarState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            solar_source: state.billing_config.solar_source.clone(),
        }
    }
}

/// The form data for creating a solar production entry.
#[derive(Debug, Deserialize)]
pub struct SolarReadingForm {
    /// The day the energy was produced.
    pub date: Date,
    /// The energy produced that day in kWh.
    pub kwh: f64,
}

/// The form data for entering a period's solar production total.
#[derive(Debug, Deserialize)]
pub struct SolarPeriodForm {
    /// The first day of the period.
    pub start_date: Date,
    /// The last day of the period.
    pub end_date: Date,
    /// The energy produced over the whole period in kWh.
    pub total_kwh: f64,
}

/// Render the page listing the recorded daily solar production.
pub async fn get_solar_page(State(state): State<SolarState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let entries = get_all_solar_readings(&connection)
        .inspect_err(|error| tracing::error!("could not retrieve solar entries: {error}"))?;

    Ok(solar_view(&entries, &state.solar_source).into_response())
}

/// Render the page for entering a day's solar production.
pub async fn get_new_solar_page(State(state): State<SolarState>) -> Response {
    new_solar_view(&state.solar_source).into_response()
}

/// Render the page for entering a period's solar production total.
pub async fn get_new_solar_period_page(State(state): State<SolarState>) -> Response {
    new_solar_period_view(&state.solar_source).into_response()
}

/// Handle solar entry form submission, redirects to the solar list on success.
pub async fn create_solar_reading_endpoint(
    State(state): State<SolarState>,
    Form(form): Form<SolarReadingForm>,
) -> Result<Redirect, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    create_solar_reading(form.date, form.kwh, &connection)
        .inspect_err(|error| tracing::error!("could not create solar entry with {form:?}: {error}"))?;

    Ok(Redirect::to(endpoints::SOLAR_VIEW))
}

/// Handle the period form submission, redirects to the solar list on success.
pub async fn create_solar_period_endpoint(
    State(state): State<SolarState>,
    Form(form): Form<SolarPeriodForm>,
) -> Result<Redirect, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    create_solar_period(form.start_date, form.end_date, form.total_kwh, &connection)
        .inspect_err(|error| tracing::error!("could not record solar period with {form:?}: {error}"))?;

    Ok(Redirect::to(endpoints::SOLAR_VIEW))
}

/// Render the page for editing an existing solar production entry.
pub async fn get_edit_solar_page(
    Path(entry_id): Path<i64>,
    State(state): State<SolarState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let entry = get_solar_reading(entry_id, &connection)
        .inspect_err(|error| tracing::error!("could not retrieve solar entry {entry_id}: {error}"))?;

    Ok(edit_solar_view(&entry, &state.solar_source).into_response())
}

/// Handle the edit form submission, redirects to the solar list on success.
pub async fn update_solar_reading_endpoint(
    Path(entry_id): Path<i64>,
    State(state): State<SolarState>,
    Form(form): Form<SolarReadingForm>,
) -> Result<Redirect, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    update_solar_reading(entry_id, form.date, form.kwh, &connection).inspect_err(|error| {
        tracing::error!("could not update solar entry {entry_id} with {form:?}: {error}")
    })?;

    Ok(Redirect::to(endpoints::SOLAR_VIEW))
}

/// Handle solar entry deletion, redirects to the solar list on success.
pub async fn delete_solar_reading_endpoint(
    Path(entry_id): Path<i64>,
    State(state): State<SolarState>,
) -> Result<Redirect, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_solar_reading(entry_id, &connection)
        .inspect_err(|error| tracing::error!("could not delete solar entry {entry_id}: {error}"))?;

    Ok(Redirect::to(endpoints::SOLAR_VIEW))
}

fn solar_view(entries: &[SolarReading], solar_source: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::SOLAR_VIEW).into_html();
    let new_solar_route = endpoints::NEW_SOLAR_VIEW;
    let new_period_route = endpoints::NEW_SOLAR_PERIOD_VIEW;

    let table_row = |entry: &SolarReading| {
        let edit_url = endpoints::format_endpoint(endpoints::EDIT_SOLAR_VIEW, entry.id);
        let delete_url = endpoints::format_endpoint(endpoints::DELETE_SOLAR, entry.id);

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (entry.date) }
                td class=(TABLE_CELL_STYLE) { (format_kwh(entry.kwh)) }
                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex items-center gap-4"
                    {
                        a href=(edit_url) class=(LINK_STYLE) { "Edit" }

                        form
                            method="post"
                            action=(delete_url)
                            onsubmit=(format!(
                                "return confirm('Delete the solar production entry for {}?');",
                                entry.date
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
                    div
                    {
                        h1 class="text-xl font-bold" { "Solar Production" }
                        p class="text-sm text-gray-600 dark:text-gray-400"
                        {
                            "Daily output of " (solar_source)
                        }
                    }

                    div class="flex items-center gap-4"
                    {
                        a href=(new_solar_route) class=(LINK_STYLE) { "Add Entry" }
                        a href=(new_period_route) class=(LINK_STYLE) { "Add Period" }
                    }
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Production" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for entry in entries {
                                (table_row(entry))
                            }

                            @if entries.is_empty() {
                                tr
                                {
                                    td
                                        colspan="3"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No solar production recorded yet. "
                                        a href=(new_solar_route) class=(LINK_STYLE)
                                        {
                                            "Add your first entry"
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

    base("Solar Production", &[], &content)
}

fn new_solar_view(solar_source: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_SOLAR_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            (solar_form(endpoints::SOLAR_API, "Save Entry", solar_source, None))
        }
    );

    base("New Solar Entry", &[], &content)
}

fn new_solar_period_view(solar_source: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_SOLAR_PERIOD_VIEW).into_html();
    let max_date = OffsetDateTime::now_utc().date();

    let content = html!(
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                method="post"
                action=(endpoints::SOLAR_PERIOD_API)
                class="w-full space-y-4 md:space-y-6"
            {
                div
                {
                    label for="start_date" class=(FORM_LABEL_STYLE) { "First day of the period" }
                    input
                        type="date"
                        name="start_date"
                        id="start_date"
                        max=(max_date)
                        class=(FORM_TEXT_INPUT_STYLE)
                        required;
                }

                div
                {
                    label for="end_date" class=(FORM_LABEL_STYLE) { "Last day of the period" }
                    input
                        type="date"
                        name="end_date"
                        id="end_date"
                        value=(max_date)
                        max=(max_date)
                        class=(FORM_TEXT_INPUT_STYLE)
                        required;
                }

                div
                {
                    label for="total_kwh" class=(FORM_LABEL_STYLE)
                    {
                        "Total energy produced by " (solar_source) " (kWh)"
                    }
                    input
                        type="number"
                        name="total_kwh"
                        id="total_kwh"
                        step="0.01"
                        min="0"
                        class=(FORM_TEXT_INPUT_STYLE)
                        required;
                }

                p class="text-sm text-gray-600 dark:text-gray-400"
                {
                    "The total is spread evenly across the days of the period."
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save Period" }
            }
        }
    );

    base("New Solar Period", &[], &content)
}

fn edit_solar_view(entry: &SolarReading, solar_source: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::SOLAR_VIEW).into_html();
    let update_url = endpoints::format_endpoint(endpoints::UPDATE_SOLAR, entry.id);

    let content = html!(
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            (solar_form(&update_url, "Update Entry", solar_source, Some(entry)))
        }
    );

    base("Edit Solar Entry", &[], &content)
}

fn solar_form(
    action: &str,
    submit_label: &str,
    solar_source: &str,
    prefill: Option<&SolarReading>,
) -> Markup {
    let max_date = OffsetDateTime::now_utc().date();
    let date_value = prefill.map_or(max_date, |entry| entry.date);

    html!(
        form
            method="post"
            action=(action)
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Production date" }
                input
                    type="date"
                    name="date"
                    id="date"
                    value=(date_value)
                    max=(max_date)
                    class=(FORM_TEXT_INPUT_STYLE)
                    required;
            }

            div
            {
                label for="kwh" class=(FORM_LABEL_STYLE)
                {
                    "Energy produced by " (solar_source) " (kWh)"
                }
                input
                    type="number"
                    name="kwh"
                    id="kwh"
                    step="0.01"
                    min="0"
                    value=[prefill.map(|entry| entry.kwh)]
                    class=(FORM_TEXT_INPUT_STYLE)
                    required;
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_label) }
        }
    )
}

#[cfg(test)]
mod solar_reading_db_tests {
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime, macros::date};

    use crate::Error;

    use super::{
        create_solar_period, create_solar_reading, create_solar_reading_table,
        delete_solar_reading, get_all_solar_readings, get_solar_reading, update_solar_reading,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_solar_reading_table(&connection).unwrap();
        connection
    }

    #[test]
    fn sql_is_valid() {
        let connection = Connection::open_in_memory().unwrap();

        assert_eq!(Ok(()), create_solar_reading_table(&connection));
    }

    #[test]
    fn create_rejects_future_date() {
        let connection = get_test_connection();
        let tomorrow = OffsetDateTime::now_utc().date() + Duration::days(1);

        let result = create_solar_reading(tomorrow, 12.5, &connection);

        assert_eq!(result, Err(Error::FutureDate(tomorrow)));
    }

    #[test]
    fn create_rejects_duplicate_date() {
        let connection = get_test_connection();
        create_solar_reading(date!(2024 - 01 - 15), 12.5, &connection).unwrap();

        let result = create_solar_reading(date!(2024 - 01 - 15), 13.0, &connection);

        assert_eq!(result, Err(Error::DuplicateSolarDate));
    }

    #[test]
    fn get_all_returns_entries_sorted_by_date() {
        let connection = get_test_connection();
        create_solar_reading(date!(2024 - 01 - 16), 8.0, &connection).unwrap();
        create_solar_reading(date!(2024 - 01 - 15), 12.5, &connection).unwrap();

        let entries = get_all_solar_readings(&connection).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, date!(2024 - 01 - 15));
        assert_eq!(entries[0].kwh, 12.5);
        assert_eq!(entries[1].date, date!(2024 - 01 - 16));
    }

    #[test]
    fn period_spreads_total_evenly_across_days() {
        let connection = get_test_connection();

        create_solar_period(date!(2024 - 01 - 15), date!(2024 - 01 - 17), 30.0, &connection)
            .unwrap();

        let entries = get_all_solar_readings(&connection).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].date, date!(2024 - 01 - 15));
        assert_eq!(entries[2].date, date!(2024 - 01 - 17));
        assert!(entries.iter().all(|entry| entry.kwh == 10.0));
    }

    #[test]
    fn single_day_period_records_the_whole_total() {
        let connection = get_test_connection();

        create_solar_period(date!(2024 - 01 - 15), date!(2024 - 01 - 15), 12.5, &connection)
            .unwrap();

        let entries = get_all_solar_readings(&connection).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kwh, 12.5);
    }

    #[test]
    fn period_overwrites_existing_entries() {
        let connection = get_test_connection();
        create_solar_reading(date!(2024 - 01 - 16), 99.0, &connection).unwrap();

        create_solar_period(date!(2024 - 01 - 15), date!(2024 - 01 - 17), 30.0, &connection)
            .unwrap();

        let entries = get_all_solar_readings(&connection).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|entry| entry.kwh == 10.0));
    }

    #[test]
    fn period_rejects_start_after_end() {
        let connection = get_test_connection();

        let result =
            create_solar_period(date!(2024 - 01 - 17), date!(2024 - 01 - 15), 30.0, &connection);

        assert_eq!(
            result,
            Err(Error::InvalidSolarPeriod(
                date!(2024 - 01 - 17),
                date!(2024 - 01 - 15)
            ))
        );
        assert!(get_all_solar_readings(&connection).unwrap().is_empty());
    }

    #[test]
    fn period_rejects_future_end_date() {
        let connection = get_test_connection();
        let tomorrow = OffsetDateTime::now_utc().date() + Duration::days(1);

        let result = create_solar_period(tomorrow - Duration::days(5), tomorrow, 30.0, &connection);

        assert_eq!(result, Err(Error::FutureDate(tomorrow)));
    }

    #[test]
    fn get_returns_stored_entry() {
        let connection = get_test_connection();
        let created = create_solar_reading(date!(2024 - 01 - 15), 12.5, &connection).unwrap();

        let retrieved = get_solar_reading(created.id, &connection).unwrap();

        assert_eq!(retrieved, created);
    }

    #[test]
    fn update_changes_stored_values() {
        let connection = get_test_connection();
        let entry = create_solar_reading(date!(2024 - 01 - 15), 12.5, &connection).unwrap();

        update_solar_reading(entry.id, date!(2024 - 01 - 16), 9.0, &connection).unwrap();

        let updated = get_solar_reading(entry.id, &connection).unwrap();
        assert_eq!(updated.date, date!(2024 - 01 - 16));
        assert_eq!(updated.kwh, 9.0);
    }

    #[test]
    fn update_missing_entry_returns_not_found() {
        let connection = get_test_connection();

        let result = update_solar_reading(999, date!(2024 - 01 - 15), 12.5, &connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn update_rejects_another_entries_date() {
        let connection = get_test_connection();
        create_solar_reading(date!(2024 - 01 - 15), 12.5, &connection).unwrap();
        let second = create_solar_reading(date!(2024 - 01 - 16), 8.0, &connection).unwrap();

        let result = update_solar_reading(second.id, date!(2024 - 01 - 15), 8.0, &connection);

        assert_eq!(result, Err(Error::DuplicateSolarDate));
    }

    #[test]
    fn delete_removes_entry() {
        let connection = get_test_connection();
        let entry = create_solar_reading(date!(2024 - 01 - 15), 12.5, &connection).unwrap();

        delete_solar_reading(entry.id, &connection).unwrap();

        assert!(get_all_solar_readings(&connection).unwrap().is_empty());
    }

    #[test]
    fn delete_missing_entry_returns_error() {
        let connection = get_test_connection();

        let result = delete_solar_reading(999, &connection);

        assert_eq!(result, Err(Error::DeleteMissingSolarEntry));
    }
}
